//! Unit tests for module and plugin errors

#[cfg(test)]
mod tests {
    use crate::context::DataSourceError;
    use crate::data::DataShape;
    use crate::modules::error::{ModuleError, PluginError};
    use crate::store::StoreError;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_store_error_conversion() {
        let error: ModuleError = StoreError::NotFound("urn:x".to_string()).into();
        assert!(matches!(error, ModuleError::Store(_)));
        assert!(error.to_string().contains("urn:x"));
    }

    #[test]
    fn test_data_source_error_conversion() {
        let error: ModuleError = DataSourceError::InvalidOutput("dpkg -l".to_string()).into();
        assert!(matches!(error, ModuleError::DataSource(_)));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_unsupported_shape_message() {
        let error = ModuleError::UnsupportedShape {
            submodule: "Packages".to_string(),
            shape: DataShape::Tree,
        };
        assert_eq!(error.to_string(), "Submodule 'Packages' cannot produce tree data");
    }

    #[test]
    fn test_io_error_conversion() {
        let error: ModuleError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(error.to_string().contains("denied"));
    }

    #[test]
    fn test_plugin_read_error_keeps_source() {
        let error = PluginError::Read {
            path: PathBuf::from("plugins/a.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(error.to_string().contains("plugins/a.toml"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_plugin_unknown_type_message() {
        let error = PluginError::UnknownType("native".to_string());
        assert_eq!(error.to_string(), "Plugin type 'native' is not registered");
    }

    #[test]
    fn test_plugin_constructor_panic_message() {
        let error = PluginError::ConstructorPanicked {
            kind: "boom".to_string(),
            message: "bad manifest".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Constructor for plugin type 'boom' panicked: bad manifest"
        );
    }
}
