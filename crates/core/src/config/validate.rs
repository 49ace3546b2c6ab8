use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Fragment extension is non-empty and has no leading dot
/// - Merged file, DASH directory and manifest names are plain file names
/// - Manifest name ends in `.mpd`
/// - Metrics port is not 0 when the endpoint is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let extension = &config.assembly.fragment_extension;
    if extension.is_empty() || extension.starts_with('.') {
        return Err(ConfigError::ValidationError(
            "assembly.fragment_extension must be non-empty and given without a leading dot"
                .to_string(),
        ));
    }

    for (key, value) in [
        ("assembly.merged_file_name", &config.assembly.merged_file_name),
        ("assembly.dash_dir_name", &config.assembly.dash_dir_name),
        ("transcoder.manifest_name", &config.transcoder.manifest_name),
    ] {
        check_plain_name(key, value)?;
    }

    if !config.transcoder.manifest_name.ends_with(".mpd") {
        return Err(ConfigError::ValidationError(
            "transcoder.manifest_name must end with .mpd".to_string(),
        ));
    }

    if config.assembly.merged_file_name.ends_with(&format!(".{}", extension)) {
        return Err(ConfigError::ValidationError(
            "assembly.merged_file_name must not use the fragment extension".to_string(),
        ));
    }

    if config.metrics.enabled && config.metrics.port == 0 {
        return Err(ConfigError::ValidationError(
            "metrics.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn check_plain_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be a plain file name, got {:?}",
            key, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_extension_fails() {
        let mut config = Config::default();
        config.assembly.fragment_extension = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_dotted_extension_fails() {
        let mut config = Config::default();
        config.assembly.fragment_extension = ".chunk".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_nested_names_fail() {
        let mut config = Config::default();
        config.assembly.dash_dir_name = "../outside".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.assembly.merged_file_name = "..".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_manifest_extension() {
        let mut config = Config::default();
        config.transcoder.manifest_name = "output.m3u8".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_merged_file_with_fragment_extension_fails() {
        let mut config = Config::default();
        config.assembly.merged_file_name = "merged.chunk".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_metrics_port_zero_fails_only_when_enabled() {
        let mut config = Config::default();
        config.metrics.port = 0;
        assert!(validate_config(&config).is_ok());

        config.metrics.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
