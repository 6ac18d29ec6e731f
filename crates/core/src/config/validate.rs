use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - an explicit thread count is not 0
/// - the graceful quit timeout is not 0
/// - stdout chunk size and progress buffer are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let conversion = &config.conversion;

    if conversion.threads == Some(0) {
        return Err(ConfigError::ValidationError(
            "conversion.threads cannot be 0".to_string(),
        ));
    }

    if conversion.graceful_quit_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "conversion.graceful_quit_timeout_secs cannot be 0".to_string(),
        ));
    }

    if conversion.stdout_chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "conversion.stdout_chunk_size cannot be 0".to_string(),
        ));
    }

    if conversion.progress_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "conversion.progress_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::ConversionSettings;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_threads_fails() {
        let config = Config {
            conversion: ConversionSettings::default().with_threads(0),
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let config = Config {
            conversion: ConversionSettings::default().with_graceful_quit_timeout(0),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_chunk_size_fails() {
        let config = Config {
            conversion: ConversionSettings::default().with_stdout_chunk_size(0),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
