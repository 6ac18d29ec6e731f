use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `FFCONV_CONVERSION__THREADS=2`.
const ENV_PREFIX: &str = "FFCONV_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Defaults with environment overrides only, for running without a file.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::ProcessPriority;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.conversion.graceful_quit_timeout_secs, 5);
    }

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[executables]
directory = "/opt/ffmpeg/bin"

[conversion]
overwrite_output = true
threads = 2
priority = "below_normal"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.executables.directory,
            Some(PathBuf::from("/opt/ffmpeg/bin"))
        );
        assert!(config.conversion.overwrite_output);
        assert_eq!(config.conversion.threads, Some(2));
        assert_eq!(
            config.conversion.priority,
            Some(ProcessPriority::BelowNormal)
        );
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[conversion]
threads = "many"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/ffconv.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[executables]
ffmpeg_path = "/usr/local/bin/ffmpeg"

[conversion]
stdout_chunk_size = 8192
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.executables.ffmpeg_path,
            Some(PathBuf::from("/usr/local/bin/ffmpeg"))
        );
        assert_eq!(config.conversion.stdout_chunk_size, 8192);
        assert_eq!(config.conversion.progress_buffer, 100);
    }
}
