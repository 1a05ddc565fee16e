//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse JSON (add-on `options.json`) / TOML configuration files
//! - Validate configuration legality
//! - Generate `ScannerOptions`
//!
//! Any error returned here is a configuration error: the scanner refuses to
//! start rather than run in an undefined mode.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let options = ConfigLoader::load_from_path(Path::new("/data/options.json")).unwrap();
//! println!("Stream: {}", options.camera_rtsp_stream);
//! ```

mod parser;
mod validator;

pub use contracts::ScannerOptions;
pub use parser::ConfigFormat;

use contracts::{ContractError, SUPERVISOR_TOKEN_ENV};
use std::path::Path;

/// Default location of the add-on options file
pub const DEFAULT_CONFIG_PATH: &str = "/data/options.json";

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.json / .toml).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure (including missing required fields and unknown detector kinds)
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ScannerOptions, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScannerOptions, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate options that were built or modified in code (e.g. CLI overrides)
    pub fn validate(options: &ScannerOptions) -> Result<(), ContractError> {
        validator::validate(options)
    }

    /// Resolve the Home Assistant token: explicit option first, then `SUPERVISOR_TOKEN`
    pub fn resolve_token(options: &ScannerOptions) -> Option<String> {
        options
            .home_assistant_token
            .clone()
            .or_else(|| std::env::var(SUPERVISOR_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Serialize options to TOML string
    pub fn to_toml(options: &ScannerOptions) -> Result<String, ContractError> {
        toml::to_string_pretty(options)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize options to JSON string
    pub fn to_json(options: &ScannerOptions) -> Result<String, ContractError> {
        serde_json::to_string_pretty(options)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScannerOptions, ContractError> {
        let options = parser::parse(content, format)?;
        validator::validate(&options)?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const OPTIONS_JSON: &str = r#"{
        "detector_type": "qr_code",
        "tag_event_device_id": "front_door",
        "camera_rtsp_stream": "rtsp://192.168.1.20:554/stream1"
    }"#;

    #[test]
    fn test_load_from_str_json() {
        let result = ConfigLoader::load_from_str(OPTIONS_JSON, ConfigFormat::Json);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let options = result.unwrap();
        assert_eq!(options.tag_event_device_id, "front_door");
        assert_eq!(options.frame_sample_interval, 0.5);
    }

    #[test]
    fn test_load_from_path_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(OPTIONS_JSON.as_bytes()).unwrap();

        let options = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(options.camera_rtsp_stream, "rtsp://192.168.1.20:554/stream1");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/options.json")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_round_trip_toml() {
        let options = ConfigLoader::load_from_str(OPTIONS_JSON, ConfigFormat::Json).unwrap();
        let serialized = ConfigLoader::to_toml(&options).unwrap();
        let options2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(options.tag_event_device_id, options2.tag_event_device_id);
        assert_eq!(options.detector_type, options2.detector_type);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"{
            "tag_event_device_id": "door",
            "camera_rtsp_stream": "rtsp://cam",
            "stream_reconnect_delay": 0
        }"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
        assert!(err.to_string().contains("stream_reconnect_delay"));
    }

    #[test]
    fn test_explicit_token_wins() {
        let mut options = ConfigLoader::load_from_str(OPTIONS_JSON, ConfigFormat::Json).unwrap();
        options.home_assistant_token = Some("abc".into());
        assert_eq!(ConfigLoader::resolve_token(&options).as_deref(), Some("abc"));
    }
}
