//! Error types for the scan_sheets library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scan_sheets operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that abort a scan.
///
/// Illegible or ambiguous fields are not errors: decoders resolve them to
/// sentinel values inside the record so a reviewer can correct them.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoad {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The sheet could not be located in the photograph
    #[error("Sheet localization failed: {reason}")]
    Localization { reason: String },

    /// The schema or sheet config is missing something a decoder needs
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    /// A configuration or schema file is not valid JSON for its type
    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A crop or record could not be written
    #[error("Failed to write {path}: {message}")]
    Output { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoad {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn localization(reason: impl Into<String>) -> Self {
        Self::Localization {
            reason: reason.into(),
        }
    }

    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error indicates a condition worth retrying with another photo
    ///
    /// Localization depends on the photograph; configuration errors do not go
    /// away until the schema or config is fixed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::Localization { .. } | ScanError::ImageLoad { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            ScanError::ImageLoad { .. } => {
                "Could not load the image. Please check the file format and try again.".to_string()
            }
            ScanError::Localization { .. } => {
                "Could not find the corner markers. Retake the photo with all four markers visible."
                    .to_string()
            }
            ScanError::Configuration { field, reason } => {
                format!("The sheet layout is invalid at `{}`: {}", field, reason)
            }
            ScanError::ConfigParse { path, .. } => {
                format!("Could not read configuration file {}.", path.display())
            }
            _ => "Scanning failed. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localization_is_recoverable() {
        let err = ScanError::localization("no quadrilateral markers");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("no quadrilateral markers"));
    }

    #[test]
    fn test_configuration_is_not_recoverable() {
        let err = ScanError::configuration("auto_score", "bad label `x2`");
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("auto_score"));
    }
}
