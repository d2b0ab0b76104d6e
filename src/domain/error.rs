//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for hedgetrader.
#[derive(Debug, thiserror::Error)]
pub enum HedgeError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("malformed bar #{index} ({date}) for {code}: {reason}")]
    MalformedBar {
        code: String,
        index: usize,
        date: NaiveDate,
        reason: String,
    },

    #[error("series {left} and {right} are misaligned at bar #{index}: {reason}")]
    Misaligned {
        left: String,
        right: String,
        index: usize,
        reason: String,
    },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HedgeError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        HedgeError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&HedgeError> for std::process::ExitCode {
    fn from(err: &HedgeError) -> Self {
        let code: u8 = match err {
            HedgeError::Io(_) => 1,
            HedgeError::ConfigParse { .. }
            | HedgeError::ConfigMissing { .. }
            | HedgeError::ConfigInvalid { .. } => 2,
            HedgeError::DataSource { .. } => 3,
            HedgeError::InvalidParameter { .. } => 4,
            HedgeError::MalformedBar { .. }
            | HedgeError::Misaligned { .. }
            | HedgeError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
