use std::{error::Error, fmt, io};

use machine_learning::MlErr;

pub type Result<T> = std::result::Result<T, ConfigErr>;

/// All errors that can occur while handling a configuration document.
#[derive(Debug)]
pub enum ConfigErr {
    /// The document breaks one of its rules, caught before anything uses it.
    Invalid(String),
    Io(io::Error),
    Json(serde_json::Error),
    Ml(MlErr),
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Ml(e) => write!(f, "machine learning error: {e}"),
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Ml(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<MlErr> for ConfigErr {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}
