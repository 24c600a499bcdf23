//! Error taxonomy for chorus.
//!
//! Only [`ChorusError::ConfigUnavailable`] and [`ChorusError::InvalidConfig`]
//! are fatal to an invocation. Every other variant is captured on the
//! [`CallResult`](crate::types::CallResult) of the call that produced it. A
//! missing prompt is not an error; it ends the run as
//! [`Outcome::NoInput`](crate::orchestrator::Outcome::NoInput).

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChorusError {
    #[error(
        "No API key found. Set OPENAI_API_KEY or write the key to ./{}",
        crate::config::KEY_FILE_NAME
    )]
    ConfigUnavailable,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Remote error: {0}")]
    Remote(String),
}

impl ChorusError {
    /// Short classification stored on failed call results
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigUnavailable | Self::InvalidConfig(_) => ErrorKind::Config,
            Self::UnknownModel(_) => ErrorKind::UnknownModel,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Remote(_) => ErrorKind::Remote,
        }
    }

    /// The message without the variant prefix
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidConfig(detail)
            | Self::UnknownModel(detail)
            | Self::Transport(detail)
            | Self::Remote(detail) => detail.clone(),
            Self::ConfigUnavailable => self.to_string(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    UnknownModel,
    Transport,
    Remote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            ChorusError::Transport("reset".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ChorusError::UnknownModel("gpt-9".into()).kind(),
            ErrorKind::UnknownModel
        );
        assert_eq!(ErrorKind::UnknownModel.to_string(), "unknown_model");
    }

    #[test]
    fn test_error_kind_parses_from_snake_case() {
        assert_eq!("unknown_model".parse::<ErrorKind>(), Ok(ErrorKind::UnknownModel));
        assert_eq!(
            "no_input".parse::<ErrorKind>(),
            Err(strum::ParseError::VariantNotFound)
        );
    }

    #[test]
    fn test_detail_strips_prefix() {
        let err = ChorusError::Remote("status 500".into());
        assert_eq!(err.to_string(), "Remote error: status 500");
        assert_eq!(err.detail(), "status 500");
    }
}
