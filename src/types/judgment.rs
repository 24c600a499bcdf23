//! The judge's verdict

use super::CallResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentResult {
    /// Model that produced the verdict
    pub model: String,
    pub text: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CallResult> for JudgmentResult {
    fn from(result: CallResult) -> Self {
        Self {
            model: result.model,
            text: result.text,
            ok: result.ok,
            error: result.error,
        }
    }
}
