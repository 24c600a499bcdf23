//! Data model shared by the dispatcher, the judge and the CLI
//!
//! - Requests built per backend call
//! - Per-model call results and their ordered aggregate
//! - The judge's verdict

mod call;
mod judgment;
mod request;

pub use call::{AggregateResult, CallResult};
pub use judgment::JudgmentResult;
pub use request::Request;
