//! Model registry.
//!
//! Single source of truth for the models chorus knows how to call and the
//! request shape each one needs.

use crate::error::ChorusError;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Wire format a model expects
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    /// Structured list of role-tagged messages (`/chat/completions`)
    Chat,
    /// Flat prompt string plus a token budget (`/completions`)
    RawCompletion,
}

/// A model identifier paired with its call shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub identifier: String,
    pub shape: CallShape,
}

impl ModelSpec {
    pub fn new(identifier: impl Into<String>, shape: CallShape) -> Self {
        Self {
            identifier: identifier.into(),
            shape,
        }
    }

    /// Chat-shaped spec for an arbitrary identifier, used for judging
    pub fn chat(identifier: impl Into<String>) -> Self {
        Self::new(identifier, CallShape::Chat)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.shape)
    }
}

/// Every model the registry resolves
const REGISTRY: &[(&str, CallShape)] = &[
    ("gpt-3.5-turbo", CallShape::Chat),
    ("gpt-4", CallShape::Chat),
    ("gpt-4o-mini", CallShape::Chat),
    ("text-davinci-003", CallShape::RawCompletion),
    ("gpt-3.5-turbo-instruct", CallShape::RawCompletion),
];

/// Models queried when no model is pinned, in display order
pub const DEFAULT_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-4",
    "text-davinci-003",
    "gpt-3.5-turbo-instruct",
];

/// Model asked to pick the best answer
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-3.5-turbo";

/// Look up the spec for `identifier`
pub fn resolve(identifier: &str) -> Result<ModelSpec, ChorusError> {
    let wanted = identifier.trim();
    REGISTRY
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(name, shape)| ModelSpec::new(*name, *shape))
        .ok_or_else(|| ChorusError::UnknownModel(identifier.to_string()))
}

/// All registered specs, in registry order
pub fn all() -> Vec<ModelSpec> {
    REGISTRY
        .iter()
        .map(|(name, shape)| ModelSpec::new(*name, *shape))
        .collect()
}

/// All registered identifiers
pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// The default fan-out set as owned strings
pub fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(ToString::to_string).collect()
}
