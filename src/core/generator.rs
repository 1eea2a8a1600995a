//! The text-generation collaborator consumed by the volume planner.
//!
//! The planner builds prompts and hands them over; it never inspects the
//! options beyond passing them through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    Failed(String),
    #[error("generator returned empty text")]
    Empty,
}

/// Opaque hints forwarded to the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

pub trait TextGenerator {
    fn generate(&mut self, prompt: &str, options: &GenerationOptions) -> Result<String, GenerationError>;
}

impl<F> TextGenerator for F
where
    F: FnMut(&str) -> Result<String, GenerationError>,
{
    fn generate(&mut self, prompt: &str, _options: &GenerationOptions) -> Result<String, GenerationError> {
        self(prompt)
    }
}
