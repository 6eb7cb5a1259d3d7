//! Optional text-generation overlay for the three forecasting features.
//!
//! Each feature has a prompt builder (`prompt`) and a reply parser (`parse`).
//! Parsers never fail: malformed or mistyped replies turn into fallback text.
//! Transport errors from the generator are returned to the caller untouched.

pub mod chat;
pub mod parse;
pub mod prompt;

use anyhow::Result;

pub use chat::ChatCompletionsClient;

pub const DEFAULT_TEMPERATURE: f64 = 0.4;
pub const SIGN_THEORY_TEMPERATURE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
}

/// A collaborator that turns a system/user prompt pair into free text.
pub trait NarrativeGenerator {
    fn generate(&self, request: &NarrativeRequest) -> Result<String>;
}

impl<G: NarrativeGenerator + ?Sized> NarrativeGenerator for &G {
    fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        (**self).generate(request)
    }
}

impl<G: NarrativeGenerator + ?Sized> NarrativeGenerator for Box<G> {
    fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        (**self).generate(request)
    }
}
