//! Text-generation adapter for the Gemini API.

pub mod client;

pub use client::{resolve_api_key, GeminiClient};
