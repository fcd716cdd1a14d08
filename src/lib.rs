//! Turns a GitHub repository into a short LLM-generated MVP description.
//!
//! The `describe` flow reads repository metadata and the README from GitHub
//! and posts them to the describe-mvp service, which prompts a Groq-hosted
//! model and relays the completion back.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod github;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod repo_ref;
pub mod server;
