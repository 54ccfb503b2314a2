//! File-based AI chat: a whole conversation in one editable text file.
//!
//! A dialog file names its model and behavior template in two header lines and
//! then holds the turn history. Each run of `fbac <file>` parses the file,
//! sends the conversation to the model, and streams the reply back into the
//! same file, ending with an empty `Human:` turn for the next question.
//!
//! ```text
//! model: gpt-4o
//! behavior: default
//!
//! Human: What is a monad?
//!
//! AI: ...
//!
//! Human:
//! ```
//!
//! # Modules
//!
//! - [`config`]: Application settings from TOML and environment variables
//! - [`registry`]: Model and behavior lookup over operator-maintained JSON maps
//! - [`dialog`]: The dialog-file protocol: create, parse, append
//! - [`backend`]: Streaming chat clients for OpenAI-compatible and Anthropic APIs
//! - [`error`]: Error types for every phase

pub mod backend;
pub mod config;
pub mod dialog;
pub mod error;
pub mod registry;
