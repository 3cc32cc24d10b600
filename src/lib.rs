//! ollama-bridge: Ollama- and OpenAI-compatible front end for a chat model.
//!
//! Clients written against either protocol talk to this server as if it were
//! the native one. Every request is compiled into a flat prompt, answered by a
//! single [`backend::provider::ModelProvider`], and the reply is rendered back
//! in the caller's protocol, including synthesized streaming and usage fields.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod prompt;
pub mod server;
pub mod service;
