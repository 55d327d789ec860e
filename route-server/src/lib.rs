//! Route resolution server.
//!
//! Answers "how far is it from here to there, and how long will it take?"
//! by asking a chain of routing backends in turn and caching what they say.

pub mod cache;
pub mod domain;
pub mod providers;
pub mod resolver;
pub mod web;
