// src/exec/mod.rs

//! Execution layer.
//!
//! - [`command`] runs the external site generator with
//!   `tokio::process::Command`.
//! - [`backend`] provides the `ActionBackend` trait and the production
//!   `PipelineBackend`, which tests can replace with a fake implementation.

pub mod backend;
pub mod command;

pub use backend::{ActionBackend, PipelineBackend};
pub use command::{current_platform, generator_program, SiteGenerator};
