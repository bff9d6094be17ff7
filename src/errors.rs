// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitewatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A single source file could not be compiled. Collected in
    /// [`CompileReport`](crate::compile::CompileReport)s, never propagated.
    #[error("failed to compile {}: {message}", path.display())]
    Compile { path: PathBuf, message: String },

    /// The site generator exited unsuccessfully (one-shot `site-build`).
    #[error("site generator exited with code {code}")]
    SiteBuild { code: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SitewatchError>;
