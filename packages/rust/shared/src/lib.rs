//! Shared types, error model, and configuration for labdoc.
//!
//! This crate is the foundation depended on by all other labdoc crates.
//! It provides:
//! - [`LabdocError`]: the unified error type
//! - Domain types ([`ChangeSet`], [`ChangedChapters`], [`OutputFormat`])
//! - Configuration ([`AppConfig`] and its sections, config loading)
//! - Preview markup shared by the banner filter and the post-processing tools

pub mod config;
pub mod error;
pub mod markup;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BannerStyle, CONFIG_FILE_NAME, ChangesConfig, FilterKind, FiltersConfig,
    PreviewConfig, default_config_path, init_config, load_config, load_config_from,
    validate_config,
};
pub use error::{LabdocError, Result};
pub use types::{CHANGED_CHAPTERS_FILE, ChangeSet, ChangedChapters, OutputFormat, chapter_id};
