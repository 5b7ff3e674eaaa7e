//! Git plumbing for labdoc: command access, change detection, and CI export.

pub mod changes;
pub mod export;
pub mod repo;

pub use changes::{DetectOptions, detect_changes, filter_by_extension};
pub use export::{append_to_file, render_env, render_outputs, write_chapters_json};
pub use repo::{GitCli, GitSource};
