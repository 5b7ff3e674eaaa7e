//! Application configuration for labdoc.
//!
//! Project config lives at `./labdoc.toml` (or the path given with `--config`).
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LabdocError, Result};

/// Default configuration file name, resolved against the working directory.
pub const CONFIG_FILE_NAME: &str = "labdoc.toml";

// ---------------------------------------------------------------------------
// Config structs (matching labdoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Change detection settings.
    #[serde(default)]
    pub changes: ChangesConfig,

    /// Pandoc filter chain settings.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Preview post-processing settings.
    #[serde(default)]
    pub preview: PreviewConfig,
}

/// `[changes]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesConfig {
    /// Base branch or revision to diff against.
    #[serde(default = "default_base_ref")]
    pub base_ref: String,

    /// Remote the base branch is fetched from. Empty disables the remote prefix.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Extension (without the dot) of documentation sources.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Whether to `git fetch` the base before diffing.
    #[serde(default = "default_true")]
    pub fetch: bool,

    /// Output key for the multi-line file list.
    #[serde(default = "default_files_key")]
    pub files_key: String,

    /// Output key for the boolean "has changes" flag.
    #[serde(default = "default_flag_key")]
    pub flag_key: String,

    /// Environment variable name the file list is exported under.
    #[serde(default = "default_env_key")]
    pub env_key: String,
}

impl Default for ChangesConfig {
    fn default() -> Self {
        Self {
            base_ref: default_base_ref(),
            remote: default_remote(),
            extension: default_extension(),
            fetch: true,
            files_key: default_files_key(),
            flag_key: default_flag_key(),
            env_key: default_env_key(),
        }
    }
}

fn default_base_ref() -> String {
    "main".into()
}
fn default_remote() -> String {
    "origin".into()
}
fn default_extension() -> String {
    "qmd".into()
}
fn default_true() -> bool {
    true
}
fn default_files_key() -> String {
    "changed_files".into()
}
fn default_flag_key() -> String {
    "has_changes".into()
}
fn default_env_key() -> String {
    "PREVIEW_CHANGED_FILES".into()
}

/// A named pass in the pandoc filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// Page break before every chapter heading but the first.
    PageBreak,
    /// Git version appendix for the archival format.
    GitInfo,
    /// Banner on pages changed in a preview build.
    PreviewBanner,
}

impl FilterKind {
    /// All filters, in default chain order.
    pub const ALL: [FilterKind; 3] = [Self::PageBreak, Self::GitInfo, Self::PreviewBanner];

    /// The kebab-case name used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageBreak => "page-break",
            Self::GitInfo => "git-info",
            Self::PreviewBanner => "preview-banner",
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterKind {
    type Err = LabdocError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                LabdocError::validation(format!(
                    "unknown filter '{s}': expected 'page-break', 'git-info', or 'preview-banner'"
                ))
            })
    }
}

/// How the preview banner is emitted into HTML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BannerStyle {
    /// A placeholder paragraph, expanded later by `preview expand-banner`.
    #[default]
    Placeholder,
    /// The banner markup itself, as a raw HTML block.
    Html,
}

/// `[filters]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Filters to run, in order.
    #[serde(default = "default_chain")]
    pub chain: Vec<FilterKind>,

    /// The only output format that receives the git version appendix.
    #[serde(default = "default_git_info_format")]
    pub git_info_format: String,

    /// Metadata key marking a document as changed in the preview.
    #[serde(default = "default_changed_key")]
    pub changed_key: String,

    /// Banner emission style.
    #[serde(default)]
    pub banner_style: BannerStyle,

    /// Placeholder token emitted in [`BannerStyle::Placeholder`] mode.
    #[serde(default = "default_banner_placeholder")]
    pub banner_placeholder: String,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            git_info_format: default_git_info_format(),
            changed_key: default_changed_key(),
            banner_style: BannerStyle::default(),
            banner_placeholder: default_banner_placeholder(),
        }
    }
}

fn default_chain() -> Vec<FilterKind> {
    FilterKind::ALL.to_vec()
}
fn default_git_info_format() -> String {
    "docx".into()
}
fn default_changed_key() -> String {
    "preview-changed".into()
}
fn default_banner_placeholder() -> String {
    "LABDOC-PREVIEW-BANNER".into()
}

/// `[preview]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Directory holding the rendered HTML site.
    #[serde(default = "default_html_dir")]
    pub html_dir: String,

    /// Remote hosting the published site branch.
    #[serde(default = "default_remote")]
    pub publish_remote: String,

    /// Branch the published site lives on.
    #[serde(default = "default_publish_branch")]
    pub publish_branch: String,

    /// Scratch directory the published HTML is checked out into.
    #[serde(default = "default_base_checkout_dir")]
    pub base_checkout_dir: String,

    /// Pages at least this similar to the published version get no notice.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            html_dir: default_html_dir(),
            publish_remote: default_remote(),
            publish_branch: default_publish_branch(),
            base_checkout_dir: default_base_checkout_dir(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl PreviewConfig {
    /// The fully qualified ref of the published site, e.g. `origin/gh-pages`.
    pub fn publish_ref(&self) -> String {
        if self.publish_remote.is_empty() {
            self.publish_branch.clone()
        } else {
            format!("{}/{}", self.publish_remote, self.publish_branch)
        }
    }
}

fn default_html_dir() -> String {
    "docs".into()
}
fn default_publish_branch() -> String {
    "gh-pages".into()
}
fn default_base_checkout_dir() -> String {
    std::env::temp_dir()
        .join("labdoc-base-html")
        .to_string_lossy()
        .into_owned()
}
fn default_similarity_threshold() -> f64 {
    0.95
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the project config file in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load the config from `path`, or from `./labdoc.toml` when `None`.
/// Returns defaults if the file does not exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LabdocError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LabdocError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Write a default config file to `path`, refusing to overwrite an existing one.
/// Returns the path written.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(LabdocError::config(format!(
            "{} already exists; remove it first to regenerate defaults",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LabdocError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| LabdocError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Reject values that would make an operation meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let threshold = config.preview.similarity_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(LabdocError::config(format!(
            "preview.similarity_threshold must be within 0.0..=1.0, got {threshold}"
        )));
    }
    if config.changes.extension.trim_start_matches('.').is_empty() {
        return Err(LabdocError::config("changes.extension must not be empty"));
    }
    let placeholder = &config.filters.banner_placeholder;
    if placeholder.is_empty() || placeholder.chars().any(char::is_whitespace) {
        return Err(LabdocError::config(
            "filters.banner_placeholder must be a single word",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_ref"));
        assert!(toml_str.contains("PREVIEW_CHANGED_FILES"));
        assert!(toml_str.contains("page-break"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, config);
        assert_eq!(parsed.changes.base_ref, "main");
        assert_eq!(parsed.filters.banner_style, BannerStyle::Placeholder);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[changes]
base_ref = "develop"

[filters]
chain = ["preview-banner"]
banner_style = "html"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.changes.base_ref, "develop");
        assert_eq!(config.changes.extension, "qmd");
        assert_eq!(config.filters.chain, vec![FilterKind::PreviewBanner]);
        assert_eq!(config.filters.banner_style, BannerStyle::Html);
        assert_eq!(config.preview.publish_branch, "gh-pages");
    }

    #[test]
    fn filter_kind_parses_names() {
        assert_eq!("page-break".parse::<FilterKind>().unwrap(), FilterKind::PageBreak);
        assert_eq!(" git-info ".parse::<FilterKind>().unwrap(), FilterKind::GitInfo);
        assert!("page_break".parse::<FilterKind>().is_err());
    }

    #[test]
    fn publish_ref_joins_remote() {
        let mut preview = PreviewConfig::default();
        assert_eq!(preview.publish_ref(), "origin/gh-pages");
        preview.publish_remote.clear();
        assert_eq!(preview.publish_ref(), "gh-pages");
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let mut config = AppConfig::default();
        config.preview.similarity_threshold = 1.5;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn empty_banner_placeholder_is_rejected() {
        let mut config = AppConfig::default();
        config.filters.banner_placeholder.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("banner_placeholder"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(Some(&dir.path().join("absent.toml"))).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn init_writes_loadable_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);

        init_config(&path).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded, AppConfig::default());

        assert!(init_config(&path).is_err());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[changes\nbase_ref = 1").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, LabdocError::Config { .. }));
    }
}
