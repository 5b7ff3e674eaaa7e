//! Version appendix: which commit a rendered document was built from.

use chrono::DateTime;
use tracing::{debug, warn};

use labdoc_git::GitSource;
use labdoc_shared::OutputFormat;

use crate::ast::{Attr, Block, Inline, Pandoc};
use crate::transform::{Filter, FilterContext};

/// Placeholder for any value git could not provide.
pub const UNKNOWN: &str = "unknown";

const SECTION_ID: &str = "version-information";
const SECTION_TITLE: &str = "Version Information";
const SECTION_INTRO: &str =
    "This document was generated from the following version of the source repository.";

/// Repository state at render time. Fields hold [`UNKNOWN`] when unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInfo {
    pub branch: String,
    pub short_hash: String,
    pub full_hash: String,
    pub commit_date: String,
}

impl GitInfo {
    /// Query `git`, substituting [`UNKNOWN`] for anything that fails.
    pub fn collect(git: &dyn GitSource, ci_branch: Option<&str>) -> Self {
        let branch = resolve_branch(query(git, &["rev-parse", "--abbrev-ref", "HEAD"]), ci_branch);
        let commit_date = query(git, &["log", "-1", "--format=%cI"]);
        Self {
            branch,
            short_hash: query(git, &["rev-parse", "--short", "HEAD"]),
            full_hash: query(git, &["rev-parse", "HEAD"]),
            commit_date: format_commit_date(&commit_date),
        }
    }

    /// Heading, explanatory paragraph and bullet list describing this commit.
    pub fn to_blocks(&self) -> Vec<Block> {
        let item = |label: &str, value: Inline| {
            let mut inlines = vec![Inline::Strong(Inline::words(label)), Inline::Space];
            inlines.push(value);
            vec![Block::Plain(inlines)]
        };
        let code = |text: &str| Inline::Code(Attr::default(), text.to_string());

        vec![
            Block::Header(
                1,
                Attr(SECTION_ID.into(), vec!["unnumbered".into()], vec![]),
                Inline::words(SECTION_TITLE),
            ),
            Block::Para(Inline::words(SECTION_INTRO)),
            Block::BulletList(vec![
                item("Branch:", code(&self.branch)),
                item("Commit:", code(&self.short_hash)),
                item("Full commit hash:", code(&self.full_hash)),
                item("Commit date:", Inline::Str(self.commit_date.clone())),
            ]),
        ]
    }
}

fn query(git: &dyn GitSource, args: &[&str]) -> String {
    match git.text(args) {
        Ok(value) if !value.is_empty() => value,
        Ok(_) => {
            debug!(?args, "git returned nothing");
            UNKNOWN.to_string()
        }
        Err(e) => {
            debug!(?args, error = %e, "git query failed");
            UNKNOWN.to_string()
        }
    }
}

/// A detached checkout reports its branch as `HEAD`; prefer the CI branch then.
pub fn resolve_branch(raw: String, ci_branch: Option<&str>) -> String {
    let ci = ci_branch.map(str::trim).filter(|b| !b.is_empty());
    match (raw.as_str(), ci) {
        ("HEAD" | UNKNOWN, Some(ci)) => ci.to_string(),
        ("HEAD", None) => UNKNOWN.to_string(),
        _ => raw,
    }
}

/// Branch name exported by GitHub Actions, if any.
pub fn ci_branch_from_env() -> Option<String> {
    ["GITHUB_HEAD_REF", "GITHUB_REF_NAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
}

/// Reformat an ISO 8601 commit date as `YYYY-MM-DD HH:MM:SS ±ZZZZ`.
/// Anything unparseable is returned unchanged.
pub fn format_commit_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(date) => date.format("%Y-%m-%d %H:%M:%S %z").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Appends [`GitInfo`] to documents rendered in one target format.
pub struct GitInfoFilter {
    target: OutputFormat,
    git: Box<dyn GitSource>,
    ci_branch: Option<String>,
}

impl GitInfoFilter {
    pub fn new(target: OutputFormat, git: impl GitSource + 'static) -> Self {
        Self {
            target,
            git: Box::new(git),
            ci_branch: None,
        }
    }

    pub fn with_ci_branch(mut self, branch: Option<String>) -> Self {
        self.ci_branch = branch;
        self
    }
}

impl Filter for GitInfoFilter {
    fn name(&self) -> &'static str {
        "git-info"
    }

    fn apply(&self, mut doc: Pandoc, ctx: &FilterContext) -> Pandoc {
        if ctx.format != self.target {
            return doc;
        }

        let info = GitInfo::collect(self.git.as_ref(), self.ci_branch.as_deref());
        if info.full_hash == UNKNOWN {
            warn!("commit hash unavailable, appending placeholder version information");
        }
        doc.blocks.extend(info.to_blocks());
        doc
    }
}
