//! Core domain types shared by the detector, the filters and the preview tools.

use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Documentation sources modified between two revisions, in diff order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Repository-relative paths.
    pub files: Vec<String>,
}

impl ChangeSet {
    pub fn new(files: Vec<String>) -> Self {
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Chapter ids in the same order as [`ChangeSet::files`].
    pub fn chapter_ids(&self) -> Vec<String> {
        self.files.iter().filter_map(|f| chapter_id(f)).collect()
    }

    /// Parse a newline-separated list, as exported to the environment.
    /// Blank lines and surrounding whitespace are ignored.
    pub fn from_lines(text: &str) -> Self {
        Self {
            files: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Newline-joined list, without a trailing newline.
    pub fn to_lines(&self) -> String {
        self.files.join("\n")
    }
}

/// Chapter id for a source path: the path without its extension, with `/`
/// separators (`chapters/01-intro.qmd` → `chapters/01-intro`). The rendered
/// page is `<id>.html` relative to the site root.
pub fn chapter_id(path: &str) -> Option<String> {
    let path = Path::new(path.trim().trim_start_matches("./"));
    path.file_stem()?;
    let id = path.with_extension("").to_string_lossy().replace('\\', "/");
    (!id.is_empty()).then_some(id)
}

// ---------------------------------------------------------------------------
// ChangedChapters
// ---------------------------------------------------------------------------

/// File name of the changed-chapters manifest inside the HTML directory.
pub const CHANGED_CHAPTERS_FILE: &str = "changed-chapters.json";

/// Root structure of `changed-chapters.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedChapters {
    #[serde(default)]
    pub changed_chapters: Vec<String>,
}

impl From<&ChangeSet> for ChangedChapters {
    fn from(set: &ChangeSet) -> Self {
        Self {
            changed_chapters: set.chapter_ids(),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Renderer output format, as passed to a pandoc filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Latex,
    Docx,
    Html,
    /// Any format the filters do not special-case.
    Other(String),
}

impl OutputFormat {
    /// Map a pandoc format tag (e.g. `html5`, `latex`) to a known format.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        // pandoc may pass extensions along, e.g. `html5+smart`
        let base = tag.split(['+', '-']).next().unwrap_or_default();
        match base {
            "latex" | "pdf" | "beamer" => Self::Latex,
            "docx" => Self::Docx,
            "html" | "html4" | "html5" => Self::Html,
            _ => Self::Other(tag),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Latex => "latex",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_set_lines_roundtrip_ignores_blanks() {
        let set = ChangeSet::from_lines("  01-intro.qmd\n\n02-style.qmd  \n");
        assert_eq!(set.files, vec!["01-intro.qmd", "02-style.qmd"]);
        assert_eq!(set.to_lines(), "01-intro.qmd\n02-style.qmd");
        assert!(ChangeSet::from_lines("\n \n").is_empty());
    }

    #[test]
    fn chapter_ids_keep_directories() {
        let set = ChangeSet::new(vec![
            "chapters/01-culture-and-conduct.qmd".into(),
            "index.qmd".into(),
            "./appendix/tools.v2.qmd".into(),
        ]);
        assert_eq!(
            set.chapter_ids(),
            vec!["chapters/01-culture-and-conduct", "index", "appendix/tools.v2"]
        );
        assert_eq!(chapter_id(""), None);
    }

    #[test]
    fn changed_chapters_json_shape() {
        let set = ChangeSet::new(vec!["05-git.qmd".into()]);
        let json = serde_json::to_string(&ChangedChapters::from(&set)).expect("serialize");
        assert_eq!(json, r#"{"changed_chapters":["05-git"]}"#);

        let parsed: ChangedChapters = serde_json::from_str("{}").expect("deserialize");
        assert!(parsed.changed_chapters.is_empty());
    }

    #[test]
    fn output_format_recognizes_pandoc_tags() {
        assert_eq!(OutputFormat::parse("latex"), OutputFormat::Latex);
        assert_eq!(OutputFormat::parse("beamer"), OutputFormat::Latex);
        assert_eq!(OutputFormat::parse("DOCX"), OutputFormat::Docx);
        assert_eq!(OutputFormat::parse("html5+smart"), OutputFormat::Html);
        assert_eq!(
            OutputFormat::parse("markdown"),
            OutputFormat::Other("markdown".into())
        );
        assert_eq!(OutputFormat::parse("epub").to_string(), "epub");
    }
}
