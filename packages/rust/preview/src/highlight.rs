//! "Content changed" notices from comparing preview pages with the published site.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use similar::TextDiff;
use tracing::{debug, info, instrument, warn};

use labdoc_git::GitSource;
use labdoc_shared::markup::{CHANGED_BANNER_CLASS, CONTENT_NOTICE_CLASS};
use labdoc_shared::{LabdocError, Result};

use crate::home::insert_after_main;

/// Upper bound on a single page diff; past it the ratio is approximate.
const DIFF_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-run summary of [`highlight_changed_pages`].
#[derive(Debug, Default, PartialEq)]
pub struct HighlightReport {
    /// Pages that received a notice, with their similarity to the published page.
    pub annotated: Vec<(PathBuf, f64)>,
    /// Pages whose content is (nearly) the same as published.
    pub unchanged: Vec<PathBuf>,
    /// Pages with no published counterpart.
    pub new_pages: Vec<PathBuf>,
    /// Changed sources whose rendered page does not exist.
    pub missing: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Published site checkout
// ---------------------------------------------------------------------------

/// Materialize every `.html` file of `publish_ref` under `target`.
///
/// `target` is emptied first, so pages left by an earlier run never pass for
/// published ones. Returns `None` when the ref cannot be listed or holds no
/// HTML, which is normal before the first publish. Individual files that
/// cannot be read from git are skipped.
#[instrument(skip(git))]
pub fn checkout_published_html(
    git: &dyn GitSource,
    remote: &str,
    branch: &str,
    publish_ref: &str,
    target: &Path,
) -> Result<Option<PathBuf>> {
    if target.exists() {
        debug!("clearing previous checkout");
        std::fs::remove_dir_all(target).map_err(|e| LabdocError::io(target, e))?;
    }

    if !remote.is_empty() {
        if let Err(e) = git.fetch(remote, branch) {
            debug!(error = %e, "could not fetch published branch");
        }
    }

    let files = match git.list_tree(publish_ref) {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "could not list published site");
            return Ok(None);
        }
    };

    let pages: Vec<&String> = files.iter().filter(|f| is_html(Path::new(f))).collect();
    if pages.is_empty() {
        info!("published site has no HTML pages");
        return Ok(None);
    }

    for page in &pages {
        let bytes = match git.show_file(publish_ref, page) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(%page, error = %e, "skipping unreadable published page");
                continue;
            }
        };
        let out = target.join(page.as_str());
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LabdocError::io(parent, e))?;
        }
        std::fs::write(&out, bytes).map_err(|e| LabdocError::io(&out, e))?;
    }

    info!(pages = pages.len(), target = %target.display(), "published HTML checked out");
    Ok(Some(target.to_path_buf()))
}

fn is_html(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "html")
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// The page body: `<main>` content, else the first `content` div, else everything.
pub fn extract_main_content(html: &str) -> &str {
    static MAIN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<main[^>]*>(.*?)</main>").expect("valid regex"));
    static CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)<div[^>]*class="[^"]*content[^"]*"[^>]*>(.*?)</div>"#).expect("valid regex")
    });

    MAIN_RE
        .captures(html)
        .or_else(|| CONTENT_RE.captures(html))
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str())
}

/// Drop comments and collapse whitespace runs so formatting noise does not count.
pub fn normalize_html(html: &str) -> String {
    static COMMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let without_comments = COMMENT_RE.replace_all(html, "");
    WS_RE.replace_all(&without_comments, " ").trim().to_string()
}

/// Character-level similarity in `0.0..=1.0` (`2·matches / total length`).
pub fn similarity(old: &str, new: &str) -> f64 {
    if old == new {
        return 1.0;
    }
    let diff = TextDiff::configure()
        .timeout(DIFF_TIMEOUT)
        .diff_chars(old, new);
    f64::from(diff.ratio())
}

/// Similarity of two pages' bodies when it warrants a notice, i.e. the bodies
/// differ and the ratio is at or below `threshold`.
pub fn compare_pages(old_html: &str, new_html: &str, threshold: f64) -> Option<f64> {
    let old = normalize_html(extract_main_content(old_html));
    let new = normalize_html(extract_main_content(new_html));
    if old == new {
        return None;
    }
    let ratio = similarity(&old, &new);
    (ratio <= threshold).then_some(ratio)
}

/// Whole-percent share of content that changed.
pub fn change_percentage(similarity: f64) -> u32 {
    ((1.0 - similarity.clamp(0.0, 1.0)) * 100.0) as u32
}

/// Notice markup for a page with the given similarity.
pub fn content_notice(similarity: f64) -> String {
    format!(
        r#"
<div class="{CONTENT_NOTICE_CLASS}" style="background-color: #e7f3ff; border-left: 4px solid #2196F3; padding: 12px 16px; margin-bottom: 20px; border-radius: 4px; font-size: 14px;">
    <p style="margin: 0;"><strong>🔍 Content Changes:</strong> This page has been modified in this pull request (~{}% of content changed).</p>
</div>
"#,
        change_percentage(similarity)
    )
}

/// Insert the notice after the page's preview banner, else after `<main>`.
/// `None` when the page has neither.
pub fn inject_change_notice(html: &str, similarity: f64) -> Option<String> {
    static BANNER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(&format!(
            r#"(?s)<div class="{}"[^>]*>.*?</div>"#,
            regex::escape(CHANGED_BANNER_CLASS)
        ))
        .expect("valid regex")
    });

    let notice = content_notice(similarity);
    match BANNER_RE.find(html) {
        Some(banner) => {
            let at = banner.end();
            Some(format!("{}{notice}{}", &html[..at], &html[at..]))
        }
        None => insert_after_main(html, &notice),
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Annotate every rendered page in `pages` that differs enough from its
/// counterpart under `base_dir`. Paths in `pages` are relative to `html_dir`.
#[instrument(skip_all, fields(html_dir = %html_dir.display(), pages = pages.len()))]
pub fn highlight_changed_pages(
    html_dir: &Path,
    base_dir: Option<&Path>,
    pages: &[PathBuf],
    threshold: f64,
) -> Result<HighlightReport> {
    let mut report = HighlightReport::default();

    for rel in pages {
        let page = html_dir.join(rel);
        if !page.is_file() {
            debug!(page = %page.display(), "rendered page not found");
            report.missing.push(page);
            continue;
        }

        let published = base_dir
            .map(|dir| dir.join(rel))
            .filter(|p| p.is_file());
        let Some(published) = published else {
            info!(page = %page.display(), "no published version (page may be new)");
            report.new_pages.push(page);
            continue;
        };

        let new_html = std::fs::read_to_string(&page).map_err(|e| LabdocError::io(&page, e))?;
        let old_html =
            std::fs::read_to_string(&published).map_err(|e| LabdocError::io(&published, e))?;

        let Some(ratio) = compare_pages(&old_html, &new_html, threshold) else {
            debug!(page = %page.display(), "no significant content changes");
            report.unchanged.push(page);
            continue;
        };

        match inject_change_notice(&new_html, ratio) {
            Some(updated) => {
                std::fs::write(&page, updated).map_err(|e| LabdocError::io(&page, e))?;
                info!(page = %page.display(), similarity = ratio, "added content change notice");
                report.annotated.push((page, ratio));
            }
            None => {
                warn!(page = %page.display(), "no place to insert content change notice");
                report.unchanged.push(page);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn extracts_main_then_content_div() {
        assert_eq!(extract_main_content("<nav>n</nav><main id=\"m\">body</main>"), "body");
        assert_eq!(
            extract_main_content(r#"<div class="page-content wide">inner</div>"#),
            "inner"
        );
        assert_eq!(extract_main_content("<p>plain</p>"), "<p>plain</p>");
    }

    #[test]
    fn normalization_ignores_comments_and_spacing() {
        assert_eq!(
            normalize_html("<p>a  <!-- build 42 -->\n\n b</p>\n"),
            "<p>a b</p>"
        );
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("same", "same"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let r = similarity("abcd", "abxd");
        assert!((r - 0.75).abs() < 1e-6, "ratio was {r}");
    }

    #[test]
    fn cosmetic_changes_get_no_notice() {
        let old = "<main><p>Hello world</p><!-- a --></main>";
        let new = "<main>\n  <p>Hello world</p>\n<!-- b --></main>";
        assert_eq!(compare_pages(old, new, 0.95), None);
    }

    #[test]
    fn small_edits_under_threshold_get_no_notice() {
        let body = "x".repeat(200);
        let old = format!("<main>{body}a</main>");
        let new = format!("<main>{body}b</main>");
        assert_eq!(compare_pages(&old, &new, 0.95), None);
    }

    #[test]
    fn rewritten_page_gets_a_notice() {
        let ratio = compare_pages(
            "<main><p>The old chapter text.</p></main>",
            "<main><h2>New</h2><ul><li>entirely different</li></ul></main>",
            0.95,
        )
        .expect("notice expected");
        assert!(ratio < 0.95);
    }

    #[test]
    fn percentage_truncates() {
        assert_eq!(change_percentage(0.634), 36);
        assert_eq!(change_percentage(1.0), 0);
        assert_eq!(change_percentage(-0.2), 100);
    }

    #[test]
    fn notice_follows_preview_banner() {
        let html = r#"<main><div class="preview-changed-banner" style="x"><p>b</p></div><p>body</p></main>"#;
        let out = inject_change_notice(html, 0.5).unwrap();
        let banner_end = out.find("</div>").unwrap();
        let notice = out.find(CONTENT_NOTICE_CLASS).unwrap();
        assert!(notice > banner_end);
        assert!(out.contains("~50% of content changed"));
        assert!(notice < out.find("<p>body</p>").unwrap());
    }

    #[test]
    fn notice_falls_back_to_main() {
        let out = inject_change_notice("<main><p>body</p></main>", 0.2).unwrap();
        assert!(out.starts_with("<main>\n<div class=\"preview-content-changed-notice\""));
        assert_eq!(inject_change_notice("<p>no anchor</p>", 0.2), None);
    }

    struct PublishedSite(HashMap<String, String>);

    impl GitSource for PublishedSite {
        fn output(&self, args: &[&str]) -> Result<Vec<u8>> {
            self.0
                .get(&args.join(" "))
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| LabdocError::git("unknown revision"))
        }
    }

    #[test]
    fn checks_out_published_html() {
        let git = PublishedSite(HashMap::from([
            (
                "ls-tree -r --name-only -z origin/gh-pages".to_string(),
                "index.html\0site_libs/app.js\0chapters/01-intro.html\0".to_string(),
            ),
            ("show origin/gh-pages:index.html".to_string(), "<main>home</main>".to_string()),
            (
                "show origin/gh-pages:chapters/01-intro.html".to_string(),
                "<main>intro</main>".to_string(),
            ),
        ]));
        let dir = tempfile::tempdir().expect("tempdir");

        let out = checkout_published_html(&git, "origin", "gh-pages", "origin/gh-pages", dir.path())
            .expect("checkout")
            .expect("pages");
        assert_eq!(
            std::fs::read_to_string(out.join("chapters/01-intro.html")).unwrap(),
            "<main>intro</main>"
        );
        assert!(!out.join("site_libs/app.js").exists());
    }

    #[test]
    fn stale_pages_from_an_earlier_checkout_are_removed() {
        let git = PublishedSite(HashMap::from([
            (
                "ls-tree -r --name-only -z gh-pages".to_string(),
                "chapters/01-intro.html\0".to_string(),
            ),
            (
                "show gh-pages:chapters/01-intro.html".to_string(),
                "<main>intro</main>".to_string(),
            ),
        ]));
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("base-html");
        std::fs::create_dir_all(target.join("chapters")).unwrap();
        std::fs::write(target.join("chapters/09-retired.html"), "<main>old</main>").unwrap();

        let out = checkout_published_html(&git, "", "gh-pages", "gh-pages", &target)
            .expect("checkout")
            .expect("pages");
        assert!(out.join("chapters/01-intro.html").is_file());
        assert!(!out.join("chapters/09-retired.html").exists());
    }

    #[test]
    fn unpublished_site_yields_none() {
        let git = PublishedSite(HashMap::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let out = checkout_published_html(&git, "", "gh-pages", "gh-pages", dir.path()).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn annotates_changed_pages_only() {
        let site = tempfile::tempdir().expect("site");
        let base = tempfile::tempdir().expect("base");
        let write = |dir: &Path, name: &str, body: &str| {
            std::fs::write(dir.join(name), format!("<html><main>{body}</main></html>")).unwrap();
        };
        write(site.path(), "01-intro.html", "<p>Completely rewritten introduction chapter.</p>");
        write(base.path(), "01-intro.html", "<p>Old.</p>");
        write(site.path(), "02-style.html", "<p>Same</p>");
        write(base.path(), "02-style.html", "<p>Same</p>");
        write(site.path(), "03-new.html", "<p>Brand new</p>");

        let pages: Vec<PathBuf> = ["01-intro.html", "02-style.html", "03-new.html", "04-gone.html"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let report = highlight_changed_pages(site.path(), Some(base.path()), &pages, 0.95)
            .expect("highlight");

        assert_eq!(report.annotated.len(), 1);
        assert_eq!(report.annotated[0].0, site.path().join("01-intro.html"));
        assert_eq!(report.unchanged, vec![site.path().join("02-style.html")]);
        assert_eq!(report.new_pages, vec![site.path().join("03-new.html")]);
        assert_eq!(report.missing, vec![site.path().join("04-gone.html")]);

        let intro = std::fs::read_to_string(site.path().join("01-intro.html")).unwrap();
        assert!(intro.contains(CONTENT_NOTICE_CLASS));
    }
}
