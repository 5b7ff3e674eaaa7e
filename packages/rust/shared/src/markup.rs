//! HTML snippets injected into rendered preview pages.

/// CSS class of the per-page "changed in this preview" banner.
pub const CHANGED_BANNER_CLASS: &str = "preview-changed-banner";

/// CSS class of the home-page list of changed chapters.
pub const HOME_BANNER_CLASS: &str = "preview-home-changes-banner";

/// CSS class of the "content changed" notice.
pub const CONTENT_NOTICE_CLASS: &str = "preview-content-changed-notice";

/// Banner shown at the top of a page whose source changed in the preview.
pub fn changed_page_banner() -> String {
    format!(
        r#"<div class="{CHANGED_BANNER_CLASS}" style="background-color: #fff3cd; border-left: 4px solid #ffc107; padding: 12px 16px; margin-bottom: 20px; border-radius: 4px;">
<p style="margin: 0;"><strong>📝 Preview:</strong> This page has been modified in this pull request.</p>
</div>"#
    )
}

/// Escape text for use in HTML element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_is_a_single_div() {
        let banner = changed_page_banner();
        assert!(banner.starts_with(r#"<div class="preview-changed-banner""#));
        assert_eq!(banner.matches("<div").count(), 1);
        assert!(banner.ends_with("</div>"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"Tips & "tricks" <b>"#),
            "Tips &amp; &quot;tricks&quot; &lt;b&gt;"
        );
    }
}
