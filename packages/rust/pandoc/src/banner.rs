//! Preview banner on documents flagged as changed.

use labdoc_shared::{BannerStyle, FiltersConfig, OutputFormat, markup};

use crate::ast::{Block, Inline, Pandoc};
use crate::transform::{Filter, FilterContext};

/// Prepends the banner (or its placeholder) to changed documents rendered as HTML.
#[derive(Debug, Clone)]
pub struct PreviewBannerFilter {
    changed_key: String,
    style: BannerStyle,
    placeholder: String,
}

impl PreviewBannerFilter {
    pub fn new(changed_key: impl Into<String>, style: BannerStyle, placeholder: impl Into<String>) -> Self {
        Self {
            changed_key: changed_key.into(),
            style,
            placeholder: placeholder.into(),
        }
    }

    pub fn from_config(config: &FiltersConfig) -> Self {
        Self::new(
            config.changed_key.clone(),
            config.banner_style,
            config.banner_placeholder.clone(),
        )
    }

    fn banner_block(&self) -> Block {
        match self.style {
            BannerStyle::Html => Block::raw("html", markup::changed_page_banner()),
            BannerStyle::Placeholder => Block::Para(vec![Inline::Str(self.placeholder.clone())]),
        }
    }
}

impl Filter for PreviewBannerFilter {
    fn name(&self) -> &'static str {
        "preview-banner"
    }

    fn apply(&self, mut doc: Pandoc, ctx: &FilterContext) -> Pandoc {
        if ctx.format != OutputFormat::Html || !doc.meta_flag(&self.changed_key) {
            return doc;
        }
        doc.blocks.insert(0, self.banner_block());
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MetaValue;

    fn changed_doc(flag: MetaValue) -> Pandoc {
        let mut doc = Pandoc::new(vec![Block::Para(Inline::words("content"))]);
        doc.meta.insert("preview-changed".into(), flag);
        doc
    }

    fn filter(style: BannerStyle) -> PreviewBannerFilter {
        PreviewBannerFilter::new("preview-changed", style, "LABDOC-PREVIEW-BANNER")
    }

    fn html() -> FilterContext {
        FilterContext::new(OutputFormat::Html)
    }

    #[test]
    fn prepends_placeholder_to_changed_html() {
        let out = filter(BannerStyle::Placeholder).apply(changed_doc(MetaValue::MetaBool(true)), &html());
        assert_eq!(
            out.blocks[0],
            Block::Para(vec![Inline::Str("LABDOC-PREVIEW-BANNER".into())])
        );
        assert_eq!(out.blocks.len(), 2);
    }

    #[test]
    fn html_style_prepends_raw_banner() {
        let out = filter(BannerStyle::Html).apply(changed_doc(MetaValue::MetaBool(true)), &html());
        match &out.blocks[0] {
            Block::RawBlock(format, text) => {
                assert_eq!(format, "html");
                assert!(text.contains(markup::CHANGED_BANNER_CLASS));
            }
            other => panic!("expected raw block, got {other:?}"),
        }
    }

    #[test]
    fn unchanged_documents_are_untouched() {
        let f = filter(BannerStyle::Placeholder);
        let unflagged = Pandoc::new(vec![Block::Para(Inline::words("content"))]);
        assert_eq!(f.apply(unflagged.clone(), &html()), unflagged);

        let falsy = changed_doc(MetaValue::MetaBool(false));
        assert_eq!(f.apply(falsy.clone(), &html()), falsy);
    }

    #[test]
    fn only_html_gets_a_banner() {
        let f = filter(BannerStyle::Html);
        let doc = changed_doc(MetaValue::MetaBool(true));
        for format in [OutputFormat::Latex, OutputFormat::Docx] {
            assert_eq!(f.apply(doc.clone(), &FilterContext::new(format)), doc);
        }
    }

    #[test]
    fn string_flag_counts() {
        let doc = changed_doc(MetaValue::MetaInlines(Inline::words("true")));
        let out = filter(BannerStyle::Placeholder).apply(doc, &html());
        assert_eq!(out.blocks.len(), 2);
    }
}
