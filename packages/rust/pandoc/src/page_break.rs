//! Page break before every chapter heading except the first.

use labdoc_shared::OutputFormat;

use crate::ast::{Block, Pandoc};
use crate::transform::{Filter, FilterContext};

/// Inserts a format-specific page break before each top-level heading after the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageBreakFilter;

impl Filter for PageBreakFilter {
    fn name(&self) -> &'static str {
        "page-break"
    }

    fn apply(&self, mut doc: Pandoc, ctx: &FilterContext) -> Pandoc {
        let Some(marker) = page_break_marker(&ctx.format) else {
            return doc;
        };
        let mut seen_first = false;
        doc.blocks = insert_page_breaks(doc.blocks, &marker, &mut seen_first);
        doc
    }
}

/// The raw block that forces a page break in `format`, if it has one.
pub fn page_break_marker(format: &OutputFormat) -> Option<Block> {
    match format {
        OutputFormat::Latex => Some(Block::raw("latex", "\\newpage")),
        OutputFormat::Docx => Some(Block::raw(
            "openxml",
            r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#,
        )),
        OutputFormat::Html => Some(Block::raw(
            "html",
            r#"<div style="page-break-before: always;"></div>"#,
        )),
        OutputFormat::Other(_) => None,
    }
}

/// Insert `marker` before every level-1 heading once `seen_first` is set.
///
/// `seen_first` is the traversal's only state: pass a fresh `false` per
/// document. Section divs are searched so `--section-divs` output is covered.
/// A heading already preceded by `marker` is left alone.
pub fn insert_page_breaks(blocks: Vec<Block>, marker: &Block, seen_first: &mut bool) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            Block::Header(1, _, _) => {
                if *seen_first && out.last() != Some(marker) {
                    out.push(marker.clone());
                }
                *seen_first = true;
                out.push(block);
            }
            Block::Div(attr, inner) => {
                out.push(Block::Div(attr, insert_page_breaks(inner, marker, seen_first)));
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Attr, Inline};

    fn h(level: i64, text: &str) -> Block {
        Block::Header(level, Attr::default(), Inline::words(text))
    }

    fn p(text: &str) -> Block {
        Block::Para(Inline::words(text))
    }

    fn chapters() -> Pandoc {
        Pandoc::new(vec![
            h(1, "Culture"),
            p("intro"),
            h(2, "Conduct"),
            h(1, "Style"),
            p("body"),
            h(1, "Git"),
        ])
    }

    fn run(doc: Pandoc, format: OutputFormat) -> Pandoc {
        PageBreakFilter.apply(doc, &FilterContext::new(format))
    }

    #[test]
    fn breaks_before_every_chapter_but_the_first() {
        let out = run(chapters(), OutputFormat::Latex);
        let brk = Block::raw("latex", "\\newpage");
        assert_eq!(
            out.blocks,
            vec![
                h(1, "Culture"),
                p("intro"),
                h(2, "Conduct"),
                brk.clone(),
                h(1, "Style"),
                p("body"),
                brk,
                h(1, "Git"),
            ]
        );
    }

    #[test]
    fn docx_uses_openxml_break() {
        let out = run(chapters(), OutputFormat::Docx);
        let breaks = out
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::RawBlock(f, t) if f == "openxml" && t.contains("w:type=\"page\"")))
            .count();
        assert_eq!(breaks, 2);
    }

    #[test]
    fn first_chapter_never_gets_a_break() {
        for format in [OutputFormat::Latex, OutputFormat::Docx, OutputFormat::Html] {
            let out = run(chapters(), format);
            assert_eq!(out.blocks[0], h(1, "Culture"));
        }
    }

    #[test]
    fn unknown_format_passes_through() {
        let doc = chapters();
        let out = run(doc.clone(), OutputFormat::parse("epub"));
        assert_eq!(out, doc);
    }

    #[test]
    fn second_run_changes_nothing() {
        for format in [OutputFormat::Latex, OutputFormat::Docx, OutputFormat::Html] {
            let once = run(chapters(), format.clone());
            let twice = run(once.clone(), format);
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn state_does_not_leak_between_documents() {
        let first = run(chapters(), OutputFormat::Latex);
        let second = run(Pandoc::new(vec![h(1, "Only")]), OutputFormat::Latex);
        assert_eq!(first.blocks.len(), 8);
        assert_eq!(second.blocks, vec![h(1, "Only")]);
    }

    #[test]
    fn headings_inside_section_divs() {
        let section = |id: &str, title: &str| {
            Block::Div(Attr(id.into(), vec!["section".into()], vec![]), vec![h(1, title), p("x")])
        };
        let doc = Pandoc::new(vec![section("one", "One"), section("two", "Two")]);
        let out = run(doc, OutputFormat::Latex);

        let Block::Div(_, first) = &out.blocks[0] else { panic!("expected div") };
        let Block::Div(_, second) = &out.blocks[1] else { panic!("expected div") };
        assert_eq!(first[0], h(1, "One"));
        assert_eq!(second[0], Block::raw("latex", "\\newpage"));
        assert_eq!(second[1], h(1, "Two"));
    }

    #[test]
    fn lower_level_headings_are_ignored() {
        let doc = Pandoc::new(vec![h(2, "a"), h(2, "b"), h(3, "c")]);
        let out = run(doc.clone(), OutputFormat::Html);
        assert_eq!(out, doc);
    }
}
