//! The [`Filter`] trait and the ordered chain the renderer runs per document.

use tracing::{debug, instrument};

use labdoc_git::GitSource;
use labdoc_shared::{FilterKind, FiltersConfig, OutputFormat};

use crate::ast::Pandoc;
use crate::banner::PreviewBannerFilter;
use crate::git_info::GitInfoFilter;
use crate::page_break::PageBreakFilter;

/// Per-document context handed to every filter.
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Output format the renderer is producing.
    pub format: OutputFormat,
}

impl FilterContext {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

/// A total transformation of one document.
///
/// Filters hold configuration only; any traversal state lives inside
/// [`Filter::apply`] and is dropped with it.
pub trait Filter {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Transform `doc` for `ctx`. Must not fail; unsupported input passes through.
    fn apply(&self, doc: Pandoc, ctx: &FilterContext) -> Pandoc;
}

/// Filters applied in order.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Build the configured chain. `git` backs the version appendix;
    /// `ci_branch` names the branch when the checkout is detached.
    pub fn from_config(
        config: &FiltersConfig,
        git: impl GitSource + Clone + 'static,
        ci_branch: Option<String>,
    ) -> Self {
        let mut chain = Self::new();
        for kind in &config.chain {
            match kind {
                FilterKind::PageBreak => chain.push(PageBreakFilter),
                FilterKind::GitInfo => chain.push(
                    GitInfoFilter::new(OutputFormat::parse(&config.git_info_format), git.clone())
                        .with_ci_branch(ci_branch.clone()),
                ),
                FilterKind::PreviewBanner => chain.push(PreviewBannerFilter::from_config(config)),
            };
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of the filters, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every filter over `doc` in order.
    #[instrument(skip_all, fields(format = %ctx.format, filters = self.filters.len()))]
    pub fn run(&self, doc: Pandoc, ctx: &FilterContext) -> Pandoc {
        self.filters.iter().fold(doc, |doc, filter| {
            let before = doc.blocks.len();
            let doc = filter.apply(doc, ctx);
            debug!(
                filter = filter.name(),
                blocks_before = before,
                blocks_after = doc.blocks.len(),
                "filter applied"
            );
            doc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Inline};
    use labdoc_shared::{LabdocError, Result};

    #[derive(Clone)]
    struct NoGit;

    impl GitSource for NoGit {
        fn output(&self, _args: &[&str]) -> Result<Vec<u8>> {
            Err(LabdocError::git("git unavailable"))
        }
    }

    struct Append(&'static str);

    impl Filter for Append {
        fn name(&self) -> &'static str {
            "append"
        }

        fn apply(&self, mut doc: Pandoc, _ctx: &FilterContext) -> Pandoc {
            doc.blocks.push(Block::Para(vec![Inline::Str(self.0.into())]));
            doc
        }
    }

    #[test]
    fn runs_filters_in_order() {
        let mut chain = FilterChain::new();
        chain.push(Append("first")).push(Append("second"));

        let doc = chain.run(Pandoc::new(vec![]), &FilterContext::new(OutputFormat::Html));
        assert_eq!(
            doc.blocks,
            vec![
                Block::Para(vec![Inline::Str("first".into())]),
                Block::Para(vec![Inline::Str("second".into())]),
            ]
        );
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        let doc = Pandoc::new(vec![Block::HorizontalRule]);
        let out = chain.run(doc.clone(), &FilterContext::new(OutputFormat::Latex));
        assert_eq!(out, doc);
    }

    #[test]
    fn config_chain_follows_listed_order() {
        let config = FiltersConfig {
            chain: vec![FilterKind::PreviewBanner, FilterKind::PageBreak],
            ..FiltersConfig::default()
        };
        let chain = FilterChain::from_config(&config, NoGit, None);
        assert_eq!(chain.names(), vec!["preview-banner", "page-break"]);

        let default_chain = FilterChain::from_config(&FiltersConfig::default(), NoGit, None);
        assert_eq!(default_chain.len(), 3);
    }
}
