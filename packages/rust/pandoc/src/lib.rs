//! Pandoc JSON filters for the manual's render pipeline.
//!
//! The renderer calls the filter once per document with the output format;
//! the configured [`FilterChain`] then runs, in order:
//!
//! - [`PageBreakFilter`]: page break before every chapter but the first
//! - [`GitInfoFilter`]: version appendix for the archival format
//! - [`PreviewBannerFilter`]: banner on pages changed in a preview build

pub mod ast;
mod banner;
pub mod driver;
pub mod git_info;
mod page_break;
pub mod transform;

pub use ast::{Attr, Block, Inline, MetaValue, Pandoc, stringify};
pub use banner::PreviewBannerFilter;
pub use driver::{filter_json, run_filter, run_stdio_filter};
pub use git_info::{GitInfo, GitInfoFilter, UNKNOWN, ci_branch_from_env};
pub use page_break::{PageBreakFilter, insert_page_breaks, page_break_marker};
pub use transform::{Filter, FilterChain, FilterContext};
