//! Serde model of pandoc's JSON AST.
//!
//! Mirrors `Text.Pandoc.Definition` as serialized by `pandoc -t json`: every
//! node is an object with a `t` tag and (except for nullary nodes) a `c`
//! payload. Tables, figures and citations are carried as opaque JSON so
//! documents survive a parse/serialize cycle unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pandoc {
    #[serde(rename = "pandoc-api-version")]
    pub api_version: Vec<u32>,
    #[serde(default)]
    pub meta: BTreeMap<String, MetaValue>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Pandoc {
    /// An empty document for the given blocks, tagged with API version 1.23.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            api_version: vec![1, 23, 1],
            meta: BTreeMap::new(),
            blocks,
        }
    }

    /// Whether metadata field `key` is present and truthy.
    pub fn meta_flag(&self, key: &str) -> bool {
        self.meta.get(key).is_some_and(MetaValue::is_truthy)
    }
}

/// `(identifier, classes, key/value attributes)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attr(pub String, pub Vec<String>, pub Vec<(String, String)>);

impl Attr {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self(id.into(), Vec::new(), Vec::new())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn classes(&self) -> &[String] {
        &self.1
    }
}

/// `(url, title)`.
pub type Target = (String, String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Block {
    Plain(Vec<Inline>),
    Para(Vec<Inline>),
    LineBlock(Vec<Vec<Inline>>),
    CodeBlock(Attr, String),
    RawBlock(String, String),
    BlockQuote(Vec<Block>),
    /// List attributes are `(start, style, delimiter)`.
    OrderedList((i64, Value, Value), Vec<Vec<Block>>),
    BulletList(Vec<Vec<Block>>),
    DefinitionList(Vec<(Vec<Inline>, Vec<Vec<Block>>)>),
    Header(i64, Attr, Vec<Inline>),
    HorizontalRule,
    Table(Value),
    Figure(Value),
    Div(Attr, Vec<Block>),
}

impl Block {
    /// A raw block passed through verbatim to `format`.
    pub fn raw(format: impl Into<String>, text: impl Into<String>) -> Self {
        Self::RawBlock(format.into(), text.into())
    }

    /// The level of a heading, `None` for any other block.
    pub fn header_level(&self) -> Option<i64> {
        match self {
            Self::Header(level, _, _) => Some(*level),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum QuoteType {
    SingleQuote,
    DoubleQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum MathType {
    DisplayMath,
    InlineMath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Inline {
    Str(String),
    Emph(Vec<Inline>),
    Underline(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikeout(Vec<Inline>),
    Superscript(Vec<Inline>),
    Subscript(Vec<Inline>),
    SmallCaps(Vec<Inline>),
    Quoted(QuoteType, Vec<Inline>),
    Cite(Value),
    Code(Attr, String),
    Space,
    SoftBreak,
    LineBreak,
    Math(MathType, String),
    RawInline(String, String),
    Link(Attr, Vec<Inline>, Target),
    Image(Attr, Vec<Inline>, Target),
    Note(Vec<Block>),
    Span(Attr, Vec<Inline>),
}

impl Inline {
    /// Split `text` on whitespace into `Str`/`Space` runs, as pandoc's reader does.
    pub fn words(text: &str) -> Vec<Inline> {
        let mut out = Vec::new();
        for word in text.split_whitespace() {
            if !out.is_empty() {
                out.push(Inline::Space);
            }
            out.push(Inline::Str(word.to_string()));
        }
        out
    }
}

/// Plain-text rendering of inlines, dropping formatting.
pub fn stringify(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_inlines(&mut out, inlines);
    out
}

fn push_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Str(s) | Inline::Code(_, s) | Inline::Math(_, s) => out.push_str(s),
            Inline::Space | Inline::SoftBreak | Inline::LineBreak => out.push(' '),
            Inline::Emph(xs)
            | Inline::Underline(xs)
            | Inline::Strong(xs)
            | Inline::Strikeout(xs)
            | Inline::Superscript(xs)
            | Inline::Subscript(xs)
            | Inline::SmallCaps(xs)
            | Inline::Span(_, xs)
            | Inline::Link(_, xs, _)
            | Inline::Image(_, xs, _) => push_inlines(out, xs),
            Inline::Quoted(kind, xs) => {
                let mark = match kind {
                    QuoteType::SingleQuote => '\'',
                    QuoteType::DoubleQuote => '"',
                };
                out.push(mark);
                push_inlines(out, xs);
                out.push(mark);
            }
            Inline::Cite(_) | Inline::RawInline(_, _) | Inline::Note(_) => {}
        }
    }
}

/// A metadata value from the document's front matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum MetaValue {
    MetaMap(BTreeMap<String, MetaValue>),
    MetaList(Vec<MetaValue>),
    MetaBool(bool),
    MetaString(String),
    MetaInlines(Vec<Inline>),
    MetaBlocks(Vec<Block>),
}

impl MetaValue {
    /// Truthiness of a front-matter flag.
    ///
    /// Booleans are themselves; text is true unless it reads as empty,
    /// `false`, `no`, `off` or `0`; collections are true when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::MetaBool(b) => *b,
            Self::MetaString(s) => truthy_text(s),
            Self::MetaInlines(xs) => truthy_text(&stringify(xs)),
            Self::MetaMap(m) => !m.is_empty(),
            Self::MetaList(xs) => !xs.is_empty(),
            Self::MetaBlocks(xs) => !xs.is_empty(),
        }
    }
}

fn truthy_text(text: &str) -> bool {
    let text = text.trim();
    !(text.is_empty()
        || ["false", "no", "off", "0"]
            .iter()
            .any(|f| text.eq_ignore_ascii_case(f)))
}
