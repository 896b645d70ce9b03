//! Raw import/export facts and the parser seam.
//!
//! A [`SourceParser`] turns module text into [`ImportsExports`]: a flat,
//! source-ordered list of statements that matter to the graph. The merge
//! step folds these into a [`Module`](crate::graph::Module).

mod oxc;

pub use oxc::OxcParser;

use serde::{Deserialize, Serialize};

use crate::graph::{DeclarationKind, Name, Position, RawPath};

/// Byte range of a statement or expression in the parsed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Source text covered by the span, empty if out of bounds.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or_default()
    }
}

/// `name as alias` inside import or export braces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specifier {
    /// The name on the left of `as`.
    pub name: Name,
    /// The name on the right of `as`, if present and different.
    pub alias: Option<Name>,
}

impl Specifier {
    pub fn new(name: impl Into<Name>, alias: Option<Name>) -> Self {
        let name = name.into();
        let alias = alias.filter(|alias| *alias != name);
        Self { name, alias }
    }

    /// The name visible after the statement: the alias if any.
    pub fn visible(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// One statement relevant to the module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Fact {
    /// `import d, {a as b} from 'x'` or `import 'x'`.
    NamedImport {
        from: RawPath,
        span: Span,
        default: Option<Name>,
        names: Vec<Specifier>,
    },
    /// `import d, * as ns from 'x'`
    NamespaceImport {
        from: RawPath,
        span: Span,
        default: Option<Name>,
        namespace: Name,
    },
    /// `import('x')`
    DynamicImport { from: RawPath, span: Span },
    /// `require('x')`
    Require { from: RawPath, span: Span },
    /// `export {a as b}`; `alias` is the exported name.
    NamedExport { span: Span, names: Vec<Specifier> },
    /// `export const a = 1`, `export class A {}`, ...
    DeclarationExport {
        span: Span,
        declaration: DeclarationKind,
        /// `declare` declarations only exist for the type checker.
        ambient: bool,
        names: Vec<Name>,
    },
    /// `export default <expression or declaration>`
    DefaultExport { span: Span },
    /// `export {a as b} from 'x'`; `alias` is the exported name.
    NamedReexport {
        from: RawPath,
        span: Span,
        names: Vec<Specifier>,
    },
    /// `export * as ns from 'x'`
    NamespaceReexport {
        from: RawPath,
        span: Span,
        namespace: Name,
    },
    /// `export * from 'x'`
    StarReexport { from: RawPath, span: Span },
}

impl Fact {
    pub fn span(&self) -> Span {
        match self {
            Fact::NamedImport { span, .. }
            | Fact::NamespaceImport { span, .. }
            | Fact::DynamicImport { span, .. }
            | Fact::Require { span, .. }
            | Fact::NamedExport { span, .. }
            | Fact::DeclarationExport { span, .. }
            | Fact::DefaultExport { span, .. }
            | Fact::NamedReexport { span, .. }
            | Fact::NamespaceReexport { span, .. }
            | Fact::StarReexport { span, .. } => *span,
        }
    }
}

/// A syntax error reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub position: Position,
    pub message: String,
}

/// Everything the graph needs to know about one module's source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportsExports {
    /// Facts ordered by source position.
    pub facts: Vec<Fact>,
    pub errors: Vec<ParseError>,
}

impl ImportsExports {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.errors.is_empty()
    }
}

/// Options forwarded to the parser for every module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Collect `import('x')` with a static string as a namespace import.
    pub include_dynamic_imports: bool,
    /// Collect `require('x')` with a static string as a namespace import.
    pub include_requires: bool,
}

/// Turns module source into raw import/export facts.
pub trait SourceParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, path: &str, source: &str, options: ParseOptions) -> ImportsExports;
}
