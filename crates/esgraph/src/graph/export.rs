use serde::{Deserialize, Serialize};

use super::{Name, Position, RawPath};

/// Kind of a declaration exported with `export <declaration>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationKind {
    Const,
    Let,
    Var,
    Using,
    DestructuringConst,
    DestructuringLet,
    DestructuringVar,
    Function,
    AsyncFunction,
    GeneratorFunction,
    AsyncGeneratorFunction,
    Class,
    AbstractClass,
    Enum,
    ConstEnum,
    Namespace,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Const => "const",
            DeclarationKind::Let => "let",
            DeclarationKind::Var => "var",
            DeclarationKind::Using => "using",
            DeclarationKind::DestructuringConst => "destructuring-const",
            DeclarationKind::DestructuringLet => "destructuring-let",
            DeclarationKind::DestructuringVar => "destructuring-var",
            DeclarationKind::Function => "function",
            DeclarationKind::AsyncFunction => "async-function",
            DeclarationKind::GeneratorFunction => "generator-function",
            DeclarationKind::AsyncGeneratorFunction => "async-generator-function",
            DeclarationKind::Class => "class",
            DeclarationKind::AbstractClass => "abstract-class",
            DeclarationKind::Enum => "enum",
            DeclarationKind::ConstEnum => "const-enum",
            DeclarationKind::Namespace => "namespace",
        }
    }
}

/// One entry of a module's export map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Export {
    /// `export const x = 1`, `export function f() {}`, ...
    Declaration {
        declaration: DeclarationKind,
        position: Position,
    },
    /// `export {local as name}`
    Name {
        #[serde(skip_serializing_if = "Option::is_none")]
        by: Option<Name>,
        position: Position,
    },
    /// `export {by as name} from '...'` or `export * as name from '...'`
    Reexport {
        from: RawPath,
        #[serde(skip_serializing_if = "Option::is_none")]
        by: Option<Name>,
        namespace: bool,
        position: Position,
    },
}

impl Export {
    pub fn position(&self) -> Position {
        match self {
            Export::Declaration { position, .. }
            | Export::Name { position, .. }
            | Export::Reexport { position, .. } => *position,
        }
    }

    /// Raw path this export forwards from, if it is a re-export.
    pub fn reexported_from(&self) -> Option<&str> {
        match self {
            Export::Reexport { from, .. } => Some(from),
            _ => None,
        }
    }
}

/// The default export of a module.
///
/// `from` is set when the default is re-exported; `namespace` marks
/// `export * as default from '...'`; `by` names the binding behind the
/// default when it is not an anonymous expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultExport {
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<Name>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<RawPath>,
    #[serde(default)]
    pub namespace: bool,
}

impl DefaultExport {
    pub fn local(position: Position, by: Option<Name>) -> Self {
        Self {
            position,
            by,
            from: None,
            namespace: false,
        }
    }
}
