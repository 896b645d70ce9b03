//! [`SourceParser`] backed by the oxc parser.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, CallExpression, Declaration,
    ExportAllDeclaration, ExportDefaultDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, Expression, ImportDeclaration, ImportDeclarationSpecifier,
    ImportExpression, ModuleDeclaration, ModuleExportName, VariableDeclarationKind,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::SourceType;

use super::{Fact, ImportsExports, ParseError, ParseOptions, SourceParser, Span, Specifier};
use crate::graph::{DeclarationKind, Name};

/// Parses ECMAScript/TypeScript modules with `oxc_parser`.
///
/// The source type is picked from the module extension; unknown extensions
/// are parsed as ES modules. Type-only imports and exports are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcParser;

impl OxcParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for OxcParser {
    fn parse(&self, path: &str, source: &str, options: ParseOptions) -> ImportsExports {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path).unwrap_or(SourceType::mjs());
        let parsed = Parser::new(&allocator, source, source_type).parse();

        let mut result = ImportsExports::default();

        for error in &parsed.errors {
            let offset = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map_or(0, |label| label.offset());
            result.errors.push(ParseError {
                position: u32::try_from(offset).unwrap_or(u32::MAX),
                message: error.to_string(),
            });
        }

        for statement in &parsed.program.body {
            let Some(declaration) = statement.as_module_declaration() else {
                continue;
            };
            match declaration {
                ModuleDeclaration::ImportDeclaration(import) => {
                    collect_import(import, &mut result.facts);
                }
                ModuleDeclaration::ExportNamedDeclaration(export) => {
                    collect_named_export(export, &mut result.facts);
                }
                ModuleDeclaration::ExportDefaultDeclaration(export) => {
                    collect_default_export(export, &mut result.facts);
                }
                ModuleDeclaration::ExportAllDeclaration(export) => {
                    collect_export_all(export, &mut result.facts);
                }
                _ => {}
            }
        }

        if options.include_dynamic_imports || options.include_requires {
            let mut collector = CallCollector {
                options,
                facts: &mut result.facts,
            };
            collector.visit_program(&parsed.program);
        }

        result.facts.sort_by_key(|fact| fact.span().start);
        result
    }
}

fn span(span: oxc_span::Span) -> Span {
    Span::new(span.start, span.end)
}

fn export_name(name: &ModuleExportName<'_>) -> Name {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

fn collect_import(import: &ImportDeclaration<'_>, facts: &mut Vec<Fact>) {
    if import.import_kind.is_type() {
        return;
    }
    let from = import.source.value.to_string();
    let span = span(import.span);

    let Some(specifiers) = &import.specifiers else {
        facts.push(Fact::NamedImport {
            from,
            span,
            default: None,
            names: Vec::new(),
        });
        return;
    };

    let mut default = None;
    let mut namespace = None;
    let mut names = Vec::new();
    for specifier in specifiers {
        match specifier {
            ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                default = Some(spec.local.name.to_string());
            }
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                namespace = Some(spec.local.name.to_string());
            }
            ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                if spec.import_kind.is_type() {
                    continue;
                }
                names.push(Specifier::new(
                    export_name(&spec.imported),
                    Some(spec.local.name.to_string()),
                ));
            }
        }
    }

    // `import {type A} from 'x'` is erased entirely
    if !specifiers.is_empty() && default.is_none() && namespace.is_none() && names.is_empty() {
        return;
    }

    match namespace {
        Some(namespace) => facts.push(Fact::NamespaceImport {
            from,
            span,
            default,
            namespace,
        }),
        None => facts.push(Fact::NamedImport {
            from,
            span,
            default,
            names,
        }),
    }
}

fn collect_named_export(export: &ExportNamedDeclaration<'_>, facts: &mut Vec<Fact>) {
    if export.export_kind.is_type() {
        return;
    }
    let span = span(export.span);

    if let Some(declaration) = &export.declaration {
        if let Some((declaration, ambient, names)) = declaration_names(declaration) {
            facts.push(Fact::DeclarationExport {
                span,
                declaration,
                ambient,
                names,
            });
        }
        return;
    }

    let names: Vec<Specifier> = export
        .specifiers
        .iter()
        .filter(|spec| !spec.export_kind.is_type())
        .map(|spec| Specifier::new(export_name(&spec.local), Some(export_name(&spec.exported))))
        .collect();

    match &export.source {
        Some(source) => facts.push(Fact::NamedReexport {
            from: source.value.to_string(),
            span,
            names,
        }),
        None => facts.push(Fact::NamedExport { span, names }),
    }
}

fn collect_default_export(export: &ExportDefaultDeclaration<'_>, facts: &mut Vec<Fact>) {
    if matches!(
        export.declaration,
        ExportDefaultDeclarationKind::TSInterfaceDeclaration(_)
    ) {
        return;
    }
    facts.push(Fact::DefaultExport {
        span: span(export.span),
    });
}

fn collect_export_all(export: &ExportAllDeclaration<'_>, facts: &mut Vec<Fact>) {
    if export.export_kind.is_type() {
        return;
    }
    let from = export.source.value.to_string();
    let span = span(export.span);
    match &export.exported {
        Some(namespace) => facts.push(Fact::NamespaceReexport {
            from,
            span,
            namespace: export_name(namespace),
        }),
        None => facts.push(Fact::StarReexport { from, span }),
    }
}

/// Kind, ambient flag and bound names of an exported declaration.
///
/// Type aliases, interfaces and `import x = require()` bind no runtime value
/// and yield `None`.
fn declaration_names(declaration: &Declaration<'_>) -> Option<(DeclarationKind, bool, Vec<Name>)> {
    match declaration {
        Declaration::VariableDeclaration(variable) => {
            let mut names = Vec::new();
            let mut destructuring = false;
            for declarator in &variable.declarations {
                destructuring |= !matches!(declarator.id.kind, BindingPatternKind::BindingIdentifier(_));
                bound_names(&declarator.id, &mut names);
            }
            let kind = match (variable.kind, destructuring) {
                (VariableDeclarationKind::Const, false) => DeclarationKind::Const,
                (VariableDeclarationKind::Const, true) => DeclarationKind::DestructuringConst,
                (VariableDeclarationKind::Let, false) => DeclarationKind::Let,
                (VariableDeclarationKind::Let, true) => DeclarationKind::DestructuringLet,
                (VariableDeclarationKind::Var, false) => DeclarationKind::Var,
                (VariableDeclarationKind::Var, true) => DeclarationKind::DestructuringVar,
                _ => DeclarationKind::Using,
            };
            Some((kind, variable.declare, names))
        }
        Declaration::FunctionDeclaration(function) => {
            let kind = match (function.r#async, function.generator) {
                (false, false) => DeclarationKind::Function,
                (true, false) => DeclarationKind::AsyncFunction,
                (false, true) => DeclarationKind::GeneratorFunction,
                (true, true) => DeclarationKind::AsyncGeneratorFunction,
            };
            let names = function.id.iter().map(|id| id.name.to_string()).collect();
            Some((kind, function.declare, names))
        }
        Declaration::ClassDeclaration(class) => {
            let kind = if class.r#abstract {
                DeclarationKind::AbstractClass
            } else {
                DeclarationKind::Class
            };
            let names = class.id.iter().map(|id| id.name.to_string()).collect();
            Some((kind, class.declare, names))
        }
        Declaration::TSEnumDeclaration(enumeration) => {
            let kind = if enumeration.r#const {
                DeclarationKind::ConstEnum
            } else {
                DeclarationKind::Enum
            };
            Some((kind, enumeration.declare, vec![enumeration.id.name.to_string()]))
        }
        Declaration::TSModuleDeclaration(module) => Some((
            DeclarationKind::Namespace,
            module.declare,
            vec![module.id.name().to_string()],
        )),
        _ => None,
    }
}

fn bound_names(pattern: &BindingPattern<'_>, names: &mut Vec<Name>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => names.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                bound_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                bound_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                bound_names(element, names);
            }
            if let Some(rest) = &array.rest {
                bound_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assignment) => bound_names(&assignment.left, names),
    }
}

/// Static string of `'x'` or `` `x` ``.
fn static_string(expression: &Expression<'_>) -> Option<String> {
    match expression {
        Expression::StringLiteral(literal) => Some(literal.value.to_string()),
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => template
            .quasis
            .first()
            .and_then(|quasi| quasi.value.cooked.as_ref())
            .map(|cooked| cooked.to_string()),
        _ => None,
    }
}

/// Collects `import('x')` and `require('x')` anywhere in the program.
struct CallCollector<'f> {
    options: ParseOptions,
    facts: &'f mut Vec<Fact>,
}

impl<'a> Visit<'a> for CallCollector<'_> {
    fn visit_import_expression(&mut self, expression: &ImportExpression<'a>) {
        if self.options.include_dynamic_imports {
            if let Some(from) = static_string(&expression.source) {
                self.facts.push(Fact::DynamicImport {
                    from,
                    span: span(expression.span),
                });
            }
        }
        walk::walk_import_expression(self, expression);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.options.include_requires {
            if let Some(from) = require_path(call) {
                self.facts.push(Fact::Require {
                    from,
                    span: span(call.span),
                });
            }
        }
        walk::walk_call_expression(self, call);
    }
}

fn require_path(call: &CallExpression<'_>) -> Option<String> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    call.arguments[0].as_expression().and_then(static_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, source: &str) -> ImportsExports {
        OxcParser::new().parse(path, source, ParseOptions::default())
    }

    #[test]
    fn test_named_and_default_imports() {
        let result = parse("a.ts", "import d, {a, b as c} from './b';\nimport './side';");
        assert!(result.errors.is_empty());
        assert_eq!(result.facts.len(), 2);

        match &result.facts[0] {
            Fact::NamedImport {
                from,
                default,
                names,
                ..
            } => {
                assert_eq!(from, "./b");
                assert_eq!(default.as_deref(), Some("d"));
                assert_eq!(
                    names,
                    &vec![
                        Specifier::new("a", None),
                        Specifier::new("b", Some("c".to_string()))
                    ]
                );
            }
            other => panic!("unexpected fact {other:?}"),
        }
        assert!(matches!(&result.facts[1], Fact::NamedImport { names, default: None, .. } if names.is_empty()));
    }

    #[test]
    fn test_type_only_imports_are_dropped() {
        let result = parse(
            "a.ts",
            "import type {A} from './a';\nimport {type B} from './b';\nimport {type C, d} from './c';",
        );
        assert_eq!(result.facts.len(), 1);
        match &result.facts[0] {
            Fact::NamedImport { from, names, .. } => {
                assert_eq!(from, "./c");
                assert_eq!(names, &vec![Specifier::new("d", None)]);
            }
            other => panic!("unexpected fact {other:?}"),
        }
    }

    #[test]
    fn test_declaration_exports() {
        let result = parse(
            "a.ts",
            "export const a = 1, b = 2;\nexport async function* gen() {}\nexport declare const c: number;\nexport const {x, y: [z]} = obj;",
        );
        let declarations: Vec<_> = result
            .facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::DeclarationExport {
                    declaration,
                    ambient,
                    names,
                    ..
                } => Some((*declaration, *ambient, names.clone())),
                _ => None,
            })
            .collect();

        assert_eq!(
            declarations,
            vec![
                (DeclarationKind::Const, false, vec!["a".to_string(), "b".to_string()]),
                (DeclarationKind::AsyncGeneratorFunction, false, vec!["gen".to_string()]),
                (DeclarationKind::Const, true, vec!["c".to_string()]),
                (
                    DeclarationKind::DestructuringConst,
                    false,
                    vec!["x".to_string(), "z".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn test_reexports() {
        let result = parse(
            "a.ts",
            "export {a as b, default} from './b';\nexport * as ns from './c';\nexport * from 'pkg';",
        );
        assert_eq!(result.facts.len(), 3);
        assert!(matches!(
            &result.facts[0],
            Fact::NamedReexport { from, names, .. }
                if from == "./b" && names == &vec![Specifier::new("a", Some("b".into())), Specifier::new("default", None)]
        ));
        assert!(matches!(
            &result.facts[1],
            Fact::NamespaceReexport { from, namespace, .. } if from == "./c" && namespace == "ns"
        ));
        assert!(matches!(&result.facts[2], Fact::StarReexport { from, .. } if from == "pkg"));
    }

    #[test]
    fn test_dynamic_imports_and_requires_are_opt_in() {
        let source = "const a = await import('./a');\nconst b = require(`./b`);\nconst c = import(name);";
        assert!(parse("a.mjs", source).facts.is_empty());

        let result = OxcParser::new().parse(
            "a.mjs",
            source,
            ParseOptions {
                include_dynamic_imports: true,
                include_requires: true,
            },
        );
        assert_eq!(result.facts.len(), 2);
        assert!(matches!(&result.facts[0], Fact::DynamicImport { from, .. } if from == "./a"));
        assert!(matches!(&result.facts[1], Fact::Require { from, .. } if from == "./b"));
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let result = parse("a.ts", "export const = ;");
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn test_syntax_errors_are_keyed_by_offset() {
        let source = "const ok = 1;\nexport const = ;";
        let result = parse("a.ts", source);
        let error = result.errors.first().unwrap();
        assert!(error.position >= 14, "position {} precedes the broken line", error.position);
    }

    #[test]
    fn test_facts_keep_source_spans() {
        let source = "const x = 1;\nexport {x};";
        let result = parse("a.js", source);
        let span = result.facts[0].span();
        assert_eq!(span.text(source), "export {x};");
    }
}
