//! Folds a module's raw import/export facts into its graph record.
//!
//! The first declaration of anything wins. Later declarations that repeat
//! an existing one (same raw path, same shape) become warnings; later
//! declarations that collide with a different binding become errors.

mod reserved;

pub use reserved::{RESERVED_WORDS, is_reserved_word};

use rustc_hash::FxHashSet;

use crate::graph::{
    DeclarationKind, DefaultExport, Export, Import, ImportedName, Module, NAMESPACE_DEFAULT, Name,
    NamespaceBinding, RawPath, Reexport, ReexportedName, ReexportedNamespace,
};
use crate::parse::{Fact, ImportsExports, Span, Specifier};

/// Merge `facts` parsed from `source` into `module`.
pub fn merge_imports_exports<S, D>(module: &mut Module<S, D>, facts: ImportsExports, source: &str) {
    let ImportsExports { facts, errors } = facts;
    let mut merger = Merger {
        module,
        source,
        bindings: FxHashSet::default(),
        reexport_shapes: FxHashSet::default(),
    };
    for fact in facts {
        merger.merge(fact);
    }
    for error in errors {
        merger.module.parse_errors.add(error.position, error.message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ReexportShape {
    Named,
    Namespace(Name),
}

struct Merger<'m, 's, S, D> {
    module: &'m mut Module<S, D>,
    source: &'s str,
    /// Local bindings introduced by imports and exported declarations.
    bindings: FxHashSet<Name>,
    reexport_shapes: FxHashSet<(RawPath, ReexportShape)>,
}

impl<S, D> Merger<'_, '_, S, D> {
    fn merge(&mut self, fact: Fact) {
        match fact {
            Fact::NamedImport {
                from,
                span,
                default,
                names,
            } => self.named_import(from, span, default, names),
            Fact::NamespaceImport {
                from,
                span,
                default,
                namespace,
            } => self.namespace_import(from, span, default, namespace),
            Fact::DynamicImport { from, span } => {
                self.pseudo_namespace(from, span, NamespaceBinding::DynamicImport)
            }
            Fact::Require { from, span } => {
                self.pseudo_namespace(from, span, NamespaceBinding::Require)
            }
            Fact::NamedExport { span, names } => self.named_export(span, names),
            Fact::DeclarationExport {
                span,
                declaration,
                ambient,
                names,
            } => {
                if ambient {
                    return;
                }
                for name in names {
                    let export = Export::Declaration {
                        declaration,
                        position: span.start,
                    };
                    if self.add_export(span, name.clone(), export) {
                        self.bind_declaration(span, &name, declaration);
                    }
                }
            }
            Fact::DefaultExport { span } => {
                self.set_default(span, DefaultExport::local(span.start, None));
            }
            Fact::NamedReexport { from, span, names } => self.named_reexport(from, span, names),
            Fact::NamespaceReexport {
                from,
                span,
                namespace,
            } => self.namespace_reexport(from, span, namespace),
            Fact::StarReexport { from, span } => {
                let duplicate = std::mem::replace(&mut self.reexport(&from, span).star, true);
                if duplicate {
                    self.warn(span, format!("Duplicate star reexport from `{from}`"));
                }
            }
        }
    }

    fn snippet(&self, span: Span, message: String) -> String {
        format!("{message}:\n{}", span.text(self.source))
    }

    fn warn(&mut self, span: Span, message: String) {
        let message = self.snippet(span, message);
        self.module.warnings.add(span.start, message);
    }

    fn error(&mut self, span: Span, message: String) {
        let message = self.snippet(span, message);
        self.module.errors.add(span.start, message);
    }

    fn import(&mut self, from: &str, span: Span) -> &mut Import {
        self.module
            .imports
            .entry(from.to_string())
            .or_insert_with(|| Import::new(span.start))
    }

    fn reexport(&mut self, from: &str, span: Span) -> &mut Reexport {
        self.module
            .reexports
            .entry(from.to_string())
            .or_insert_with(|| Reexport::new(span.start))
    }

    /// Register a new local binding; false if it cannot be bound.
    fn bind(&mut self, span: Span, name: &str) -> bool {
        if is_reserved_word(name) {
            self.error(
                span,
                format!("Cannot use reserved word `{name}` as imported name"),
            );
            return false;
        }
        if !self.bindings.insert(name.to_string()) {
            self.error(span, format!("Duplicate imported name `{name}`"));
            return false;
        }
        true
    }

    /// Exported declarations share the binding namespace with imports.
    /// A collision is reported but the export is still recorded.
    fn bind_declaration(&mut self, span: Span, name: &str, declaration: DeclarationKind) {
        let kind = declaration.as_str();
        if self.bindings.contains(name) {
            self.error(
                span,
                format!("Duplicate name `{name}` as `{kind}` declaration export"),
            );
        } else if is_reserved_word(name) {
            self.error(
                span,
                format!("Reserved word `{name}` cannot be an identifier as `{kind}` declaration export"),
            );
        } else {
            self.bindings.insert(name.to_string());
        }
    }

    fn named_import(
        &mut self,
        from: RawPath,
        span: Span,
        default: Option<Name>,
        names: Vec<Specifier>,
    ) {
        if self.module.imports.contains_key(&from) {
            self.warn(span, format!("Duplicate named import from `{from}`"));
        }
        self.import(&from, span);

        if let Some(default) = default {
            self.import_default(&from, span, default);
        }
        for specifier in names {
            if specifier.name == "default" {
                let local = specifier.visible().to_string();
                self.import_default(&from, span, local);
                continue;
            }
            if self.import(&from, span).names.contains_key(&specifier.name) {
                self.warn(
                    span,
                    format!("Duplicate named import `{}` from `{from}`", specifier.name),
                );
                continue;
            }
            if self.bind(span, specifier.visible()) {
                self.import(&from, span).names.insert(
                    specifier.name,
                    ImportedName {
                        local: specifier.alias,
                        resolved: None,
                    },
                );
            }
        }
    }

    fn import_default(&mut self, from: &str, span: Span, local: Name) {
        if self.import(from, span).default.is_some() {
            self.warn(span, format!("Duplicate default import `{local}` from `{from}`"));
            return;
        }
        if self.bind(span, &local) {
            self.import(from, span).default = Some(local);
        }
    }

    fn namespace_import(&mut self, from: RawPath, span: Span, default: Option<Name>, namespace: Name) {
        if let Some(default) = default {
            self.import_default(&from, span, default);
        }
        if matches!(self.import(&from, span).namespace, Some(NamespaceBinding::Import(_))) {
            self.warn(
                span,
                format!("Duplicate namespace import `{namespace}` from `{from}`"),
            );
            return;
        }
        if self.bind(span, &namespace) {
            self.import(&from, span).namespace = Some(NamespaceBinding::Import(namespace));
        }
    }

    /// `import('x')` and `require('x')` bind the whole module without a name.
    fn pseudo_namespace(&mut self, from: RawPath, span: Span, binding: NamespaceBinding) {
        let import = self.import(&from, span);
        let duplicate = import.namespace.as_ref() == Some(&binding);
        if import.namespace.is_none() {
            import.namespace = Some(binding.clone());
        }
        if duplicate {
            let kind = match binding {
                NamespaceBinding::Require => "require",
                _ => "dynamic import",
            };
            self.warn(span, format!("Duplicate {kind} of `{from}`"));
        }
    }

    fn set_default(&mut self, span: Span, default: DefaultExport) -> bool {
        if self.module.default_export.is_some() {
            self.error(span, "Duplicate default export".to_string());
            return false;
        }
        self.module.default_export = Some(default);
        true
    }

    fn add_export(&mut self, span: Span, name: Name, export: Export) -> bool {
        if self.module.exports.contains_key(&name) {
            self.error(span, format!("Duplicate exported name `{name}`"));
            return false;
        }
        self.module.exports.insert(name, export);
        true
    }

    fn named_export(&mut self, span: Span, names: Vec<Specifier>) {
        for specifier in names {
            let exported = specifier.visible().to_string();
            let by = specifier.alias.as_ref().map(|_| specifier.name.clone());
            if exported == "default" {
                self.set_default(span, DefaultExport::local(span.start, by));
                continue;
            }
            self.add_export(
                span,
                exported,
                Export::Name {
                    by,
                    position: span.start,
                },
            );
        }
    }

    fn named_reexport(&mut self, from: RawPath, span: Span, names: Vec<Specifier>) {
        if !self
            .reexport_shapes
            .insert((from.clone(), ReexportShape::Named))
        {
            self.warn(span, format!("Duplicate named reexport from `{from}`"));
        }
        self.reexport(&from, span);

        for specifier in names {
            let exported = specifier.visible().to_string();
            let by = specifier.alias.as_ref().map(|_| specifier.name.clone());

            if exported == "default" {
                let default = DefaultExport {
                    position: span.start,
                    by: Some(specifier.name.clone()),
                    from: Some(from.clone()),
                    namespace: false,
                };
                if self.set_default(span, default) {
                    self.reexport(&from, span).default = Some(specifier.name);
                }
                continue;
            }

            let same_source = match self.module.exports.get(&exported) {
                Some(existing) => Some(existing.reexported_from() == Some(from.as_str())),
                None => None,
            };
            match same_source {
                Some(true) => self.warn(
                    span,
                    format!("Duplicate reexported name `{exported}` from `{from}`"),
                ),
                Some(false) => {
                    self.error(span, format!("Duplicate exported name `{exported}`"))
                }
                None => {
                    self.module.exports.insert(
                        exported.clone(),
                        Export::Reexport {
                            from: from.clone(),
                            by: by.clone(),
                            namespace: false,
                            position: span.start,
                        },
                    );
                    self.reexport(&from, span)
                        .names
                        .insert(exported, ReexportedName { by, resolved: None });
                }
            }
        }
    }

    fn namespace_reexport(&mut self, from: RawPath, span: Span, namespace: Name) {
        if !self
            .reexport_shapes
            .insert((from.clone(), ReexportShape::Namespace(namespace.clone())))
        {
            self.warn(
                span,
                format!("Duplicate namespace reexport `{namespace}` from `{from}`"),
            );
            return;
        }
        self.reexport(&from, span);

        if namespace == "default" {
            let default = DefaultExport {
                position: span.start,
                by: None,
                from: Some(from.clone()),
                namespace: true,
            };
            if self.set_default(span, default) {
                self.reexport(&from, span).default = Some(NAMESPACE_DEFAULT.to_string());
            }
            return;
        }

        let export = Export::Reexport {
            from: from.clone(),
            by: None,
            namespace: true,
            position: span.start,
        };
        if self.add_export(span, namespace.clone(), export) {
            self.reexport(&from, span)
                .namespaces
                .insert(namespace, ReexportedNamespace::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{OxcParser, ParseOptions, SourceParser};

    fn merged(source: &str) -> Module {
        let facts = OxcParser::new().parse("a.ts", source, ParseOptions::default());
        let mut module = Module::new("a.ts");
        merge_imports_exports(&mut module, facts, source);
        module
    }

    #[test]
    fn test_two_local_exports() {
        let module = merged("export const a = 1;\nexport const b = 2;");
        assert!(module.errors.is_empty());
        assert!(module.warnings.is_empty());
        assert_eq!(module.exports.len(), 2);
        for name in ["a", "b"] {
            assert!(matches!(
                module.exports.get(name),
                Some(Export::Declaration {
                    declaration: DeclarationKind::Const,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_second_default_export_is_an_error() {
        let module = merged("export default 1;\nconst x = 2;\nexport {x as default};");
        let default = module.default_export.as_ref().unwrap();
        assert_eq!(default.position, 0);
        assert_eq!(default.by, None);
        assert_eq!(module.errors.len(), 1);
        assert!(module.errors.contains("Duplicate default export"));
    }

    #[test]
    fn test_named_imports_are_keyed_by_imported_name() {
        let module = merged("import d, {a, b as c, default as e} from './x';");
        let import = &module.imports["./x"];
        assert_eq!(import.default.as_deref(), Some("d"));
        assert_eq!(import.names["a"].local, None);
        assert_eq!(import.names["b"].local.as_deref(), Some("c"));
        // `default as e` collides with `d` on the same raw path
        assert!(module.warnings.contains("Duplicate default import `e` from `./x`"));
    }

    #[test]
    fn test_duplicate_bindings_across_paths_are_errors() {
        let module = merged("import {a} from './x';\nimport {a} from './y';");
        assert!(module.errors.contains("Duplicate imported name `a`"));
        assert!(module.imports["./x"].names.contains_key("a"));
        assert!(module.imports["./y"].names.is_empty());
    }

    #[test]
    fn test_reserved_local_names_are_errors() {
        let facts = ImportsExports {
            facts: vec![Fact::NamedImport {
                from: "./x".to_string(),
                span: Span::new(0, 10),
                default: Some("yield".to_string()),
                names: vec![Specifier::new("x", Some("eval".to_string()))],
            }],
            errors: Vec::new(),
        };
        let mut module: Module = Module::new("a.ts");
        merge_imports_exports(&mut module, facts, "");

        assert!(module.errors.contains("Cannot use reserved word `yield`"));
        assert!(module.errors.contains("Cannot use reserved word `eval`"));
        assert_eq!(module.imports["./x"].default, None);
        assert!(module.imports["./x"].names.is_empty());
    }

    #[test]
    fn test_repeated_import_statement_warns_and_merges() {
        let module = merged("import {a} from './x';\nimport {a, b} from './x';");
        assert!(module.errors.is_empty());
        assert!(module.warnings.contains("Duplicate named import from `./x`"));
        assert!(module.warnings.contains("Duplicate named import `a` from `./x`"));
        let names: Vec<_> = module.imports["./x"].names.keys().cloned().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(module.imports["./x"].position, 0);
    }

    #[test]
    fn test_namespace_imports_keep_first() {
        let module = merged("import * as a from './x';\nimport * as b from './x';");
        assert_eq!(
            module.imports["./x"].namespace,
            Some(NamespaceBinding::Import("a".to_string()))
        );
        assert!(module.warnings.contains("Duplicate namespace import `b`"));
    }

    #[test]
    fn test_ambient_declarations_are_not_exported() {
        let module = merged("export declare function f(): void;\nexport function g() {}");
        assert!(!module.exports.contains_key("f"));
        assert!(module.exports.contains_key("g"));
    }

    #[test]
    fn test_named_reexports() {
        let module = merged("export {x as y, default} from './b';\nconst z = 1;\nexport {z as default};");
        let reexport = &module.reexports["./b"];
        assert_eq!(reexport.names["y"].by.as_deref(), Some("x"));
        assert_eq!(reexport.default.as_deref(), Some("default"));
        assert_eq!(
            module.exports["y"],
            Export::Reexport {
                from: "./b".to_string(),
                by: Some("x".to_string()),
                namespace: false,
                position: 0,
            }
        );
        let default = module.default_export.as_ref().unwrap();
        assert_eq!(default.from.as_deref(), Some("./b"));
        assert_eq!(default.by.as_deref(), Some("default"));
        assert!(module.errors.contains("Duplicate default export"));
    }

    #[test]
    fn test_repeated_reexport_statements_warn_and_merge() {
        let module = merged(
            "export {a} from './b';\nexport {c} from './b';\nexport * from './b';\nexport * from './b';",
        );
        let reexport = &module.reexports["./b"];
        assert!(reexport.star);
        let names: Vec<_> = reexport.names.keys().cloned().collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(matches!(module.exports["c"], Export::Reexport { .. }));
        assert!(module.errors.is_empty());
        assert!(module.warnings.contains("Duplicate named reexport from `./b`"));
        assert!(module.warnings.contains("Duplicate star reexport from `./b`"));
    }

    #[test]
    fn test_repeated_reexport_statement_refuses_known_names() {
        let module = merged("export {x} from './b';\nexport {x, y} from './b';\nexport {y} from './c';");
        assert_eq!(module.reexports["./b"].names.len(), 2);
        assert!(module.warnings.contains("Duplicate reexported name `x` from `./b`"));
        assert!(module.errors.contains("Duplicate exported name `y`"));
        assert!(module.reexports["./c"].names.is_empty());
    }

    #[test]
    fn test_declaration_export_shadowing_import_is_error() {
        let module = merged("import {a} from './b';\nexport const a = 1;");
        assert!(module.errors.contains("Duplicate name `a` as `const` declaration export"));
        assert!(module.imports["./b"].names.contains_key("a"));
        assert!(matches!(module.exports["a"], Export::Declaration { .. }));

        let module = merged("export function f() {}\nimport {f} from './b';");
        assert!(module.errors.contains("Duplicate imported name `f`"));
        assert!(module.imports["./b"].names.is_empty());
    }

    #[test]
    fn test_reserved_declaration_export_is_error() {
        let facts = ImportsExports {
            facts: vec![Fact::DeclarationExport {
                span: Span::new(0, 10),
                declaration: DeclarationKind::Var,
                ambient: false,
                names: vec!["arguments".to_string()],
            }],
            errors: Vec::new(),
        };
        let mut module: Module = Module::new("a.ts");
        merge_imports_exports(&mut module, facts, "");

        assert!(module.errors.contains("Reserved word `arguments` cannot be an identifier"));
        assert!(module.exports.contains_key("arguments"));
    }

    #[test]
    fn test_namespace_reexports() {
        let module = merged("export * as ns from './b';\nexport * as default from './c';");
        assert!(module.reexports["./b"].namespaces.contains_key("ns"));
        assert_eq!(module.reexports["./c"].default.as_deref(), Some("*"));
        assert!(module.default_export.as_ref().unwrap().namespace);
    }

    #[test]
    fn test_export_name_clash_with_reexport_is_error() {
        let module = merged("export const a = 1;\nexport {a} from './b';");
        assert!(module.errors.contains("Duplicate exported name `a`"));
        assert!(matches!(module.exports["a"], Export::Declaration { .. }));
    }

    #[test]
    fn test_diagnostics_carry_statement_text() {
        let source = "export default 1;\nexport default 2;";
        let module = merged(source);
        assert_eq!(
            module.errors.get(18),
            Some("Duplicate default export:\nexport default 2;")
        );
    }
}
