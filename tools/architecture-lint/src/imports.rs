//! Collects every path a parsed file names, resolved against the module it
//! appears in.

use std::collections::BTreeSet;

use syn::spanned::Spanned;
use syn::visit::Visit;

use crate::module_path::{ModulePath, Target, resolve};

/// A resolved path and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    /// Module the path was written in, including inline `mod` blocks.
    pub(crate) module: ModulePath,
    pub(crate) target: Target,
    /// 1-based source line.
    pub(crate) line: usize,
}

/// Resolve every path in `file`, skipping `#[cfg(test)]` items.
pub(crate) fn references(module: ModulePath, file: &syn::File) -> Vec<Reference> {
    let mut collector = ReferenceCollector {
        scopes: vec![Scope::new(module, &file.items)],
        references: Vec::new(),
    };
    for item in &file.items {
        collector.visit_item(item);
    }
    collector.references
}

struct Scope {
    module: ModulePath,
    children: BTreeSet<String>,
}

impl Scope {
    fn new(module: ModulePath, items: &[syn::Item]) -> Self {
        let children = items
            .iter()
            .filter_map(|item| match item {
                syn::Item::Mod(declared) => Some(declared.ident.to_string()),
                _ => None,
            })
            .collect();
        Self { module, children }
    }
}

struct ReferenceCollector {
    scopes: Vec<Scope>,
    references: Vec<Reference>,
}

impl ReferenceCollector {
    fn record(&mut self, segments: &[String], line: usize) {
        let Some(scope) = self.scopes.last() else {
            return;
        };
        if let Some(target) = resolve(&scope.module, &scope.children, segments) {
            self.references.push(Reference {
                module: scope.module.clone(),
                target,
                line,
            });
        }
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use_tree(&path.tree, prefix);
            }
            syn::UseTree::Name(name) => {
                prefix.push(name.ident.to_string());
                self.record(&prefix, line_of(tree));
            }
            syn::UseTree::Rename(rename) => {
                prefix.push(rename.ident.to_string());
                self.record(&prefix, line_of(tree));
            }
            syn::UseTree::Glob(_) => {
                // Leaf placeholder so `use reqwest::*` resolves to its crate.
                prefix.push("*".to_owned());
                self.record(&prefix, line_of(tree));
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for ReferenceCollector {
    fn visit_item(&mut self, node: &'ast syn::Item) {
        if is_test_only(item_attrs(node)) {
            return;
        }
        syn::visit::visit_item(self, node);
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        let Some((_, items)) = &node.content else {
            return;
        };
        let Some(parent) = self.scopes.last() else {
            return;
        };
        let module = parent.module.child(&node.ident.to_string());
        self.scopes.push(Scope::new(module, items));
        for item in items {
            self.visit_item(item);
        }
        self.scopes.pop();
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, Vec::new());
    }

    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>();
        self.record(&segments, line_of(node));
        syn::visit::visit_path(self, node);
    }
}

fn line_of(node: &impl Spanned) -> usize {
    node.span().start().line
}

fn is_test_only(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .is_ok_and(|predicate| predicate == "test")
    })
}

fn item_attrs(item: &syn::Item) -> &[syn::Attribute] {
    match item {
        syn::Item::Const(item) => &item.attrs,
        syn::Item::Enum(item) => &item.attrs,
        syn::Item::Fn(item) => &item.attrs,
        syn::Item::Impl(item) => &item.attrs,
        syn::Item::Macro(item) => &item.attrs,
        syn::Item::Mod(item) => &item.attrs,
        syn::Item::Static(item) => &item.attrs,
        syn::Item::Struct(item) => &item.attrs,
        syn::Item::Trait(item) => &item.attrs,
        syn::Item::Type(item) => &item.attrs,
        syn::Item::Use(item) => &item.attrs,
        _ => &[],
    }
}
