//! Declaration collection: struct and function registries built before any
//! text is generated.
//!
//! Both passes run to completion first, so forward references and mutually
//! recursive calls resolve the same way regardless of source order.

use crate::names::sanitize_identifier;
use crate::placement::{FunctionSignature, Parameter, Placement, PlacementPolicy};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use ur_clang::{CType, ClangNode, ClangNodeKind};

/// Name given to an anonymous tag nothing refers to.
pub const ANONYMOUS_PLACEHOLDER: &str = "_";

/// One field of a record, as emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: CType,
}

/// A struct or union, keyed by its resolved C name.
#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub placement: Placement,
    pub is_union: bool,
    /// Empty until a definition (not just a forward declaration) is seen
    pub fields: Vec<FieldInfo>,
}

impl StructInfo {
    /// The name the record is emitted and referred to under.
    pub fn target_name(&self) -> String {
        sanitize_identifier(self.placement.name_or(&self.name))
    }
}

/// A function definition.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: FunctionSignature,
    /// Argument name to C type, in declaration order
    pub arguments: IndexMap<String, CType>,
    pub placement: Placement,
}

impl FunctionInfo {
    pub fn target_name(&self) -> String {
        sanitize_identifier(self.placement.name_or(&self.name))
    }
}

/// Name tables consulted by the translator.
#[derive(Debug, Default)]
pub struct Registry {
    structs: IndexMap<String, StructInfo>,
    /// Record type spelling to resolved record name
    record_names: FxHashMap<String, String>,
    functions: IndexMap<String, FunctionInfo>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructInfo> {
        self.structs.values()
    }

    pub fn struct_info(&self, name: &str) -> Option<&StructInfo> {
        self.structs.get(name)
    }

    /// The record a `CType::Record` key denotes.
    pub fn struct_for_type(&self, key: &str) -> Option<&StructInfo> {
        match self.record_names.get(key) {
            Some(name) => self.structs.get(name),
            None => self.structs.get(key),
        }
    }

    /// Rust name for a record type key.
    pub fn record_name(&self, key: &str) -> String {
        match self.struct_for_type(key) {
            Some(info) => info.target_name(),
            None if key.contains('(') || key.contains(' ') => ANONYMOUS_PLACEHOLDER.to_string(),
            None => sanitize_identifier(key),
        }
    }

    /// Rust type text, with record names mapped through the registry.
    pub fn render_type(&self, ty: &CType) -> String {
        ty.to_target(&|key: &str| self.record_name(key))
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions.values()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    /// Look a callee up by its C name, then by its emitted name.
    pub fn resolve_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions
            .get(name)
            .or_else(|| self.functions.values().find(|f| f.target_name() == name))
    }
}

/// Walk `node` in pre-order, skipping system-header subtrees, handing each
/// node its ancestor chain.
pub fn walk_with_ancestors<'a>(
    node: &'a ClangNode,
    ancestors: &mut Vec<&'a ClangNode>,
    visit: &mut dyn FnMut(&'a ClangNode, &[&'a ClangNode]),
) {
    if node.in_system_header {
        return;
    }
    visit(node, ancestors);
    ancestors.push(node);
    for child in &node.children {
        walk_with_ancestors(child, ancestors, visit);
    }
    ancestors.pop();
}

/// The type key a tag declaration is referred to by.
fn tag_key(tag: &ClangNode) -> Option<&str> {
    match tag.kind {
        ClangNodeKind::EnumDecl => tag.ty.referenced_enum(),
        _ => tag.ty.referenced_record(),
    }
}

fn references_tag(ty: &CType, tag: &ClangNode, key: &str) -> bool {
    let referenced = match tag.kind {
        ClangNodeKind::EnumDecl => ty.referenced_enum(),
        _ => ty.referenced_record(),
    };
    referenced == Some(key)
}

/// Resolve the C name of a struct, union or enum declaration.
///
/// An anonymous tag takes the name of the first typedef, variable or field
/// declared after it in its semantic parent whose type refers to it, looking
/// through pointers and arrays. The parent is scanned in full, so the tag
/// may sit at any nesting depth below it.
pub fn resolve_tag_name(tag: &ClangNode, ancestors: &[&ClangNode]) -> String {
    if !tag.spelling.is_empty() {
        return tag.spelling.clone();
    }

    let Some(key) = tag_key(tag) else {
        return ANONYMOUS_PLACEHOLDER.to_string();
    };
    let Some(parent) = ancestors.iter().rev().find(|a| a.is_decl_context()) else {
        return ANONYMOUS_PLACEHOLDER.to_string();
    };

    let mut seen = false;
    let mut found: Option<&str> = None;
    parent.walk(&mut |node| {
        if found.is_some() {
            return;
        }
        if node.same_entity(tag) {
            seen = true;
            return;
        }
        let declares = matches!(
            node.kind,
            ClangNodeKind::TypedefDecl | ClangNodeKind::VarDecl { .. } | ClangNodeKind::FieldDecl
        );
        if seen && declares && !node.spelling.is_empty() && references_tag(&node.ty, tag, key) {
            found = Some(&node.spelling);
        }
    });

    match found {
        Some(name) => name.to_string(),
        None => ANONYMOUS_PLACEHOLDER.to_string(),
    }
}

fn record_fields(record: &ClangNode) -> Vec<FieldInfo> {
    record
        .children
        .iter()
        .filter(|c| c.kind == ClangNodeKind::FieldDecl)
        .map(|c| FieldInfo {
            name: sanitize_identifier(&c.spelling),
            ty: c.ty.clone(),
        })
        .collect()
}

/// Runs the two preprocessing passes against a placement policy.
pub struct DeclarationCollector<'p> {
    policy: &'p dyn PlacementPolicy,
}

impl<'p> DeclarationCollector<'p> {
    pub fn new(policy: &'p dyn PlacementPolicy) -> Self {
        Self { policy }
    }

    /// Register every struct and union under its resolved name.
    pub fn collect_structs(&self, root: &ClangNode, registry: &mut Registry) {
        walk_with_ancestors(root, &mut Vec::new(), &mut |node, ancestors| {
            if !node.is_record() {
                return;
            }

            let name = resolve_tag_name(node, ancestors);
            if let Some(key) = node.ty.referenced_record() {
                registry
                    .record_names
                    .entry(key.to_string())
                    .or_insert_with(|| name.clone());
            }

            let fields = record_fields(node);
            if let Some(existing) = registry.structs.get_mut(&name) {
                if existing.fields.is_empty() && !fields.is_empty() {
                    existing.fields = fields;
                }
                return;
            }

            info!("Preprocessing struct {}", name);
            let placement = match self.policy.place_struct(&name) {
                Some(placement) => placement,
                None => {
                    warn!("no struct placement configured, skipping {}", name);
                    Placement::skip()
                }
            };
            debug!("struct {} placed as {:?}", name, placement);

            registry.structs.insert(
                name.clone(),
                StructInfo {
                    name,
                    placement,
                    is_union: node.kind == ClangNodeKind::UnionDecl,
                    fields,
                },
            );
        });
    }

    /// Register every function definition; prototypes are ignored.
    pub fn collect_functions(&self, root: &ClangNode, registry: &mut Registry) {
        walk_with_ancestors(root, &mut Vec::new(), &mut |node, _| {
            if node.kind != ClangNodeKind::FunctionDecl || node.function_body().is_none() {
                return;
            }

            info!("Preprocessing function {}", node.spelling);
            let signature = function_signature(node, registry);
            let placement = match self.policy.place_function(&signature) {
                Some(placement) => placement,
                None => {
                    warn!("no function placement configured, skipping {}", node.spelling);
                    Placement::skip()
                }
            };
            debug!("function {} placed as {:?}", node.spelling, placement);

            let arguments = signature
                .params
                .iter()
                .map(|p| (p.name.clone(), p.ty.clone()))
                .collect();
            registry.functions.insert(
                node.spelling.clone(),
                FunctionInfo {
                    name: node.spelling.clone(),
                    signature,
                    arguments,
                    placement,
                },
            );
        });
    }
}

/// Signature view of a function definition.
pub fn function_signature(function: &ClangNode, registry: &Registry) -> FunctionSignature {
    let params = function
        .children
        .iter()
        .filter(|c| c.kind == ClangNodeKind::ParmDecl)
        .enumerate()
        .map(|(i, param)| {
            // Array parameters are pointers
            let ty = match &param.ty {
                CType::Array { element, .. } => CType::Pointer(element.clone()),
                other => other.clone(),
            };
            let name = if param.spelling.is_empty() {
                format!("arg{}", i)
            } else {
                sanitize_identifier(&param.spelling)
            };
            Parameter {
                name,
                rendered_type: registry.render_type(&ty),
                ty,
            }
        })
        .collect();

    let (return_type, is_variadic) = match &function.ty {
        CType::Function {
            return_type,
            is_variadic,
            ..
        } => (return_type.as_ref().clone(), *is_variadic),
        _ => (CType::Void, false),
    };

    FunctionSignature {
        name: function.spelling.clone(),
        params,
        return_type,
        is_variadic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::SingleBuffer;

    fn field(name: &str, ty: CType) -> ClangNode {
        ClangNode::new(ClangNodeKind::FieldDecl)
            .with_spelling(name)
            .with_type(ty)
    }

    /// `typedef struct { int x; } point;` as libclang lists it: the record at
    /// file scope and again under the typedef.
    fn anonymous_typedef_tu() -> ClangNode {
        let key = "(unnamed struct at a.c:1:9)";
        let record = ClangNode::new(ClangNodeKind::StructDecl)
            .with_type(CType::record(key))
            .with_usr("c:a.c@9@S@a.c@9")
            .with_child(field("x", CType::int()));
        let typedef = ClangNode::new(ClangNodeKind::TypedefDecl)
            .with_spelling("point")
            .with_type(CType::record(key))
            .with_child(record.clone());
        ClangNode::new(ClangNodeKind::TranslationUnit).with_children(vec![record, typedef])
    }

    #[test]
    fn test_anonymous_struct_takes_typedef_name() {
        let tu = anonymous_typedef_tu();
        let mut registry = Registry::new();
        DeclarationCollector::new(&SingleBuffer::new("out")).collect_structs(&tu, &mut registry);

        let names: Vec<_> = registry.structs().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["point"]);
        assert_eq!(registry.record_name("(unnamed struct at a.c:1:9)"), "point");
        assert_eq!(
            registry.struct_info("point").unwrap().fields,
            vec![FieldInfo {
                name: "x".to_string(),
                ty: CType::int()
            }]
        );
    }

    #[test]
    fn test_anonymous_resolution_is_idempotent() {
        let tu = anonymous_typedef_tu();
        let copy_under_typedef = &tu.children[1].children[0];
        let from_file_scope = resolve_tag_name(&tu.children[0], &[&tu]);
        let from_typedef = resolve_tag_name(copy_under_typedef, &[&tu, &tu.children[1]]);
        assert_eq!(from_file_scope, "point");
        assert_eq!(from_typedef, "point");
    }

    #[test]
    fn test_nested_anonymous_record_takes_field_name() {
        // struct outer { struct { int a; } *inner; };
        let key = "(unnamed struct at a.c:2:5)";
        let inner = ClangNode::new(ClangNodeKind::StructDecl)
            .with_type(CType::record(key))
            .with_usr("c:@S@outer@Sa")
            .with_child(field("a", CType::int()));
        let outer = ClangNode::new(ClangNodeKind::StructDecl)
            .with_spelling("outer")
            .with_type(CType::record("outer"))
            .with_usr("c:@S@outer")
            .with_children(vec![inner, field("inner", CType::record(key).ptr())]);
        let tu = ClangNode::new(ClangNodeKind::TranslationUnit).with_child(outer);

        let mut registry = Registry::new();
        DeclarationCollector::new(&SingleBuffer::new("out")).collect_structs(&tu, &mut registry);
        assert!(registry.struct_info("inner").is_some());
        assert_eq!(registry.render_type(&CType::record(key).ptr()), "*mut inner");
    }

    #[test]
    fn test_unreferenced_anonymous_record_uses_placeholder() {
        let record = ClangNode::new(ClangNodeKind::StructDecl)
            .with_type(CType::record("(anonymous struct at a.c:1:1)"))
            .with_child(field("x", CType::int()));
        let tu = ClangNode::new(ClangNodeKind::TranslationUnit).with_child(record);
        assert_eq!(resolve_tag_name(&tu.children[0], &[&tu]), ANONYMOUS_PLACEHOLDER);
    }

    #[test]
    fn test_system_header_records_are_skipped() {
        let record = ClangNode::new(ClangNodeKind::StructDecl)
            .with_spelling("FILE_impl")
            .with_type(CType::record("FILE_impl"))
            .in_system_header();
        let tu = ClangNode::new(ClangNodeKind::TranslationUnit).with_child(record);
        let mut registry = Registry::new();
        DeclarationCollector::new(&SingleBuffer::new("out")).collect_structs(&tu, &mut registry);
        assert_eq!(registry.structs().count(), 0);
    }

    #[test]
    fn test_unconfigured_policy_still_registers() {
        let record = ClangNode::new(ClangNodeKind::StructDecl)
            .with_spelling("point")
            .with_type(CType::record("point"));
        let tu = ClangNode::new(ClangNodeKind::TranslationUnit).with_child(record);
        let mut registry = Registry::new();
        DeclarationCollector::new(&crate::placement::Unconfigured)
            .collect_structs(&tu, &mut registry);
        assert!(registry.struct_info("point").unwrap().placement.is_skipped());
    }

    #[test]
    fn test_functions_without_body_are_ignored() {
        let prototype = ClangNode::new(ClangNodeKind::FunctionDecl)
            .with_spelling("puts")
            .with_type(CType::function(CType::int(), vec![CType::char().ptr()]));
        let definition = ClangNode::new(ClangNodeKind::FunctionDecl)
            .with_spelling("main")
            .with_type(CType::function(CType::int(), vec![]))
            .with_child(ClangNode::new(ClangNodeKind::CompoundStmt));
        let tu = ClangNode::new(ClangNodeKind::TranslationUnit)
            .with_children(vec![prototype, definition]);

        let mut registry = Registry::new();
        DeclarationCollector::new(&SingleBuffer::new("out")).collect_functions(&tu, &mut registry);
        assert!(registry.function("puts").is_none());
        assert!(registry.function("main").is_some());
    }

    #[test]
    fn test_signature_decays_arrays_and_names_unnamed_params() {
        let function = ClangNode::new(ClangNodeKind::FunctionDecl)
            .with_spelling("fill")
            .with_type(CType::function(CType::Void, vec![]))
            .with_children(vec![
                ClangNode::new(ClangNodeKind::ParmDecl)
                    .with_spelling("buf")
                    .with_type(CType::char().array(16)),
                ClangNode::new(ClangNodeKind::ParmDecl).with_type(CType::int()),
                ClangNode::new(ClangNodeKind::ParmDecl)
                    .with_spelling("type")
                    .with_type(CType::int()),
            ]);
        let sig = function_signature(&function, &Registry::new());
        assert_eq!(sig.rendered(), "buf: *mut i8, arg1: i32, r#type: i32");
    }

    #[test]
    fn test_resolve_function_by_either_name() {
        struct Rename;
        impl PlacementPolicy for Rename {
            fn place_function(&self, sig: &FunctionSignature) -> Option<Placement> {
                Some(Placement::to("out").renamed(format!("ur_{}", sig.name)))
            }
        }

        let definition = ClangNode::new(ClangNodeKind::FunctionDecl)
            .with_spelling("helper")
            .with_type(CType::function(CType::Void, vec![]))
            .with_child(ClangNode::new(ClangNodeKind::CompoundStmt));
        let tu = ClangNode::new(ClangNodeKind::TranslationUnit).with_child(definition);

        let mut registry = Registry::new();
        DeclarationCollector::new(&Rename).collect_functions(&tu, &mut registry);
        assert_eq!(registry.resolve_function("helper").unwrap().target_name(), "ur_helper");
        assert_eq!(registry.resolve_function("ur_helper").unwrap().name, "helper");
        assert!(registry.resolve_function("other").is_none());
    }
}
