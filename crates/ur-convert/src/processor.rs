//! Drives one conversion run over a translation unit.
//!
//! Structs and functions are collected first; emission then runs in four
//! passes (enums, global variables, structs, functions) so each category
//! lands in its buffers in a fixed order whatever the source order was.

use crate::collect::{resolve_tag_name, walk_with_ancestors, DeclarationCollector, Registry};
use crate::literal::parse_c_integer;
use crate::names::sanitize_identifier;
use crate::output::OutputSet;
use crate::params::ConversionParameters;
use crate::placement::Placement;
use crate::translate::{initializer, Phase, TranslationContext, Translator};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};
use ur_clang::{ClangNode, ClangNodeKind};

/// Converts a translation unit into a set of named output buffers.
pub struct ConversionProcessor {
    params: ConversionParameters,
    registry: Registry,
}

impl ConversionProcessor {
    pub fn new(params: ConversionParameters) -> Self {
        Self {
            params,
            registry: Registry::new(),
        }
    }

    /// Name tables built by the last run.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Convert `root`, returning buffer id → generated text.
    pub fn run(&mut self, root: &ClangNode) -> IndexMap<String, String> {
        let output = OutputSet::new(self.params.preamble.clone());
        self.run_into(root, output)
    }

    /// Convert `root` into a caller-prepared output set.
    pub fn run_into(
        &mut self,
        root: &ClangNode,
        mut output: OutputSet,
    ) -> IndexMap<String, String> {
        self.preprocess(root);

        self.emit_enums(root, &mut output);
        self.emit_globals(root, &mut output);
        self.emit_structs(root, &mut output);
        self.emit_functions(root, &mut output);

        self.params.hooks.before_close(&mut output);
        output.finish()
    }

    /// Both collection passes, to completion, before anything is emitted.
    fn preprocess(&mut self, root: &ClangNode) {
        self.registry = Registry::new();
        let collector = DeclarationCollector::new(self.params.policy.as_ref());
        collector.collect_structs(root, &mut self.registry);
        collector.collect_functions(root, &mut self.registry);
        info!(
            "collected {} structs and {} functions",
            self.registry.structs().count(),
            self.registry.functions().count()
        );
    }

    fn emit_enums(&self, root: &ClangNode, output: &mut OutputSet) {
        let translator = Translator::new(&self.registry);
        let mut seen = FxHashSet::default();

        for (node, name) in tag_declarations(root, &|n| n.kind == ClangNodeKind::EnumDecl) {
            let is_new = if node.usr.is_empty() {
                seen.insert(format!("{:p}", node))
            } else {
                seen.insert(node.usr.clone())
            };
            if !is_new {
                continue;
            }

            let Some(placement) = placed(self.params.policy.place_enum(&name), "enum", &name) else {
                continue;
            };
            let ctx = TranslationContext::new(Phase::Enums, placement.buffer.as_str());

            let mut writer = output.writer(&placement.buffer);
            let mut counter: i64 = 0;
            for constant in &node.children {
                if constant.kind != ClangNodeKind::EnumConstantDecl {
                    continue;
                }
                let explicit = translator.expression(constant, &ctx);
                // libclang's value is exact; hand-built trees fall back to the literal
                if let Some(v) = constant.value.or_else(|| parse_c_integer(&explicit)) {
                    counter = v;
                }
                let value = if explicit.is_empty() {
                    counter.to_string()
                } else {
                    explicit
                };
                writer.writeln(&format!(
                    "const {}: i32 = {};",
                    sanitize_identifier(&constant.spelling),
                    value
                ));
                counter += 1;
            }
            writer.blank_line();
        }
    }

    fn emit_globals(&mut self, root: &ClangNode, output: &mut OutputSet) {
        let Self { params, registry } = self;
        let translator = Translator::new(registry);

        // Tentative definitions repeat a name; the one with an initializer wins
        let mut globals: IndexMap<&str, &ClangNode> = IndexMap::new();
        for node in root.children.iter().filter(|c| !c.in_system_header) {
            let ClangNodeKind::VarDecl { is_extern, .. } = node.kind else {
                continue;
            };
            let has_init = initializer(node).is_some();
            if is_extern && !has_init {
                debug!("skipping extern declaration {}", node.spelling);
                continue;
            }
            match globals.get_mut(node.spelling.as_str()) {
                Some(existing) if has_init => *existing = node,
                Some(_) => {}
                None => {
                    globals.insert(node.spelling.as_str(), node);
                }
            }
        }

        for (name, node) in globals {
            let Some(placement) = placed(params.policy.place_global(name), "global", name) else {
                continue;
            };
            if !placement.rename.is_empty() {
                warn!(
                    "global {} cannot be renamed to {}; keeping its C name",
                    name, placement.rename
                );
            }

            let ctx = TranslationContext::new(Phase::GlobalVariables, placement.buffer.as_str());
            let mut result = translator.process(node, &ctx);
            params.hooks.global_variable(&mut result);
            if result.is_empty() {
                continue;
            }

            let storage = match node.kind {
                ClangNodeKind::VarDecl { is_const: true, .. } => "const",
                _ => "static mut",
            };
            let mut writer = output.writer(&placement.buffer);
            writer.writeln(&format!("{} {}", storage, result.expression.trim()));
            writer.blank_line();
        }
    }

    fn emit_structs(&self, root: &ClangNode, output: &mut OutputSet) {
        let mut visited = FxHashSet::default();

        for (node, name) in tag_declarations(root, &ClangNode::is_record) {
            // Forward declarations carry no fields
            if node.find_child(&ClangNodeKind::FieldDecl).is_none() {
                continue;
            }
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(info) = self.registry.struct_info(&name) else {
                continue;
            };
            if info.placement.is_skipped() {
                debug!("struct {} has no buffer, not emitted", name);
                continue;
            }

            let buffer = info.placement.buffer.clone();
            let keyword = if info.is_union { "union" } else { "struct" };
            {
                let mut writer = output.writer(&buffer);
                writer.writeln("#[derive(Clone, Copy)]");
                writer.writeln("#[repr(C)]");
                writer.writeln(&format!("{} {} {{", keyword, info.target_name()));
            }
            output.indent();
            {
                let mut writer = output.writer(&buffer);
                for field in &info.fields {
                    writer.writeln(&format!(
                        "{}: {},",
                        field.name,
                        self.registry.render_type(&field.ty)
                    ));
                }
            }
            output.outdent();
            let mut writer = output.writer(&buffer);
            writer.writeln("}");
            writer.blank_line();
        }
    }

    fn emit_functions(&mut self, root: &ClangNode, output: &mut OutputSet) {
        let Self { params, registry } = self;
        let translator = Translator::new(registry);

        for node in root.children.iter().filter(|c| !c.in_system_header) {
            let Some(body) = node.function_body() else {
                continue;
            };
            let Some(function) = registry.function(&node.spelling) else {
                continue;
            };
            if function.placement.is_skipped() {
                debug!("function {} has no buffer, not emitted", function.name);
                continue;
            }

            let signature = &function.signature;
            if signature.is_variadic {
                warn!(
                    "variadic function {} is emitted with its named parameters only",
                    function.name
                );
            }

            let name = function.target_name();
            let buffer = function.placement.buffer.as_str();
            let mut header = format!("unsafe fn {}({})", name, signature.rendered());
            if !signature.return_type.is_void() {
                header.push_str(&format!(
                    " -> {}",
                    translator.render_type(&signature.return_type)
                ));
            }
            header.push_str(" {");

            output.writer(buffer).writeln(&header);
            let fragments: Vec<String> = signature.params.iter().map(|p| p.fragment()).collect();
            params.hooks.function_header(&name, &fragments);

            output.indent();
            let mut ctx = TranslationContext::for_function(signature.return_type.clone(), buffer);
            ctx.indent = output.indent_level();
            {
                let mut writer = output.writer(buffer);
                for stmt in &body.children {
                    for line in translator.statements(stmt, &ctx) {
                        writer.writeln(&line);
                    }
                }
            }
            output.outdent();

            let mut writer = output.writer(buffer);
            writer.writeln("}");
            writer.blank_line();
        }
    }
}

/// Ask-the-policy result: `None` when there is nothing to emit.
fn placed(placement: Option<Placement>, category: &str, name: &str) -> Option<Placement> {
    match placement {
        Some(placement) if placement.is_skipped() => {
            debug!("{} {} has no buffer, not emitted", category, name);
            None
        }
        Some(placement) => Some(placement),
        None => {
            warn!("no {} placement configured, skipping {}", category, name);
            None
        }
    }
}

/// Every tag declaration outside system headers, with its resolved name.
fn tag_declarations<'a>(
    root: &'a ClangNode,
    is_tag: &dyn Fn(&ClangNode) -> bool,
) -> Vec<(&'a ClangNode, String)> {
    let mut found = Vec::new();
    walk_with_ancestors(root, &mut Vec::new(), &mut |node, ancestors| {
        if is_tag(node) {
            found.push((node, resolve_tag_name(node, ancestors)));
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorProcessResult;
    use crate::hooks::ConversionHooks;
    use crate::output::Preamble;
    use crate::placement::{FunctionSignature, PlacementPolicy, SingleBuffer};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use ur_clang::{BinaryOp, CType};

    fn fixed_time() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn make_node(kind: ClangNodeKind, children: Vec<ClangNode>) -> ClangNode {
        ClangNode::new(kind).with_children(children)
    }

    fn int(value: &str) -> ClangNode {
        ClangNode::new(ClangNodeKind::IntegerLiteral)
            .with_type(CType::int())
            .with_tokens([value])
    }

    fn global(name: &str, ty: CType, is_const: bool, children: Vec<ClangNode>) -> ClangNode {
        make_node(
            ClangNodeKind::VarDecl {
                is_const,
                is_extern: false,
            },
            children,
        )
        .with_spelling(name)
        .with_type(ty)
    }

    fn field(name: &str, ty: CType) -> ClangNode {
        ClangNode::new(ClangNodeKind::FieldDecl)
            .with_spelling(name)
            .with_type(ty)
    }

    fn record(kind: ClangNodeKind, name: &str, fields: Vec<ClangNode>) -> ClangNode {
        make_node(kind, fields)
            .with_spelling(name)
            .with_type(CType::record(name))
    }

    fn param(name: &str, ty: CType) -> ClangNode {
        ClangNode::new(ClangNodeKind::ParmDecl)
            .with_spelling(name)
            .with_type(ty)
    }

    fn declref(name: &str, ty: CType) -> ClangNode {
        ClangNode::new(ClangNodeKind::DeclRefExpr)
            .with_spelling(name)
            .with_type(ty)
    }

    fn enum_decl(name: &str, constants: Vec<(&str, Option<&str>)>) -> ClangNode {
        let children = constants
            .into_iter()
            .map(|(c, v)| {
                make_node(
                    ClangNodeKind::EnumConstantDecl,
                    v.map(|v| vec![int(v)]).unwrap_or_default(),
                )
                .with_spelling(c)
            })
            .collect();
        make_node(ClangNodeKind::EnumDecl, children)
            .with_spelling(name)
            .with_type(CType::Enum(name.to_string()))
    }

    /// int add(int a, int b) { return a + b; }
    fn add_function() -> ClangNode {
        let sum = make_node(
            ClangNodeKind::BinaryOperator(BinaryOp::Add),
            vec![declref("a", CType::int()), declref("b", CType::int())],
        )
        .with_type(CType::int());
        make_node(
            ClangNodeKind::FunctionDecl,
            vec![
                param("a", CType::int()),
                param("b", CType::int()),
                make_node(
                    ClangNodeKind::CompoundStmt,
                    vec![make_node(ClangNodeKind::ReturnStmt, vec![sum])],
                ),
            ],
        )
        .with_spelling("add")
        .with_type(CType::function(CType::int(), vec![CType::int(), CType::int()]))
    }

    /// Declarations deliberately out of emission order.
    fn sample_unit() -> ClangNode {
        make_node(
            ClangNodeKind::TranslationUnit,
            vec![
                add_function(),
                record(
                    ClangNodeKind::StructDecl,
                    "pair",
                    vec![field("first", CType::int()), field("rest", CType::record("pair").ptr())],
                ),
                global("counter", CType::int(), false, vec![]),
                global("limit", CType::int(), true, vec![int("10")]),
                enum_decl(
                    "color",
                    vec![("RED", None), ("GREEN", Some("4")), ("BLUE", None)],
                ),
            ],
        )
    }

    fn run(root: &ClangNode, params: ConversionParameters) -> IndexMap<String, String> {
        let output = OutputSet::new(params.preamble.clone()).generated_at(fixed_time());
        ConversionProcessor::new(params).run_into(root, output)
    }

    #[test]
    fn test_emission_order_is_fixed() {
        let params = ConversionParameters::new("sample.c").with_policy(SingleBuffer::new("out"));
        let buffers = run(&sample_unit(), params);

        assert_eq!(buffers.len(), 1);
        insta::assert_snapshot!(buffers["out"], @r"
        // Generated by Ur at 2023-11-14T22:13:20Z

        use std;
        use c_runtime;

        const RED: i32 = 0;
        const GREEN: i32 = 4;
        const BLUE: i32 = 5;

        static mut counter: i32 = 0;

        const limit: i32 = 10;

        #[derive(Clone, Copy)]
        #[repr(C)]
        struct pair {
            first: i32,
            rest: *mut pair,
        }

        unsafe fn add(a: i32, b: i32) -> i32 {
            return a + b;
        }
        ");
    }

    struct Split;

    impl PlacementPolicy for Split {
        fn place_struct(&self, _name: &str) -> Option<Placement> {
            Some(Placement::to("types"))
        }

        fn place_enum(&self, _name: &str) -> Option<Placement> {
            Some(Placement::to("types"))
        }

        fn place_global(&self, name: &str) -> Option<Placement> {
            if name == "limit" {
                Some(Placement::skip())
            } else {
                Some(Placement::to("code"))
            }
        }

        fn place_function(&self, signature: &FunctionSignature) -> Option<Placement> {
            Some(Placement::to("code").renamed(format!("c_{}", signature.name)))
        }
    }

    #[test]
    fn test_buffers_are_partitioned() {
        let params = ConversionParameters::new("sample.c").with_policy(Split);
        let buffers = run(&sample_unit(), params);

        assert_eq!(buffers.keys().collect::<Vec<_>>(), ["types", "code"]);
        let types = &buffers["types"];
        let code = &buffers["code"];

        assert!(types.contains("struct pair {"));
        assert!(types.contains("const RED: i32 = 0;"));
        assert!(!types.contains("unsafe fn"));
        assert!(code.contains("unsafe fn c_add(a: i32, b: i32) -> i32 {"));
        assert!(code.contains("static mut counter: i32 = 0;"));
        assert!(!code.contains("struct pair"));
        assert!(!code.contains("limit"));

        for text in buffers.values() {
            assert_eq!(text.matches("// Generated by Ur at").count(), 1);
            assert_eq!(text.matches("use c_runtime;").count(), 1);
        }
    }

    #[test]
    fn test_unconfigured_policy_emits_nothing() {
        let params = ConversionParameters::new("sample.c");
        let mut processor = ConversionProcessor::new(params);
        let buffers = processor.run(&sample_unit());

        assert!(buffers.is_empty());
        // Names are still registered for reference resolution
        assert!(processor.registry().struct_info("pair").is_some());
        assert!(processor.registry().function("add").is_some());
    }

    #[test]
    fn test_enum_counter_follows_computed_values() {
        // enum flags { A = 1 << 2, B };
        let shifted = make_node(
            ClangNodeKind::BinaryOperator(BinaryOp::Shl),
            vec![int("1"), int("2")],
        )
        .with_type(CType::int());
        let flags = make_node(
            ClangNodeKind::EnumDecl,
            vec![
                make_node(ClangNodeKind::EnumConstantDecl, vec![shifted])
                    .with_spelling("A")
                    .with_value(4),
                ClangNode::new(ClangNodeKind::EnumConstantDecl).with_spelling("B"),
            ],
        )
        .with_spelling("flags")
        .with_type(CType::Enum("flags".to_string()));
        let root = make_node(ClangNodeKind::TranslationUnit, vec![flags]);

        let params = ConversionParameters::new("flags.c")
            .with_policy(SingleBuffer::new("out"))
            .with_preamble(None);
        let buffers = run(&root, params);
        let out = &buffers["out"];
        assert!(out.contains("const A: i32 = 1 << 2;\nconst B: i32 = 5;\n"));
    }

    #[test]
    fn test_anonymous_struct_emitted_once() {
        // typedef struct { int x; } point;
        let anonymous = || {
            record(ClangNodeKind::StructDecl, "", vec![field("x", CType::int())])
                .with_type(CType::record("struct (unnamed at a.c:1:9)"))
                .with_usr("c:@SA@point")
        };
        let typedef = make_node(ClangNodeKind::TypedefDecl, vec![anonymous()])
            .with_spelling("point")
            .with_type(CType::record("struct (unnamed at a.c:1:9)"));
        let tu = make_node(ClangNodeKind::TranslationUnit, vec![anonymous(), typedef]);

        let params = ConversionParameters::new("a.c")
            .with_policy(SingleBuffer::new("out"))
            .with_preamble(None);
        let buffers = run(&tu, params);

        assert_eq!(buffers["out"].matches("struct point {").count(), 1);
    }

    #[test]
    fn test_extern_declaration_and_tentative_definitions() {
        let tu = make_node(
            ClangNodeKind::TranslationUnit,
            vec![
                make_node(
                    ClangNodeKind::VarDecl {
                        is_const: false,
                        is_extern: true,
                    },
                    vec![],
                )
                .with_spelling("errno_like")
                .with_type(CType::int()),
                global("hits", CType::int(), false, vec![]),
                global("hits", CType::int(), false, vec![int("3")]),
                global("head", CType::int().ptr(), false, vec![int("0")]),
            ],
        );
        let params = ConversionParameters::new("a.c")
            .with_policy(SingleBuffer::new("out"))
            .with_preamble(None);
        let buffers = run(&tu, params);
        let out = &buffers["out"];

        assert!(!out.contains("errno_like"));
        assert_eq!(out.matches("hits").count(), 1);
        assert!(out.contains("static mut hits: i32 = 3;"));
        assert!(out.contains("static mut head: *mut i32 = std::ptr::null_mut();"));
    }

    #[derive(Default)]
    struct Recorder {
        headers: Rc<RefCell<Vec<String>>>,
    }

    impl ConversionHooks for Recorder {
        fn global_variable(&mut self, result: &mut CursorProcessResult<'_>) {
            result.expression = result.expression.replace("counter", "COUNTER");
        }

        fn function_header(&mut self, name: &str, params: &[String]) {
            self.headers
                .borrow_mut()
                .push(format!("{}({})", name, params.join(", ")));
        }

        fn before_close(&mut self, output: &mut OutputSet) {
            output.writer("out").writeln("// end");
        }
    }

    #[test]
    fn test_hooks_are_called() {
        let headers = Rc::new(RefCell::new(Vec::new()));
        let params = ConversionParameters::new("sample.c")
            .with_policy(SingleBuffer::new("out"))
            .with_preamble(None)
            .with_hooks(Recorder {
                headers: Rc::clone(&headers),
            });
        let buffers = run(&sample_unit(), params);
        let out = &buffers["out"];

        assert!(out.contains("static mut COUNTER: i32 = 0;"));
        assert!(out.ends_with("// end\n"));
        assert_eq!(*headers.borrow(), ["add(a: i32, b: i32)"]);
    }

    #[test]
    fn test_preamble_can_be_disabled() {
        let params = ConversionParameters::new("sample.c")
            .with_policy(SingleBuffer::new("out"))
            .with_preamble(Some(Preamble {
                generated_header: false,
                prelude: vec!["#![allow(non_upper_case_globals)]".to_string()],
            }));
        let buffers = run(&sample_unit(), params);
        assert!(buffers["out"].starts_with("#![allow(non_upper_case_globals)]\n\nconst RED"));
    }

    #[test]
    fn test_function_body_statements_are_indented() {
        // void reset(int *p) { if (p) *p = 0; }
        let deref = make_node(
            ClangNodeKind::UnaryOperator(ur_clang::UnaryOp::Deref),
            vec![declref("p", CType::int().ptr())],
        )
        .with_type(CType::int());
        let assign = make_node(
            ClangNodeKind::BinaryOperator(BinaryOp::Assign),
            vec![deref, int("0")],
        )
        .with_type(CType::int());
        let body = make_node(
            ClangNodeKind::CompoundStmt,
            vec![make_node(
                ClangNodeKind::IfStmt,
                vec![declref("p", CType::int().ptr()), assign],
            )],
        );
        let function = make_node(
            ClangNodeKind::FunctionDecl,
            vec![param("p", CType::int().ptr()), body],
        )
        .with_spelling("reset")
        .with_type(CType::function(CType::Void, vec![CType::int().ptr()]));
        let tu = make_node(ClangNodeKind::TranslationUnit, vec![function]);

        let params = ConversionParameters::new("a.c")
            .with_policy(SingleBuffer::new("out"))
            .with_preamble(None);
        let buffers = run(&tu, params);

        insta::assert_snapshot!(buffers["out"], @r"
        unsafe fn reset(p: *mut i32) {
            if p != std::ptr::null_mut() {
                p = 0;
            }
        }
        ");
    }
}
