//! Integration tests for libclang parsing.
//!
//! These need a libclang shared library at runtime and skip otherwise.

use ur_clang::{BinaryOp, CType, ClangNode, ClangNodeKind, ClangParser, ParseOptions, UnaryOp};

fn parser() -> Option<ClangParser> {
    match ClangParser::new() {
        Ok(parser) => Some(parser),
        Err(err) => {
            eprintln!("Skipping test: libclang not available ({})", err);
            None
        }
    }
}

fn find<'a>(root: &'a ClangNode, pred: impl Fn(&ClangNode) -> bool) -> Option<&'a ClangNode> {
    let mut found = None;
    root.walk(&mut |node| {
        if found.is_none() && pred(node) {
            found = Some(node);
        }
    });
    found
}

/// Test parsing a simple add function.
#[test]
fn test_parse_add_function() {
    let Some(parser) = parser() else { return };

    let source = r#"
        int add(int a, int b) {
            return a + b;
        }
    "#;

    let ast = parser
        .parse_string(source, "add.c", &ParseOptions::default())
        .expect("Failed to parse");

    assert!(matches!(
        ast.translation_unit.kind,
        ClangNodeKind::TranslationUnit
    ));

    let add = find(&ast.translation_unit, |n| {
        n.kind == ClangNodeKind::FunctionDecl && n.spelling == "add"
    })
    .expect("add not found");
    assert_eq!(
        add.ty,
        CType::function(CType::int(), vec![CType::int(), CType::int()])
    );
    assert!(add.function_body().is_some());

    let plus = find(add, |n| {
        n.kind == ClangNodeKind::BinaryOperator(BinaryOp::Add)
    });
    assert!(plus.is_some());
}

#[test]
fn test_operators_and_literals() {
    let Some(parser) = parser() else { return };

    let source = r#"
        int f(int x) {
            x += 0x10u;
            x++;
            return !x;
        }
    "#;

    let ast = parser
        .parse_string(source, "ops.c", &ParseOptions::default())
        .expect("Failed to parse");
    let root = &ast.translation_unit;

    assert!(find(root, |n| {
        n.kind == ClangNodeKind::CompoundAssignOperator(BinaryOp::AddAssign)
    })
    .is_some());
    assert!(find(root, |n| n.kind == ClangNodeKind::UnaryOperator(UnaryOp::PostInc)).is_some());
    assert!(find(root, |n| n.kind == ClangNodeKind::UnaryOperator(UnaryOp::LNot)).is_some());

    let literal = find(root, |n| n.kind == ClangNodeKind::IntegerLiteral)
        .expect("literal not found");
    assert_eq!(literal.tokens, vec!["0x10u".to_string()]);
}

#[test]
fn test_var_decl_flags() {
    let Some(parser) = parser() else { return };

    let source = r#"
        extern int counter;
        const int limit = 4;
        char *name;
    "#;

    let ast = parser
        .parse_string(source, "vars.c", &ParseOptions::default())
        .expect("Failed to parse");
    let vars: Vec<_> = ast
        .translation_unit
        .children
        .iter()
        .filter(|c| matches!(c.kind, ClangNodeKind::VarDecl { .. }))
        .collect();

    assert_eq!(vars.len(), 3);
    assert_eq!(
        vars[0].kind,
        ClangNodeKind::VarDecl {
            is_const: false,
            is_extern: true
        }
    );
    assert_eq!(
        vars[1].kind,
        ClangNodeKind::VarDecl {
            is_const: true,
            is_extern: false
        }
    );
    assert_eq!(vars[2].ty, CType::char().ptr());
}

#[test]
fn test_anonymous_struct_has_empty_spelling() {
    let Some(parser) = parser() else { return };

    let source = "typedef struct { int x; } point;";

    let ast = parser
        .parse_string(source, "anon.c", &ParseOptions::default())
        .expect("Failed to parse");

    let record = find(&ast.translation_unit, |n| n.kind == ClangNodeKind::StructDecl)
        .expect("struct not found");
    // Newer libclang spells the tag after its typedef
    assert!(record.spelling.is_empty() || record.spelling == "point");
    assert!(!record.usr.is_empty());

    let typedef = find(&ast.translation_unit, |n| n.kind == ClangNodeKind::TypedefDecl)
        .expect("typedef not found");
    assert_eq!(typedef.spelling, "point");
    assert!(matches!(typedef.ty, CType::Record(_)));
}

#[test]
fn test_defines_reach_preprocessor() {
    let Some(parser) = parser() else { return };

    let source = r#"
        #ifdef WITH_HELPER
        int helper(void) { return 1; }
        #endif
    "#;

    let options = ParseOptions {
        defines: vec!["WITH_HELPER".to_string()],
        ..Default::default()
    };
    let ast = parser
        .parse_string(source, "defs.c", &options)
        .expect("Failed to parse");
    assert!(find(&ast.translation_unit, |n| n.spelling == "helper").is_some());

    let ast = parser
        .parse_string(source, "defs.c", &ParseOptions::default())
        .expect("Failed to parse");
    assert!(find(&ast.translation_unit, |n| n.spelling == "helper").is_none());
}

#[test]
fn test_for_header_tokens_stop_at_body() {
    let Some(parser) = parser() else { return };

    let source = r#"
        void spin(int i) {
            for (;; i = i + 1) {
                if (i > 2) break;
            }
        }
    "#;

    let ast = parser
        .parse_string(source, "spin.c", &ParseOptions::default())
        .expect("Failed to parse");
    let node = find(&ast.translation_unit, |n| n.kind == ClangNodeKind::ForStmt)
        .expect("for not found");
    assert_eq!(
        node.tokens,
        vec!["for", "(", ";", ";", "i", "=", "i", "+", "1", ")"]
    );
    // Step and body only; the null clauses have no cursor
    assert_eq!(node.children.len(), 2);
}

#[test]
fn test_enumerator_values_are_computed() {
    let Some(parser) = parser() else { return };

    let source = "enum flags { A = 1 << 2, B, C = -1, D };";
    let ast = parser
        .parse_string(source, "flags.c", &ParseOptions::default())
        .expect("Failed to parse");

    let values: Vec<(String, Option<i64>)> = ast
        .translation_unit
        .children
        .iter()
        .flat_map(|decl| decl.children.iter())
        .filter(|n| n.kind == ClangNodeKind::EnumConstantDecl)
        .map(|n| (n.spelling.clone(), n.value))
        .collect();
    assert_eq!(
        values,
        vec![
            ("A".to_string(), Some(4)),
            ("B".to_string(), Some(5)),
            ("C".to_string(), Some(-1)),
            ("D".to_string(), Some(0)),
        ]
    );
}
