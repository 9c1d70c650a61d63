//! End-to-end conversion through libclang.
//!
//! Tests that parse need a libclang shared library at runtime and skip otherwise.

use std::io::Write;
use ur_clang::{ClangParser, ParseOptions};
use ur_convert::{
    convert, ConversionParameters, ConversionProcessor, ConvertError, FunctionSignature,
    Placement, PlacementPolicy, SingleBuffer,
};

fn parser() -> Option<ClangParser> {
    match ClangParser::new() {
        Ok(parser) => Some(parser),
        Err(err) => {
            eprintln!("Skipping test: libclang not available ({})", err);
            None
        }
    }
}

const SOURCE: &str = r#"
typedef struct { int x; int y; } point;

enum mode { OFF, ON = 3, AUTO };

static int calls = 0;

int twice(int v);

int sum_to(int n) {
    int sum = 0;
    int i;
    for (i = 0; i < n; i++)
        sum += twice(i);
    return sum;
}

int twice(int v) {
    calls++;
    return v * 2;
}
"#;

fn convert_source(
    source: &str,
    params: ConversionParameters,
) -> Option<indexmap::IndexMap<String, String>> {
    let parser = parser()?;
    let ast = parser
        .parse_string(source, "sample.c", &ParseOptions::default())
        .expect("Failed to parse");
    Some(ConversionProcessor::new(params).run(&ast.translation_unit))
}

#[test]
fn test_convert_sample_unit() {
    let params = ConversionParameters::new("sample.c").with_policy(SingleBuffer::new("sample"));
    let Some(buffers) = convert_source(SOURCE, params) else { return };

    let out = &buffers["sample"];
    println!("{}", out);

    assert!(out.starts_with("// Generated by Ur at "));
    assert_eq!(out.matches("use c_runtime;").count(), 1);

    assert_eq!(out.matches("struct point {").count(), 1);
    assert!(out.contains("    x: i32,"));
    assert!(out.contains("const OFF: i32 = 0;"));
    assert!(out.contains("const ON: i32 = 3;"));
    assert!(out.contains("const AUTO: i32 = 4;"));
    assert!(out.contains("static mut calls: i32 = 0;"));

    assert!(out.contains("unsafe fn sum_to(n: i32) -> i32 {"));
    assert!(out.contains("while i < n {"));
    assert!(out.contains("sum += twice(i);"));
    assert!(out.contains("i += 1;"));
    assert!(out.contains("calls += 1;"));
    assert!(out.contains("return v * 2;"));

    // enums, then globals, then structs, then functions
    let order: Vec<usize> = ["const OFF", "static mut calls", "struct point", "unsafe fn sum_to"]
        .iter()
        .map(|needle| out.find(needle).expect("declaration missing"))
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]), "order: {:?}", order);
}

struct Prefixed;

impl PlacementPolicy for Prefixed {
    fn place_struct(&self, _name: &str) -> Option<Placement> {
        Some(Placement::to("types"))
    }

    fn place_function(&self, signature: &FunctionSignature) -> Option<Placement> {
        Some(Placement::to("code").renamed(format!("c_{}", signature.name)))
    }
}

#[test]
fn test_renamed_callee_resolves_before_its_definition() {
    let params = ConversionParameters::new("sample.c").with_policy(Prefixed);
    let Some(buffers) = convert_source(SOURCE, params) else { return };

    let code = &buffers["code"];
    assert!(code.contains("unsafe fn c_twice(v: i32) -> i32 {"));
    assert!(code.contains("sum += c_twice(i);"));
    assert!(!code.contains("struct point"));
    // No enum or global placement configured
    assert!(buffers.values().all(|text| !text.contains("calls: i32 = 0")));
}

#[test]
fn test_switch_and_null_pointers() {
    let source = r#"
        void a(void); void b(void); void c(void);
        int pick(int x, char *p) {
            switch (x) {
            case 1: a(); break;
            case 2: b(); break;
            default: c();
            }
            if (p == 0) return 0;
            return !p;
        }
    "#;
    let params = ConversionParameters::new("switch.c").with_policy(SingleBuffer::new("out"));
    let Some(buffers) = convert_source(source, params) else { return };

    let out = &buffers["out"];
    assert!(out.contains("if x == 1 {"));
    assert!(out.contains("} else if x == 2 {"));
    assert!(out.contains("} else {"));
    assert!(out.contains("if p == std::ptr::null_mut() {"));
    assert!(out.contains("return p == std::ptr::null_mut();"));
}

#[test]
fn test_step_only_for_loop_steps_every_iteration() {
    let source = r#"
        int count(int i) {
            for (;; i = i + 1) {
                if (i > 2) break;
            }
            return i;
        }
    "#;
    let params = ConversionParameters::new("count.c").with_policy(SingleBuffer::new("out"));
    let Some(buffers) = convert_source(source, params) else { return };

    let out = &buffers["out"];
    assert!(out.contains("loop {"));
    assert!(out.contains("        i = i + 1;\n    }\n    return i;"));
    assert!(!out.contains("    i = i + 1;\n    loop {"));
}

#[test]
fn test_nested_break_in_switch_keeps_looping() {
    let source = r#"
        void a(void); void b(void);
        void run(int k, int x, int y) {
            while (k) {
                switch (x) {
                case 1: if (y) break; a(); break;
                }
                b();
                k--;
            }
        }
    "#;
    let params = ConversionParameters::new("run.c").with_policy(SingleBuffer::new("out"));
    let Some(buffers) = convert_source(source, params) else { return };

    let out = &buffers["out"];
    assert!(out.contains("'switch: {"));
    assert!(out.contains("break 'switch;"));
    assert!(out.contains("b();"));
}

#[test]
fn test_enum_after_shifted_value() {
    let source = "enum flags { A = 1 << 2, B };";
    let params = ConversionParameters::new("flags.c").with_policy(SingleBuffer::new("out"));
    let Some(buffers) = convert_source(source, params) else { return };

    assert!(buffers["out"].contains("const B: i32 = 5;"));
}

#[test]
fn test_missing_input_is_reported() {
    let params = ConversionParameters::new("/nonexistent/input.c");
    let err = convert(params).unwrap_err();
    assert!(matches!(err, ConvertError::InputNotFound(_)));
    assert!(err.to_string().contains("/nonexistent/input.c"));
}

#[test]
fn test_convert_reads_file() {
    if parser().is_none() {
        return;
    }

    let mut file = tempfile::Builder::new()
        .suffix(".c")
        .tempfile()
        .expect("Failed to create temp file");
    writeln!(
        file,
        "#ifndef SCALE\n#define SCALE 1\n#endif\nint scale(int v) {{ return v * SCALE; }}"
    )
    .expect("Failed to write temp file");

    let params = ConversionParameters::new(file.path())
        .with_defines(["SCALE=4"])
        .with_policy(SingleBuffer::new("out"));
    let buffers = convert(params).expect("Failed to convert");

    assert!(buffers["out"].contains("return v * 4;"));
}
