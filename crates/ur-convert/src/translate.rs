//! The node translator: one C AST node in, one fragment of Rust text out.
//!
//! Translation is a function of the node, the registries and an explicit
//! [`TranslationContext`]; nothing is remembered between calls. Control flow
//! that Rust lacks is desugared here:
//!
//! ```text
//! for (init; cond; step) body   →  init; while cond { body; step; }
//! do body while (cond);         →  loop { body; if !(cond) { break; } }
//! switch (x) { case ... }       →  if x == a { .. } else if x == b { .. } else { .. }
//! ```
//!
//! A `break` nested inside a switch arm leaves the switch, so such a chain is
//! wrapped in a labelled block and the nested `break` names that label.

use crate::collect::Registry;
use crate::cursor::{CursorInfo, CursorProcessResult};
use crate::literal;
use crate::names::{
    as_expression, as_statement, block, deparentize, null_if_zero, parentize, sanitize_identifier,
    zero_value, NULL,
};
use tracing::{debug, warn};
use ur_clang::{BinaryOp, CType, ClangNode, ClangNodeKind, UnaryOp};

/// Allocation expression for local arrays whose initializer is not copied.
const UNINIT: &str = "unsafe { std::mem::MaybeUninit::uninit().assume_init() }";

/// Which declaration pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    Enums,
    GlobalVariables,
    Structs,
    #[default]
    Functions,
}

/// State threaded through every recursive translation call.
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    /// Return type of the enclosing function
    pub return_type: CType,
    /// Scrutinee text of the innermost switch
    pub switch_expression: Option<String>,
    /// Number of enclosing switches
    pub switch_depth: usize,
    /// Indent level the fragment will be written at
    pub indent: usize,
    /// Buffer the fragment will be written to
    pub buffer: String,
    pub phase: Phase,
    /// Statements a `continue` must run first (desugared `for` step, `do` check)
    pub loop_step: Option<String>,
    /// Block label a `break` leaves through, inside a labelled switch chain
    pub break_label: Option<String>,
}

impl TranslationContext {
    pub fn new(phase: Phase, buffer: impl Into<String>) -> Self {
        Self {
            phase,
            buffer: buffer.into(),
            ..Default::default()
        }
    }

    /// Context for the body of a function returning `return_type`.
    pub fn for_function(return_type: CType, buffer: impl Into<String>) -> Self {
        Self {
            return_type,
            ..Self::new(Phase::Functions, buffer)
        }
    }

    fn in_loop(&self, step: Option<String>) -> Self {
        Self {
            loop_step: step,
            break_label: None,
            ..self.clone()
        }
    }

    fn in_switch(&self, scrutinee: String, break_label: Option<String>) -> Self {
        Self {
            switch_expression: Some(scrutinee),
            switch_depth: self.switch_depth + 1,
            break_label,
            ..self.clone()
        }
    }
}

/// One `case`/`default` group of a switch body.
#[derive(Debug, Default)]
struct SwitchArm<'a> {
    labels: Vec<&'a ClangNode>,
    is_default: bool,
    body: Vec<&'a ClangNode>,
}

impl<'a> SwitchArm<'a> {
    /// Arm statements with one level of braces removed.
    fn flattened(&self) -> impl Iterator<Item = &'a ClangNode> + '_ {
        self.body.iter().copied().flat_map(|stmt: &'a ClangNode| match stmt.kind {
            ClangNodeKind::CompoundStmt => stmt.children.iter().collect::<Vec<_>>(),
            _ => vec![stmt],
        })
    }
}

/// Converts AST nodes into Rust text.
pub struct Translator<'r> {
    registry: &'r Registry,
}

impl<'r> Translator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Translate a node into its result record.
    pub fn process<'a>(
        &self,
        node: &'a ClangNode,
        ctx: &TranslationContext,
    ) -> CursorProcessResult<'a> {
        let info = CursorInfo::new(node);
        let expression = self.translate(&info, ctx);
        CursorProcessResult::new(info, expression)
    }

    /// Translate a node used as a value.
    pub fn expression(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        as_expression(&self.translate_node(node, ctx)).to_string()
    }

    /// Translate a node in statement position; comma expressions are split.
    pub fn statements(&self, node: &ClangNode, ctx: &TranslationContext) -> Vec<String> {
        match node.kind {
            ClangNodeKind::BinaryOperator(BinaryOp::Comma) => node
                .children
                .iter()
                .flat_map(|child| self.statements(child, ctx))
                .collect(),
            _ => {
                let text = as_statement(&self.translate_node(node, ctx));
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
        }
    }

    pub fn render_type(&self, ty: &CType) -> String {
        self.registry.render_type(ty)
    }

    /// Rewrite a numeric or pointer value consumed as a condition into an
    /// explicit comparison. Values that are already truth values are kept.
    pub fn materialize(&self, node: &ClangNode, text: String) -> String {
        if text.is_empty() || yields_bool(node) {
            return text;
        }

        let inner = node.ignore_parens_and_casts();
        let ty = if node.ty.is_void() { &inner.ty } else { &node.ty };
        if ty.is_pointer() || ty.is_array() {
            format!("{} != {}", parentize(&text), NULL)
        } else if ty.is_floating() {
            format!("{} != 0.0", parentize(&text))
        } else if ty.is_integer() {
            format!("{} != 0", parentize(&text))
        } else {
            text
        }
    }

    fn translate_node(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        self.translate(&CursorInfo::new(node), ctx)
    }

    fn translate(&self, info: &CursorInfo<'_>, ctx: &TranslationContext) -> String {
        let node = info.node;
        match info.kind() {
            ClangNodeKind::TranslationUnit => self.pass_through(node, ctx),

            // Declarations are emitted by their own passes
            ClangNodeKind::StructDecl
            | ClangNodeKind::UnionDecl
            | ClangNodeKind::EnumDecl
            | ClangNodeKind::TypedefDecl
            | ClangNodeKind::FunctionDecl
            | ClangNodeKind::ParmDecl => String::new(),
            // The explicit value, if any
            ClangNodeKind::EnumConstantDecl => node
                .children
                .first()
                .map(|value| self.expression(value, ctx))
                .unwrap_or_default(),
            ClangNodeKind::FieldDecl => format!(
                "{}: {}",
                sanitize_identifier(info.spelling()),
                self.render_type(info.ty())
            ),
            ClangNodeKind::VarDecl { .. } => self.var_decl(info, ctx),

            ClangNodeKind::TypeRef => self.render_type(info.ty()),
            ClangNodeKind::LabelRef => info.spelling().to_string(),

            ClangNodeKind::CompoundStmt => block(&self.body_statements(node, ctx)),
            ClangNodeKind::DeclStmt => node
                .children
                .iter()
                .map(|decl| as_statement(&self.translate_node(decl, ctx)))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            ClangNodeKind::ReturnStmt => self.return_stmt(node, ctx),
            ClangNodeKind::IfStmt => self.if_stmt(node, ctx),
            ClangNodeKind::WhileStmt => self.while_stmt(node, ctx),
            ClangNodeKind::DoStmt => self.do_stmt(node, ctx),
            ClangNodeKind::ForStmt => self.for_stmt(node, ctx),
            ClangNodeKind::SwitchStmt => self.switch_stmt(node, ctx),
            ClangNodeKind::CaseStmt | ClangNodeKind::DefaultStmt => {
                warn!("case label outside a switch body at {}", node.location);
                node.children
                    .last()
                    .map(|stmt| self.statements(stmt, ctx).join("\n"))
                    .unwrap_or_default()
            }
            ClangNodeKind::BreakStmt => match &ctx.break_label {
                Some(label) => format!("break {}", label),
                None => "break".to_string(),
            },
            ClangNodeKind::ContinueStmt => match &ctx.loop_step {
                Some(step) => format!("{}\ncontinue", as_statement(step)),
                None => "continue".to_string(),
            },
            ClangNodeKind::GotoStmt => {
                let label = node
                    .children
                    .first()
                    .map(|target| target.spelling.clone())
                    .unwrap_or_else(|| node.spelling.clone());
                warn!("goto {} has no Rust equivalent, emitted verbatim", label);
                format!("goto {}", label)
            }
            ClangNodeKind::LabelStmt => self.label_stmt(node, ctx),
            ClangNodeKind::NullStmt => String::new(),

            ClangNodeKind::IntegerLiteral => literal::integer_literal(first_token(node)),
            ClangNodeKind::FloatingLiteral => literal::float_literal(first_token(node)),
            ClangNodeKind::CharacterLiteral => literal::char_literal(first_token(node)),
            ClangNodeKind::StringLiteral => literal::string_literal(info.spelling()),

            ClangNodeKind::DeclRefExpr => self.decl_ref(node),
            ClangNodeKind::MemberRefExpr => {
                let field = sanitize_identifier(info.spelling());
                match node.children.first().map(|base| self.expression(base, ctx)) {
                    Some(base) if !base.is_empty() => format!("{}.{}", base, field),
                    _ => field,
                }
            }
            ClangNodeKind::CallExpr => self.call(node, ctx),
            ClangNodeKind::BinaryOperator(op) | ClangNodeKind::CompoundAssignOperator(op) => {
                self.binary(node, *op, ctx)
            }
            ClangNodeKind::UnaryOperator(op) => self.unary(node, *op, ctx),
            ClangNodeKind::UnaryExpr => self.unary_expr(node),
            ClangNodeKind::ArraySubscriptExpr => match (node.child(0), node.child(1)) {
                (Some(base), Some(index)) => format!(
                    "{}[{}]",
                    self.expression(base, ctx),
                    self.expression(index, ctx)
                ),
                _ => self.pass_through(node, ctx),
            },
            ClangNodeKind::ConditionalOperator => {
                match (node.child(0), node.child(1), node.child(2)) {
                    (Some(cond), Some(then), Some(otherwise)) => format!(
                        "if {} {{ {} }} else {{ {} }}",
                        self.condition(cond, ctx),
                        self.expression(then, ctx),
                        self.expression(otherwise, ctx)
                    ),
                    _ => self.pass_through(node, ctx),
                }
            }
            ClangNodeKind::ParenExpr => {
                let inner = node
                    .children
                    .first()
                    .map(|child| self.expression(child, ctx))
                    .unwrap_or_default();
                if inner.is_empty() {
                    inner
                } else {
                    format!("({})", inner)
                }
            }
            // Casts are dropped; only the operand is kept
            ClangNodeKind::CStyleCastExpr | ClangNodeKind::UnexposedExpr => {
                null_if_zero(self.pass_through(node, ctx), info.ty())
            }
            ClangNodeKind::InitListExpr => self.init_list(node, ctx),

            ClangNodeKind::Unknown(kind) => {
                debug!("passing through unhandled {} at {}", kind, node.location);
                self.pass_through(node, ctx)
            }
        }
    }

    /// Text of the last child, or nothing.
    fn pass_through(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        node.children
            .last()
            .map(|child| self.translate_node(child, ctx))
            .unwrap_or_default()
    }

    /// Statements of a loop or branch body, unwrapping one block level.
    fn body_statements(&self, node: &ClangNode, ctx: &TranslationContext) -> Vec<String> {
        match node.kind {
            ClangNodeKind::CompoundStmt => node
                .children
                .iter()
                .flat_map(|stmt| self.statements(stmt, ctx))
                .collect(),
            _ => self.statements(node, ctx),
        }
    }

    fn var_decl(&self, info: &CursorInfo<'_>, ctx: &TranslationContext) -> String {
        let node = info.node;
        let name = sanitize_identifier(info.spelling());
        let ty = info.ty();
        let init = initializer(node);

        let value = if ctx.phase == Phase::Functions && info.is_array && ty.array_size().is_some() {
            if init.is_some() {
                warn!(
                    "initializer of local array {} is not copied; the array starts uninitialized",
                    name
                );
            }
            Some(UNINIT.to_string())
        } else {
            init.map(|init| self.expression(init, ctx))
                .filter(|text| !text.is_empty())
                .map(|text| null_if_zero(text, ty))
        };
        let value = value.unwrap_or_else(|| zero_value(ty, &|t: &CType| self.render_type(t)));

        let declaration = format!("{}: {} = {};", name, self.render_type(ty), value);
        match ctx.phase {
            Phase::Functions => format!("let mut {}", declaration),
            _ => declaration,
        }
    }

    fn decl_ref(&self, node: &ClangNode) -> String {
        if node.ty.is_function() {
            if let Some(function) = self.registry.function(&node.spelling) {
                return function.target_name();
            }
        }
        sanitize_identifier(&node.spelling)
    }

    fn call(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let Some((callee, args)) = node.children.split_first() else {
            return sanitize_identifier(&node.spelling);
        };

        let callee_text = self.expression(callee, ctx);
        let function = self.registry.resolve_function(deparentize(&callee_text));
        let name = match function {
            Some(function) => function.target_name(),
            None => callee_text.clone(),
        };

        let args: Vec<String> = args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let text = self.expression(arg, ctx);
                match function.and_then(|f| f.arguments.get_index(i)) {
                    Some((_, ty)) => null_if_zero(text, ty),
                    None => text,
                }
            })
            .collect();

        format!("{}({})", name, args.join(", "))
    }

    fn binary(&self, node: &ClangNode, op: BinaryOp, ctx: &TranslationContext) -> String {
        let (Some(lhs), Some(rhs)) = (node.child(0), node.child(1)) else {
            return self.pass_through(node, ctx);
        };

        if op == BinaryOp::Comma {
            let parts = self.statements(node, ctx);
            return format!("{{ {} }}", parts.join(" "));
        }

        let mut a = self.expression(lhs, ctx);
        let mut b = self.expression(rhs, ctx);

        if op.is_logical() {
            a = self.materialize(lhs, a);
            b = self.materialize(rhs, b);
        }

        if op == BinaryOp::Add {
            if lhs.ty.is_pointer() {
                return format!("{}[{}]", a, b);
            }
            if rhs.ty.is_pointer() {
                return format!("{}[{}]", b, a);
            }
        }

        if op == BinaryOp::Assign || op.is_comparison() {
            b = null_if_zero(b, &lhs.ty);
            if op.is_comparison() {
                a = null_if_zero(a, &rhs.ty);
            }
        }

        let text = format!("{} {} {}", a, op.spelling(), b);
        if op.is_assignment() {
            format!("{};", text)
        } else {
            text
        }
    }

    fn unary(&self, node: &ClangNode, op: UnaryOp, ctx: &TranslationContext) -> String {
        let Some(operand) = node.child(0) else {
            return String::new();
        };
        let a = self.expression(operand, ctx);

        match op {
            UnaryOp::PreInc | UnaryOp::PostInc => format!("{} += 1", a),
            UnaryOp::PreDec | UnaryOp::PostDec => format!("{} -= 1", a),
            // Address-of and dereference stay implicit
            UnaryOp::AddrOf | UnaryOp::Deref | UnaryOp::Plus | UnaryOp::Other => a,
            UnaryOp::Minus => format!("-{}", a),
            UnaryOp::Not => format!("!{}", a),
            UnaryOp::LNot => {
                let inner = operand.ignore_parens_and_casts();
                if operand.ty.is_pointer() || inner.ty.is_pointer() {
                    format!("{} == {}", parentize(&a), NULL)
                } else if yields_bool(operand) {
                    format!("!{}", parentize(&a))
                } else if operand.ty.is_floating() {
                    format!("{} == 0.0", parentize(&a))
                } else {
                    format!("{} == 0", parentize(&a))
                }
            }
        }
    }

    /// `sizeof` and `alignof`.
    fn unary_expr(&self, node: &ClangNode) -> String {
        let op = node.tokens.first().map(String::as_str).unwrap_or("sizeof");
        match op {
            "alignof" | "_Alignof" | "__alignof" | "__alignof__" => "4".to_string(),
            "sizeof" => {
                let ty = match node.children.first() {
                    Some(operand) => operand.ty.clone(),
                    None => type_from_tokens(&node.tokens),
                };
                format!("std::mem::size_of::<{}>()", self.render_type(&ty))
            }
            _ => node.tokens.concat(),
        }
    }

    fn return_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let value = node
            .children
            .first()
            .map(|child| self.expression(child, ctx))
            .unwrap_or_default();

        if value.is_empty() {
            "return".to_string()
        } else if ctx.return_type.is_void() {
            format!("{};\nreturn", value)
        } else {
            format!("return {}", null_if_zero(value, &ctx.return_type))
        }
    }

    fn branch(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        block(&self.body_statements(node, ctx))
    }

    fn condition(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let text = self.expression(node, ctx);
        self.materialize(node, text)
    }

    fn if_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let (Some(cond), Some(then)) = (node.child(0), node.child(1)) else {
            return self.pass_through(node, ctx);
        };

        let mut text = format!("if {} {}", self.condition(cond, ctx), self.branch(then, ctx));
        if let Some(otherwise) = node.child(2) {
            text.push_str(" else ");
            match otherwise.kind {
                ClangNodeKind::IfStmt => text.push_str(&self.if_stmt(otherwise, ctx)),
                _ => text.push_str(&self.branch(otherwise, ctx)),
            }
        }
        text
    }

    fn while_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let (Some(cond), Some(body)) = (node.child(0), node.child(1)) else {
            return self.pass_through(node, ctx);
        };
        let body = self.branch(body, &ctx.in_loop(None));
        format!("while {} {}", self.condition(cond, ctx), body)
    }

    fn do_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let (Some(body), Some(cond)) = (node.child(0), node.child(1)) else {
            return self.pass_through(node, ctx);
        };

        let check = format!(
            "if !({}) {{\n    break;\n}}",
            deparentize(&self.condition(cond, ctx))
        );
        let mut statements = self.body_statements(body, &ctx.in_loop(Some(check.clone())));
        statements.push(check);
        format!("loop {}", block(&statements))
    }

    fn for_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let Some((body, clauses)) = node.children.split_last() else {
            return String::new();
        };
        let (init, cond, step) = match for_header_slots(&node.tokens) {
            Some(slots) => assign_for_clauses(slots, clauses)
                .unwrap_or_else(|| classify_for_clauses(clauses)),
            None => classify_for_clauses(clauses),
        };

        let mut out = init
            .map(|init| self.statements(init, ctx))
            .unwrap_or_default();

        let step = step
            .map(|step| self.statements(step, ctx))
            .unwrap_or_default();
        let step_text = (!step.is_empty()).then(|| step.join("\n"));

        let mut statements = self.body_statements(body, &ctx.in_loop(step_text));
        statements.extend(step);

        let head = match cond {
            Some(cond) => format!("while {} ", self.condition(cond, ctx)),
            None => "loop ".to_string(),
        };
        out.push(format!("{}{}", head, block(&statements)));
        out.join("\n")
    }

    fn switch_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let (Some(cond), Some(body)) = (node.child(0), node.child(1)) else {
            return self.pass_through(node, ctx);
        };

        let value = self.expression(cond, ctx);
        let mut out = Vec::new();
        let scrutinee = match cond.ignore_parens_and_casts().kind {
            ClangNodeKind::DeclRefExpr
            | ClangNodeKind::IntegerLiteral
            | ClangNodeKind::CharacterLiteral => value,
            _ => {
                // Evaluate once; case comparisons reuse the binding
                let name = match ctx.switch_depth {
                    0 => "switch_value".to_string(),
                    depth => format!("switch_value{}", depth),
                };
                out.push(format!("let {} = {};", name, value));
                name
            }
        };

        let arms = switch_arms(body);
        let last = arms.len().saturating_sub(1);
        // A nested `break` needs a label to leave the chain
        let label = arms
            .iter()
            .any(arm_breaks_early)
            .then(|| match ctx.switch_depth {
                0 => "'switch".to_string(),
                depth => format!("'switch{}", depth),
            });
        let inner = ctx.in_switch(scrutinee.clone(), label.clone());

        let mut chain = String::new();
        let mut default = None;
        for (i, arm) in arms.iter().enumerate() {
            let statements = self.arm_statements(arm, i == last, &inner);
            if arm.is_default {
                default = Some(statements);
                continue;
            }
            let test = arm
                .labels
                .iter()
                .map(|label| format!("{} == {}", scrutinee, self.expression(label, &inner)))
                .collect::<Vec<_>>()
                .join(" || ");
            if !chain.is_empty() {
                chain.push_str(" else ");
            }
            chain.push_str(&format!("if {} {}", test, block(&statements)));
        }
        if let Some(statements) = default {
            if !chain.is_empty() {
                chain.push_str(" else ");
            }
            chain.push_str(&block(&statements));
        }

        if chain.is_empty() {
            return out.join("\n");
        }
        match label {
            Some(label) => {
                out.push(chain);
                format!("{}: {}", label, block(&out))
            }
            None if out.is_empty() => chain,
            None => {
                out.push(chain);
                block(&out)
            }
        }
    }

    /// Statements of one arm, up to its first top-level `break`.
    fn arm_statements(
        &self,
        arm: &SwitchArm<'_>,
        is_last: bool,
        ctx: &TranslationContext,
    ) -> Vec<String> {
        let mut statements = Vec::new();
        let mut terminated = false;
        for stmt in arm.flattened() {
            if stmt.kind == ClangNodeKind::BreakStmt {
                terminated = true;
                break;
            }
            terminated = matches!(
                stmt.kind,
                ClangNodeKind::ReturnStmt | ClangNodeKind::ContinueStmt | ClangNodeKind::GotoStmt
            );
            statements.extend(self.statements(stmt, ctx));
        }

        if !terminated && !is_last {
            warn!(
                "switch case falls through at {}; the generated branch does not",
                arm.body
                    .first()
                    .map(|stmt| stmt.location.to_string())
                    .unwrap_or_default()
            );
        }
        statements
    }

    fn label_stmt(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        warn!("label {} has no Rust equivalent, emitted verbatim", node.spelling);
        let mut lines = vec![format!("{}:;", node.spelling)];
        for child in &node.children {
            lines.extend(self.statements(child, ctx));
        }
        lines.join("\n")
    }

    fn init_list(&self, node: &ClangNode, ctx: &TranslationContext) -> String {
        let render = |t: &CType| self.render_type(t);

        if let CType::Record(key) = &node.ty {
            if let Some(info) = self.registry.struct_for_type(key) {
                if !info.fields.is_empty() {
                    let count = if info.is_union { 1 } else { info.fields.len() };
                    let fields: Vec<String> = info
                        .fields
                        .iter()
                        .take(count)
                        .enumerate()
                        .map(|(i, field)| {
                            let value = match node.child(i) {
                                Some(value) => null_if_zero(self.expression(value, ctx), &field.ty),
                                None => zero_value(&field.ty, &render),
                            };
                            format!("{}: {}", sanitize_identifier(&field.name), value)
                        })
                        .collect();
                    return format!("{} {{ {} }}", info.target_name(), fields.join(", "));
                }
            }
        }

        let element = node.ty.element();
        let mut values: Vec<String> = node
            .children
            .iter()
            .map(|value| {
                let text = self.expression(value, ctx);
                match element {
                    Some(ty) => null_if_zero(text, ty),
                    None => text,
                }
            })
            .collect();
        // C zero-fills the rest of a partially initialised array
        if let (Some(ty), Some(size)) = (element, node.ty.array_size()) {
            while values.len() < size {
                values.push(zero_value(ty, &render));
            }
        }
        format!("[{}]", values.join(", "))
    }
}

/// Whether the node's value is already a truth value.
fn yields_bool(node: &ClangNode) -> bool {
    let inner = node.ignore_parens_and_casts();
    match inner.kind {
        ClangNodeKind::BinaryOperator(op) => op.yields_bool(),
        ClangNodeKind::UnaryOperator(UnaryOp::LNot) => true,
        _ => node.ty == CType::Bool || inner.ty == CType::Bool,
    }
}

fn first_token(node: &ClangNode) -> &str {
    node.tokens
        .first()
        .map(String::as_str)
        .unwrap_or(node.spelling.as_str())
}

/// The initializer child of a variable declaration.
///
/// Array declarations also carry their size expression as a child; only an
/// initializer list or string literal counts as an initializer for them.
pub(crate) fn initializer(var: &ClangNode) -> Option<&ClangNode> {
    let last = var.children.last()?;
    match &last.kind {
        ClangNodeKind::TypeRef
        | ClangNodeKind::StructDecl
        | ClangNodeKind::UnionDecl
        | ClangNodeKind::EnumDecl
        | ClangNodeKind::ParmDecl => None,
        ClangNodeKind::Unknown(kind) if kind.ends_with("Attr") => None,
        _ if var.ty.is_array() => matches!(
            last.kind,
            ClangNodeKind::InitListExpr | ClangNodeKind::StringLiteral
        )
        .then_some(last),
        _ => Some(last),
    }
}

/// Type named by `sizeof ( type-name )` tokens.
fn type_from_tokens(tokens: &[String]) -> CType {
    let mut words = Vec::new();
    let mut depth = 0usize;
    for token in tokens.iter().skip(1) {
        match token.as_str() {
            "(" => {
                depth += 1;
                if depth == 1 {
                    continue;
                }
            }
            ")" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        words.push(token.as_str());
    }
    CType::from_c_spelling(&words.join(" "))
}

fn has_side_effects(node: &ClangNode) -> bool {
    let mut found = false;
    node.walk(&mut |n| {
        found |= match n.kind {
            ClangNodeKind::BinaryOperator(op) => op.is_assignment(),
            ClangNodeKind::CompoundAssignOperator(_)
            | ClangNodeKind::CallExpr
            | ClangNodeKind::DeclStmt => true,
            ClangNodeKind::UnaryOperator(op) => matches!(
                op,
                UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
            ),
            _ => false,
        };
    });
    found
}

/// A clause that reads like a loop condition.
fn is_condition(clause: &ClangNode) -> bool {
    if clause.kind == ClangNodeKind::DeclStmt {
        return false;
    }
    match clause.ignore_parens_and_casts().kind {
        ClangNodeKind::BinaryOperator(op) if op.yields_bool() => true,
        ClangNodeKind::UnaryOperator(UnaryOp::LNot) => true,
        _ => !has_side_effects(clause),
    }
}

fn is_init(clause: &ClangNode) -> bool {
    matches!(
        clause.kind,
        ClangNodeKind::DeclStmt
            | ClangNodeKind::BinaryOperator(BinaryOp::Assign)
            | ClangNodeKind::BinaryOperator(BinaryOp::Comma)
    )
}

type ForClauses<'a> = (Option<&'a ClangNode>, Option<&'a ClangNode>, Option<&'a ClangNode>);

/// Which of the init, condition and step slots a `for` header fills.
///
/// `tokens` is the header as written, `for ( init ; cond ; step )`. Returns
/// `None` when the tokens do not have that shape.
fn for_header_slots(tokens: &[String]) -> Option<[bool; 3]> {
    let mut rest = tokens.iter().map(String::as_str);
    if rest.next() != Some("for") || rest.next() != Some("(") {
        return None;
    }

    let mut slots = [false; 3];
    let mut slot = 0;
    let mut depth = 0usize;
    for token in rest {
        match token {
            ")" | "]" | "}" if depth == 0 => return (slot == 2).then_some(slots),
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth -= 1,
            ";" if depth == 0 => {
                slot += 1;
                if slot > 2 {
                    return None;
                }
                continue;
            }
            _ => {}
        }
        slots[slot] = true;
    }
    None
}

/// Pair the present clauses with the slots the header says they fill.
fn assign_for_clauses(slots: [bool; 3], clauses: &[ClangNode]) -> Option<ForClauses<'_>> {
    if slots.iter().filter(|&&present| present).count() != clauses.len() {
        return None;
    }
    let mut present = clauses.iter();
    let mut take = |filled: bool| if filled { present.next() } else { None };
    Some((take(slots[0]), take(slots[1]), take(slots[2])))
}

/// Split the present clauses of a `for` into (init, condition, step).
///
/// Used when the header tokens are unavailable. libclang only lists clauses
/// that are written, so with fewer than three the roles are guessed from the
/// clauses themselves; a lone assignment reads as the init clause.
fn classify_for_clauses(clauses: &[ClangNode]) -> ForClauses<'_> {
    match clauses {
        [] => (None, None, None),
        [only] if is_condition(only) => (None, Some(only), None),
        [only] if is_init(only) => (Some(only), None, None),
        [only] => (None, None, Some(only)),
        [first, second] => {
            if is_condition(first) && !is_init(first) {
                (None, Some(first), Some(second))
            } else if is_condition(second) {
                (Some(first), Some(second), None)
            } else {
                (Some(first), None, Some(second))
            }
        }
        [init, cond, step, ..] => (Some(init), Some(cond), Some(step)),
    }
}

/// Whether a `break` that leaves the switch sits below the arm's top level.
fn arm_breaks_early(arm: &SwitchArm<'_>) -> bool {
    arm.flattened()
        .take_while(|stmt| stmt.kind != ClangNodeKind::BreakStmt)
        .any(leaves_switch)
}

/// A `break` in this subtree binds to the enclosing switch.
fn leaves_switch(node: &ClangNode) -> bool {
    match node.kind {
        ClangNodeKind::BreakStmt => true,
        ClangNodeKind::WhileStmt
        | ClangNodeKind::DoStmt
        | ClangNodeKind::ForStmt
        | ClangNodeKind::SwitchStmt => false,
        _ => node.children.iter().any(leaves_switch),
    }
}

/// Group a switch body into arms; stacked labels share one arm.
fn switch_arms(body: &ClangNode) -> Vec<SwitchArm<'_>> {
    let statements: Vec<&ClangNode> = match body.kind {
        ClangNodeKind::CompoundStmt => body.children.iter().collect(),
        _ => vec![body],
    };

    let mut arms: Vec<SwitchArm<'_>> = Vec::new();
    for stmt in statements {
        match stmt.kind {
            ClangNodeKind::CaseStmt | ClangNodeKind::DefaultStmt => {
                let mut arm = SwitchArm::default();
                let mut current = stmt;
                loop {
                    match current.kind {
                        ClangNodeKind::CaseStmt => {
                            if let Some(value) = current.child(0) {
                                arm.labels.push(value);
                            }
                            match current.children.last() {
                                Some(next) if current.children.len() > 1 => current = next,
                                _ => break,
                            }
                        }
                        ClangNodeKind::DefaultStmt => {
                            arm.is_default = true;
                            match current.children.last() {
                                Some(next) => current = next,
                                None => break,
                            }
                        }
                        _ => {
                            arm.body.push(current);
                            break;
                        }
                    }
                }
                arms.push(arm);
            }
            _ => match arms.last_mut() {
                Some(arm) => arm.body.push(stmt),
                None => debug!("dropping unreachable statement before the first case"),
            },
        }
    }
    arms
}
