//! Canonical surface-syntax pretty-printer for the untyped AST.
//!
//! This module exists for one reason: spec §8's round-trip testable
//! property ("lex → parse → pretty-print → lex → parse again yields the
//! same tree") needs a printer. It is not a code formatter and makes no
//! attempt to preserve the original source's whitespace, comment
//! placement, or operator spelling choices — only its meaning.

use std::fmt::Write as _;

use crate::ast::*;

pub fn print_program(program: &RawProgram) -> String {
    let mut out = String::new();
    for (i, b) in program.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        print_behaviour(&mut out, b);
    }
    out
}

fn print_behaviour(out: &mut String, b: &RawBehaviour) {
    match b {
        RawBehaviour::Transition(t) => print_transition(out, t),
        RawBehaviour::Definition(c) => print_constructor(out, c),
    }
}

fn print_transition(out: &mut String, t: &RawTransition) {
    let _ = writeln!(out, "behaviour {} of {}", t.name, t.contract);
    print_interface(out, &t.interface);
    print_condition_section(out, "iff", &t.iff);
    print_cases(out, &t.cases);
    print_condition_section(out, "ensures", &t.ensures);
}

fn print_constructor(out: &mut String, c: &RawConstructor) {
    let _ = writeln!(out, "constructor of {}", c.contract);
    print_interface(out, &c.interface);
    print_condition_section(out, "iff", &c.iff);
    print_condition_section(out, "ensures", &c.ensures);
    print_condition_section(out, "invariants", &c.invariants);
    if !c.creates.is_empty() {
        let _ = writeln!(out, "creates");
        for assign in &c.creates {
            print_create_assign(out, assign);
        }
    }
}

fn print_interface(out: &mut String, iface: &Interface) {
    let args: Vec<String> = iface
        .args
        .iter()
        .map(|a| format!("{} {}", print_type_name(&a.ty), a.name))
        .collect();
    let _ = writeln!(out, "interface {}({})", iface.name, args.join(", "));
}

fn print_condition_section(out: &mut String, keyword: &str, exprs: &[Expr]) {
    if exprs.is_empty() {
        return;
    }
    let _ = writeln!(out, "{keyword}");
    for e in exprs {
        let _ = writeln!(out, "  {}", print_expr(e));
    }
}

fn print_cases(out: &mut String, cases: &RawCases) {
    match cases {
        RawCases::Direct(leaf) => print_case_leaf(out, leaf),
        RawCases::Cases(list) => {
            for case in list {
                print_case(out, case);
            }
        }
    }
}

fn print_case(out: &mut String, case: &RawCase) {
    let guard = match &case.guard {
        RawCaseGuard::Wildcard => "_".to_string(),
        RawCaseGuard::Cond(e) => print_expr(e),
    };
    let _ = writeln!(out, "case {guard}:");
    match &case.body {
        RawCaseBody::Leaf(leaf) => print_case_leaf(out, leaf),
        RawCaseBody::Nested(nested) => {
            let _ = writeln!(out, "{{");
            for c in nested {
                print_case(out, c);
            }
            let _ = writeln!(out, "}}");
        }
    }
}

fn print_case_leaf(out: &mut String, leaf: &CaseLeaf) {
    if !leaf.storage.is_empty() {
        let _ = writeln!(out, "storage");
        for rw in &leaf.storage {
            print_rewrite(out, rw);
        }
    }
    if let Some(ret) = &leaf.returns {
        let _ = writeln!(out, "returns {}", print_expr(ret));
    }
}

fn print_rewrite(out: &mut String, rw: &RawRewrite) {
    match &rw.rhs {
        Some(rhs) => {
            let _ = writeln!(out, "  {} => {}", print_entry(&rw.entry), print_expr(rhs));
        }
        None => {
            let _ = writeln!(out, "  {}", print_entry(&rw.entry));
        }
    }
}

fn print_create_assign(out: &mut String, assign: &RawCreateAssign) {
    match assign {
        RawCreateAssign::Value { ty, name, rhs, .. } => {
            let _ = writeln!(out, "  {} {} := {}", print_type_name(ty), name, print_expr(rhs));
        }
        RawCreateAssign::Mapping {
            ty_keys,
            ty_val,
            name,
            entries,
            ..
        } => {
            let keys = ty_keys.iter().map(print_type_name).collect::<Vec<_>>().join(", ");
            let entries_str = entries
                .iter()
                .map(|(idx, v)| {
                    let idx_str = idx.iter().map(print_expr).collect::<Vec<_>>().join("][");
                    format!("[{idx_str}] => {}", print_expr(v))
                })
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                "  mapping({keys}) {} {name} := {{{entries_str}}}",
                print_type_name(ty_val)
            );
        }
        RawCreateAssign::Struct { name, .. } => {
            let _ = writeln!(out, "  {name} := {{ ... }}");
        }
    }
}

fn print_entry(entry: &RawEntry) -> String {
    let mut s = entry.base.clone();
    for idx in &entry.indices {
        s.push('[');
        s.push_str(&print_expr(idx));
        s.push(']');
    }
    if let Some(field) = &entry.field {
        s.push_str("..");
        s.push_str(field);
    }
    if let Some(contract) = &entry.at_contract {
        s.push_str(" at ");
        s.push_str(contract);
    }
    s
}

fn print_type_name(ty: &TypeName) -> String {
    match ty {
        TypeName::Uint(256) => "uint".to_string(),
        TypeName::Uint(w) => format!("uint{w}"),
        TypeName::Int(256) => "int".to_string(),
        TypeName::Int(w) => format!("int{w}"),
        TypeName::Bytes(w) => format!("bytes{w}"),
        TypeName::Bool => "bool".to_string(),
        TypeName::Address => "address".to_string(),
        TypeName::Custom(name) => name.clone(),
    }
}

fn print_expr(e: &Expr) -> String {
    match e {
        Expr::IntLit(v, _) => v.to_string(),
        Expr::BoolLit(true, _) => "true".to_string(),
        Expr::BoolLit(false, _) => "false".to_string(),
        Expr::ByteStrLit(s, _) => format!("\"{s}\""),
        Expr::EnvVar(env, _) => env.smt_name().to_uppercase(),
        Expr::Var(name, _) => name.clone(),
        Expr::Entry { entry, time } => {
            let inner = print_entry(entry);
            match time {
                Some(TimeWrap::Pre) => format!("pre({inner})"),
                Some(TimeWrap::Post) => format!("post({inner})"),
                None => inner,
            }
        }
        Expr::Unary { op, expr, .. } => {
            let sym = match op {
                UnOp::Not => "not ",
                UnOp::Neg => "-",
            };
            format!("{sym}{}", print_expr_parenthesized(expr))
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            format!(
                "{} {} {}",
                print_expr_parenthesized(lhs),
                bin_op_symbol(*op),
                print_expr_parenthesized(rhs)
            )
        }
        Expr::Ite {
            cond,
            then_branch,
            else_branch,
            ..
        } => format!(
            "if {} then {} else {}",
            print_expr(cond),
            print_expr(then_branch),
            print_expr(else_branch)
        ),
        Expr::InRange { expr, ty, .. } => format!("{} in range {}", print_expr(expr), print_type_name(ty)),
    }
}

fn print_expr_parenthesized(e: &Expr) -> String {
    match e {
        Expr::Binary { .. } | Expr::Ite { .. } => format!("({})", print_expr(e)),
        _ => print_expr(e),
    }
}

fn bin_op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Exp => "^",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::Eq => "==",
        BinOp::Neq => "=/=",
        BinOp::And => "and",
        BinOp::Or => "or",
        BinOp::Concat => "++",
    }
}
