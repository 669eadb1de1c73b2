//! Recursive-descent parser: token stream (C2) to untyped AST (C3).
//!
//! Parse errors are accumulated as [`Diagnostic`]s rather than aborting at
//! the first problem. When a production cannot be completed the parser
//! skips forward to the next plausible recovery point (the next top-level
//! keyword, or the next section keyword inside a behaviour) so that one
//! malformed declaration doesn't hide errors in the rest of the file.

use act_base::{Diagnostic, Diagnostics, Span};
use num_bigint::BigInt;

use crate::ast::*;
use crate::token::{EnvVar, Token, TokenKind, TypeFamily};

/// Parses a complete token stream into a [`RawProgram`].
///
/// Returns the partial program built so far alongside accumulated
/// diagnostics; callers should treat the program as unusable (but may still
/// render what was recovered) when `diagnostics().is_empty()` is false.
pub fn parse(tokens: Vec<Token>) -> (RawProgram, Diagnostics) {
    let mut p = Parser::new(tokens);
    let program = p.parse_program();
    (program, p.diags)
}

/// Sentinel used internally to mean "a diagnostic was already recorded for
/// this failure"; propagated with `?` instead of a richer error type
/// because every failure path already pushes its own message.
type PResult<T> = Result<T, ()>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diags: Diagnostics,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diags: Diagnostics::new(),
        }
    }

    // -- token stream primitives -----------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            let span = self.span();
            self.error(span, format!("expected {kind:?}, found {:?}", self.peek_kind()));
            Err(())
        }
    }

    fn expect_ident(&mut self) -> PResult<(String, Span)> {
        let span = self.span();
        if let TokenKind::Ident(name) = self.peek_kind().clone() {
            self.bump();
            Ok((name, span))
        } else {
            self.error(span, format!("expected identifier, found {:?}", self.peek_kind()));
            Err(())
        }
    }

    fn error(&mut self, span: Span, msg: impl Into<String>) {
        self.diags.push(span, msg);
    }

    /// Skips tokens until the next one for which `is_boundary` holds, or EOF.
    /// Used after a production fails so the parser can keep finding further
    /// errors instead of stopping at the first one.
    fn recover_until(&mut self, is_boundary: impl Fn(&TokenKind) -> bool) {
        while !matches!(self.peek_kind(), TokenKind::Eof) && !is_boundary(self.peek_kind()) {
            self.bump();
        }
    }

    fn is_top_level_start(kind: &TokenKind) -> bool {
        matches!(kind, TokenKind::Behaviour | TokenKind::Constructor | TokenKind::Eof)
    }

    // -- top level ---------------------------------------------------------

    fn parse_program(&mut self) -> RawProgram {
        let mut decls = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Eof) {
            match self.parse_behaviour() {
                Ok(b) => decls.push(b),
                Err(()) => self.recover_until(Self::is_top_level_start),
            }
        }
        decls
    }

    fn parse_behaviour(&mut self) -> PResult<RawBehaviour> {
        match self.peek_kind() {
            TokenKind::Behaviour => self.parse_transition().map(RawBehaviour::Transition),
            TokenKind::Constructor => self.parse_constructor().map(RawBehaviour::Definition),
            other => {
                let span = self.span();
                self.error(span, format!("expected 'behaviour' or 'constructor', found {other:?}"));
                Err(())
            }
        }
    }

    fn parse_transition(&mut self) -> PResult<RawTransition> {
        let start = self.span();
        self.expect(&TokenKind::Behaviour)?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Of)?;
        let (contract, _) = self.expect_ident()?;
        let interface = self.parse_interface()?;

        let iff = self.parse_opt_condition_section(&TokenKind::Iff)?;
        let cases = self.parse_cases()?;
        let ensures = self.parse_opt_condition_section(&TokenKind::Ensures)?;

        let end = self.prev_span();
        Ok(RawTransition {
            name,
            contract,
            interface,
            iff,
            cases,
            ensures,
            span: start.merge(end),
        })
    }

    fn parse_constructor(&mut self) -> PResult<RawConstructor> {
        let start = self.span();
        self.expect(&TokenKind::Constructor)?;
        self.expect(&TokenKind::Of)?;
        let (contract, _) = self.expect_ident()?;
        let interface = self.parse_interface()?;

        let iff = self.parse_opt_condition_section(&TokenKind::Iff)?;
        let ensures = self.parse_opt_condition_section(&TokenKind::Ensures)?;
        let invariants = self.parse_opt_condition_section(&TokenKind::Invariants)?;
        let creates = self.parse_opt_creates_section()?;

        let end = self.prev_span();
        Ok(RawConstructor {
            contract,
            interface,
            iff,
            ensures,
            invariants,
            creates,
            span: start.merge(end),
        })
    }

    fn prev_span(&self) -> Span {
        let idx = self.pos.saturating_sub(1);
        self.tokens[idx].span
    }

    // -- interface -----------------------------------------------------------

    fn parse_interface(&mut self) -> PResult<Interface> {
        let start = self.span();
        self.expect(&TokenKind::Interface)?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_arg_decl()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let end = self.prev_span();
        Ok(Interface {
            name,
            args,
            span: start.merge(end),
        })
    }

    fn parse_arg_decl(&mut self) -> PResult<ArgDecl> {
        let start = self.span();
        let ty = self.parse_type_name()?;
        let (name, _) = self.expect_ident()?;
        let end = self.prev_span();
        Ok(ArgDecl {
            ty,
            name,
            span: start.merge(end),
        })
    }

    fn parse_type_name(&mut self) -> PResult<TypeName> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::TypeName(TypeFamily::Uint, w) => {
                self.bump();
                Ok(TypeName::Uint(w))
            }
            TokenKind::TypeName(TypeFamily::Int, w) => {
                self.bump();
                Ok(TypeName::Int(w))
            }
            TokenKind::TypeName(TypeFamily::Bytes, w) => {
                self.bump();
                Ok(TypeName::Bytes(w))
            }
            TokenKind::Ident(name) if name == "bool" => {
                self.bump();
                Ok(TypeName::Bool)
            }
            TokenKind::Ident(name) if name == "address" => {
                self.bump();
                Ok(TypeName::Address)
            }
            TokenKind::Ident(name) => {
                self.bump();
                Ok(TypeName::Custom(name))
            }
            other => {
                self.error(span, format!("expected a type name, found {other:?}"));
                Err(())
            }
        }
    }

    fn parse_slot_type(&mut self) -> PResult<RawSlotType> {
        if self.eat(&TokenKind::Mapping) {
            self.expect(&TokenKind::LParen)?;
            let mut keys = vec![self.parse_type_name()?];
            while self.eat(&TokenKind::Comma) {
                keys.push(self.parse_type_name()?);
            }
            self.expect(&TokenKind::RParen)?;
            let value = self.parse_type_name()?;
            Ok(RawSlotType::Mapping { keys, value })
        } else {
            Ok(RawSlotType::Value(self.parse_type_name()?))
        }
    }

    // -- condition sections (iff / ensures / invariants) ----------------------

    /// Parses `keyword Expr+`, stopping before the next section keyword,
    /// `case`, or a top-level start. Returns an empty vec (no error) if the
    /// section keyword is absent, since every one of these sections is
    /// optional at the grammar level (semantic requiredness, e.g. that a
    /// constructor's `invariants` aren't optional in spirit, is a
    /// typechecker concern).
    fn parse_opt_condition_section(&mut self, keyword: &TokenKind) -> PResult<Vec<Expr>> {
        if !self.eat(keyword) {
            return Ok(Vec::new());
        }
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expr()?);
            if self.at_section_boundary() {
                break;
            }
        }
        Ok(exprs)
    }

    fn at_section_boundary(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Iff
                | TokenKind::Ensures
                | TokenKind::Invariants
                | TokenKind::Creates
                | TokenKind::Case
                | TokenKind::Storage
                | TokenKind::Returns
                | TokenKind::Behaviour
                | TokenKind::Constructor
                | TokenKind::RBrace
                | TokenKind::Eof
        )
    }

    // -- creates -----------------------------------------------------------

    fn parse_opt_creates_section(&mut self) -> PResult<Vec<RawCreateAssign>> {
        if !self.eat(&TokenKind::Creates) {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        while !self.at_section_boundary() {
            out.push(self.parse_create_assign()?);
            self.eat(&TokenKind::Semi);
        }
        Ok(out)
    }

    fn parse_create_assign(&mut self) -> PResult<RawCreateAssign> {
        let start = self.span();
        let slot_ty = self.parse_slot_type()?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;

        match slot_ty {
            RawSlotType::Value(ty) => {
                if self.at(&TokenKind::LBrace) {
                    // struct-literal-shaped creates assignment: accepted by
                    // the grammar, rejected downstream (spec §9).
                    self.skip_balanced_braces()?;
                    let end = self.prev_span();
                    return Ok(RawCreateAssign::Struct {
                        name,
                        span: start.merge(end),
                    });
                }
                let rhs = self.parse_expr()?;
                let end = self.prev_span();
                Ok(RawCreateAssign::Value {
                    ty,
                    name,
                    rhs,
                    span: start.merge(end),
                })
            }
            RawSlotType::Mapping { keys: ty_keys, value: ty_val } => {
                self.expect(&TokenKind::LBrace)?;
                let mut entries = Vec::new();
                if !self.at(&TokenKind::RBrace) {
                    loop {
                        let keys = self.parse_mapping_key_list()?;
                        self.expect(&TokenKind::Arrow)?;
                        let value = self.parse_expr()?;
                        entries.push((keys, value));
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                let end = self.prev_span();
                Ok(RawCreateAssign::Mapping {
                    ty_keys,
                    ty_val,
                    name,
                    entries,
                    span: start.merge(end),
                })
            }
        }
    }

    fn parse_mapping_key_list(&mut self) -> PResult<Vec<Expr>> {
        self.expect(&TokenKind::LBracket)?;
        let mut keys = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            keys.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(keys)
    }

    /// Consumes a `{ ... }` group with balanced nested braces, without
    /// interpreting its contents. Used only for the struct-literal creates
    /// stub, whose shape is never given semantics downstream.
    fn skip_balanced_braces(&mut self) -> PResult<()> {
        self.expect(&TokenKind::LBrace)?;
        let mut depth = 1usize;
        loop {
            match self.peek_kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return Ok(());
                    }
                }
                TokenKind::Eof => {
                    let span = self.span();
                    self.error(span, "unterminated '{' in creates assignment");
                    return Err(());
                }
                _ => {}
            }
            self.bump();
        }
    }

    // -- cases ---------------------------------------------------------------

    fn parse_cases(&mut self) -> PResult<RawCases> {
        if self.at(&TokenKind::Case) {
            let mut cases = Vec::new();
            while self.at(&TokenKind::Case) {
                cases.push(self.parse_case()?);
            }
            Ok(RawCases::Cases(cases))
        } else {
            Ok(RawCases::Direct(self.parse_case_leaf()?))
        }
    }

    fn parse_case(&mut self) -> PResult<RawCase> {
        let start = self.span();
        self.expect(&TokenKind::Case)?;
        let guard = if self.eat(&TokenKind::Underscore) {
            RawCaseGuard::Wildcard
        } else {
            RawCaseGuard::Cond(self.parse_expr()?)
        };
        self.expect(&TokenKind::Colon)?;

        let body = if self.eat(&TokenKind::LBrace) {
            let mut nested = Vec::new();
            while self.at(&TokenKind::Case) {
                nested.push(self.parse_case()?);
            }
            self.expect(&TokenKind::RBrace)?;
            RawCaseBody::Nested(nested)
        } else {
            RawCaseBody::Leaf(self.parse_case_leaf()?)
        };

        let end = self.prev_span();
        Ok(RawCase {
            guard,
            body,
            span: start.merge(end),
        })
    }

    fn parse_case_leaf(&mut self) -> PResult<CaseLeaf> {
        let start = self.span();
        let mut storage = Vec::new();
        if self.eat(&TokenKind::Storage) {
            while !self.at_section_boundary() && !self.at(&TokenKind::Returns) {
                storage.push(self.parse_rewrite()?);
                self.eat(&TokenKind::Semi);
            }
        }
        let returns = if self.eat(&TokenKind::Returns) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.prev_span();
        Ok(CaseLeaf {
            storage,
            returns,
            span: start.merge(end),
        })
    }

    fn parse_rewrite(&mut self) -> PResult<RawRewrite> {
        let start = self.span();
        let entry = self.parse_raw_entry()?;
        let rhs = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.prev_span();
        Ok(RawRewrite {
            entry,
            rhs,
            span: start.merge(end),
        })
    }

    fn parse_raw_entry(&mut self) -> PResult<RawEntry> {
        let start = self.span();
        let (base, _) = self.expect_ident()?;
        let mut indices = Vec::new();
        while self.eat(&TokenKind::LBracket) {
            indices.push(self.parse_expr()?);
            self.expect(&TokenKind::RBracket)?;
        }
        let field = if self.eat(&TokenKind::DotDot) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };
        let at_contract = if self.eat(&TokenKind::At) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };
        let end = self.prev_span();
        Ok(RawEntry {
            base,
            indices,
            field,
            at_contract,
            span: start.merge(end),
        })
    }

    // -- expressions -----------------------------------------------------------
    //
    // Precedence, low to high:
    //   or
    //   and
    //   comparison (==, =/=, <, <=, >, >=)   (non-associative pairs chain left)
    //   concat (++)
    //   additive (+, -)
    //   multiplicative (*, /, %)
    //   exponent (^)                          (right-associative)
    //   unary (not, -)
    //   `in range`                            (postfix)
    //   primary

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.parse_and()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&TokenKind::And) {
            let rhs = self.parse_comparison()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_concat()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Neq => BinOp::Neq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_concat()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_concat(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_additive()?;
        while self.eat(&TokenKind::Concat) {
            let rhs = self.parse_additive()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op: BinOp::Concat,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_exponent()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_exponent()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    /// Right-associative: `2 ^ 3 ^ 2` parses as `2 ^ (3 ^ 2)`.
    fn parse_exponent(&mut self) -> PResult<Expr> {
        let base = self.parse_unary()?;
        if self.eat(&TokenKind::Caret) {
            let rhs = self.parse_exponent()?;
            let span = base.span().merge(rhs.span());
            Ok(Expr::Binary {
                op: BinOp::Exp,
                lhs: Box::new(base),
                rhs: Box::new(rhs),
                span,
            })
        } else {
            Ok(base)
        }
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.span();
        if self.eat(&TokenKind::Not) {
            let expr = self.parse_unary()?;
            let span = start.merge(expr.span());
            return Ok(Expr::Unary {
                op: UnOp::Not,
                expr: Box::new(expr),
                span,
            });
        }
        if self.eat(&TokenKind::Minus) {
            let expr = self.parse_unary()?;
            let span = start.merge(expr.span());
            return Ok(Expr::Unary {
                op: UnOp::Neg,
                expr: Box::new(expr),
                span,
            });
        }
        self.parse_in_range()
    }

    fn parse_in_range(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.at(&TokenKind::In) {
            self.bump();
            self.expect(&TokenKind::Range)?;
            let ty = self.parse_type_name()?;
            let span = expr.span();
            expr = Expr::InRange {
                expr: Box::new(expr),
                ty,
                span,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.span();
        match self.peek_kind().clone() {
            TokenKind::IntLit(digits) => {
                self.bump();
                let value = digits
                    .parse::<BigInt>()
                    .expect("lexer only emits ASCII-digit runs");
                Ok(Expr::IntLit(value, start))
            }
            TokenKind::True => {
                self.bump();
                Ok(Expr::BoolLit(true, start))
            }
            TokenKind::False => {
                self.bump();
                Ok(Expr::BoolLit(false, start))
            }
            TokenKind::StrLit(s) => {
                self.bump();
                Ok(Expr::ByteStrLit(s, start))
            }
            TokenKind::EnvIdent(env) => {
                self.bump();
                Ok(Expr::EnvVar(env, start))
            }
            TokenKind::If => self.parse_ite(),
            TokenKind::Ident(name) if name == "pre" || name == "post" => {
                self.parse_timed_entry(if name == "pre" { TimeWrap::Pre } else { TimeWrap::Post })
            }
            TokenKind::Ident(_) => self.parse_ident_headed_expr(),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            other => {
                self.error(start, format!("expected an expression, found {other:?}"));
                Err(())
            }
        }
    }

    fn parse_ite(&mut self) -> PResult<Expr> {
        let start = self.span();
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Then)?;
        let then_branch = self.parse_expr()?;
        self.expect(&TokenKind::Else)?;
        let else_branch = self.parse_expr()?;
        let span = start.merge(else_branch.span());
        Ok(Expr::Ite {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span,
        })
    }

    /// `pre(entry)` / `post(entry)`: explicit timing wrapper around a
    /// storage entry, legal anywhere a `Neither`-timed reference would
    /// otherwise be ambiguous (spec §5's `setTime` elaboration target).
    fn parse_timed_entry(&mut self, time: TimeWrap) -> PResult<Expr> {
        self.bump(); // `pre` / `post` identifier
        self.expect(&TokenKind::LParen)?;
        let entry = self.parse_raw_entry()?;
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Entry {
            entry,
            time: Some(time),
        })
    }

    /// An identifier in expression position is either a bare calldata
    /// variable or the head of a storage entry (`name`, `name[i]`,
    /// `name..field`, `name at Contract`); disambiguated by whether any of
    /// `[`, `..`, or `at` follows.
    fn parse_ident_headed_expr(&mut self) -> PResult<Expr> {
        let checkpoint = self.pos;
        let (name, span) = self.expect_ident()?;
        let looks_like_entry = matches!(
            self.peek_kind(),
            TokenKind::LBracket | TokenKind::DotDot | TokenKind::At
        );
        if !looks_like_entry {
            return Ok(Expr::Var(name, span));
        }
        self.pos = checkpoint;
        let entry = self.parse_raw_entry()?;
        Ok(Expr::Entry { entry, time: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_ok(src: &str) -> RawProgram {
        let (tokens, lex_diags) = Lexer::new(src).tokenize();
        assert!(lex_diags.is_empty(), "unexpected lex errors: {lex_diags}");
        let (program, diags) = parse(tokens);
        assert!(diags.is_empty(), "unexpected parse errors: {diags}");
        program
    }

    #[test]
    fn parses_direct_behaviour_with_storage_and_returns() {
        let program = parse_ok(
            "behaviour transfer of Token\n\
             interface transfer(uint256 value, address to)\n\
             iff\n  value <= balanceOf[CALLER]\n\
             storage\n  balanceOf[CALLER] => balanceOf[CALLER] - value\n  balanceOf[to] => balanceOf[to] + value\n\
             returns true\n",
        );
        assert_eq!(program.len(), 1);
        let RawBehaviour::Transition(t) = &program[0] else {
            panic!("expected a transition");
        };
        assert_eq!(t.name, "transfer");
        assert_eq!(t.contract, "Token");
        assert_eq!(t.interface.args.len(), 2);
        assert_eq!(t.iff.len(), 1);
        let RawCases::Direct(leaf) = &t.cases else {
            panic!("expected a direct (case-less) body");
        };
        assert_eq!(leaf.storage.len(), 2);
        assert!(leaf.returns.is_some());
    }

    #[test]
    fn parses_explicit_cases_with_wildcard() {
        let program = parse_ok(
            "behaviour withdraw of Vault\n\
             interface withdraw(uint256 amount)\n\
             case amount <= balance[CALLER]:\n  storage\n    balance[CALLER] => balance[CALLER] - amount\n\
             case _:\n  returns false\n",
        );
        let RawBehaviour::Transition(t) = &program[0] else {
            panic!("expected a transition");
        };
        let RawCases::Cases(cases) = &t.cases else {
            panic!("expected explicit cases");
        };
        assert_eq!(cases.len(), 2);
        assert!(matches!(cases[0].guard, RawCaseGuard::Cond(_)));
        assert!(matches!(cases[1].guard, RawCaseGuard::Wildcard));
    }

    #[test]
    fn parses_constructor_with_creates() {
        let program = parse_ok(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n  mapping(address) uint256 balanceOf := {[CALLER] => supply}\n\
             invariants\n  totalSupply >= 0\n",
        );
        let RawBehaviour::Definition(c) = &program[0] else {
            panic!("expected a constructor");
        };
        assert_eq!(c.creates.len(), 2);
        assert_eq!(c.invariants.len(), 1);
        assert!(matches!(c.creates[0], RawCreateAssign::Value { .. }));
        assert!(matches!(c.creates[1], RawCreateAssign::Mapping { .. }));
    }

    #[test]
    fn exponent_is_right_associative() {
        let program = parse_ok(
            "behaviour f of C\ninterface f()\nreturns 2 ^ 3 ^ 2\n",
        );
        let RawBehaviour::Transition(t) = &program[0] else {
            panic!("expected a transition");
        };
        let RawCases::Direct(leaf) = &t.cases else {
            panic!("expected a direct body");
        };
        let Some(Expr::Binary { op: BinOp::Exp, rhs, .. }) = &leaf.returns else {
            panic!("expected a top-level exponent");
        };
        assert!(matches!(**rhs, Expr::Binary { op: BinOp::Exp, .. }));
    }

    #[test]
    fn reports_error_and_recovers_at_next_behaviour() {
        let (tokens, _) = Lexer::new(
            "behaviour bad of\ninterface bad()\nreturns true\n\
             behaviour ok of C\ninterface ok()\nreturns false\n",
        )
        .tokenize();
        let (program, diags) = parse(tokens);
        assert!(!diags.is_empty());
        assert_eq!(program.len(), 1);
        let RawBehaviour::Transition(t) = &program[0] else {
            panic!("expected a transition");
        };
        assert_eq!(t.name, "ok");
    }

    #[test]
    fn round_trips_through_the_pretty_printer() {
        let src = "behaviour transfer of Token\n\
                   interface transfer(uint256 value, address to)\n\
                   iff\n  value <= balanceOf[CALLER]\n\
                   storage\n  balanceOf[CALLER] => balanceOf[CALLER] - value\n\
                   returns true\n";
        let first = parse_ok(src);
        let printed = crate::pretty::print_program(&first);
        let second = parse_ok(&printed);
        assert_eq!(first, second);
    }
}
