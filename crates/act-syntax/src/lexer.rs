//! Context-free tokenizer for Act source text.
//!
//! The lexer walks the source once, left to right, tracking line and column
//! as it goes. Single-line `//` comments and whitespace are discarded but
//! still advance position tracking. On an unrecognized character the lexer
//! records a diagnostic and skips one byte, so that a file with several
//! lexical problems reports all of them instead of stopping at the first.

use act_base::{Diagnostics, Pos, Span};

use crate::token::{keyword, EnvVar, Token, TokenKind, TypeFamily};

pub struct Lexer<'src> {
    src: &'src [u8],
    pos: usize,
    line: u32,
    col: u32,
    diags: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 0,
            diags: Diagnostics::new(),
        }
    }

    /// Scans the whole input into a token stream, always terminated with a
    /// single `Eof` token. Lexical errors are accumulated rather than
    /// aborting the scan; callers should check `diagnostics().is_empty()`
    /// before trusting the token stream.
    pub fn tokenize(mut self) -> (Vec<Token>, Diagnostics) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.here();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, Span::point(start)));
                break;
            };

            let kind = if c.is_ascii_digit() {
                self.lex_number()
            } else if c == '"' {
                self.lex_string()
            } else if is_ident_start(c) {
                self.lex_ident_or_keyword()
            } else {
                self.lex_symbol()
            };

            if let Some(kind) = kind {
                let end = self.here();
                tokens.push(Token::new(kind, Span::new(start, end)));
            }
        }
        (tokens, self.diags)
    }

    fn here(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).map(|&b| b as char)
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).map(|&b| b as char)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> Option<TokenKind> {
        let start_pos = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let text = std::str::from_utf8(&self.src[start_pos..self.pos])
            .unwrap()
            .to_string();
        Some(TokenKind::IntLit(text))
    }

    fn lex_string(&mut self) -> Option<TokenKind> {
        let start = self.here();
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None => {
                    self.diags.push(Span::point(start), "unterminated string literal");
                    break;
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    s.push(c);
                    self.bump();
                }
            }
        }
        Some(TokenKind::StrLit(s))
    }

    fn lex_ident_or_keyword(&mut self) -> Option<TokenKind> {
        let start_pos = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        let word = std::str::from_utf8(&self.src[start_pos..self.pos]).unwrap();

        if word == "_" {
            return Some(TokenKind::Underscore);
        }
        if let Some(kw) = keyword(word) {
            return Some(kw);
        }
        if let Some(env) = EnvVar::lookup(word) {
            return Some(TokenKind::EnvIdent(env));
        }
        if let Some((family, width)) = parse_type_name(word) {
            return Some(TokenKind::TypeName(family, width));
        }
        Some(TokenKind::Ident(word.to_string()))
    }

    fn lex_symbol(&mut self) -> Option<TokenKind> {
        let start = self.here();
        let c = self.bump().unwrap();
        use TokenKind::*;
        let kind = match c {
            ':' if self.peek() == Some('=') => {
                self.bump();
                Assign
            }
            '=' if self.peek() == Some('>') => {
                self.bump();
                Arrow
            }
            '=' if self.peek() == Some('=') => {
                self.bump();
                Eq
            }
            '=' if self.peek() == Some('/') && self.peek2_is('=') => {
                self.bump();
                self.bump();
                Neq
            }
            '>' if self.peek() == Some('=') => {
                self.bump();
                Ge
            }
            '<' if self.peek() == Some('=') => {
                self.bump();
                Le
            }
            '+' if self.peek() == Some('+') => {
                self.bump();
                Concat
            }
            '.' if self.peek() == Some('.') => {
                self.bump();
                DotDot
            }
            '>' => Gt,
            '<' => Lt,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '^' => Caret,
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            '{' => LBrace,
            '}' => RBrace,
            ',' => Comma,
            ':' => Colon,
            ';' => Semi,
            other => {
                self.diags
                    .push(Span::point(start), format!("unexpected character '{other}'"));
                return None;
            }
        };
        Some(kind)
    }

    fn peek2_is(&self, c: char) -> bool {
        self.peek2() == Some(c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Recognizes `uint<N>`, `int<N>`, `bytes<N>`, and the bare `uint`/`int`
/// forms which default to a 256-bit width.
fn parse_type_name(word: &str) -> Option<(TypeFamily, u16)> {
    for (prefix, family) in [
        ("uint", TypeFamily::Uint),
        ("int", TypeFamily::Int),
        ("bytes", TypeFamily::Bytes),
    ] {
        if let Some(rest) = word.strip_prefix(prefix) {
            if rest.is_empty() {
                let default_width = if family == TypeFamily::Bytes { 32 } else { 256 };
                return Some((family, default_width));
            }
            if let Ok(width) = rest.parse::<u16>() {
                return Some((family, width));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(src).tokenize();
        assert!(diags.is_empty(), "unexpected lex errors: {diags}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let out = kinds("behaviour transfer of Token");
        assert_eq!(
            out,
            vec![
                TokenKind::Behaviour,
                TokenKind::Ident("transfer".into()),
                TokenKind::Of,
                TokenKind::Ident("Token".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_parametric_types_and_defaults() {
        assert_eq!(kinds("uint256")[0], TokenKind::TypeName(TypeFamily::Uint, 256));
        assert_eq!(kinds("uint")[0], TokenKind::TypeName(TypeFamily::Uint, 256));
        assert_eq!(kinds("int8")[0], TokenKind::TypeName(TypeFamily::Int, 8));
        assert_eq!(kinds("bytes32")[0], TokenKind::TypeName(TypeFamily::Bytes, 32));
    }

    #[test]
    fn lexes_environment_identifiers() {
        assert_eq!(kinds("CALLER")[0], TokenKind::EnvIdent(EnvVar::Caller));
        assert_eq!(kinds("BLOCKHASH")[0], TokenKind::EnvIdent(EnvVar::Blockhash));
    }

    #[test]
    fn lexes_symbols() {
        let out = kinds(":= => == =/= >= <= ++ ..");
        assert_eq!(
            out,
            vec![
                TokenKind::Assign,
                TokenKind::Arrow,
                TokenKind::Eq,
                TokenKind::Neq,
                TokenKind::Ge,
                TokenKind::Le,
                TokenKind::Concat,
                TokenKind::DotDot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let (tokens, _) = Lexer::new("// hello\nCALLER").tokenize();
        assert_eq!(tokens[0].span.start.line, 2);
    }

    #[test]
    fn reports_unknown_character_and_recovers() {
        let (tokens, diags) = Lexer::new("a @ b").tokenize();
        assert_eq!(diags.len(), 1);
        // both identifiers either side of the bad character are still lexed
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Ident("a".into())));
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Ident("b".into())));
    }

    #[test]
    fn underscore_is_wildcard_token() {
        assert_eq!(kinds("_")[0], TokenKind::Underscore);
    }
}
