// SPDX: CC0-1.0

use crate::eval::{AssignTyp, OperatorTyp};
use core::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.end()]
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &SubStr) -> Self {
        let end = other.end().max(self.end());
        Self::new(Arc::clone(&self.src), self.start, end - self.start)
    }

    /// True if no line break separates the end of `self` from the start of
    /// `later`.
    pub fn same_line_as(&self, later: &SubStr) -> bool {
        let (from, to) = (self.end().min(later.start), later.start);
        !self.src[from..to].contains('\n')
    }

    /// The full line of source containing this span, and the span's column
    /// within it.
    pub fn line(&self) -> (&str, usize) {
        let line_start = self.src[..self.start].rfind('\n').map_or(0, |idx| idx + 1);
        let line_end = self.src[self.start..]
            .find('\n')
            .map_or(self.src.len(), |idx| self.start + idx);
        (&self.src[line_start..line_end], self.start - line_start)
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Assign(AssignTyp),
    Incr,
    Decr,
    Comma,
    Semi,
    OpenParen,
    CloseParen,
    OpenSquare,
    CloseSquare,
    OpenCurly,
    CloseCurly,
    Question,
    Colon,
    Comment,

    // unsupported tokens
    XCaret,
    XPipe,
    XAmpersand,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Assign(_)
            | Self::Incr
            | Self::Decr
            | Self::Comma
            | Self::Semi
            | Self::OpenParen
            | Self::CloseParen
            | Self::OpenSquare
            | Self::CloseSquare
            | Self::OpenCurly
            | Self::CloseCurly
            | Self::Question
            | Self::Colon
            | Self::Comment => false,

            // unsupported tokens
            Self::XCaret | Self::XPipe | Self::XAmpersand => true,
        }
    }
}

// longest match first
const SYMBOLS: &[(&str, TokTyp)] = &[
    ("===", TokTyp::Op(OperatorTyp::Eq)),
    ("!==", TokTyp::Op(OperatorTyp::Ne)),
    ("**", TokTyp::Op(OperatorTyp::Pow)),
    ("<=", TokTyp::Op(OperatorTyp::Le)),
    (">=", TokTyp::Op(OperatorTyp::Ge)),
    ("==", TokTyp::Op(OperatorTyp::Eq)),
    ("!=", TokTyp::Op(OperatorTyp::Ne)),
    ("&&", TokTyp::Op(OperatorTyp::And)),
    ("||", TokTyp::Op(OperatorTyp::Or)),
    ("+=", TokTyp::Assign(AssignTyp::Add)),
    ("-=", TokTyp::Assign(AssignTyp::Sub)),
    ("*=", TokTyp::Assign(AssignTyp::Mul)),
    ("/=", TokTyp::Assign(AssignTyp::Div)),
    ("++", TokTyp::Incr),
    ("--", TokTyp::Decr),
    ("+", TokTyp::Op(OperatorTyp::Add)),
    ("-", TokTyp::Op(OperatorTyp::Sub)),
    ("*", TokTyp::Op(OperatorTyp::Mul)),
    ("/", TokTyp::Op(OperatorTyp::Div)),
    ("%", TokTyp::Op(OperatorTyp::Rem)),
    ("<", TokTyp::Op(OperatorTyp::Lt)),
    (">", TokTyp::Op(OperatorTyp::Gt)),
    ("!", TokTyp::Op(OperatorTyp::Not)),
    ("=", TokTyp::Assign(AssignTyp::Set)),
    (",", TokTyp::Comma),
    (";", TokTyp::Semi),
    ("(", TokTyp::OpenParen),
    (")", TokTyp::CloseParen),
    ("[", TokTyp::OpenSquare),
    ("]", TokTyp::CloseSquare),
    ("{", TokTyp::OpenCurly),
    ("}", TokTyp::CloseCurly),
    ("?", TokTyp::Question),
    (":", TokTyp::Colon),
    ("^", TokTyp::XCaret),
    ("|", TokTyp::XPipe),
    ("&", TokTyp::XAmpersand),
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

impl Tok {
    /// Whether this is an identifier spelled exactly `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.typ == TokTyp::Ident && self.loc.get() == word
    }

    /// Text of a comment token without its delimiters.
    pub fn comment_body(&self) -> Option<&str> {
        if self.typ != TokTyp::Comment {
            return None;
        }
        let text = self.loc.get();
        if let Some(line) = text.strip_prefix("//") {
            Some(line)
        } else {
            text.strip_prefix("/*")
                .map(|block| block.strip_suffix("*/").unwrap_or(block))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    UnterminatedComment,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

/// Yields tokens (comments included) until the end of `src`. After an
/// error the offending character is skipped and lexing resumes, so callers
/// that only care about well-formed stretches can keep going.
#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    pos: usize,
}

const fn is_ident_start(chr: char) -> bool {
    chr.is_ascii_alphabetic() || chr == '_' || chr == '$'
}

const fn is_ident_continue(chr: char) -> bool {
    is_ident_start(chr) || chr.is_ascii_digit()
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn span(&self, start: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, self.pos - start)
    }

    pub fn trim_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn consume_comment(&mut self) -> Option<Result<Tok, LexErr>> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("//") {
            self.pos += rest.find('\n').unwrap_or(rest.len());
        } else if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(idx) => self.pos += idx + 4,
                None => {
                    self.pos = self.src.len();
                    return Some(Err(LexErr {
                        typ: LexErrTyp::UnterminatedComment,
                        loc: self.span(start),
                    }));
                }
            }
        } else {
            return None;
        }
        Some(Ok(Tok {
            typ: TokTyp::Comment,
            loc: self.span(start),
        }))
    }

    fn consume_symbol(&mut self) -> Option<Tok> {
        let start = self.pos;
        let (text, typ) = SYMBOLS
            .iter()
            .find(|(text, _)| self.rest().starts_with(text))?;
        self.pos += text.len();
        Some(Tok {
            typ: *typ,
            loc: self.span(start),
        })
    }

    fn consume_while<P>(&mut self, predicate: P)
    where
        P: Fn(char) -> bool,
    {
        let len = self
            .rest()
            .find(|chr| !predicate(chr))
            .unwrap_or(self.rest().len());
        self.pos += len;
    }

    fn consume_number(&mut self) -> Option<Tok> {
        let starts_number = match self.peek()? {
            '0'..='9' => true,
            '.' => self.peek_nth(1).is_some_and(|chr| chr.is_ascii_digit()),
            _ => false,
        };
        if !starts_number {
            return None;
        }
        let start = self.pos;
        self.consume_while(|chr| chr.is_ascii_digit() || chr == '.');
        // exponent
        if let Some('e' | 'E') = self.peek() {
            let digit_at = match self.peek_nth(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_nth(digit_at).is_some_and(|chr| chr.is_ascii_digit()) {
                self.pos += digit_at;
                self.consume_while(|chr| chr.is_ascii_digit());
            }
        }
        Some(Tok {
            typ: TokTyp::Number,
            loc: self.span(start),
        })
    }

    fn consume_ident(&mut self) -> Option<Tok> {
        if !is_ident_start(self.peek()?) {
            return None;
        }
        let start = self.pos;
        loop {
            self.consume_while(is_ident_continue);
            // dotted paths such as `Math.sin` form one identifier
            if self.peek() == Some('.') && self.peek_nth(1).is_some_and(is_ident_start) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(Tok {
            typ: TokTyp::Ident,
            loc: self.span(start),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        self.trim_whitespace();

        let next_idx = self.pos;
        let next_chr = self.peek()?;
        if let Some(comment) = self.consume_comment() {
            return Some(comment);
        }
        let tok = if let Some(tok) = self.consume_number() {
            tok
        } else if let Some(tok) = self.consume_ident() {
            tok
        } else if let Some(tok) = self.consume_symbol() {
            tok
        } else {
            self.pos += next_chr.len_utf8();
            return Some(Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: self.span(next_idx),
            }));
        };
        if tok.typ.is_unsupported() {
            return Some(Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }));
        }
        Some(Ok(tok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<(TokTyp, String)> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| {
                let tok = tok.unwrap();
                (tok.typ, tok.loc.get().to_string())
            })
            .collect()
    }

    #[test]
    fn declaration_with_trailing_comment() {
        let toks = lex("const curve = 2.0; // range(0.1,5.0)");
        let typs: Vec<TokTyp> = toks.iter().map(|(typ, _)| *typ).collect();
        assert_eq!(
            typs,
            [
                TokTyp::Ident,
                TokTyp::Ident,
                TokTyp::Assign(AssignTyp::Set),
                TokTyp::Number,
                TokTyp::Semi,
                TokTyp::Comment,
            ]
        );
        assert_eq!(toks[5].1, "// range(0.1,5.0)");
    }

    #[test]
    fn dotted_identifiers_and_multichar_ops() {
        let toks = lex("Math.pow(x, 2) ** 3 <= y && i++");
        let texts: Vec<&str> = toks.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(
            texts,
            ["Math.pow", "(", "x", ",", "2", ")", "**", "3", "<=", "y", "&&", "i", "++"]
        );
    }

    #[test]
    fn numbers_with_exponents() {
        let toks = lex("1e-3 .5 2.5E+2 3");
        let texts: Vec<&str> = toks.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(texts, ["1e-3", ".5", "2.5E+2", "3"]);
        assert!(toks.iter().all(|(typ, _)| *typ == TokTyp::Number));
    }

    #[test]
    fn resumes_after_invalid_char() {
        let src = Arc::new(String::from("a # b"));
        let toks: Vec<_> = Lexer::new(&src).collect();
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1].as_ref().unwrap_err().typ, LexErrTyp::InvalidChar);
        assert_eq!(toks[2].as_ref().unwrap().loc.get(), "b");
    }

    #[test]
    fn caret_is_unsupported() {
        let src = Arc::new(String::from("x ^ 2"));
        let err = Lexer::new(&src).nth(1).unwrap().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::Unsupported(TokTyp::XCaret));
    }

    #[test]
    fn same_line_detection() {
        let src = Arc::new(String::from("a;\n// b\nc; // d"));
        let toks: Vec<Tok> = Lexer::new(&src).map(Result::unwrap).collect();
        assert!(!toks[1].loc.same_line_as(&toks[2].loc));
        assert!(toks[4].loc.same_line_as(&toks[5].loc));
        assert_eq!(toks[5].comment_body(), Some(" d"));
        assert_eq!(toks[3].loc.line(), ("c; // d", 0));
    }
}
