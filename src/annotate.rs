// SPDX: CC0-1.0

//! Discovers slider and checkbox parameters declared in a snippet, and the
//! labels of the curves it returns.
//!
//! A parameter is a declaration with a literal initializer followed, on the
//! same line, by a directive comment:
//!
//! ```text
//! const curve = 2.0; // range(0.1, 5.0)
//! const freq = 1.0;  // range(0.1, 10.0, log)
//! const flip = true; // checkbox
//! ```
//!
//! Labels come from the last `return` statement, optionally overridden with
//! `// labels(First, Second)`.

use crate::{
    eval::DeclKind,
    lex::{Lexer, Tok, TokTyp},
    parse::is_keyword,
    Number,
};
use core::fmt;
use std::sync::Arc;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scale {
    Linear,
    Log,
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Log => write!(f, "log"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamKind {
    Range {
        min: Number,
        max: Number,
        scale: Scale,
        is_integer: bool,
    },
    Checkbox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Number(Number),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(num) => write!(f, "{num}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: ParamValue,
}

/// Why an annotated declaration was not turned into a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedTyp {
    NonNumericBound,
    EmptySpan,
    LogNonPositive,
    UnknownScale,
    NonLiteralDefault,
}

impl fmt::Display for MalformedTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNumericBound => write!(f, "range bounds must be numbers"),
            Self::EmptySpan => write!(f, "range minimum must be below its maximum"),
            Self::LogNonPositive => write!(f, "log scale needs a positive minimum"),
            Self::UnknownScale => write!(f, "scale must be 'linear' or 'log'"),
            Self::NonLiteralDefault => write!(f, "initial value must be a literal"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotations {
    /// In order of first declaration; a redeclared name keeps its slot but
    /// takes the later declaration's spec.
    pub params: Vec<ParameterSpec>,
    /// Byte offsets of every declaration that produced a parameter.
    pub sites: Vec<usize>,
    pub labels: Vec<String>,
}

impl Annotations {
    pub fn is_param_site(&self, offset: usize) -> bool {
        self.sites.contains(&offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Directive {
    Range {
        min: Number,
        max: Number,
        scale: Scale,
        integer_literals: bool,
    },
    Checkbox,
}

pub fn annotate(src: &Arc<String>) -> Annotations {
    // lex errors only hide the offending characters
    let toks: Vec<Tok> = Lexer::new(src).filter_map(Result::ok).collect();

    let mut ret = Annotations::default();
    for idx in 0..toks.len() {
        let Some((spec, site)) = parameter_at(&toks, idx) else {
            continue;
        };
        match spec {
            Ok(spec) => {
                ret.sites.push(site);
                if let Some(old) = ret.params.iter_mut().find(|p| p.name == spec.name) {
                    *old = spec;
                } else {
                    ret.params.push(spec);
                }
            }
            Err((name, why)) => trace!(%name, %why, "dropped malformed annotation"),
        }
    }
    ret.labels = labels(&toks);
    ret
}

type Discovered = Result<ParameterSpec, (String, MalformedTyp)>;

/// Recognizes `<decl> <name> = <literal>; // <directive>` starting at `idx`.
fn parameter_at(toks: &[Tok], idx: usize) -> Option<(Discovered, usize)> {
    let [keyword, name, assign, ..] = toks.get(idx..)? else {
        return None;
    };
    DeclKind::from_keyword(keyword.loc.get())?;
    if name.typ != TokTyp::Ident || is_keyword(name.loc.get()) {
        return None;
    }
    if assign.typ != TokTyp::Assign(crate::eval::AssignTyp::Set) {
        return None;
    }

    let mut depth = 0usize;
    let mut semi = None;
    for (offset, tok) in toks[idx + 3..].iter().enumerate() {
        match tok.typ {
            TokTyp::OpenParen | TokTyp::OpenSquare | TokTyp::OpenCurly => depth += 1,
            TokTyp::CloseParen | TokTyp::CloseSquare | TokTyp::CloseCurly => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            TokTyp::Semi if depth == 0 => {
                semi = Some(idx + 3 + offset);
                break;
            }
            _ => {}
        }
    }
    let semi = semi?;
    let comment = toks.get(semi + 1)?;
    let body = comment.comment_body()?;
    if !comment.loc.get().starts_with("//") || !toks[semi].loc.same_line_as(&comment.loc) {
        return None;
    }

    let name = name.loc.get().to_string();
    let init: Vec<&Tok> = toks[idx + 3..semi]
        .iter()
        .filter(|tok| tok.typ != TokTyp::Comment)
        .collect();
    let spec = match directive(body) {
        Ok(None) => return None,
        Ok(Some(directive)) => spec_from(name.clone(), directive, &init),
        Err(why) => Err(why),
    };
    Some((spec.map_err(|why| (name, why)), keyword.loc.start()))
}

fn spec_from(name: String, directive: Directive, init: &[&Tok]) -> Result<ParameterSpec, MalformedTyp> {
    match directive {
        Directive::Checkbox => {
            // any literal is accepted, only `true` starts checked
            let default = match init {
                [tok] if tok.is_word("true") => true,
                [tok] if tok.is_word("false") => false,
                _ if literal_number(init).is_some() => false,
                _ => return Err(MalformedTyp::NonLiteralDefault),
            };
            Ok(ParameterSpec {
                name,
                kind: ParamKind::Checkbox,
                default: ParamValue::Bool(default),
            })
        }
        Directive::Range {
            min,
            max,
            scale,
            integer_literals,
        } => {
            let default = literal_number(init).ok_or(MalformedTyp::NonLiteralDefault)?;
            let is_integer = integer_literals && scale == Scale::Linear && max - min >= 3.0;
            Ok(ParameterSpec {
                name,
                kind: ParamKind::Range {
                    min,
                    max,
                    scale,
                    is_integer,
                },
                default: ParamValue::Number(default),
            })
        }
    }
}

/// A number literal with an optional sign, and whether it was written
/// without a decimal point or exponent.
fn signed_number(toks: &[&Tok]) -> Option<(Number, bool)> {
    let (sign, num) = match toks {
        [num] => (1.0, num),
        [sign, num] if sign.typ == TokTyp::Op(crate::eval::OperatorTyp::Sub) => (-1.0, num),
        [sign, num] if sign.typ == TokTyp::Op(crate::eval::OperatorTyp::Add) => (1.0, num),
        _ => return None,
    };
    if num.typ != TokTyp::Number {
        return None;
    }
    let text = num.loc.get();
    let val: Number = text.parse().ok()?;
    let integer = !text.contains(['.', 'e', 'E']);
    val.is_finite().then_some((sign * val, integer))
}

fn literal_number(toks: &[&Tok]) -> Option<Number> {
    signed_number(toks).map(|(val, _)| val)
}

fn directive(body: &str) -> Result<Option<Directive>, MalformedTyp> {
    let body = Arc::new(body.trim_start().to_string());
    let mut lex = Lexer::new(&body);
    match lex.next() {
        Some(Ok(tok)) if tok.is_word("checkbox") => return Ok(Some(Directive::Checkbox)),
        Some(Ok(tok)) if tok.is_word("range") => {}
        _ => return Ok(None),
    }
    match lex.next() {
        Some(Ok(tok)) if tok.typ == TokTyp::OpenParen => {}
        _ => return Ok(None),
    }

    // the argument list runs to the first closing paren
    let mut args: Vec<Vec<Tok>> = Vec::new();
    let mut arg = Vec::new();
    loop {
        match lex.next() {
            Some(Ok(tok)) if tok.typ == TokTyp::CloseParen => {
                args.push(arg);
                break;
            }
            Some(Ok(tok)) if tok.typ == TokTyp::Comma => args.push(core::mem::take(&mut arg)),
            Some(Ok(tok)) => arg.push(tok),
            Some(Err(_)) => return Err(MalformedTyp::NonNumericBound),
            None => return Ok(None),
        }
    }

    let bound = |toks: &[Tok]| {
        let toks: Vec<&Tok> = toks.iter().collect();
        signed_number(&toks).ok_or(MalformedTyp::NonNumericBound)
    };
    let (min, max, scale) = match args.as_slice() {
        [min, max] => (bound(min)?, bound(max)?, Scale::Linear),
        [min, max, scale] => {
            let scale = match scale.as_slice() {
                [tok] if tok.is_word("linear") => Scale::Linear,
                [tok] if tok.is_word("log") => Scale::Log,
                _ => return Err(MalformedTyp::UnknownScale),
            };
            (bound(min)?, bound(max)?, scale)
        }
        _ => return Err(MalformedTyp::NonNumericBound),
    };
    let ((min, min_int), (max, max_int)) = (min, max);
    if min >= max {
        return Err(MalformedTyp::EmptySpan);
    }
    if scale == Scale::Log && min <= 0.0 {
        return Err(MalformedTyp::LogNonPositive);
    }
    Ok(Some(Directive::Range {
        min,
        max,
        scale,
        integer_literals: min_int && max_int,
    }))
}

fn is_comment(tok: &&Tok) -> bool {
    tok.typ == TokTyp::Comment
}

/// Identifier at the head of an output expression, up to the first `.`.
fn leading_ident(tok: &Tok) -> Option<String> {
    if tok.typ != TokTyp::Ident {
        return None;
    }
    let text = tok.loc.get();
    Some(text.split('.').next().unwrap_or(text).to_string())
}

fn labels(toks: &[Tok]) -> Vec<String> {
    let Some(ret_idx) = toks.iter().rposition(|tok| tok.is_word("return")) else {
        return Vec::new();
    };

    let mut depth = 0usize;
    let mut end = toks.len();
    let mut semi = None;
    for (idx, tok) in toks.iter().enumerate().skip(ret_idx + 1) {
        match tok.typ {
            TokTyp::OpenParen | TokTyp::OpenSquare | TokTyp::OpenCurly => depth += 1,
            TokTyp::CloseParen | TokTyp::CloseSquare | TokTyp::CloseCurly => {
                if depth == 0 {
                    end = idx;
                    break;
                }
                depth -= 1;
            }
            TokTyp::Semi if depth == 0 => {
                end = idx;
                semi = Some(idx);
                break;
            }
            _ => {}
        }
    }

    let mut expr = &toks[ret_idx + 1..end];
    let trailing = match semi {
        Some(idx) => toks
            .get(idx + 1)
            .filter(|tok| tok.typ == TokTyp::Comment && toks[idx].loc.same_line_as(&tok.loc)),
        None => {
            // without a `;` the comments closing the expression are trailing
            let mut first_trailing = None;
            while let Some((last, rest)) = expr.split_last() {
                if last.typ != TokTyp::Comment {
                    break;
                }
                first_trailing = Some(last);
                expr = rest;
            }
            first_trailing.filter(|comment| {
                expr.last()
                    .map_or(true, |last| last.loc.same_line_as(&comment.loc))
            })
        }
    };

    let derived = derived_labels(expr);
    let provided = trailing
        .and_then(Tok::comment_body)
        .map(provided_labels)
        .unwrap_or_default();

    derived
        .into_iter()
        .enumerate()
        .map(|(idx, derived)| match provided.get(idx) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => derived.unwrap_or_else(|| format!("output{}", idx + 1)),
        })
        .collect()
}

/// One entry per curve position, `None` where no identifier leads the
/// element.
fn derived_labels(expr: &[Tok]) -> Vec<Option<String>> {
    let code: Vec<&Tok> = expr.iter().filter(|tok| !is_comment(tok)).collect();
    let Some(first) = code.first() else {
        return vec![Some(String::from("output"))];
    };

    if first.typ == TokTyp::OpenSquare && closes_at_end(&code) {
        // split the list body on top-level commas, keeping comments so a
        // comment-only element can be recognized and dropped
        let open = expr.iter().position(|tok| tok.typ == TokTyp::OpenSquare).unwrap_or(0);
        let close = expr
            .iter()
            .rposition(|tok| tok.typ == TokTyp::CloseSquare)
            .unwrap_or(expr.len());
        let mut elems: Vec<&[Tok]> = Vec::new();
        let mut depth = 0usize;
        let mut start = open + 1;
        for (idx, tok) in expr.iter().enumerate().take(close).skip(open + 1) {
            match tok.typ {
                TokTyp::OpenParen | TokTyp::OpenSquare | TokTyp::OpenCurly => depth += 1,
                TokTyp::CloseParen | TokTyp::CloseSquare | TokTyp::CloseCurly => {
                    depth = depth.saturating_sub(1)
                }
                TokTyp::Comma if depth == 0 => {
                    elems.push(&expr[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            }
        }
        elems.push(&expr[start..close]);

        elems
            .into_iter()
            .filter_map(|elem| elem.iter().find(|tok| tok.typ != TokTyp::Comment))
            .map(leading_ident)
            .collect()
    } else {
        vec![Some(leading_ident(first).unwrap_or_else(|| String::from("output")))]
    }
}

/// Whether the bracket opening `code` is closed by its last token.
fn closes_at_end(code: &[&Tok]) -> bool {
    let mut depth = 0usize;
    for (idx, tok) in code.iter().enumerate() {
        match tok.typ {
            TokTyp::OpenParen | TokTyp::OpenSquare | TokTyp::OpenCurly => depth += 1,
            TokTyp::CloseParen | TokTyp::CloseSquare | TokTyp::CloseCurly => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx == code.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn provided_labels(comment: &str) -> Vec<String> {
    let Some(start) = comment.find("labels(") else {
        return Vec::new();
    };
    let args = &comment[start + "labels(".len()..];
    let Some(end) = args.find(')') else {
        return Vec::new();
    };
    args[..end]
        .split(',')
        .map(|label| label.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(src: &str) -> Annotations {
        annotate(&Arc::new(src.to_string()))
    }

    fn range(spec: &ParameterSpec) -> (Number, Number, Scale, bool) {
        match spec.kind {
            ParamKind::Range {
                min,
                max,
                scale,
                is_integer,
            } => (min, max, scale, is_integer),
            ParamKind::Checkbox => panic!("expected a range"),
        }
    }

    #[test]
    fn discovers_range_and_checkbox() {
        let ann = annotations(
            "const curve = 2.0; // range(0.1,5.0)\nlet flip = true; // checkbox\nreturn x;",
        );
        assert_eq!(ann.params.len(), 2);
        assert_eq!(ann.params[0].name, "curve");
        assert_eq!(range(&ann.params[0]), (0.1, 5.0, Scale::Linear, false));
        assert_eq!(ann.params[0].default, ParamValue::Number(2.0));
        assert_eq!(ann.params[1].kind, ParamKind::Checkbox);
        assert_eq!(ann.params[1].default, ParamValue::Bool(true));
        assert_eq!(ann.sites, [0, 37]);
    }

    #[test]
    fn integer_heuristic() {
        let ann = annotations(
            "const steps = 8; // range(2,16)\nconst few = 1; // range(0,2)\nconst f = 1; // range(1.0,8)\nconst l = 2; // range(1,8,log)",
        );
        let ints: Vec<bool> = ann.params.iter().map(|p| range(p).3).collect();
        assert_eq!(ints, [true, false, false, false]);
        assert_eq!(range(&ann.params[3]).2, Scale::Log);
    }

    #[test]
    fn malformed_annotations_are_dropped() {
        let ann = annotations(
            "const a = 3; // range(5,2)\nconst b = 1; // range(0,10,log)\nconst c = 1; // range(lo,2)\nconst d = x; // range(0,1)\nconst e = 0.5; // range(-1,1)\nreturn a + e;",
        );
        assert_eq!(ann.params.len(), 1);
        assert_eq!(ann.params[0].name, "e");
        assert_eq!(range(&ann.params[0]).0, -1.0);
        assert_eq!(ann.sites.len(), 1);
    }

    #[test]
    fn later_declaration_wins() {
        let ann = annotations(
            "const a = 1; // range(0,2)\nconst b = 1; // checkbox\nconst a = 3; // range(0,10)",
        );
        assert_eq!(ann.params.len(), 2);
        assert_eq!(ann.params[0].name, "a");
        assert_eq!(range(&ann.params[0]).1, 10.0);
        assert_eq!(ann.params[0].default, ParamValue::Number(3.0));
        assert_eq!(ann.params[1].kind, ParamKind::Checkbox);
        assert_eq!(ann.params[1].default, ParamValue::Bool(false));
        assert_eq!(ann.sites.len(), 3);
    }

    #[test]
    fn checkbox_defaults_from_any_literal() {
        let ann = annotations(
            "const on = true; // checkbox
const one = 1; // checkbox
const off = -0.5; // checkbox
const bad = x; // checkbox
return x;",
        );
        let defaults: Vec<(&str, ParamValue)> = ann
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.default))
            .collect();
        assert_eq!(
            defaults,
            [
                ("on", ParamValue::Bool(true)),
                ("one", ParamValue::Bool(false)),
                ("off", ParamValue::Bool(false)),
            ]
        );
    }

    #[test]
    fn comment_on_next_line_is_not_an_annotation() {
        let ann = annotations("const a = 1;\n// range(0,2)\nreturn a;");
        assert!(ann.params.is_empty());
    }

    #[test]
    fn labels_with_partial_override() {
        let ann = annotations("return [a, b, c]; // labels(First)");
        assert_eq!(ann.labels, ["First", "b", "c"]);
    }

    #[test]
    fn labels_fall_back_positionally() {
        let ann = annotations("return [Math.sin(x), 0.5 * x, c]; // labels(, Half)");
        assert_eq!(ann.labels, ["Math", "Half", "c"]);
        let ann = annotations("return [x, 2 * x, 3];");
        assert_eq!(ann.labels, ["x", "output2", "output3"]);
    }

    #[test]
    fn commented_out_elements_produce_no_label() {
        let ann = annotations("return [\n  linear,\n  // square,\n  cubic,\n];");
        assert_eq!(ann.labels, ["linear", "cubic"]);
    }

    #[test]
    fn single_value_labels() {
        assert_eq!(annotations("return 0.5 + x;").labels, ["output"]);
        assert_eq!(annotations("return sine * 2;").labels, ["sine"]);
        assert_eq!(annotations("return x; // labels(Identity)").labels, ["Identity"]);
        assert!(annotations("const a = 1;").labels.is_empty());
    }

    #[test]
    fn only_last_return_counts() {
        let ann = annotations(
            "if (x < 0.5) {\n  return [a, b]; // labels(A, B)\n}\nreturn [c, d];",
        );
        assert_eq!(ann.labels, ["c", "d"]);
    }
}
