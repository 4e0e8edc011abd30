// SPDX: CC0-1.0

// statements are parsed by recursive descent, expressions with the shunting
// yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{
        AssignTyp, Associativity, DeclKind, Operation, OperationTyp, OperatorTyp, Program,
        Script, Stmt,
    },
    lex::{LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};
use std::sync::Arc;

pub const KEYWORDS: &[&str] = &[
    "const", "let", "var", "return", "if", "else", "for", "while", "break", "continue", "true",
    "false",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

#[derive(Clone, Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    Expected(&'static str),
    MissingOperand,
    MissingOperator,
    Keyword,
    Redeclared { name: String },
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched brackets"),
            Self::Expected(what) => write!(f, "expected {what}"),
            Self::MissingOperand => write!(f, "operator is missing an operand"),
            Self::MissingOperator => write!(f, "expected an operator between two values"),
            Self::Keyword => write!(f, "unexpected reserved word"),
            Self::Redeclared { name } => {
                write!(f, "identifier '{name}' has already been declared")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Open,     // boundary of the innermost frame
    Question, // conditional still waiting for its ':'
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    fn into_output(self) -> Result<Operation, ParseErr> {
        match self.typ {
            ShuntOpTyp::Operator(typ) => Ok(Operation {
                typ: OperationTyp::Operator(typ),
                loc: self.loc,
            }),
            ShuntOpTyp::Question => Err(ParseErr {
                typ: ParseErrTyp::Expected("':' to complete the conditional"),
                loc: self.loc,
            }),
            ShuntOpTyp::Open => unreachable!("no brackets in the output stack"),
        }
    }
}

#[derive(Clone, Debug)]
enum FrameTyp {
    Group,
    Call(SubStr),
    List,
}

#[derive(Clone, Debug)]
struct Frame {
    typ: FrameTyp,
    items: usize,
    loc: SubStr,
}

struct Parser {
    src: Arc<String>,
    toks: Vec<Tok>,
    pos: usize,
}

pub fn parse(lex: Lexer<'_>, src: &Arc<String>) -> Result<Script, ParseErr> {
    let mut toks = Vec::new();
    for tok in lex {
        let tok = tok?;
        if tok.typ != TokTyp::Comment {
            toks.push(tok);
        }
    }
    let mut parser = Parser {
        src: Arc::clone(src),
        toks,
        pos: 0,
    };
    let mut stmts = Vec::new();
    while parser.peek().is_some() {
        stmts.push(parser.statement()?);
    }
    Ok(Script { stmts })
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_typ(&self, offset: usize) -> Option<TokTyp> {
        self.toks.get(self.pos + offset).map(|tok| tok.typ)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn end_loc(&self) -> SubStr {
        SubStr::new(Arc::clone(&self.src), self.src.len(), 0)
    }

    fn here(&self) -> SubStr {
        self.peek().map_or_else(|| self.end_loc(), |tok| tok.loc.clone())
    }

    fn prev_loc(&self) -> SubStr {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.toks.get(idx))
            .map_or_else(|| self.end_loc(), |tok| tok.loc.clone())
    }

    fn err(&self, typ: ParseErrTyp) -> ParseErr {
        ParseErr {
            typ,
            loc: self.here(),
        }
    }

    fn expect(&mut self, typ: TokTyp, what: &'static str) -> Result<Tok, ParseErr> {
        if self.peek_typ(0) == Some(typ) {
            Ok(self.next().unwrap())
        } else {
            Err(self.err(ParseErrTyp::Expected(what)))
        }
    }

    fn expect_name(&mut self) -> Result<SubStr, ParseErr> {
        let tok = self.expect(TokTyp::Ident, "a name")?;
        if is_keyword(tok.loc.get()) {
            return Err(ParseErr {
                typ: ParseErrTyp::Keyword,
                loc: tok.loc,
            });
        }
        Ok(tok.loc)
    }

    fn terminator(&mut self) -> Result<(), ParseErr> {
        match self.peek_typ(0) {
            Some(TokTyp::Semi) => {
                self.next();
                Ok(())
            }
            None | Some(TokTyp::CloseCurly) => Ok(()),
            Some(_) => Err(self.err(ParseErrTyp::Expected("';'"))),
        }
    }

    fn statement(&mut self) -> Result<Stmt, ParseErr> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.err(ParseErrTyp::Expected("a statement")));
        };
        match tok.typ {
            TokTyp::Semi => {
                self.next();
                Ok(Stmt::Block(Vec::new()))
            }
            TokTyp::OpenCurly => self.block(),
            TokTyp::CloseCurly => Err(self.err(ParseErrTyp::ParenMismatch)),
            TokTyp::Ident => match tok.loc.get() {
                "const" | "let" | "var" => {
                    let stmt = self.declaration()?;
                    self.terminator()?;
                    Ok(stmt)
                }
                "return" => {
                    self.next();
                    if let None | Some(TokTyp::Semi | TokTyp::CloseCurly) = self.peek_typ(0) {
                        return Err(self.err(ParseErrTyp::Expected("a value after 'return'")));
                    }
                    let value = self.expression()?;
                    let loc = tok.loc.to(&self.prev_loc());
                    self.terminator()?;
                    Ok(Stmt::Return { value, loc })
                }
                "if" => {
                    self.next();
                    let cond = self.condition()?;
                    let then = Box::new(self.statement()?);
                    let otherwise = if self.peek().is_some_and(|tok| tok.is_word("else")) {
                        self.next();
                        Some(Box::new(self.statement()?))
                    } else {
                        None
                    };
                    Ok(Stmt::If {
                        cond,
                        then,
                        otherwise,
                    })
                }
                "while" => {
                    self.next();
                    let cond = self.condition()?;
                    let body = Box::new(self.statement()?);
                    Ok(Stmt::While { cond, body })
                }
                "for" => self.for_loop(),
                "break" | "continue" => {
                    self.next();
                    self.terminator()?;
                    Ok(if tok.is_word("break") {
                        Stmt::Break
                    } else {
                        Stmt::Continue
                    })
                }
                "else" => Err(self.err(ParseErrTyp::Keyword)),
                _ => {
                    let stmt = self.simple()?;
                    self.terminator()?;
                    Ok(stmt)
                }
            },
            _ => {
                let stmt = self.simple()?;
                self.terminator()?;
                Ok(stmt)
            }
        }
    }

    fn block(&mut self) -> Result<Stmt, ParseErr> {
        let open = self.expect(TokTyp::OpenCurly, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_typ(0) {
                Some(TokTyp::CloseCurly) => {
                    self.next();
                    return Ok(Stmt::Block(stmts));
                }
                None => {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: open.loc,
                    })
                }
                Some(_) => stmts.push(self.statement()?),
            }
        }
    }

    fn condition(&mut self) -> Result<Program, ParseErr> {
        self.expect(TokTyp::OpenParen, "'(' before the condition")?;
        let cond = self.expression()?;
        self.expect(TokTyp::CloseParen, "')' after the condition")?;
        Ok(cond)
    }

    fn for_loop(&mut self) -> Result<Stmt, ParseErr> {
        self.next();
        self.expect(TokTyp::OpenParen, "'(' after 'for'")?;
        let starts_decl = self
            .peek()
            .is_some_and(|tok| DeclKind::from_keyword(tok.loc.get()).is_some());
        let init = if self.peek_typ(0) == Some(TokTyp::Semi) {
            None
        } else if starts_decl {
            Some(Box::new(self.declaration()?))
        } else {
            Some(Box::new(self.simple()?))
        };
        self.expect(TokTyp::Semi, "';' after the loop initializer")?;
        let cond = match self.peek_typ(0) {
            Some(TokTyp::Semi) => None,
            _ => Some(self.expression()?),
        };
        self.expect(TokTyp::Semi, "';' after the loop condition")?;
        let step = match self.peek_typ(0) {
            Some(TokTyp::CloseParen) => None,
            _ => Some(Box::new(self.simple()?)),
        };
        self.expect(TokTyp::CloseParen, "')' after the loop step")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn declaration(&mut self) -> Result<Stmt, ParseErr> {
        let Some(keyword) = self.next() else {
            return Err(self.err(ParseErrTyp::Expected("a declaration")));
        };
        let Some(kind) = DeclKind::from_keyword(keyword.loc.get()) else {
            return Err(ParseErr {
                typ: ParseErrTyp::Expected("a declaration"),
                loc: keyword.loc,
            });
        };
        let name = self.expect_name()?;
        let init = if kind != DeclKind::Const && self.peek_typ(0) == Some(TokTyp::Semi) {
            // declared without a value, reads as NaN until assigned
            Program::new(vec![Operation {
                typ: OperationTyp::Val(Number::NAN),
                loc: name.clone(),
            }])
        } else {
            self.expect(TokTyp::Assign(AssignTyp::Set), "'=' after the declared name")?;
            self.expression()?
        };
        Ok(Stmt::Decl {
            kind,
            name,
            init,
            loc: keyword.loc.to(&self.prev_loc()),
        })
    }

    /// Assignment, increment or bare expression.
    fn simple(&mut self) -> Result<Stmt, ParseErr> {
        if self.peek_typ(0) == Some(TokTyp::Ident) {
            match self.peek_typ(1) {
                Some(TokTyp::Assign(typ)) => {
                    let name = self.expect_name()?;
                    self.next();
                    let value = self.expression()?;
                    return Ok(Stmt::Assign { name, typ, value });
                }
                Some(TokTyp::Incr | TokTyp::Decr) => {
                    let name = self.expect_name()?;
                    let delta = match self.next().map(|tok| tok.typ) {
                        Some(TokTyp::Incr) => 1.0,
                        _ => -1.0,
                    };
                    return Ok(Stmt::Step { name, delta });
                }
                _ => {}
            }
        }
        Ok(Stmt::Expr(self.expression()?))
    }

    fn expression(&mut self) -> Result<Program, ParseErr> {
        let mut out: Vec<Operation> = Vec::new(); // output
        let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack
        let mut frames: Vec<Frame> = Vec::new(); // open brackets
        let mut expect_operand = true;

        fn close_frame(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) -> Result<(), ParseErr> {
            while let Some(op) = ops.pop() {
                if op.typ == ShuntOpTyp::Open {
                    break;
                }
                out.push(op.into_output()?);
            }
            Ok(())
        }

        while let Some(tok) = self.peek().cloned() {
            if frames.is_empty() {
                if let TokTyp::Semi
                | TokTyp::Comma
                | TokTyp::CloseParen
                | TokTyp::OpenCurly
                | TokTyp::CloseCurly
                | TokTyp::Assign(_)
                | TokTyp::Incr
                | TokTyp::Decr = tok.typ
                {
                    break;
                }
            }
            self.next();

            let is_operand = matches!(
                tok.typ,
                TokTyp::Number | TokTyp::Ident | TokTyp::OpenParen | TokTyp::OpenSquare
            );
            if is_operand && !expect_operand {
                return Err(ParseErr {
                    typ: ParseErrTyp::MissingOperator,
                    loc: tok.loc,
                });
            }

            match tok.typ {
                TokTyp::Number => {
                    let num: Number = tok.loc.get().parse().map_err(|err| ParseErr {
                        typ: ParseErrTyp::ParseNum(err),
                        loc: tok.loc.clone(),
                    })?;
                    out.push(Operation {
                        typ: OperationTyp::Val(num),
                        loc: tok.loc,
                    });
                    expect_operand = false;
                }

                TokTyp::Ident => {
                    let word = tok.loc.get();
                    if word == "true" || word == "false" {
                        out.push(Operation {
                            typ: OperationTyp::Bool(word == "true"),
                            loc: tok.loc,
                        });
                    } else if is_keyword(word) {
                        return Err(ParseErr {
                            typ: ParseErrTyp::Keyword,
                            loc: tok.loc,
                        });
                    } else if self.peek_typ(0) == Some(TokTyp::OpenParen) {
                        let open = self.next().unwrap();
                        frames.push(Frame {
                            typ: FrameTyp::Call(tok.loc),
                            items: 0,
                            loc: open.loc.clone(),
                        });
                        ops.push(ShuntOp {
                            typ: ShuntOpTyp::Open,
                            loc: open.loc,
                        });
                        continue;
                    } else {
                        out.push(Operation {
                            typ: OperationTyp::Ident,
                            loc: tok.loc,
                        });
                    }
                    expect_operand = false;
                }

                TokTyp::OpenParen | TokTyp::OpenSquare => {
                    frames.push(Frame {
                        typ: if tok.typ == TokTyp::OpenParen {
                            FrameTyp::Group
                        } else {
                            FrameTyp::List
                        },
                        items: 0,
                        loc: tok.loc.clone(),
                    });
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Open,
                        loc: tok.loc,
                    });
                }

                TokTyp::Op(o1) => {
                    let o1 = if expect_operand {
                        match o1 {
                            OperatorTyp::Sub | OperatorTyp::Neg => OperatorTyp::Neg,
                            OperatorTyp::Not => OperatorTyp::Not,
                            // unary plus is a no-op
                            OperatorTyp::Add => continue,
                            _ => {
                                return Err(ParseErr {
                                    typ: ParseErrTyp::MissingOperand,
                                    loc: tok.loc,
                                })
                            }
                        }
                    } else if o1 == OperatorTyp::Not {
                        return Err(ParseErr {
                            typ: ParseErrTyp::MissingOperator,
                            loc: tok.loc,
                        });
                    } else {
                        // prefix operators never pop anything
                        while let Some(o2) = ops.last().cloned() {
                            let ShuntOpTyp::Operator(o2_typ) = o2.typ else {
                                break;
                            };
                            if (o2_typ.precedence() > o1.precedence())
                                || ((o1.precedence() == o2_typ.precedence())
                                    && (o1.associativity() == Associativity::Left))
                            {
                                ops.pop();
                                out.push(o2.into_output()?);
                            } else {
                                break;
                            }
                        }
                        o1
                    };
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Operator(o1),
                        loc: tok.loc,
                    });
                    expect_operand = true;
                }

                TokTyp::Comma => {
                    // frames is non-empty here, top-level commas end the expression
                    let frame = frames.last_mut().unwrap();
                    if matches!(frame.typ, FrameTyp::Group) {
                        return Err(ParseErr {
                            typ: ParseErrTyp::Expected("')'"),
                            loc: tok.loc,
                        });
                    }
                    if expect_operand {
                        return Err(ParseErr {
                            typ: ParseErrTyp::Expected("an expression before ','"),
                            loc: tok.loc,
                        });
                    }
                    frame.items += 1;
                    while let Some(op) = ops.last() {
                        if op.typ != ShuntOpTyp::Open {
                            if let Some(op) = ops.pop() {
                                out.push(op.into_output()?);
                            }
                        } else {
                            break;
                        }
                    }
                    expect_operand = true;
                }

                TokTyp::CloseParen | TokTyp::CloseSquare => {
                    let frame = frames.pop().unwrap();
                    let closes_paren = tok.typ == TokTyp::CloseParen;
                    let matches_frame = match frame.typ {
                        FrameTyp::Group | FrameTyp::Call(_) => closes_paren,
                        FrameTyp::List => !closes_paren,
                    };
                    if !matches_frame {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: tok.loc,
                        });
                    }
                    let items = frame.items + usize::from(!expect_operand);
                    close_frame(&mut ops, &mut out)?;
                    match frame.typ {
                        FrameTyp::Group => {
                            if expect_operand {
                                return Err(ParseErr {
                                    typ: ParseErrTyp::Expected("an expression inside '()'"),
                                    loc: tok.loc,
                                });
                            }
                        }
                        FrameTyp::Call(name) => out.push(Operation {
                            typ: OperationTyp::Call { argc: items },
                            loc: name,
                        }),
                        FrameTyp::List => out.push(Operation {
                            typ: OperationTyp::List { len: items },
                            loc: frame.loc.to(&tok.loc),
                        }),
                    }
                    expect_operand = false;
                }

                TokTyp::Semi
                | TokTyp::OpenCurly
                | TokTyp::CloseCurly
                | TokTyp::Assign(_)
                | TokTyp::Incr
                | TokTyp::Decr => {
                    let frame = frames.last().unwrap();
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: frame.loc.clone(),
                    });
                }

                TokTyp::Question => {
                    if expect_operand {
                        return Err(ParseErr {
                            typ: ParseErrTyp::MissingOperand,
                            loc: tok.loc,
                        });
                    }
                    // the condition is complete, a nested conditional stays put
                    while let Some(ShuntOp {
                        typ: ShuntOpTyp::Operator(o2_typ),
                        ..
                    }) = ops.last()
                    {
                        if *o2_typ == OperatorTyp::Cond {
                            break;
                        }
                        if let Some(op) = ops.pop() {
                            out.push(op.into_output()?);
                        }
                    }
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Question,
                        loc: tok.loc,
                    });
                    expect_operand = true;
                }

                TokTyp::Colon => {
                    if expect_operand {
                        return Err(ParseErr {
                            typ: ParseErrTyp::MissingOperand,
                            loc: tok.loc,
                        });
                    }
                    loop {
                        match ops.pop() {
                            Some(ShuntOp {
                                typ: ShuntOpTyp::Question,
                                loc,
                            }) => {
                                ops.push(ShuntOp {
                                    typ: ShuntOpTyp::Operator(OperatorTyp::Cond),
                                    loc,
                                });
                                break;
                            }
                            Some(op @ ShuntOp {
                                typ: ShuntOpTyp::Operator(_),
                                ..
                            }) => out.push(op.into_output()?),
                            _ => {
                                return Err(ParseErr {
                                    typ: ParseErrTyp::Expected("'?' before ':'"),
                                    loc: tok.loc,
                                })
                            }
                        }
                    }
                    expect_operand = true;
                }

                TokTyp::Comment | TokTyp::XCaret | TokTyp::XPipe | TokTyp::XAmpersand => {
                    unreachable!("filtered or rejected by the lexer")
                }
            }
        }

        if let Some(frame) = frames.pop() {
            return Err(ParseErr {
                typ: ParseErrTyp::ParenMismatch,
                loc: frame.loc,
            });
        }
        if expect_operand {
            return Err(self.err(if out.is_empty() && ops.is_empty() {
                ParseErrTyp::Expected("an expression")
            } else {
                ParseErrTyp::MissingOperand
            }));
        }
        while let Some(op) = ops.pop() {
            out.push(op.into_output()?);
        }

        Ok(Program::new(out))
    }
}
