// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Number};
use core::fmt;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Cond,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Cond => 0,
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne => 3,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Rem => 6,
            Self::Neg | Self::Not => 7,
            Self::Pow => 8,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg | Self::Not | Self::Pow | Self::Cond => Right,
            _ => Left,
        }
    }

    pub const fn arity(&self) -> usize {
        match self {
            Self::Neg | Self::Not => 1,
            Self::Cond => 3,
            _ => 2,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Not => "not",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
            Self::Pow => "pow",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::And => "and",
            Self::Or => "or",
            Self::Cond => "cond",
        }
    }

    /// Numeric kernel for arithmetic operators, `None` for the logical and
    /// comparison ones.
    pub const fn fun(&self) -> Option<Fun> {
        match self {
            Self::Neg => Some(Fun::new(Arity::Exact(1), stdlib::neg)),
            Self::Add => Some(Fun::new(Arity::Exact(2), stdlib::add)),
            Self::Sub => Some(Fun::new(Arity::Exact(2), stdlib::sub)),
            Self::Mul => Some(Fun::new(Arity::Exact(2), stdlib::mul)),
            Self::Div => Some(Fun::new(Arity::Exact(2), stdlib::div)),
            Self::Rem => Some(Fun::new(Arity::Exact(2), stdlib::rem)),
            Self::Pow => Some(Fun::new(Arity::Exact(2), stdlib::pow)),
            _ => None,
        }
    }

    pub fn apply(&self, args: &[Value]) -> Result<Value, EvalErrTyp> {
        if let Some(fun) = self.fun() {
            let nums = args
                .iter()
                .map(Value::number)
                .collect::<Result<Vec<Number>, _>>()?;
            return Ok(Value::Num((fun.fun)(nums)));
        }
        // both branches are already evaluated
        if let Self::Cond = self {
            let branch = if args[0].truthy() { &args[1] } else { &args[2] };
            return Ok(branch.clone());
        }
        let val = match self {
            Self::Not => !args[0].truthy(),
            Self::And => args[0].truthy() && args[1].truthy(),
            Self::Or => args[0].truthy() || args[1].truthy(),
            cmp => {
                let (a, b) = (args[0].number()?, args[1].number()?);
                match cmp {
                    Self::Lt => a < b,
                    Self::Le => a <= b,
                    Self::Gt => a > b,
                    Self::Ge => a >= b,
                    Self::Eq => a == b,
                    Self::Ne => a != b,
                    _ => unreachable!("only comparisons are left"),
                }
            }
        };
        Ok(Value::Bool(val))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignTyp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignTyp {
    pub fn combine(&self, old: &Value, new: Value) -> Result<Value, EvalErrTyp> {
        let op = match self {
            Self::Set => return Ok(new),
            Self::Add => OperatorTyp::Add,
            Self::Sub => OperatorTyp::Sub,
            Self::Mul => OperatorTyp::Mul,
            Self::Div => OperatorTyp::Div,
        };
        op.apply(&[old.clone(), new])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Num(Number),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Num(_) => "number",
            Self::Bool(_) => "boolean",
            Self::List(_) => "list",
        }
    }

    /// Booleans coerce to 1 and 0.
    pub fn number(&self) -> Result<Number, EvalErrTyp> {
        match self {
            Self::Num(num) => Ok(*num),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::List(_) => Err(EvalErrTyp::TypeMismatch {
                expected: "number",
                found: self.type_name(),
            }),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::Num(num) => *num != 0.0 && !num.is_nan(),
            Self::Bool(b) => *b,
            Self::List(_) => true,
        }
    }

    /// Flattens a returned value into one output per curve.
    pub fn into_outputs(self) -> Result<Vec<Number>, EvalErrTyp> {
        match self {
            Self::Num(num) => Ok(vec![num]),
            Self::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Self::Num(num) => Ok(num),
                    other => Err(EvalErrTyp::BadOutput {
                        found: other.type_name(),
                    }),
                })
                .collect(),
            Self::Bool(_) => Err(EvalErrTyp::BadOutput {
                found: self.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(num) => write!(f, "{num}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    Bool(bool),
    Ident,
    Call { argc: usize },
    List { len: usize },
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Bool(b) => write!(f, "push {b}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.name()),
            OperationTyp::Ident => write!(f, "load '{}'", self.loc.get()),
            OperationTyp::Call { argc } => write!(f, "call '{}' with {argc}", self.loc.get()),
            OperationTyp::List { len } => write!(f, "collect {len} into list"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum EvalErrTyp {
    Empty,
    MissingArgs {
        name: IdentKey,
        arity: Arity,
        found: usize,
    },
    UndefinedIdent {
        text: SubStr,
        similar: Option<String>,
    },
    NotAFunction {
        text: SubStr,
    },
    NotAValue {
        text: SubStr,
    },
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    ConstAssign {
        text: SubStr,
    },
    NoReturn,
    BadOutput {
        found: &'static str,
    },
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity}, but found {found}",
                name = name.get(),
            ),

            EvalErrTyp::UndefinedIdent { text, similar } => {
                write!(f, "undefined identifier '{}'", text.get())?;
                if let Some(similar) = similar {
                    write!(f, " (did you mean '{similar}'?)")?;
                }
                Ok(())
            }

            EvalErrTyp::NotAFunction { text } => {
                write!(f, "'{}' is not a function", text.get())
            }

            EvalErrTyp::NotAValue { text } => {
                write!(f, "function '{}' used without calling it", text.get())
            }

            EvalErrTyp::TypeMismatch { expected, found } => {
                write!(f, "expected a {expected} but found a {found}")
            }

            EvalErrTyp::ConstAssign { text } => {
                write!(f, "cannot assign to constant '{}'", text.get())
            }

            EvalErrTyp::NoReturn => write!(f, "snippet finished without returning a value"),

            EvalErrTyp::BadOutput { found } => write!(
                f,
                "snippet must return a number or a list of numbers, but returned a {found}"
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub loc: Option<SubStr>, // if none, associated with the snippet as a whole
}

impl EvalErr {
    fn at(typ: EvalErrTyp, loc: &SubStr) -> Self {
        Self {
            typ,
            loc: Some(loc.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub const fn accepts(&self, argc: usize) -> bool {
        match self {
            Self::Exact(n) => argc == *n,
            Self::AtLeast(n) => argc >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, n) = match self {
            Self::Exact(n) => ("", *n),
            Self::AtLeast(n) => ("at least ", *n),
        };
        write!(
            f,
            "{prefix}{n} argument{s}",
            s = if n == 1 { "" } else { "s" }
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Fun {
    pub arity: Arity,
    pub fun: fn(Vec<Number>) -> Number,
}

impl Fun {
    pub const fn new(arity: Arity, fun: fn(Vec<Number>) -> Number) -> Self {
        Self { arity, fun }
    }
}

#[derive(Debug)]
pub enum Ident {
    Const(Number),
    Fun(Fun),
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Owned(String),
    Static(&'static str),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Owned(s) => s,
            Self::Static(s) => s,
        }
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<String> for IdentKey {
    fn from(s: String) -> Self {
        Self::Owned(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

/// A compiled expression in postfix order.
#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

impl DeclKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "const" => Some(Self::Const),
            "let" => Some(Self::Let),
            "var" => Some(Self::Var),
            _ => None,
        }
    }

    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Let => "let",
            Self::Var => "var",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Decl {
        kind: DeclKind,
        name: SubStr,
        init: Program,
        loc: SubStr,
    },
    Assign {
        name: SubStr,
        typ: AssignTyp,
        value: Program,
    },
    Step {
        name: SubStr,
        delta: Number,
    },
    Return {
        value: Program,
        loc: SubStr,
    },
    If {
        cond: Program,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Program,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Program>,
        step: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Expr(Program),
    Break,
    Continue,
}

/// A parsed snippet: the statements of one function body taking `x`.
#[derive(Clone, Debug, Default)]
pub struct Script {
    pub stmts: Vec<Stmt>,
}

enum Flow {
    Next,
    Break,
    Continue,
    Return(Value),
}

#[derive(Debug)]
struct Binding {
    name: IdentKey,
    value: Value,
    constant: bool,
}

/// Lexically scoped variables over the builtin identifiers.
#[derive(Debug)]
pub struct Env<'i> {
    idents: &'i Idents,
    bindings: Vec<Binding>,
    scopes: Vec<usize>,
    stack: Vec<Value>,
}

impl<'i> Env<'i> {
    pub fn new(idents: &'i Idents) -> Self {
        Self {
            idents,
            bindings: Vec::new(),
            scopes: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn declare(&mut self, name: impl Into<IdentKey>, value: Value, constant: bool) {
        self.bindings.push(Binding {
            name: name.into(),
            value,
            constant,
        });
    }

    fn push_scope(&mut self) {
        self.scopes.push(self.bindings.len());
    }

    fn pop_scope(&mut self) {
        if let Some(len) = self.scopes.pop() {
            self.bindings.truncate(len);
        }
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.name.get() == name)
    }

    fn similar_name(&self, text: &str) -> Option<String> {
        // HACK: this is wasteful but that's not important
        let text = text.to_ascii_lowercase();
        self.bindings
            .iter()
            .map(|b| b.name.get())
            .chain(self.idents.keys().map(IdentKey::get))
            .map(|name| {
                (
                    strsim::normalized_damerau_levenshtein(&text, &name.to_ascii_lowercase()),
                    name,
                )
            })
            .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
            .filter(|(sim, _)| *sim > 0.3)
            .map(|(_, name)| name.to_string())
    }

    fn undefined(&self, text: &SubStr) -> EvalErr {
        EvalErr::at(
            EvalErrTyp::UndefinedIdent {
                text: text.clone(),
                similar: self.similar_name(text.get()),
            },
            text,
        )
    }

    /// Evaluates one compiled expression.
    pub fn eval(&mut self, prog: &Program) -> Result<Value, EvalErr> {
        let mut stack = core::mem::take(&mut self.stack);
        stack.clear();
        let ret = self.eval_with(prog, &mut stack);
        self.stack = stack;
        ret
    }

    fn eval_with(&self, prog: &Program, stack: &mut Vec<Value>) -> Result<Value, EvalErr> {
        fn take_args(
            stack: &mut Vec<Value>,
            op: &Operation,
            name: impl Into<IdentKey>,
            n: usize,
            arity: Arity,
        ) -> Result<Vec<Value>, EvalErr> {
            // stack: ...a, b, c, d
            //                 ^^^^ args if n is 2
            let len = stack.len();
            if len < n {
                return Err(EvalErr::at(
                    EvalErrTyp::MissingArgs {
                        name: name.into(),
                        arity,
                        found: len,
                    },
                    &op.loc,
                ));
            }
            Ok(stack.split_off(len - n))
        }

        for op in prog.ops() {
            match op.typ {
                OperationTyp::Val(num) => stack.push(Value::Num(num)),

                OperationTyp::Bool(b) => stack.push(Value::Bool(b)),

                OperationTyp::Operator(typ) => {
                    let n = typ.arity();
                    let args = take_args(stack, op, typ.name(), n, Arity::Exact(n))?;
                    let val = typ.apply(&args).map_err(|typ| EvalErr::at(typ, &op.loc))?;
                    stack.push(val);
                }

                OperationTyp::Ident => {
                    let sym = &op.loc;
                    let val = if let Some(binding) = self.binding(sym.get()) {
                        binding.value.clone()
                    } else {
                        match self.idents.get(&sym.clone().into()) {
                            Some(Ident::Const(val)) => Value::Num(*val),
                            Some(Ident::Fun(_)) => {
                                return Err(EvalErr::at(
                                    EvalErrTyp::NotAValue { text: sym.clone() },
                                    sym,
                                ))
                            }
                            None => return Err(self.undefined(sym)),
                        }
                    };
                    stack.push(val);
                }

                OperationTyp::Call { argc } => {
                    let sym = &op.loc;
                    if self.binding(sym.get()).is_some() {
                        return Err(EvalErr::at(
                            EvalErrTyp::NotAFunction { text: sym.clone() },
                            sym,
                        ));
                    }
                    let fun = match self.idents.get(&sym.clone().into()) {
                        Some(Ident::Fun(fun)) => *fun,
                        Some(Ident::Const(_)) => {
                            return Err(EvalErr::at(
                                EvalErrTyp::NotAFunction { text: sym.clone() },
                                sym,
                            ))
                        }
                        None => return Err(self.undefined(sym)),
                    };
                    let args = take_args(stack, op, sym.clone(), argc, fun.arity)?;
                    if !fun.arity.accepts(argc) {
                        return Err(EvalErr::at(
                            EvalErrTyp::MissingArgs {
                                name: sym.clone().into(),
                                arity: fun.arity,
                                found: argc,
                            },
                            sym,
                        ));
                    }
                    let nums = args
                        .iter()
                        .map(Value::number)
                        .collect::<Result<Vec<Number>, _>>()
                        .map_err(|typ| EvalErr::at(typ, sym))?;
                    stack.push(Value::Num((fun.fun)(nums)));
                }

                OperationTyp::List { len } => {
                    let items = take_args(stack, op, "list", len, Arity::Exact(len))?;
                    stack.push(Value::List(items));
                }
            }
        }

        // the parser guarantees a single value per expression
        stack.pop().ok_or(EvalErr {
            typ: EvalErrTyp::Empty,
            loc: None,
        })
    }

    /// Runs a function body and returns the value of its `return`.
    pub fn run(&mut self, stmts: &[Stmt]) -> Result<Value, EvalErr> {
        match self.exec_all(stmts)? {
            Flow::Return(val) => Ok(val),
            Flow::Next | Flow::Break | Flow::Continue => Err(EvalErr {
                typ: EvalErrTyp::NoReturn,
                loc: None,
            }),
        }
    }

    fn exec_all(&mut self, stmts: &[Stmt]) -> Result<Flow, EvalErr> {
        for stmt in stmts {
            match self.exec(stmt)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn scoped<F>(&mut self, f: F) -> Result<Flow, EvalErr>
    where
        F: FnOnce(&mut Self) -> Result<Flow, EvalErr>,
    {
        self.push_scope();
        let ret = f(self);
        self.pop_scope();
        ret
    }

    fn assign(&mut self, name: &SubStr, typ: AssignTyp, val: Value) -> Result<(), EvalErr> {
        let Some(idx) = self.bindings.iter().rposition(|b| b.name.get() == name.get()) else {
            return Err(self.undefined(name));
        };
        let binding = &mut self.bindings[idx];
        if binding.constant {
            return Err(EvalErr::at(
                EvalErrTyp::ConstAssign { text: name.clone() },
                name,
            ));
        }
        binding.value = typ
            .combine(&binding.value, val)
            .map_err(|typ| EvalErr::at(typ, name))?;
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, EvalErr> {
        match stmt {
            Stmt::Decl {
                kind, name, init, ..
            } => {
                let val = self.eval(init)?;
                self.declare(name.clone(), val, *kind == DeclKind::Const);
            }

            Stmt::Assign { name, typ, value } => {
                let val = self.eval(value)?;
                self.assign(name, *typ, val)?;
            }

            Stmt::Step { name, delta } => self.assign(name, AssignTyp::Add, Value::Num(*delta))?,

            Stmt::Return { value, .. } => return Ok(Flow::Return(self.eval(value)?)),

            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.truthy() {
                    return self.scoped(|env| env.exec(then));
                } else if let Some(otherwise) = otherwise {
                    return self.scoped(|env| env.exec(otherwise));
                }
            }

            Stmt::While { cond, body } => {
                while self.eval(cond)?.truthy() {
                    match self.scoped(|env| env.exec(body))? {
                        Flow::Break => break,
                        Flow::Next | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }

            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                return self.scoped(|env| {
                    if let Some(init) = init {
                        env.exec(init)?;
                    }
                    loop {
                        if let Some(cond) = cond {
                            if !env.eval(cond)?.truthy() {
                                break;
                            }
                        }
                        match env.scoped(|env| env.exec(body))? {
                            Flow::Break => break,
                            Flow::Next | Flow::Continue => {}
                            ret @ Flow::Return(_) => return Ok(ret),
                        }
                        if let Some(step) = step {
                            env.exec(step)?;
                        }
                    }
                    Ok(Flow::Next)
                });
            }

            Stmt::Block(stmts) => return self.scoped(|env| env.exec_all(stmts)),

            Stmt::Expr(prog) => {
                self.eval(prog)?;
            }

            Stmt::Break => return Ok(Flow::Break),

            Stmt::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, parse::parse, stdlib};
    use std::sync::Arc;

    fn run(src: &str, x: Number) -> Result<Value, EvalErr> {
        let src = Arc::new(src.to_string());
        let script = parse(Lexer::new(&src), &src).unwrap();
        let idents = stdlib::standard_idents();
        let mut env = Env::new(&idents);
        env.declare(stdlib::X, Value::Num(x), false);
        env.run(&script.stmts)
    }

    #[test]
    fn arithmetic_and_builtins() {
        assert_eq!(run("return 1 + 2 * 3 ** 2;", 0.0).unwrap(), Value::Num(19.0));
        assert_eq!(run("return Math.max(x, 1, 7);", 3.0).unwrap(), Value::Num(7.0));
        assert_eq!(run("return (x > 1) + 1;", 3.0).unwrap(), Value::Num(2.0));
    }

    #[test]
    fn loops_and_scopes() {
        let src = "let s = 0;\nfor (let i = 0; i < 10; i++) {\n  if (i == 3) { continue; }\n  if (i > 5) { break; }\n  s += i;\n}\nreturn s;";
        assert_eq!(run(src, 0.0).unwrap(), Value::Num(12.0));

        let src = "let n = 0;\nwhile (n < 4) { n += 1; let tmp = n; }\nreturn n;";
        assert_eq!(run(src, 0.0).unwrap(), Value::Num(4.0));

        // block-scoped names are gone after the block
        let err = run("{ let t = 1; }\nreturn t;", 0.0).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::UndefinedIdent { .. }));
    }

    #[test]
    fn constants_reject_assignment() {
        let err = run("const k = 2;\nk *= 3;\nreturn k;", 0.0).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::ConstAssign { .. }));
        assert_eq!(err.loc.unwrap().get(), "k");
    }

    #[test]
    fn undefined_names_suggest_similar() {
        let err = run("return Math.sqr(x);", 0.0).unwrap_err();
        assert_eq!(err.to_string(), "undefined identifier 'Math.sqr' (did you mean 'Math.sqrt'?)");
    }

    #[test]
    fn missing_return() {
        let err = run("let a = x;", 0.0).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::NoReturn));
        assert!(err.loc.is_none());
    }

    #[test]
    fn outputs() {
        assert_eq!(Value::Num(1.0).into_outputs().unwrap(), [1.0]);
        let list = Value::List(vec![Value::Num(1.0), Value::Num(2.0)]);
        assert_eq!(list.into_outputs().unwrap(), [1.0, 2.0]);
        assert!(Value::Bool(true).into_outputs().is_err());
        assert!(Value::List(vec![Value::List(Vec::new())]).into_outputs().is_err());
    }
}
