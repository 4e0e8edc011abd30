// SPDX: CC0-1.0

use crate::{
    eval::{AssignTyp, Program, Stmt},
    lex::SubStr,
    synth::ExecutableUnit,
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetSource,
    Show,
    Param,
    Slider,
    Range,
    Size,
    Cursor,
    PrintProg,
    Plot,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetSource,
            Self::Show,
            Self::Param,
            Self::Slider,
            Self::Range,
            Self::Size,
            Self::Cursor,
            Self::Plot,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetSource => "enter a new snippet, ending with a line holding only '.'",
            Self::Show => "show the snippet, its parameters and labels, and the last error",
            Self::Param => "set a parameter's value (a number, or true/false)",
            Self::Slider => "move a range parameter's slider to a position between 0 and 1",
            Self::Range => "select the plot's domain and range preset",
            Self::Size => "set the plot size in pixels",
            Self::Cursor => "hover the cursor at a pixel column (blank to leave the plot)",
            Self::PrintProg => "print the program synthesized from the snippet (for debugging)",
            Self::Plot => "draw the current plot to an svg file",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetSource => "set",
            Self::Show => "show",
            Self::Param => "param",
            Self::Slider => "slider",
            Self::Range => "range",
            Self::Size => "size",
            Self::Cursor => "cursor",
            Self::PrintProg => "prog",
            Self::Plot => "plot",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

/// One trimmed line from standard input, or `None` once it is closed.
pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<Option<String>> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        if stdin.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim().to_string()))
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

/// Lines up to a lone `.` (or the end of input), untrimmed so indentation
/// survives.
pub fn input_block<W: Write>(mut out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    writeln!(out, "{prompt}")?;
    out.flush()?;
    let lines = read_block(stdin().lock()).context("read from standard input failed")?;
    Ok(lines)
}

fn read_block<R: BufRead>(input: R) -> io::Result<String> {
    let mut block = String::new();
    for line in input.lines() {
        let line = line?;
        if line.trim() == "." {
            break;
        }
        block.push_str(&line);
        block.push('\n');
    }
    Ok(block)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?.unwrap_or_default());
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

/// Prints the line holding `span` with carets under it.
pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    let (line, col) = span.line();
    // NOTE(unicode): columns are bytes
    let width = span.len().min(line.len().saturating_sub(col)).max(1);
    writeln!(out, "{line}")?;
    writeln!(out, "{}{}", " ".repeat(col), "^".repeat(width))?;
    Ok(())
}

const fn assign_symbol(typ: AssignTyp) -> &'static str {
    match typ {
        AssignTyp::Set => "=",
        AssignTyp::Add => "+=",
        AssignTyp::Sub => "-=",
        AssignTyp::Mul => "*=",
        AssignTyp::Div => "/=",
    }
}

fn dump_stmt<W: Write>(out: &mut W, stmt: &Stmt, depth: usize) -> io::Result<()> {
    let pad = "  ".repeat(depth);
    let ops = |out: &mut W, prog: &Program| -> io::Result<()> {
        for op in prog.ops() {
            writeln!(out, "{pad}  | {op}")?;
        }
        Ok(())
    };

    match stmt {
        Stmt::Decl {
            kind, name, init, ..
        } => {
            writeln!(out, "{pad}{} {name} =", kind.keyword())?;
            ops(out, init)?;
        }
        Stmt::Assign { name, typ, value } => {
            writeln!(out, "{pad}{name} {}", assign_symbol(*typ))?;
            ops(out, value)?;
        }
        Stmt::Step { name, delta } => writeln!(out, "{pad}{name} += {delta}")?,
        Stmt::Return { value, .. } => {
            writeln!(out, "{pad}return")?;
            ops(out, value)?;
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            writeln!(out, "{pad}if")?;
            ops(out, cond)?;
            dump_stmt(out, then, depth + 1)?;
            if let Some(otherwise) = otherwise {
                writeln!(out, "{pad}else")?;
                dump_stmt(out, otherwise, depth + 1)?;
            }
        }
        Stmt::While { cond, body } => {
            writeln!(out, "{pad}while")?;
            ops(out, cond)?;
            dump_stmt(out, body, depth + 1)?;
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => {
            writeln!(out, "{pad}for")?;
            if let Some(init) = init {
                dump_stmt(out, init, depth + 1)?;
            }
            if let Some(cond) = cond {
                writeln!(out, "{pad}  while")?;
                ops(out, cond)?;
            }
            if let Some(step) = step {
                writeln!(out, "{pad}  step")?;
                dump_stmt(out, step, depth + 2)?;
            }
            dump_stmt(out, body, depth + 1)?;
        }
        Stmt::Block(stmts) => {
            writeln!(out, "{pad}{{")?;
            for stmt in stmts {
                dump_stmt(out, stmt, depth + 1)?;
            }
            writeln!(out, "{pad}}}")?;
        }
        Stmt::Expr(prog) => {
            writeln!(out, "{pad}eval")?;
            ops(out, prog)?;
        }
        Stmt::Break => writeln!(out, "{pad}break")?,
        Stmt::Continue => writeln!(out, "{pad}continue")?,
    }
    Ok(())
}

/// Prints the parameter bindings and statements the snippet runs with.
pub fn dump_unit<W: Write>(mut out: W, unit: &ExecutableUnit) -> io::Result<()> {
    writeln!(out, "bindings: ")?;
    if unit.bindings().is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (name, value) in unit.bindings() {
        writeln!(out, "  const {name} = {value}")?;
    }
    writeln!(out, "body: ")?;
    if unit.body().is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for stmt in unit.body() {
        dump_stmt(&mut out, stmt, 1)?;
    }
    Ok(())
}

pub fn source_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no snippet is defined")
}

pub fn prog_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no program is defined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_round_trip_by_name() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
        assert!("window".parse::<Command>().is_err());
    }

    #[test]
    fn block_ends_at_lone_dot() {
        let input = "const a = 1; // range(0,2)\n  return a * x;\n.\nignored\n";
        assert_eq!(
            read_block(input.as_bytes()).unwrap(),
            "const a = 1; // range(0,2)\n  return a * x;\n"
        );
        assert_eq!(read_block("return x;".as_bytes()).unwrap(), "return x;\n");
    }

    #[test]
    fn underline_marks_the_right_line() {
        let src = Arc::new("let a = 1;\nreturn a +;\n".to_string());
        let span = SubStr::new(Arc::clone(&src), 20, 1);
        let mut out = Vec::new();
        underline(&mut out, &span).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "return a +;\n         ^\n");
    }
}
