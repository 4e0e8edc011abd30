// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU16;
use curve_sketch::{
    annotate::{ParamKind, ParamValue},
    eval::EvalErrTyp,
    lex::{LexErrTyp, SubStr, TokTyp},
    parse::ParseErrTyp,
    range::{self, PRESETS},
    render::Surface,
    session::{PassError, Session},
    shell::{self, Command},
    svg::SvgSurface,
    Number,
};
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::ExitCode,
};
use tracing::level_filters::LevelFilter;

const DEFAULT_SIZE: [Number; 2] = [800.0, 600.0];

const DEFAULT_SOURCE: &str = "\
const curve = 2.0; // range(0.1,5.0)

return Math.pow(x, curve);
";

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn main() -> ExitCode {
    init_logging();
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let level = std::env::var("CURVE_SKETCH_LOG")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

type State = Session<SvgSurface>;

fn try_main() -> anyhow::Result<()> {
    let [width, height] = DEFAULT_SIZE;
    let mut state = State::new(SvgSurface::new(width, height));
    state.set_source(DEFAULT_SOURCE)?;

    let mut stdout = BufWriter::new(stdout());
    loop {
        writeln!(
            stdout,
            "range = {}, {} parameter(s)",
            state.range().name,
            state.parameters().len()
        )?;

        let Some(mut try_cmd) = shell::input(&mut stdout, "> ")? else {
            break;
        };
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetSource => set_source(&mut stdout, &mut state)?,

                Command::Show => show(&mut stdout, &state)?,

                Command::Param => set_param(&mut stdout, &mut state)?,

                Command::Slider => set_slider(&mut stdout, &mut state)?,

                Command::Range => set_range(&mut stdout, &mut state)?,

                Command::Size => set_size(&mut stdout, &mut state)?,

                Command::Cursor => set_cursor(&mut stdout, &mut state)?,

                Command::Plot => plot(&mut stdout, &mut state)?,

                Command::PrintProg => {
                    if let Some(unit) = state.unit() {
                        shell::dump_unit(&mut stdout, unit)?;
                    } else {
                        shell::prog_undefined(&mut stdout)?;
                    }
                }
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_source<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = shell::input_block(&mut out, "snippet (end with a line holding only '.'):")?;
    if input.trim().is_empty() {
        return Ok(());
    }
    state.set_source(input)?;
    report(&mut out, state)?;
    Ok(())
}

fn show<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    if state.source().is_empty() {
        shell::source_undefined(&mut out)?;
    } else {
        writeln!(out, "{}", state.source().trim_end())?;
    }
    writeln!(out)?;

    writeln!(out, "parameters: ")?;
    if state.parameters().is_empty() {
        writeln!(out, "  (none)")?;
    }
    for param in state.parameters().iter() {
        match param.spec.kind {
            ParamKind::Range {
                min,
                max,
                scale,
                is_integer,
            } => {
                let integer = if is_integer { ", integer" } else { "" };
                writeln!(
                    out,
                    "  {name} = {value} (range {min}..{max}, {scale}{integer}, slider at {pos:.3})",
                    name = param.name(),
                    value = param.value,
                    pos = param.normalized().unwrap_or(Number::NAN),
                )?;
            }
            ParamKind::Checkbox => {
                writeln!(out, "  {} = {} (checkbox)", param.name(), param.value)?;
            }
        }
    }

    writeln!(out, "labels: {}", state.labels().join(", "))?;
    writeln!(out, "range: {:#}", state.range())?;
    writeln!(out, "samples: {}", state.samples())?;
    match state.cursor() {
        Some(x) => writeln!(out, "cursor: {x}")?,
        None => writeln!(out, "cursor: off the plot")?,
    }
    report(&mut out, state)?;
    Ok(())
}

fn parse_value(input: &str) -> Option<ParamValue> {
    match input {
        "true" => Some(ParamValue::Bool(true)),
        "false" => Some(ParamValue::Bool(false)),
        _ => input.parse().ok().map(ParamValue::Number),
    }
}

fn set_param<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(name) = shell::input(&mut out, "?name = ")? else {
        return Ok(());
    };
    let Some(input) = shell::input(&mut out, format_args!("?{name} = "))? else {
        return Ok(());
    };
    let Some(value) = parse_value(&input) else {
        writeln!(out, "error: '{input}' is neither a number nor true/false")?;
        return Ok(());
    };
    if let Err(err) = state.set_parameter(&name, value)? {
        writeln!(out, "error: {err}")?;
        return Ok(());
    }
    report(&mut out, state)?;
    Ok(())
}

fn set_slider<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(name) = shell::input(&mut out, "?name = ")? else {
        return Ok(());
    };
    let u = match shell::read_fromstr::<_, Number>(
        &mut out,
        format_args!("?{name} slider position (0 to 1) = "),
        true,
    )? {
        Ok(Some(u)) => u,
        Ok(None) | Err(_) => return Ok(()),
    };
    match state.set_slider(&name, u)? {
        Ok(value) => writeln!(out, "{name} = {value}")?,
        Err(err) => writeln!(out, "error: {err}")?,
    }
    report(&mut out, state)?;
    Ok(())
}

fn set_range<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    for config in PRESETS.iter() {
        let mark = if config.name == state.range().name { "*" } else { " " };
        writeln!(out, "{mark} {name}: {label}", name = config.name, label = config.label)?;
    }
    writeln!(out)?;
    let Some(name) = shell::input(&mut out, "?range = ")? else {
        return Ok(());
    };
    if name.is_empty() {
        return Ok(());
    }
    match range::preset(&name) {
        Some(config) => state.select_range(config)?,
        None => writeln!(out, "error: no range named '{name}'")?,
    }
    Ok(())
}

fn set_size<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let (mut width, mut height) = state.surface().size();
    writeln!(out, "note: leave blank to skip")?;
    for (name, dst) in [("width", &mut width), ("height", &mut height)] {
        match shell::read_fromstr::<_, NonZeroU16>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = Number::from(new.get()),
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    state.set_surface(SvgSurface::new(width, height))?;
    Ok(())
}

fn set_cursor<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let x = match shell::read_fromstr::<_, Number>(&mut out, "?cursor x (pixels) = ", true)? {
        Ok(x) => x,
        Err(_) => return Ok(()),
    };
    state.set_cursor(x)?;
    for (_, label, y) in state.readout() {
        writeln!(out, "{label}: {y:.3}")?;
    }
    Ok(())
}

fn plot<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    state.redraw()?;
    report(&mut out, state)?;

    let path = output_svg_filename(Local::now());
    let mut file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .context("failed to open output svg file")?,
    );
    file.write_all(state.surface().finish().as_bytes())
        .context("failed to write to output svg file")?;
    file.flush()?;
    file.get_mut().sync_data()?;
    writeln!(out, "wrote {path}")?;
    Ok(())
}

/// Prints the last pass's error, if any, with a hint where one helps.
fn report<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let Some(err) = state.error() else {
        return Ok(());
    };

    writeln!(out)?;
    let source = state.source();
    let loc = err
        .loc()
        .cloned()
        // NOTE(unicode)
        .unwrap_or_else(|| SubStr::new(source.clone(), source.trim_end().len(), 0));
    shell::underline(&mut out, &loc)?;
    writeln!(out, "{err}")?;

    match err {
        PassError::Compile(err) => match &err.typ {
            ParseErrTyp::LexErr(LexErrTyp::InvalidChar) => {
                writeln!(
                    out,
                    // TODO: derive this list from the lexer's symbol table
                    "note: available tokens are numbers, identifiers, comments, and symbols +-*/%<>=!&|?:,;()[]{{}}"
                )?;
            }
            ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
                TokTyp::XCaret => writeln!(
                    out,
                    "note: use '**' or 'Math.pow' for exponentiation"
                )?,
                TokTyp::XPipe | TokTyp::XAmpersand => writeln!(
                    out,
                    "note: bitwise operators are not supported, use '&&' and '||' for logic"
                )?,
                _ => {}
            },
            ParseErrTyp::LexErr(LexErrTyp::UnterminatedComment) => {}
            ParseErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number")?,
            ParseErrTyp::MissingOperator => writeln!(
                out,
                "note: implicit multiplication is not supported, so for example '5x' would be '5*x'"
            )?,
            ParseErrTyp::Redeclared { .. } => writeln!(
                out,
                "note: 'x' and every parameter are already declared around the snippet"
            )?,
            ParseErrTyp::ParenMismatch
            | ParseErrTyp::Expected(_)
            | ParseErrTyp::MissingOperand
            | ParseErrTyp::Keyword => {}
        },

        PassError::Eval(err) => match &err.typ {
            EvalErrTyp::NoReturn => writeln!(
                out,
                "note: every path through the snippet must end in a return"
            )?,
            EvalErrTyp::BadOutput { .. } => writeln!(
                out,
                "note: return one number per curve, for example 'return [a, b];'"
            )?,
            _ => {}
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameter_values() {
        assert_eq!(parse_value("true"), Some(ParamValue::Bool(true)));
        assert_eq!(parse_value("-2.5"), Some(ParamValue::Number(-2.5)));
        assert_eq!(parse_value("maybe"), None);
    }

    #[test]
    fn default_source_plots() {
        let [width, height] = DEFAULT_SIZE;
        let mut state = State::new(SvgSurface::new(width, height));
        state.set_source(DEFAULT_SOURCE).unwrap();
        assert!(state.error().is_none());
        assert_eq!(state.parameters().len(), 1);
    }
}
