// SPDX: CC0-1.0

use crate::{
    annotate::{annotate, Annotations, ParamValue},
    eval::{EvalErr, Idents, Script},
    lex::{Lexer, SubStr},
    params::{ParamErr, ParameterStore},
    parse::{parse, ParseErr},
    range::{self, RangeConfig, RangeMapper},
    render::{readout, render, Frame, Surface},
    sample::{sample, SampleGrid, DEFAULT_SAMPLES},
    stdlib,
    synth::{self, ExecutableUnit},
    Number,
};
use core::{fmt, num::NonZeroU16};
use std::sync::Arc;
use tracing::debug;

/// Why a pass drew no curves.
#[derive(Clone, Debug)]
pub enum PassError {
    Compile(ParseErr),
    Eval(EvalErr),
}

impl PassError {
    pub fn loc(&self) -> Option<&SubStr> {
        match self {
            Self::Compile(err) => Some(&err.loc),
            Self::Eval(err) => err.loc.as_ref(),
        }
    }
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(err) => write!(f, "compile error: {err}"),
            Self::Eval(err) => write!(f, "evaluation error: {err}"),
        }
    }
}

/// The live state behind one plot. Every event handler runs a full
/// annotate, merge, synthesize, sample and render pass before returning.
#[derive(Debug)]
pub struct Session<S> {
    source: Arc<String>,
    script: Result<Script, ParseErr>,
    annotations: Annotations,
    params: ParameterStore,
    range: &'static RangeConfig,
    cursor: Option<Number>,
    samples: NonZeroU16,
    idents: Arc<Idents>,
    unit: Option<ExecutableUnit>,
    grid: Option<SampleGrid>,
    error: Option<PassError>,
    surface: S,
}

impl<S: Surface> Session<S> {
    /// An empty snippet on the default range. Nothing is drawn until the
    /// first event.
    pub fn new(surface: S) -> Self {
        Self {
            source: Arc::new(String::new()),
            script: Ok(Script::default()),
            annotations: Annotations::default(),
            params: ParameterStore::new(),
            range: range::default_preset(),
            cursor: None,
            samples: DEFAULT_SAMPLES,
            idents: Arc::new(stdlib::standard_idents()),
            unit: None,
            grid: None,
            error: None,
            surface,
        }
    }

    pub fn set_source(&mut self, source: impl Into<String>) -> Result<(), S::Err> {
        self.source = Arc::new(source.into());
        self.annotations = annotate(&self.source);
        self.params.merge(self.annotations.params.clone());
        self.script = parse(Lexer::new(&self.source), &self.source);
        debug!(
            params = self.params.len(),
            labels = self.annotations.labels.len(),
            parsed = self.script.is_ok(),
            "source changed"
        );
        self.pass()
    }

    /// Edits a value directly. The source is left as written.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<Result<(), ParamErr>, S::Err> {
        if let Err(err) = self.params.set(name, value) {
            return Ok(Err(err));
        }
        self.pass().map(Ok)
    }

    /// Moves a slider to normalized position `u` and returns the new value.
    pub fn set_slider(&mut self, name: &str, u: Number) -> Result<Result<Number, ParamErr>, S::Err> {
        match self.params.set_normalized(name, u) {
            Ok(value) => self.pass().map(|()| Ok(value)),
            Err(err) => Ok(Err(err)),
        }
    }

    pub fn toggle(&mut self, name: &str) -> Result<Result<bool, ParamErr>, S::Err> {
        match self.params.toggle(name) {
            Ok(state) => self.pass().map(|()| Ok(state)),
            Err(err) => Ok(Err(err)),
        }
    }

    /// Switches the domain/range. Parameter values are untouched.
    pub fn select_range(&mut self, config: &'static RangeConfig) -> Result<(), S::Err> {
        self.range = config;
        self.pass()
    }

    /// Hover at pixel `x`, or leave the plot with `None`.
    pub fn set_cursor(&mut self, x: Option<Number>) -> Result<(), S::Err> {
        self.cursor = x;
        self.pass()
    }

    pub fn set_samples(&mut self, samples: NonZeroU16) -> Result<(), S::Err> {
        self.samples = samples;
        self.pass()
    }

    /// Swaps in a new drawing surface (for example after a resize).
    pub fn set_surface(&mut self, surface: S) -> Result<S, S::Err> {
        let old = core::mem::replace(&mut self.surface, surface);
        self.pass().map(|()| old)
    }

    pub fn redraw(&mut self) -> Result<(), S::Err> {
        self.pass()
    }

    fn pass(&mut self) -> Result<(), S::Err> {
        match self.evaluate() {
            Ok(grid) => {
                debug!(curves = grid.curves(), samples = grid.len(), "pass complete");
                self.grid = Some(grid);
                self.error = None;
            }
            Err(err) => {
                debug!(%err, "pass failed");
                self.grid = None;
                self.error = Some(err);
            }
        }
        self.draw()
    }

    fn evaluate(&mut self) -> Result<SampleGrid, PassError> {
        self.unit = None;
        let script = self.script.as_ref().map_err(|err| PassError::Compile(err.clone()))?;
        let unit = synth::build(script, &self.annotations, &self.params, &self.idents)
            .map_err(PassError::Compile)?;
        let unit = self.unit.insert(unit);
        sample(|x| unit.call(x), &self.range.x, self.samples).map_err(PassError::Eval)
    }

    fn mapper(&self) -> RangeMapper<'static> {
        let (width, height) = self.surface.size();
        RangeMapper::new(self.range, width, height)
    }

    fn draw(&mut self) -> Result<(), S::Err> {
        let frame = Frame {
            mapper: self.mapper(),
            grid: self.grid.as_ref(),
            labels: &self.annotations.labels,
            cursor: self.cursor,
        };
        render(&mut self.surface, &frame)
    }

    pub fn source(&self) -> &Arc<String> {
        &self.source
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    pub fn labels(&self) -> &[String] {
        &self.annotations.labels
    }

    pub fn range(&self) -> &'static RangeConfig {
        self.range
    }

    pub fn cursor(&self) -> Option<Number> {
        self.cursor
    }

    pub fn samples(&self) -> NonZeroU16 {
        self.samples
    }

    pub fn idents(&self) -> &Idents {
        &self.idents
    }

    /// The snippet as last synthesized, if it compiled.
    pub fn unit(&self) -> Option<&ExecutableUnit> {
        self.unit.as_ref()
    }

    pub fn grid(&self) -> Option<&SampleGrid> {
        self.grid.as_ref()
    }

    /// The error of the last pass; cleared by the next successful one.
    pub fn error(&self) -> Option<&PassError> {
        self.error.as_ref()
    }

    /// What the hover badges show: `(curve, label, y)` for each labeled
    /// curve under the cursor. Empty when not hovering over the plot.
    pub fn readout(&self) -> Vec<(usize, &str, Number)> {
        let mapper = self.mapper();
        match (self.grid.as_ref(), self.cursor) {
            (Some(grid), Some(px)) if mapper.contains_x(px) => {
                readout(grid, &self.annotations.labels, &mapper, px)
            }
            _ => Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::SvgSurface;

    fn session(src: &str) -> Session<SvgSurface> {
        let mut s = Session::new(SvgSurface::new(800.0, 600.0));
        s.set_source(src).unwrap();
        s
    }

    #[test]
    fn compile_error_clears_on_fix() {
        let mut s = session("return x +;");
        assert!(matches!(s.error(), Some(PassError::Compile(_))));
        assert!(s.grid().is_none());
        assert!(s.unit().is_none());

        s.set_source("return x;").unwrap();
        assert!(s.error().is_none());
        assert_eq!(s.grid().unwrap().curves(), 1);
    }

    #[test]
    fn evaluation_error_keeps_unit() {
        let s = session("return nope(x);");
        let err = s.error().unwrap();
        assert!(matches!(err, PassError::Eval(_)));
        assert!(err.to_string().starts_with("evaluation error: undefined identifier 'nope'"));
        assert!(s.unit().is_some());
    }

    #[test]
    fn slider_and_toggle_rerun_the_pass() {
        let mut s = session(
            "const k = 1; // range(0,10)\nconst neg = false; // checkbox\nif (neg) { return -k * x; }\nreturn k * x;",
        );
        assert_eq!(s.set_slider("k", 0.5).unwrap(), Ok(5.0));
        assert_eq!(s.grid().unwrap().value(500, 0), Some(5.0));
        assert_eq!(s.toggle("neg").unwrap(), Ok(true));
        assert_eq!(s.grid().unwrap().value(500, 0), Some(-5.0));
        assert!(s.toggle("k").unwrap().is_err());
    }

    #[test]
    fn sample_count_is_adjustable() {
        let mut s = session("return x;");
        s.set_samples(NonZeroU16::new(10).unwrap()).unwrap();
        assert_eq!(s.grid().unwrap().len(), 11);
    }
}
