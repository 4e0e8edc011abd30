// SPDX: CC0-1.0

use core::convert::Infallible;
use curve_sketch::{
    render::{Color, Stroke, Surface, TextStyle},
    session::Session,
    Number, Point,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Clear(Color),
    Path {
        points: Vec<Point<Number>>,
        stroke: Stroke,
    },
    Circle {
        center: Point<Number>,
        radius: Number,
        color: Color,
    },
    Rect {
        origin: Point<Number>,
        size: Point<Number>,
        color: Color,
    },
    Text {
        text: String,
        at: Point<Number>,
        style: TextStyle,
    },
}

/// Keeps the calls of the most recent draw.
#[derive(Clone, Debug)]
pub struct Recorder {
    pub width: Number,
    pub height: Number,
    pub calls: Vec<Call>,
}

impl Recorder {
    pub fn new(width: Number, height: Number) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = (&[Point<Number>], &Stroke)> {
        self.calls.iter().filter_map(|call| match call {
            Call::Path { points, stroke } => Some((points.as_slice(), stroke)),
            _ => None,
        })
    }

    pub fn paths_in(&self, color: Color) -> Vec<&[Point<Number>]> {
        self.paths()
            .filter(|(_, stroke)| stroke.color == color && stroke.dash.is_none())
            .map(|(points, _)| points)
            .collect()
    }

    pub fn dashed(&self) -> usize {
        self.paths().filter(|(_, stroke)| stroke.dash.is_some()).count()
    }

    pub fn circles_in(&self, color: Color) -> Vec<Point<Number>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Circle { center, color: c, .. } if *c == color => Some(*center),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for Recorder {
    type Err = Infallible;

    fn size(&self) -> (Number, Number) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) -> Result<(), Infallible> {
        self.calls.clear();
        self.calls.push(Call::Clear(color));
        Ok(())
    }

    fn stroke_path(&mut self, path: &[Point<Number>], stroke: &Stroke) -> Result<(), Infallible> {
        self.calls.push(Call::Path {
            points: path.to_vec(),
            stroke: stroke.clone(),
        });
        Ok(())
    }

    fn fill_circle(&mut self, center: Point<Number>, radius: Number, color: Color) -> Result<(), Infallible> {
        self.calls.push(Call::Circle {
            center,
            radius,
            color,
        });
        Ok(())
    }

    fn fill_rect(&mut self, origin: Point<Number>, size: Point<Number>, color: Color) -> Result<(), Infallible> {
        self.calls.push(Call::Rect {
            origin,
            size,
            color,
        });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, at: Point<Number>, style: &TextStyle) -> Result<(), Infallible> {
        self.calls.push(Call::Text {
            text: text.to_string(),
            at,
            style: *style,
        });
        Ok(())
    }

    fn measure_text_width(&self, text: &str, size: Number) -> Number {
        text.len() as Number * size * 0.5
    }
}

pub fn session(src: &str) -> Session<Recorder> {
    let mut session = Session::new(Recorder::new(800.0, 600.0));
    session.set_source(src).unwrap();
    session
}
