// SPDX: CC0-1.0

use crate::{
    render::{Align, Color, Stroke, Surface, TextStyle},
    Number, Point,
};
use core::fmt::{self, Write};

/// Collects draw calls as SVG elements.
#[derive(Clone, Debug)]
pub struct SvgSurface {
    width: Number,
    height: Number,
    body: String,
}

impl SvgSurface {
    pub fn new(width: Number, height: Number) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    /// The complete document.
    pub fn finish(&self) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" "#,
                r#"font-family="monospace">"#,
                "\n{body}</svg>\n",
            ),
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }

    fn fill_attrs(&mut self, color: Color) -> fmt::Result {
        write!(self.body, r#"fill="{color}""#)?;
        if color.a != 0xff {
            write!(self.body, r#" fill-opacity="{:.3}""#, color.opacity())?;
        }
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

impl Surface for SvgSurface {
    type Err = fmt::Error;

    fn size(&self) -> (Number, Number) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) -> fmt::Result {
        self.body.clear();
        self.fill_rect(
            Point { x: 0.0, y: 0.0 },
            Point {
                x: self.width,
                y: self.height,
            },
            color,
        )
    }

    fn stroke_path(&mut self, path: &[Point<Number>], stroke: &Stroke) -> fmt::Result {
        let Some((first, rest)) = path.split_first() else {
            return Ok(());
        };
        write!(self.body, r#"<path d="M{:.2} {:.2}"#, first.x, first.y)?;
        for p in rest {
            write!(self.body, " L{:.2} {:.2}", p.x, p.y)?;
        }
        write!(
            self.body,
            r#"" fill="none" stroke="{}" stroke-width="{}""#,
            stroke.color, stroke.width
        )?;
        if let Some([dash, gap]) = stroke.dash {
            write!(self.body, r#" stroke-dasharray="{dash} {gap}""#)?;
        }
        writeln!(self.body, "/>")
    }

    fn fill_circle(&mut self, center: Point<Number>, radius: Number, color: Color) -> fmt::Result {
        write!(
            self.body,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{radius}" "#,
            center.x, center.y
        )?;
        self.fill_attrs(color)?;
        writeln!(self.body, "/>")
    }

    fn fill_rect(&mut self, origin: Point<Number>, size: Point<Number>, color: Color) -> fmt::Result {
        write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" "#,
            origin.x, origin.y, size.x, size.y
        )?;
        self.fill_attrs(color)?;
        writeln!(self.body, "/>")
    }

    fn fill_text(&mut self, text: &str, at: Point<Number>, style: &TextStyle) -> fmt::Result {
        let anchor = match style.align {
            Align::Left => "start",
            Align::Center => "middle",
            Align::Right => "end",
        };
        write!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" text-anchor="{anchor}" "#,
            at.x, at.y, style.size
        )?;
        if style.vertical {
            write!(self.body, r#"transform="rotate(-90 {:.2} {:.2})" "#, at.x, at.y)?;
        }
        self.fill_attrs(style.color)?;
        writeln!(self.body, ">{}</text>", escape(text))
    }

    // NOTE: monospace glyphs are about 0.6em wide
    fn measure_text_width(&self, text: &str, size: Number) -> Number {
        text.chars().count() as Number * size * 0.6
    }
}
