// SPDX: CC0-1.0

use crate::{range::RangeMapper, sample::SampleGrid, Number, Point};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opacity(&self) -> Number {
        Number::from(self.a) / 255.0
    }
}

/// Writes `#rrggbb`; alpha is left to the caller.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const PALETTE: [Color; 6] = [
    Color::rgb(0x00, 0xff, 0x88),
    Color::rgb(0xff, 0x44, 0x44),
    Color::rgb(0xff, 0xdd, 0x44),
    Color::rgb(0x44, 0x88, 0xff),
    Color::rgb(0xff, 0x88, 0xff),
    Color::rgb(0x44, 0xff, 0xff),
];

pub fn curve_color(curve: usize) -> Color {
    PALETTE[curve % PALETTE.len()]
}

const BACKGROUND: Color = Color::rgb(0x0a, 0x0a, 0x0a);
const GRID: Color = Color::rgb(0x2a, 0x2a, 0x2a);
const ZERO_LINE: Color = Color::rgb(0x55, 0x55, 0x55);
const AXIS: Color = Color::rgb(0x4a, 0x4a, 0x4a);
const TICK_TEXT: Color = Color::rgb(0x88, 0x88, 0x88);
const TITLE_TEXT: Color = Color::rgb(0xaa, 0xaa, 0xaa);
const CURSOR: Color = Color::rgb(0x66, 0x66, 0x66);
const BADGE_BACKGROUND: Color = Color::rgba(0x0a, 0x0a, 0x0a, 230);

const CURVE_WIDTH: Number = 2.5;
const MARKER_RADIUS: Number = 4.0;
const BADGE_FONT: Number = 13.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: Number,
    /// dash and gap lengths
    pub dash: Option<[Number; 2]>,
}

impl Stroke {
    pub const fn solid(color: Color, width: Number) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size: Number,
    pub align: Align,
    pub color: Color,
    /// rotated a quarter turn counter-clockwise about the anchor
    pub vertical: bool,
}

impl TextStyle {
    pub const fn new(size: Number, align: Align, color: Color) -> Self {
        Self {
            size,
            align,
            color,
            vertical: false,
        }
    }
}

/// Something the plot can be drawn on, in pixel coordinates with the origin
/// at the top left.
pub trait Surface {
    type Err;

    fn size(&self) -> (Number, Number);
    fn clear(&mut self, color: Color) -> Result<(), Self::Err>;
    fn stroke_path(&mut self, path: &[Point<Number>], stroke: &Stroke) -> Result<(), Self::Err>;
    fn fill_circle(&mut self, center: Point<Number>, radius: Number, color: Color) -> Result<(), Self::Err>;
    fn fill_rect(&mut self, origin: Point<Number>, size: Point<Number>, color: Color) -> Result<(), Self::Err>;
    fn fill_text(&mut self, text: &str, at: Point<Number>, style: &TextStyle) -> Result<(), Self::Err>;
    fn measure_text_width(&self, text: &str, size: Number) -> Number;
}

/// Everything one draw needs. `grid` is `None` when the pass failed, which
/// still draws the frame but no curves.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub mapper: RangeMapper<'a>,
    pub grid: Option<&'a SampleGrid>,
    pub labels: &'a [String],
    /// hover position in pixels, if hovering
    pub cursor: Option<Number>,
}

/// Full redraw of `frame` onto `surface`.
pub fn render<S: Surface>(surface: &mut S, frame: &Frame<'_>) -> Result<(), S::Err> {
    surface.clear(BACKGROUND)?;
    draw_grid(surface, &frame.mapper)?;
    draw_axes(surface, &frame.mapper)?;
    if let Some(grid) = frame.grid {
        for curve in 0..grid.curves() {
            draw_curve(surface, &frame.mapper, grid, curve)?;
        }
        if let Some(px) = frame.cursor.filter(|&px| frame.mapper.contains_x(px)) {
            draw_cursor(surface, &frame.mapper, grid, frame.labels, px)?;
        }
    }
    Ok(())
}

fn line<S: Surface>(surface: &mut S, from: Point<Number>, to: Point<Number>, stroke: &Stroke) -> Result<(), S::Err> {
    surface.stroke_path(&[from, to], stroke)
}

fn draw_grid<S: Surface>(surface: &mut S, m: &RangeMapper<'_>) -> Result<(), S::Err> {
    let stroke = Stroke::solid(GRID, 1.0);
    let x_ticks = m.x_ticks();
    let y_ticks = m.y_ticks();

    for (t, _) in &x_ticks {
        let x = m.plot_to_pixel(Point { x: *t, y: 0.0 }).x;
        line(surface, Point { x, y: m.top() }, Point { x, y: m.bottom() }, &stroke)?;
    }
    for (t, _) in &y_ticks {
        let y = m.plot_to_pixel(Point { x: 0.0, y: *t }).y;
        line(surface, Point { x: m.left(), y }, Point { x: m.right(), y }, &stroke)?;
    }

    let y_range = &m.config.y;
    if y_range.start < 0.0 && 0.0 < y_range.end {
        let y = m.to_pixel(Point { x: 0.0, y: 0.0 }).y;
        line(
            surface,
            Point { x: m.left(), y },
            Point { x: m.right(), y },
            &Stroke::solid(ZERO_LINE, 1.0),
        )?;
    }

    let style = TextStyle::new(12.0, Align::Center, TICK_TEXT);
    for (t, label) in &x_ticks {
        let x = m.plot_to_pixel(Point { x: *t, y: 0.0 }).x;
        surface.fill_text(label, Point { x, y: m.bottom() + 20.0 }, &style)?;
    }
    let style = TextStyle {
        align: Align::Right,
        ..style
    };
    for (t, label) in &y_ticks {
        let y = m.plot_to_pixel(Point { x: 0.0, y: *t }).y;
        surface.fill_text(label, Point { x: m.left() - 10.0, y: y + 4.0 }, &style)?;
    }
    Ok(())
}

fn draw_axes<S: Surface>(surface: &mut S, m: &RangeMapper<'_>) -> Result<(), S::Err> {
    let stroke = Stroke::solid(AXIS, 2.0);
    let origin = Point {
        x: m.left(),
        y: m.bottom(),
    };
    line(surface, origin, Point { x: m.right(), y: m.bottom() }, &stroke)?;
    line(surface, Point { x: m.left(), y: m.top() }, origin, &stroke)?;

    let title = TextStyle::new(14.0, Align::Center, TITLE_TEXT);
    surface.fill_text(
        "Input (x)",
        Point {
            x: m.width / 2.0,
            y: m.height - 5.0,
        },
        &title,
    )?;
    surface.fill_text(
        "Output (y)",
        Point {
            x: 15.0,
            y: m.height / 2.0,
        },
        &TextStyle {
            vertical: true,
            ..title
        },
    )?;
    surface.fill_text(
        m.config.label,
        Point {
            x: m.right(),
            y: m.top() - 12.0,
        },
        &TextStyle::new(12.0, Align::Right, TICK_TEXT),
    )
}

/// Pixel polylines of one curve. A sample without this curve is skipped; a
/// non-finite value ends the current polyline.
pub fn segments(grid: &SampleGrid, curve: usize, m: &RangeMapper<'_>) -> Vec<Vec<Point<Number>>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for idx in 0..grid.len() {
        let Some(y) = grid.value(idx, curve) else {
            continue;
        };
        if y.is_finite() {
            current.push(m.to_pixel(Point { x: grid.xs()[idx], y }));
        } else if !current.is_empty() {
            out.push(core::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn draw_curve<S: Surface>(surface: &mut S, m: &RangeMapper<'_>, grid: &SampleGrid, curve: usize) -> Result<(), S::Err> {
    let color = curve_color(curve);
    let stroke = Stroke::solid(color, CURVE_WIDTH);
    for path in segments(grid, curve, m) {
        if path.len() > 1 {
            surface.stroke_path(&path, &stroke)?;
        }
    }

    let Some(last) = grid.len().checked_sub(1) else {
        return Ok(());
    };
    for idx in [0, last] {
        if let Some(y) = grid.value(idx, curve).filter(|y| y.is_finite()) {
            let at = m.to_pixel(Point { x: grid.xs()[idx], y });
            surface.fill_circle(at, MARKER_RADIUS, color)?;
        }
    }
    Ok(())
}

/// Left edge of a badge `width` wide next to a dot at `px`: to the right,
/// unless that would run past `right`.
pub fn badge_x(px: Number, width: Number, right: Number) -> Number {
    let x = px + 10.0;
    if x + width + 2.0 > right {
        px - 10.0 - width
    } else {
        x
    }
}

/// Labeled values under a cursor at pixel `px`, read from the nearest
/// sample: `(curve, label, y)`. Unlabeled curves are left out.
pub fn readout<'l>(
    grid: &SampleGrid,
    labels: &'l [String],
    m: &RangeMapper<'_>,
    px: Number,
) -> Vec<(usize, &'l str, Number)> {
    let Some(idx) = grid.nearest(m.pixel_to_plot_x(px)) else {
        return Vec::new();
    };
    (0..grid.curves())
        .filter_map(|curve| {
            let label = labels.get(curve).filter(|label| !label.is_empty())?;
            let y = grid.value(idx, curve).filter(|y| y.is_finite())?;
            Some((curve, label.as_str(), y))
        })
        .collect()
}

fn draw_cursor<S: Surface>(
    surface: &mut S,
    m: &RangeMapper<'_>,
    grid: &SampleGrid,
    labels: &[String],
    px: Number,
) -> Result<(), S::Err> {
    let stroke = Stroke {
        dash: Some([5.0, 5.0]),
        ..Stroke::solid(CURSOR, 1.0)
    };
    line(surface, Point { x: px, y: m.top() }, Point { x: px, y: m.bottom() }, &stroke)?;

    for (curve, label, y) in readout(grid, labels, m, px) {
        let color = curve_color(curve);
        let dot_y = m.to_pixel(Point { x: 0.0, y }).y;
        surface.fill_circle(Point { x: px, y: dot_y }, MARKER_RADIUS, color)?;

        let text = format!("{label}: {y:.3}");
        let width = surface.measure_text_width(&text, BADGE_FONT);
        let at = Point {
            x: badge_x(px, width, m.right()),
            y: dot_y + 4.0,
        };
        surface.fill_rect(
            Point {
                x: at.x - 2.0,
                y: at.y - 12.0,
            },
            Point {
                x: width + 4.0,
                y: 16.0,
            },
            BADGE_BACKGROUND,
        )?;
        surface.fill_text(&text, at, &TextStyle::new(BADGE_FONT, Align::Left, color))?;
    }
    Ok(())
}
