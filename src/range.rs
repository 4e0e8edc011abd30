// SPDX: CC0-1.0

use crate::{Number, Point};
use core::{f64::consts::PI, fmt, ops::Range};

pub const PADDING: Number = 40.0;
pub const Y_TICK_DIVISIONS: u16 = 10;

/// A named domain/range pair. Selecting one changes only how the plot maps
/// and labels coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeConfig {
    pub name: &'static str,
    pub x: Range<Number>,
    pub y: Range<Number>,
    pub tick_divisions_x: u16,
    pub label: &'static str,
    /// x ticks are written as multiples of π
    pub angular: bool,
}

impl fmt::Display for RangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.name)
            .field("x range", &self.x)
            .field("y range", &self.y)
            .field("x ticks", &self.tick_divisions_x)
            .finish()
    }
}

pub static PRESETS: [RangeConfig; 5] = [
    RangeConfig {
        name: "norm",
        x: 0.0..1.0,
        y: 0.0..1.0,
        tick_divisions_x: 10,
        label: "Normalized [0, 1]",
        angular: false,
    },
    RangeConfig {
        name: "bipolar",
        x: -1.0..1.0,
        y: -1.0..1.0,
        tick_divisions_x: 10,
        label: "Bipolar [-1, 1]",
        angular: false,
    },
    RangeConfig {
        name: "angle",
        x: 0.0..2.0 * PI,
        y: -1.0..1.0,
        tick_divisions_x: 8,
        label: "Angle [0, 2π]",
        angular: true,
    },
    RangeConfig {
        name: "signed-angle",
        x: -PI..PI,
        y: -1.0..1.0,
        tick_divisions_x: 8,
        label: "Signed angle [-π, π]",
        angular: true,
    },
    RangeConfig {
        name: "wide",
        x: -10.0..10.0,
        y: -10.0..10.0,
        tick_divisions_x: 10,
        label: "Wide [-10, 10]",
        angular: false,
    },
];

pub fn preset(name: &str) -> Option<&'static RangeConfig> {
    PRESETS.iter().find(|cfg| cfg.name.eq_ignore_ascii_case(name))
}

pub fn default_preset() -> &'static RangeConfig {
    &PRESETS[0]
}

/// Converts between domain/range units, normalized plot space and pixels on a
/// surface of the given size.
#[derive(Clone, Debug)]
pub struct RangeMapper<'c> {
    pub config: &'c RangeConfig,
    pub width: Number,
    pub height: Number,
}

impl<'c> RangeMapper<'c> {
    pub const fn new(config: &'c RangeConfig, width: Number, height: Number) -> Self {
        Self {
            config,
            width,
            height,
        }
    }

    pub fn graph_width(&self) -> Number {
        self.width - 2.0 * PADDING
    }

    pub fn graph_height(&self) -> Number {
        self.height - 2.0 * PADDING
    }

    pub fn left(&self) -> Number {
        PADDING
    }

    pub fn right(&self) -> Number {
        self.width - PADDING
    }

    pub fn top(&self) -> Number {
        PADDING
    }

    pub fn bottom(&self) -> Number {
        self.height - PADDING
    }

    pub fn domain_to_plot(&self, x: Number) -> Number {
        let Range { start, end } = self.config.x;
        (x - start) / (end - start)
    }

    pub fn plot_to_domain(&self, t: Number) -> Number {
        let Range { start, end } = self.config.x;
        start + t * (end - start)
    }

    /// Not clamped: values outside the range land outside the plot.
    pub fn range_to_plot(&self, y: Number) -> Number {
        let Range { start, end } = self.config.y;
        (y - start) / (end - start)
    }

    pub fn plot_to_pixel(&self, plot: Point<Number>) -> Point<Number> {
        Point {
            x: PADDING + plot.x * self.graph_width(),
            y: self.height - PADDING - plot.y * self.graph_height(),
        }
    }

    pub fn to_pixel(&self, p: Point<Number>) -> Point<Number> {
        self.plot_to_pixel(Point {
            x: self.domain_to_plot(p.x),
            y: self.range_to_plot(p.y),
        })
    }

    pub fn pixel_to_plot_x(&self, px: Number) -> Number {
        (px - PADDING) / self.graph_width()
    }

    pub fn pixel_to_domain(&self, px: Number) -> Number {
        self.plot_to_domain(self.pixel_to_plot_x(px))
    }

    pub fn contains_x(&self, px: Number) -> bool {
        (self.left()..=self.right()).contains(&px)
    }

    /// Position and text of each x tick, left to right.
    pub fn x_ticks(&self) -> Vec<(Number, String)> {
        ticks(&self.config.x, self.config.tick_divisions_x, self.config.angular)
    }

    /// Position and text of each y tick, bottom to top.
    pub fn y_ticks(&self) -> Vec<(Number, String)> {
        ticks(&self.config.y, Y_TICK_DIVISIONS, false)
    }
}

/// `(t, label)` pairs where `t` is the normalized position along the axis.
fn ticks(range: &Range<Number>, divisions: u16, angular: bool) -> Vec<(Number, String)> {
    let divisions = divisions.max(1);
    let step = (range.end - range.start) / Number::from(divisions);
    let decimals = decimals_for(step);
    (0..=divisions)
        .map(|i| {
            let t = Number::from(i) / Number::from(divisions);
            let mut value = range.start + Number::from(i) * step;
            if value.abs() < step.abs() * 1e-9 {
                value = 0.0;
            }
            let label = if angular {
                format_pi(value).unwrap_or_else(|| format!("{value:.decimals$}"))
            } else {
                format!("{value:.decimals$}")
            };
            (t, label)
        })
        .collect()
}

/// Fewest decimals (at most 3) that write every multiple of `step` exactly.
fn decimals_for(step: Number) -> usize {
    (0..3)
        .find(|&d| {
            let scaled = step.abs() * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-9
        })
        .unwrap_or(3)
}

const fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Writes `value` as a reduced fraction of π, if it is one with a small
/// denominator.
pub fn format_pi(value: Number) -> Option<String> {
    let ratio = value / PI;
    let (num, den) = (1..=12).find_map(|den| {
        let scaled = ratio * den as Number;
        let num = scaled.round();
        ((scaled - num).abs() < 1e-9).then_some((num as i64, den))
    })?;
    let g = gcd(num, den).max(1);
    let (num, den) = (num / g, den / g);
    let sign = if num < 0 { "-" } else { "" };
    let coeff = match num.abs() {
        0 => return Some("0".to_string()),
        1 => String::new(),
        n => n.to_string(),
    };
    Some(match den {
        1 => format!("{sign}{coeff}π"),
        den => format!("{sign}{coeff}π/{den}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn presets_by_name() {
        assert_eq!(preset("norm").unwrap().x, 0.0..1.0);
        assert!(preset("Signed-Angle").unwrap().angular);
        assert!(preset("polar").is_none());
        assert_eq!(default_preset().name, "norm");
    }

    #[test]
    fn pixel_mapping() {
        let mapper = RangeMapper::new(preset("bipolar").unwrap(), 800.0, 600.0);
        let p = mapper.to_pixel(Point { x: 0.0, y: 0.0 });
        assert_abs_diff_eq!(p.x, 400.0);
        assert_abs_diff_eq!(p.y, 300.0);
        let p = mapper.to_pixel(Point { x: -1.0, y: 1.0 });
        assert_abs_diff_eq!(p.x, 40.0);
        assert_abs_diff_eq!(p.y, 40.0);
        assert_abs_diff_eq!(mapper.pixel_to_domain(760.0), 1.0);
        // outside the range maps outside the plot
        assert!(mapper.to_pixel(Point { x: 0.0, y: 2.0 }).y < mapper.top());
        assert!(!mapper.contains_x(39.0));
    }

    #[test]
    fn decimal_ticks() {
        let mapper = RangeMapper::new(preset("norm").unwrap(), 800.0, 600.0);
        let labels: Vec<_> = mapper.x_ticks().into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels[0], "0.0");
        assert_eq!(labels[3], "0.3");
        assert_eq!(labels[10], "1.0");

        let mapper = RangeMapper::new(preset("wide").unwrap(), 800.0, 600.0);
        let labels: Vec<_> = mapper.y_ticks().into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels, ["-10", "-8", "-6", "-4", "-2", "0", "2", "4", "6", "8", "10"]);
    }

    #[test]
    fn angular_ticks() {
        let mapper = RangeMapper::new(preset("angle").unwrap(), 800.0, 600.0);
        let labels: Vec<_> = mapper.x_ticks().into_iter().map(|(_, l)| l).collect();
        assert_eq!(
            labels,
            ["0", "π/4", "π/2", "3π/4", "π", "5π/4", "3π/2", "7π/4", "2π"]
        );
        assert_eq!(format_pi(-PI / 2.0).as_deref(), Some("-π/2"));
        assert_eq!(format_pi(1.0), None);
    }
}
