// SPDX: CC0-1.0

pub mod annotate;
pub mod eval;
pub mod lex;
pub mod params;
pub mod parse;
pub mod range;
pub mod render;
pub mod sample;
pub mod session;
pub mod shell;
pub mod stdlib;
pub mod svg;
pub mod synth;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}
