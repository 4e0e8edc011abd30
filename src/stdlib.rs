// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

/// Name of the snippet's input variable.
pub const X: &str = "x";

const MATH_PREFIX: &str = "Math.";

type Builtin = (&'static str, Arity, fn(Vec<Number>) -> Number);

const FUNCTIONS: &[Builtin] = &[
    ("abs", Arity::Exact(1), abs),
    ("sign", Arity::Exact(1), sign),
    ("floor", Arity::Exact(1), floor),
    ("ceil", Arity::Exact(1), ceil),
    ("round", Arity::Exact(1), round),
    ("trunc", Arity::Exact(1), trunc),
    ("sqrt", Arity::Exact(1), sqrt),
    ("cbrt", Arity::Exact(1), cbrt),
    ("exp", Arity::Exact(1), exp),
    ("log", Arity::Exact(1), ln),
    ("ln", Arity::Exact(1), ln),
    ("log2", Arity::Exact(1), log2),
    ("log10", Arity::Exact(1), log10),
    ("pow", Arity::Exact(2), pow),
    ("min", Arity::AtLeast(1), min),
    ("max", Arity::AtLeast(1), max),
    ("hypot", Arity::AtLeast(1), hypot),
    ("clamp", Arity::Exact(3), clamp),
    ("lerp", Arity::Exact(3), lerp),
    // trig
    ("sin", Arity::Exact(1), sin),
    ("cos", Arity::Exact(1), cos),
    ("tan", Arity::Exact(1), tan),
    ("asin", Arity::Exact(1), arcsin),
    ("acos", Arity::Exact(1), arccos),
    ("atan", Arity::Exact(1), arctan),
    ("atan2", Arity::Exact(2), arctan2),
    ("sinh", Arity::Exact(1), sinh),
    ("cosh", Arity::Exact(1), cosh),
    ("tanh", Arity::Exact(1), tanh),
];

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    // every function is reachable both bare and through `Math.`
    for (name, arity, fun) in FUNCTIONS {
        let fun = Fun::new(*arity, *fun);
        ret.insert((*name).into(), Ident::Fun(fun));
        ret.insert(
            IdentKey::Owned(format!("{MATH_PREFIX}{name}")),
            Ident::Fun(fun),
        );
    }

    for (name, val) in [
        ("PI", consts::PI),
        ("E", consts::E),
        ("TAU", consts::TAU),
        ("SQRT2", consts::SQRT_2),
        ("LN2", consts::LN_2),
        ("LN10", consts::LN_10),
    ] {
        ret.insert(name.into(), Ident::Const(val));
        ret.insert(
            IdentKey::Owned(format!("{MATH_PREFIX}{name}")),
            Ident::Const(val),
        );
    }
    ret.insert("pi".into(), Ident::Const(consts::PI));
    ret.insert("tau".into(), Ident::Const(consts::TAU));
    ret
}

#[track_caller]
fn expect_n<const N: usize>(args: &mut [Number]) -> [Number; N] {
    assert_eq!(args.len(), N);
    args[..N].try_into().unwrap()
}

pub fn neg(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    -x
}

pub fn add(mut args: Vec<Number>) -> Number {
    let [x, y] = expect_n::<2>(&mut args);
    x + y
}

pub fn sub(mut args: Vec<Number>) -> Number {
    let [x, y] = expect_n::<2>(&mut args);
    x - y
}

pub fn mul(mut args: Vec<Number>) -> Number {
    let [x, y] = expect_n::<2>(&mut args);
    x * y
}

pub fn div(mut args: Vec<Number>) -> Number {
    let [x, y] = expect_n::<2>(&mut args);
    x / y
}

pub fn rem(mut args: Vec<Number>) -> Number {
    let [x, y] = expect_n::<2>(&mut args);
    x % y
}

pub fn pow(mut args: Vec<Number>) -> Number {
    let [x, exp] = expect_n::<2>(&mut args);
    x.powf(exp)
}

pub fn abs(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.abs()
}

pub fn sign(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    // unlike `signum`, zero keeps its value
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

pub fn floor(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.floor()
}

pub fn ceil(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.ceil()
}

pub fn round(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    // halves round towards positive infinity
    (x + 0.5).floor()
}

pub fn trunc(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.trunc()
}

pub fn sqrt(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.sqrt()
}

pub fn cbrt(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.cbrt()
}

pub fn exp(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.exp()
}

pub fn ln(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.ln()
}

pub fn log2(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.log2()
}

pub fn log10(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.log10()
}

pub fn min(args: Vec<Number>) -> Number {
    args.into_iter().fold(Number::INFINITY, |acc, x| {
        if x.is_nan() || acc.is_nan() {
            Number::NAN
        } else {
            acc.min(x)
        }
    })
}

pub fn max(args: Vec<Number>) -> Number {
    args.into_iter().fold(Number::NEG_INFINITY, |acc, x| {
        if x.is_nan() || acc.is_nan() {
            Number::NAN
        } else {
            acc.max(x)
        }
    })
}

pub fn hypot(args: Vec<Number>) -> Number {
    args.into_iter().map(|x| x * x).sum::<Number>().sqrt()
}

pub fn clamp(mut args: Vec<Number>) -> Number {
    let [x, lo, hi] = expect_n::<3>(&mut args);
    x.max(lo).min(hi)
}

pub fn lerp(mut args: Vec<Number>) -> Number {
    let [a, b, t] = expect_n::<3>(&mut args);
    a + (b - a) * t
}

pub fn sin(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.sin()
}

pub fn cos(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.cos()
}

pub fn tan(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.tan()
}

pub fn arcsin(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.asin()
}

pub fn arccos(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.acos()
}

pub fn arctan(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.atan()
}

pub fn arctan2(mut args: Vec<Number>) -> Number {
    let [y, x] = expect_n::<2>(&mut args);
    y.atan2(x)
}

pub fn sinh(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.sinh()
}

pub fn cosh(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.cosh()
}

pub fn tanh(mut args: Vec<Number>) -> Number {
    let [x] = expect_n::<1>(&mut args);
    x.tanh()
}
