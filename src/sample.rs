// SPDX: CC0-1.0

use crate::{Number, Point};
use core::{num::NonZeroU16, ops::Range};

pub const DEFAULT_SAMPLES: NonZeroU16 = match NonZeroU16::new(500) {
    Some(n) => n,
    None => unreachable!(),
};

/// Outputs of a snippet at `count + 1` evenly spaced inputs, both ends of the
/// domain included.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    xs: Vec<Number>,
    outputs: Vec<Vec<Number>>,
    curves: usize,
}

impl SampleGrid {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[Number] {
        &self.xs
    }

    /// Number of curves: the longest output seen at any sample.
    pub const fn curves(&self) -> usize {
        self.curves
    }

    /// Output of `curve` at sample `idx`, if that sample produced one.
    pub fn value(&self, idx: usize, curve: usize) -> Option<Number> {
        self.outputs.get(idx)?.get(curve).copied()
    }

    /// The `(x, y)` points of one curve, skipping samples too short to have it.
    pub fn curve(&self, curve: usize) -> impl Iterator<Item = Point<Number>> + '_ {
        self.xs
            .iter()
            .zip(&self.outputs)
            .filter_map(move |(&x, out)| out.get(curve).map(|&y| Point { x, y }))
    }

    /// Index of the sample closest to `t`, a position in `[0, 1]` along the
    /// domain.
    pub fn nearest(&self, t: Number) -> Option<usize> {
        let last = self.len().checked_sub(1)?;
        let idx = (t.clamp(0.0, 1.0) * last as Number).round() as usize;
        Some(idx.min(last))
    }
}

/// Evaluates `f` across `domain`. The first error aborts the whole pass.
pub fn sample<F, E>(mut f: F, domain: &Range<Number>, count: NonZeroU16) -> Result<SampleGrid, E>
where
    F: FnMut(Number) -> Result<Vec<Number>, E>,
{
    let n = Number::from(count.get());
    let mut xs = Vec::with_capacity(usize::from(count.get()) + 1);
    let mut outputs = Vec::with_capacity(xs.capacity());
    for i in 0..=count.get() {
        let x = domain.start + (Number::from(i) / n) * (domain.end - domain.start);
        outputs.push(f(x)?);
        xs.push(x);
    }
    let curves = outputs.iter().map(Vec::len).max().unwrap_or(0);
    Ok(SampleGrid {
        xs,
        outputs,
        curves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_over_unit_domain() {
        let grid = sample(|x| Ok::<_, ()>(vec![x]), &(0.0..1.0), DEFAULT_SAMPLES).unwrap();
        assert_eq!(grid.len(), 501);
        assert_eq!(grid.curves(), 1);
        assert_abs_diff_eq!(grid.value(0, 0).unwrap(), 0.0);
        assert_abs_diff_eq!(grid.value(500, 0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn curve_count_is_longest_output() {
        let grid = sample(
            |x| Ok::<_, ()>(if x < 0.5 { vec![x] } else { vec![x, 1.0, 2.0] }),
            &(0.0..1.0),
            NonZeroU16::new(10).unwrap(),
        )
        .unwrap();
        assert_eq!(grid.curves(), 3);
        assert_eq!(grid.curve(0).count(), 11);
        assert_eq!(grid.curve(2).count(), 6);
        assert_eq!(grid.value(0, 1), None);
    }

    #[test]
    fn first_error_aborts() {
        let mut calls = 0;
        let res = sample(
            |x| {
                calls += 1;
                if x > 0.25 {
                    Err("boom")
                } else {
                    Ok(vec![x])
                }
            },
            &(0.0..1.0),
            NonZeroU16::new(8).unwrap(),
        );
        assert_eq!(res, Err("boom"));
        assert_eq!(calls, 4);
    }

    #[test]
    fn nearest_sample() {
        let grid = sample(|x| Ok::<_, ()>(vec![x]), &(-1.0..1.0), NonZeroU16::new(4).unwrap())
            .unwrap();
        assert_eq!(grid.xs(), [-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(grid.nearest(0.0), Some(0));
        assert_eq!(grid.nearest(0.6), Some(2));
        assert_eq!(grid.nearest(2.0), Some(4));
    }
}
