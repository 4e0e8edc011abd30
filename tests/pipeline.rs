// SPDX: CC0-1.0

mod common;

use approx::assert_abs_diff_eq;
use common::{session, Call};
use curve_sketch::{
    annotate::ParamValue,
    eval::EvalErrTyp,
    params::Parameter,
    range::preset,
    render::curve_color,
    session::PassError,
};

#[test]
fn identity_is_one_curve_across_the_plot() {
    let s = session("return x;");
    let grid = s.grid().unwrap();
    assert_eq!(grid.curves(), 1);
    assert_eq!(grid.len(), 501);
    assert_abs_diff_eq!(grid.value(0, 0).unwrap(), 0.0);
    assert_abs_diff_eq!(grid.value(500, 0).unwrap(), 1.0, epsilon = 1e-12);

    let paths = s.surface().paths_in(curve_color(0));
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 501);
    assert_abs_diff_eq!(paths[0][0].x, 40.0);
    assert_abs_diff_eq!(paths[0][0].y, 560.0);
    assert_abs_diff_eq!(paths[0][500].x, 760.0, epsilon = 1e-9);
    assert_abs_diff_eq!(paths[0][500].y, 40.0, epsilon = 1e-9);
    assert_eq!(s.surface().circles_in(curve_color(0)).len(), 2);
    assert_eq!(s.labels(), ["x"]);
}

#[test]
fn labels_override_and_fall_back() {
    let mut s = session(
        "const a = x;\nconst b = 2 * x;\nconst c = 3 * x;\nreturn [a, b, c]; // labels(First)",
    );
    assert_eq!(s.labels(), ["First", "b", "c"]);
    assert_eq!(s.grid().unwrap().curves(), 3);
    for curve in 0..3 {
        assert_eq!(s.surface().paths_in(curve_color(curve)).len(), 1);
    }

    s.set_cursor(Some(400.0)).unwrap();
    assert_eq!(
        s.readout(),
        [(0, "First", 0.5), (1, "b", 1.0), (2, "c", 1.5)]
    );
    let texts = s.surface().texts();
    for badge in ["First: 0.500", "b: 1.000", "c: 1.500"] {
        assert!(texts.contains(&badge), "missing badge {badge}");
    }
    assert_eq!(s.surface().dashed(), 1);
}

#[test]
fn cursor_only_draws_inside_the_plot() {
    let mut s = session("return [x, 1 - x]; // labels(Up, Down)");
    s.set_cursor(Some(20.0)).unwrap();
    assert_eq!(s.surface().dashed(), 0);
    assert!(s.readout().is_empty());

    s.set_cursor(Some(750.0)).unwrap();
    assert_eq!(s.surface().dashed(), 1);
    // near the right edge the badge sits left of the cursor
    let badge = s
        .surface()
        .calls
        .iter()
        .find_map(|call| match call {
            Call::Text { text, at, .. } if text.starts_with("Up: ") => Some(*at),
            _ => None,
        })
        .unwrap();
    assert!(badge.x < 750.0);

    s.set_cursor(None).unwrap();
    assert_eq!(s.surface().dashed(), 0);
}

#[test]
fn throwing_snippet_draws_no_curves() {
    let mut s = session("const k = 1;\nk = x;\nreturn k;");
    let err = s.error().unwrap();
    assert!(matches!(
        err,
        PassError::Eval(e) if matches!(e.typ, EvalErrTyp::ConstAssign { .. })
    ));
    assert!(s.grid().is_none());
    for curve in 0..6 {
        assert!(s.surface().paths_in(curve_color(curve)).is_empty());
        assert!(s.surface().circles_in(curve_color(curve)).is_empty());
    }
    // the frame is still drawn
    assert!(s.surface().texts().contains(&"Input (x)"));

    s.set_source("return x;").unwrap();
    assert!(s.error().is_none());
    assert_eq!(s.surface().paths_in(curve_color(0)).len(), 1);
}

#[test]
fn late_error_discards_the_whole_pass() {
    let s = session("if (x > 0.5) {\n  return nope;\n}\nreturn x;");
    assert!(matches!(s.error(), Some(PassError::Eval(_))));
    assert!(s.surface().paths_in(curve_color(0)).is_empty());
}

#[test]
fn malformed_range_is_dropped() {
    let s = session("const a = 3; // range(5,2)\nconst b = 0.5; // range(0,1)\nreturn a * x + b;");
    assert_eq!(s.parameters().len(), 1);
    assert!(s.parameters().get("a").is_none());
    assert!(s.parameters().get("b").is_some());
    assert!(s.error().is_none());
    assert_abs_diff_eq!(s.grid().unwrap().value(500, 0).unwrap(), 3.5, epsilon = 1e-12);
}

#[test]
fn reparse_preserves_values_by_name() {
    let mut s = session("const a = 0.5; // range(0,1)\nconst b = 0.5; // range(0,1)\nreturn a + b;");
    s.set_parameter("a", ParamValue::Number(0.9)).unwrap().unwrap();

    s.set_source("const a = 0.5; // range(0,10)\nconst c = 0.25; // range(0,1)\nreturn a + c;")
        .unwrap();
    assert_eq!(s.parameters().get("a").unwrap().value, ParamValue::Number(0.9));
    assert_eq!(s.parameters().get("c").unwrap().value, ParamValue::Number(0.25));
    assert!(s.parameters().get("b").is_none());
    assert_abs_diff_eq!(s.grid().unwrap().value(0, 0).unwrap(), 1.15, epsilon = 1e-12);
}

#[test]
fn switching_range_keeps_parameters() {
    let mut s = session(
        "const freq = 1.0; // range(0.1,10.0,log)\n\nreturn 0.5 + 0.5 * Math.sin(x * Math.PI * freq);",
    );
    s.set_slider("freq", 0.75).unwrap().unwrap();
    let before: Vec<Parameter> = s.parameters().iter().cloned().collect();
    let first = s.surface().paths_in(curve_color(0))[0][0];
    assert!(s.surface().texts().contains(&"0.5"));

    s.select_range(preset("angle").unwrap()).unwrap();
    let after: Vec<Parameter> = s.parameters().iter().cloned().collect();
    assert_eq!(before, after);

    let texts = s.surface().texts();
    assert!(texts.contains(&"π/2"));
    assert!(!texts.contains(&"0.5"));
    let moved = s.surface().paths_in(curve_color(0))[0][0];
    assert_abs_diff_eq!(first.y, 300.0);
    assert_abs_diff_eq!(moved.y, 170.0);
}

#[test]
fn harmonics_uses_an_integer_slider() {
    let mut s = session(
        "const harmonics = 3; // range(1,8)\nlet sum = 0;\nfor (let i = 1; i <= harmonics; i++) {\n  sum += Math.sin(x * Math.PI * 2 * i) / i;\n}\nreturn 0.5 + sum / 4;",
    );
    assert_eq!(s.set_slider("harmonics", 0.5).unwrap(), Ok(5.0));
    assert!(s.error().is_none());
    assert_abs_diff_eq!(s.grid().unwrap().value(0, 0).unwrap(), 0.5, epsilon = 1e-12);
}

#[test]
fn non_finite_values_break_the_line() {
    let s = session("return 1 / (x - 0.5);");
    assert!(s.error().is_none());
    let paths = s.surface().paths_in(curve_color(0));
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].len(), 250);
    assert_eq!(paths[1].len(), 250);
    assert_eq!(s.surface().circles_in(curve_color(0)).len(), 2);
}

#[test]
fn curve_count_uses_the_longest_output() {
    let s = session("if (x < 0.5) {\n  return [x];\n}\nreturn [x, 1 - x];");
    assert_eq!(s.grid().unwrap().curves(), 2);
    let second = s.surface().paths_in(curve_color(1));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].len(), 251);
    // no first sample for the second curve, so only its end marker
    assert_eq!(s.surface().circles_in(curve_color(1)).len(), 1);
}

#[test]
fn palette_repeats_past_six_curves() {
    let s = session("return [x, x, x, x, x, x, x];");
    assert_eq!(s.grid().unwrap().curves(), 7);
    assert_eq!(s.surface().paths_in(curve_color(0)).len(), 2);
}

#[test]
fn conditional_expression_selects_per_sample() {
    let s = session("const flip = 0; // checkbox\nlet y;\ny = x < 0.5 ? 0.25 : 0.75;\nreturn flip ? 1 - y : y;");
    assert!(s.error().is_none());
    assert_eq!(
        s.parameters().get("flip").unwrap().value,
        ParamValue::Bool(false)
    );
    let grid = s.grid().unwrap();
    assert_abs_diff_eq!(grid.value(0, 0).unwrap(), 0.25);
    assert_abs_diff_eq!(grid.value(500, 0).unwrap(), 0.75);
}
