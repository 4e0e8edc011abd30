// SPDX: CC0-1.0

use crate::{
    annotate::{Annotations, ParamValue},
    eval::{Env, EvalErr, Idents, Script, Stmt, Value},
    params::ParameterStore,
    parse::{ParseErr, ParseErrTyp},
    lex::SubStr,
    stdlib::X,
    Number,
};
use std::{collections::HashSet, sync::Arc};

impl From<ParamValue> for Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Number(num) => Self::Num(num),
            ParamValue::Bool(b) => Self::Bool(b),
        }
    }
}

/// A snippet closed over the current parameter values: `f(x) -> outputs`.
#[derive(Clone, Debug)]
pub struct ExecutableUnit {
    bindings: Vec<(String, Value)>,
    body: Vec<Stmt>,
    idents: Arc<Idents>,
}

impl ExecutableUnit {
    pub fn bindings(&self) -> &[(String, Value)] {
        &self.bindings
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    /// Evaluates the snippet at `x`, one output per curve.
    pub fn call(&self, x: Number) -> Result<Vec<Number>, EvalErr> {
        let mut env = Env::new(&self.idents);
        env.declare(X, Value::Num(x), false);
        for (name, value) in &self.bindings {
            env.declare(name.clone(), value.clone(), true);
        }
        env.run(&self.body)?
            .into_outputs()
            .map_err(|typ| EvalErr { typ, loc: None })
    }
}

/// Drops the declarations that became parameters, at any depth.
fn strip(stmts: &[Stmt], annotations: &Annotations) -> Vec<Stmt> {
    fn strip_one(stmt: &Stmt, annotations: &Annotations) -> Option<Stmt> {
        let boxed = |stmt: &Stmt| {
            Box::new(strip_one(stmt, annotations).unwrap_or(Stmt::Block(Vec::new())))
        };
        Some(match stmt {
            Stmt::Decl { loc, .. } if annotations.is_param_site(loc.start()) => return None,
            Stmt::Block(stmts) => Stmt::Block(strip(stmts, annotations)),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => Stmt::If {
                cond: cond.clone(),
                then: boxed(then),
                otherwise: otherwise.as_deref().map(boxed),
            },
            Stmt::While { cond, body } => Stmt::While {
                cond: cond.clone(),
                body: boxed(body),
            },
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => Stmt::For {
                init: init.as_deref().and_then(|init| strip_one(init, annotations)).map(Box::new),
                cond: cond.clone(),
                step: step.clone(),
                body: boxed(body),
            },
            other => other.clone(),
        })
    }

    stmts
        .iter()
        .filter_map(|stmt| strip_one(stmt, annotations))
        .collect()
}

/// Rejects a name declared twice in one scope. `outer` holds the names bound
/// around the body (the input and the parameters).
fn check_bindings(stmts: &[Stmt], outer: &[&str]) -> Result<(), ParseErr> {
    fn redeclared(name: &SubStr) -> ParseErr {
        ParseErr {
            typ: ParseErrTyp::Redeclared {
                name: name.get().to_string(),
            },
            loc: name.clone(),
        }
    }

    fn nested(stmt: &Stmt) -> Result<(), ParseErr> {
        match stmt {
            Stmt::Block(stmts) => check_bindings(stmts, &[]),
            Stmt::If {
                then, otherwise, ..
            } => {
                nested(then)?;
                otherwise.as_deref().map_or(Ok(()), nested)
            }
            Stmt::While { body, .. } | Stmt::For { body, .. } => nested(body),
            _ => Ok(()),
        }
    }

    let mut seen: HashSet<&str> = outer.iter().copied().collect();
    for stmt in stmts {
        if let Stmt::Decl { name, .. } = stmt {
            if !seen.insert(name.get()) {
                return Err(redeclared(name));
            }
        }
    }
    stmts.iter().try_for_each(nested)
}

/// Closes `script` over the current parameter values: parameter
/// declarations are removed from the body and each parameter is bound to its
/// value ahead of it.
pub fn build(
    script: &Script,
    annotations: &Annotations,
    params: &ParameterStore,
    idents: &Arc<Idents>,
) -> Result<ExecutableUnit, ParseErr> {
    let body = strip(&script.stmts, annotations);
    let bindings: Vec<(String, Value)> = params
        .iter()
        .map(|p| (p.name().to_string(), p.value.into()))
        .collect();

    let mut outer: Vec<&str> = vec![X];
    outer.extend(bindings.iter().map(|(name, _)| name.as_str()));
    check_bindings(&body, &outer)?;

    Ok(ExecutableUnit {
        bindings,
        body,
        idents: Arc::clone(idents),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{annotate::annotate, lex::Lexer, parse::parse, stdlib};

    fn unit_for(src: &str, edits: &[(&str, ParamValue)]) -> Result<ExecutableUnit, ParseErr> {
        let src = Arc::new(src.to_string());
        let annotations = annotate(&src);
        let script = parse(Lexer::new(&src), &src)?;
        let mut params = ParameterStore::new();
        params.merge(annotations.params.clone());
        for (name, value) in edits {
            params.set(name, *value).unwrap();
        }
        build(&script, &annotations, &params, &Arc::new(stdlib::standard_idents()))
    }

    #[test]
    fn parameters_are_rebound_to_current_values() {
        let src = "const curve = 2.0; // range(0.1,5.0)\n\nreturn Math.pow(x, curve);";
        let unit = unit_for(src, &[]).unwrap();
        assert_eq!(unit.call(3.0).unwrap(), [9.0]);
        let unit = unit_for(src, &[("curve", ParamValue::Number(3.0))]).unwrap();
        assert_eq!(unit.call(2.0).unwrap(), [8.0]);
        assert_eq!(unit.bindings().len(), 1);
        assert_eq!(unit.body().len(), 1);
    }

    #[test]
    fn checkbox_binds_a_boolean() {
        let src = "const flip = false; // checkbox\nif (flip) { return 1 - x; }\nreturn x;";
        assert_eq!(unit_for(src, &[]).unwrap().call(0.25).unwrap(), [0.25]);
        let unit = unit_for(src, &[("flip", ParamValue::Bool(true))]).unwrap();
        assert_eq!(unit.call(0.25).unwrap(), [0.75]);
    }

    #[test]
    fn malformed_parameter_keeps_its_declaration() {
        let unit = unit_for("const a = 3; // range(5,2)\nreturn a * x;", &[]).unwrap();
        assert!(unit.bindings().is_empty());
        assert_eq!(unit.call(2.0).unwrap(), [6.0]);
    }

    #[test]
    fn redeclaring_a_parameter_is_a_compile_error() {
        let err = unit_for("const a = 1; // range(0,2)\nconst a = 2;\nreturn a;", &[]).unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::Redeclared { ref name } if name == "a"));
        let err = unit_for("let x = 2;\nreturn x;", &[]).unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::Redeclared { .. }));
        // shadowing in an inner scope is fine
        assert!(unit_for("let s = 0;\nfor (let i = 0; i < 2; i++) { let s = i; }\nreturn s;", &[]).is_ok());
    }

    #[test]
    fn redeclared_parameter_uses_last_annotation() {
        let src = "const a = 1; // range(0,2)\nconst a = 3; // range(0,10)\nreturn a;";
        let unit = unit_for(src, &[]).unwrap();
        assert_eq!(unit.call(0.0).unwrap(), [3.0]);
    }

    #[test]
    fn non_numeric_result_is_an_evaluation_error() {
        let unit = unit_for("return x > 0.5;", &[]).unwrap();
        assert!(unit.call(1.0).is_err());
        let unit = unit_for("if (x > 0.5) { return 1; }", &[]).unwrap();
        assert!(unit.call(0.0).is_err());
    }
}
