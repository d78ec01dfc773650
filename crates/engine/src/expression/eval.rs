// Expression evaluator - walks a parsed AST against feature attributes

use std::cmp::Ordering;

use super::parser::{Expr, Op, UnaryOp};
use super::ExpressionError;
use crate::value::PropertyValue;

/// Source of attribute values for column references.
pub trait FieldLookup {
    fn field_value(&self, name: &str) -> Option<PropertyValue>;
}

pub fn evaluate<L: FieldLookup + ?Sized>(
    expr: &Expr,
    lookup: &L,
) -> Result<PropertyValue, ExpressionError> {
    match expr {
        Expr::Null => Ok(PropertyValue::Null),
        Expr::Number(n) => Ok(PropertyValue::number(*n)),
        Expr::Text(s) => Ok(PropertyValue::Text(s.clone())),
        Expr::Boolean(b) => Ok(PropertyValue::Bool(*b)),
        Expr::Column(name) => lookup
            .field_value(name)
            .ok_or_else(|| ExpressionError::UnknownField(name.clone())),
        Expr::UnaryOp { op, operand } => {
            let value = evaluate(operand, lookup)?;
            match op {
                UnaryOp::Neg => match value {
                    PropertyValue::Null => Ok(PropertyValue::Null),
                    other => Ok(PropertyValue::number(-to_number(&other)?)),
                },
                UnaryOp::Not => Ok(match value.as_bool() {
                    Some(b) => PropertyValue::Bool(!b),
                    None => PropertyValue::Null,
                }),
            }
        }
        Expr::BinaryOp { op: Op::And, left, right } => {
            // Three-valued logic: FALSE wins over NULL
            let l = evaluate(left, lookup)?.as_bool();
            if l == Some(false) {
                return Ok(PropertyValue::Bool(false));
            }
            let r = evaluate(right, lookup)?.as_bool();
            Ok(match (l, r) {
                (_, Some(false)) => PropertyValue::Bool(false),
                (Some(true), Some(true)) => PropertyValue::Bool(true),
                _ => PropertyValue::Null,
            })
        }
        Expr::BinaryOp { op: Op::Or, left, right } => {
            // TRUE wins over NULL
            let l = evaluate(left, lookup)?.as_bool();
            if l == Some(true) {
                return Ok(PropertyValue::Bool(true));
            }
            let r = evaluate(right, lookup)?.as_bool();
            Ok(match (l, r) {
                (_, Some(true)) => PropertyValue::Bool(true),
                (Some(false), Some(false)) => PropertyValue::Bool(false),
                _ => PropertyValue::Null,
            })
        }
        Expr::BinaryOp { op, left, right } => {
            let l = evaluate(left, lookup)?;
            let r = evaluate(right, lookup)?;
            eval_binary(*op, l, r)
        }
        Expr::Function { name, args } => eval_function(name, args, lookup),
    }
}

fn to_number(value: &PropertyValue) -> Result<f64, ExpressionError> {
    value.as_f64().ok_or_else(|| {
        ExpressionError::TypeMismatch(format!("cannot convert '{}' to number", value))
    })
}

fn eval_binary(op: Op, l: PropertyValue, r: PropertyValue) -> Result<PropertyValue, ExpressionError> {
    // NULL propagates through everything except the logical operators
    if l.is_null() || r.is_null() {
        return Ok(PropertyValue::Null);
    }

    match op {
        Op::Add => {
            if let (PropertyValue::Text(a), PropertyValue::Text(b)) = (&l, &r) {
                if a.trim().parse::<f64>().is_err() || b.trim().parse::<f64>().is_err() {
                    return Ok(PropertyValue::Text(format!("{}{}", a, b)));
                }
            }
            Ok(PropertyValue::number(to_number(&l)? + to_number(&r)?))
        }
        Op::Sub => Ok(PropertyValue::number(to_number(&l)? - to_number(&r)?)),
        Op::Mul => Ok(PropertyValue::number(to_number(&l)? * to_number(&r)?)),
        Op::Div => {
            let divisor = to_number(&r)?;
            let dividend = to_number(&l)?;
            if divisor == 0.0 {
                Ok(PropertyValue::Null)
            } else {
                Ok(PropertyValue::number(dividend / divisor))
            }
        }
        Op::Mod => {
            let divisor = to_number(&r)?;
            let dividend = to_number(&l)?;
            if divisor == 0.0 {
                Ok(PropertyValue::Null)
            } else {
                Ok(PropertyValue::number(dividend % divisor))
            }
        }
        Op::Pow => {
            let result = to_number(&l)?.powf(to_number(&r)?);
            Ok(finite_or_null(result))
        }
        Op::Concat => Ok(PropertyValue::Text(format!("{}{}", l, r))),
        Op::Eq | Op::NotEq | Op::Lt | Op::Gt | Op::LtEq | Op::GtEq => {
            let ordering = compare(&l, &r);
            let result = match op {
                Op::Eq => ordering == Some(Ordering::Equal),
                Op::NotEq => ordering != Some(Ordering::Equal),
                Op::Lt => ordering == Some(Ordering::Less),
                Op::Gt => ordering == Some(Ordering::Greater),
                Op::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                Op::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                _ => unreachable!(),
            };
            Ok(PropertyValue::Bool(result))
        }
        Op::And | Op::Or => unreachable!("logical operators are short-circuited in evaluate"),
    }
}

/// Numeric comparison when both sides are numeric, text comparison otherwise.
fn compare(l: &PropertyValue, r: &PropertyValue) -> Option<Ordering> {
    match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(l.to_string().cmp(&r.to_string())),
    }
}

fn finite_or_null(n: f64) -> PropertyValue {
    if n.is_finite() {
        PropertyValue::number(n)
    } else {
        PropertyValue::Null
    }
}

fn check_arity(name: &str, args: &[Expr], min: usize, max: usize) -> Result<(), ExpressionError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("{}-{}", min, max)
        };
        return Err(ExpressionError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Evaluate a one-argument numeric function; NULL in, NULL out.
fn unary_math<L: FieldLookup + ?Sized>(
    name: &str,
    args: &[Expr],
    lookup: &L,
    f: fn(f64) -> f64,
) -> Result<PropertyValue, ExpressionError> {
    check_arity(name, args, 1, 1)?;
    let value = evaluate(&args[0], lookup)?;
    if value.is_null() {
        return Ok(PropertyValue::Null);
    }
    Ok(finite_or_null(f(to_number(&value)?)))
}

fn eval_function<L: FieldLookup + ?Sized>(
    name: &str,
    args: &[Expr],
    lookup: &L,
) -> Result<PropertyValue, ExpressionError> {
    match name {
        "abs" => unary_math(name, args, lookup, f64::abs),
        "sqrt" => unary_math(name, args, lookup, f64::sqrt),
        "floor" => unary_math(name, args, lookup, f64::floor),
        "ceil" => unary_math(name, args, lookup, f64::ceil),
        "round" => {
            check_arity(name, args, 1, 2)?;
            let value = evaluate(&args[0], lookup)?;
            if value.is_null() {
                return Ok(PropertyValue::Null);
            }
            let places = match args.get(1) {
                Some(arg) => to_number(&evaluate(arg, lookup)?)?.trunc() as i32,
                None => 0,
            };
            let factor = 10f64.powi(places);
            Ok(finite_or_null((to_number(&value)? * factor).round() / factor))
        }
        "min" | "max" => {
            check_arity(name, args, 1, usize::MAX)?;
            let mut best: Option<f64> = None;
            for arg in args {
                let value = evaluate(arg, lookup)?;
                if value.is_null() {
                    continue;
                }
                let n = to_number(&value)?;
                best = Some(match best {
                    None => n,
                    Some(b) if name == "min" => b.min(n),
                    Some(b) => b.max(n),
                });
            }
            Ok(best.map(PropertyValue::number).unwrap_or(PropertyValue::Null))
        }
        "coalesce" => {
            check_arity(name, args, 1, usize::MAX)?;
            for arg in args {
                let value = evaluate(arg, lookup)?;
                if !value.is_null() {
                    return Ok(value);
                }
            }
            Ok(PropertyValue::Null)
        }
        "to_real" => {
            check_arity(name, args, 1, 1)?;
            let value = evaluate(&args[0], lookup)?;
            Ok(value
                .as_f64()
                .map(PropertyValue::number)
                .unwrap_or(PropertyValue::Null))
        }
        _ => Err(ExpressionError::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parser::parse;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    struct Attrs(HashMap<&'static str, PropertyValue>);

    impl FieldLookup for Attrs {
        fn field_value(&self, name: &str) -> Option<PropertyValue> {
            self.0.get(name).cloned()
        }
    }

    fn attrs() -> Attrs {
        let mut map = HashMap::new();
        map.insert("height", PropertyValue::number(12.5));
        map.insert("floors", PropertyValue::text("4"));
        map.insert("kind", PropertyValue::text("tower"));
        map.insert("base", PropertyValue::Null);
        Attrs(map)
    }

    fn eval(source: &str) -> PropertyValue {
        evaluate(&parse(source).unwrap(), &attrs()).unwrap()
    }

    fn eval_num(source: &str) -> f64 {
        eval(source).as_f64().unwrap_or_else(|| panic!("{} is not numeric", source))
    }

    #[test]
    fn test_arithmetic() {
        assert_relative_eq!(eval_num("1*5"), 5.0);
        assert_relative_eq!(eval_num("1 + 2 * 3"), 7.0);
        assert_relative_eq!(eval_num("(1 + 2) * 3"), 9.0);
        assert_relative_eq!(eval_num("-2^2"), -4.0);
        assert_relative_eq!(eval_num("7 % 4"), 3.0);
        assert_relative_eq!(eval_num("\"height\" * 2 + \"floors\""), 29.0);
    }

    #[test]
    fn test_null_propagation() {
        assert!(eval("\"base\" + 1").is_null());
        assert!(eval("1 / 0").is_null());
        assert!(eval("sqrt(-1)").is_null());
        assert!(eval("NULL || 'x'").is_null());
    }

    #[test]
    fn test_logic_is_three_valued() {
        assert_eq!(eval("NULL AND FALSE"), PropertyValue::Bool(false));
        assert!(eval("NULL AND TRUE").is_null());
        assert_eq!(eval("NULL OR TRUE"), PropertyValue::Bool(true));
        assert!(eval("NOT NULL").is_null());
        assert_eq!(eval("height > 10 AND kind = 'tower'"), PropertyValue::Bool(true));
    }

    #[test]
    fn test_comparison_numeric_vs_text() {
        // "4" compares numerically against 10
        assert_eq!(eval("floors < 10"), PropertyValue::Bool(true));
        assert_eq!(eval("'abc' < 'abd'"), PropertyValue::Bool(true));
        assert_eq!(eval("kind <> 'house'"), PropertyValue::Bool(true));
    }

    #[test]
    fn test_functions() {
        assert_relative_eq!(eval_num("abs(-3)"), 3.0);
        assert_relative_eq!(eval_num("round(2.346, 2)"), 2.35, epsilon = 1e-12);
        assert_relative_eq!(eval_num("round(2.5)"), 3.0);
        assert_relative_eq!(eval_num("max(1, \"height\", NULL)"), 12.5);
        assert_relative_eq!(eval_num("min(4, 2, 9)"), 2.0);
        assert_relative_eq!(eval_num("coalesce(\"base\", 7)"), 7.0);
        assert_relative_eq!(eval_num("to_real(floors)"), 4.0);
        assert_eq!(eval("'a' || 'b'"), PropertyValue::text("ab"));
    }

    #[test]
    fn test_errors() {
        let lookup = attrs();
        let err = evaluate(&parse("missing + 1").unwrap(), &lookup).unwrap_err();
        assert!(matches!(err, ExpressionError::UnknownField(ref f) if f == "missing"));

        let err = evaluate(&parse("frobnicate(1)").unwrap(), &lookup).unwrap_err();
        assert!(matches!(err, ExpressionError::UnknownFunction(_)));

        let err = evaluate(&parse("abs(1, 2)").unwrap(), &lookup).unwrap_err();
        assert!(matches!(err, ExpressionError::Arity { got: 2, .. }));

        let err = evaluate(&parse("kind * 2").unwrap(), &lookup).unwrap_err();
        assert!(matches!(err, ExpressionError::TypeMismatch(_)));
    }
}
