//! Constant expression folding for elaboration.
//!
//! Values computed from interface constants (`intf.a**3 + intf.b**3`) are
//! folded to a single [`ConstValue`] before the module description is
//! emitted, so no lookups into interface objects remain at run time.
//! Arithmetic is checked on `i128`; overflow is an error rather than a
//! silent wrap.

use std::collections::HashMap;
use std::ops::{Add, Mul, Neg, Sub};

use strata_ir::ConstValue;

use crate::error::ElabError;

/// A mapping from dotted member paths to their constant values.
pub type ConstEnv = HashMap<String, ConstValue>;

/// Binary operators available in constant expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division, truncating toward zero.
    Div,
    /// Remainder, with the sign of the dividend.
    Mod,
    /// Exponentiation with a non-negative exponent.
    Pow,
}

/// A compile-time constant expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstExpr {
    /// A literal.
    Literal(ConstValue),
    /// A member looked up in the [`ConstEnv`] by dotted path.
    Field(String),
    /// Arithmetic negation.
    Neg(Box<ConstExpr>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<ConstExpr>,
        /// Right operand.
        rhs: Box<ConstExpr>,
    },
    /// Ceiling of log2, the number of bits needed to index `n` items.
    Clog2(Box<ConstExpr>),
}

impl ConstExpr {
    /// A literal expression.
    pub fn lit(value: impl Into<ConstValue>) -> Self {
        ConstExpr::Literal(value.into())
    }

    /// A field reference.
    pub fn field(path: impl Into<String>) -> Self {
        ConstExpr::Field(path.into())
    }

    /// `self op rhs`.
    pub fn binary(self, op: BinaryOp, rhs: ConstExpr) -> Self {
        ConstExpr::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// `self ** exp`.
    pub fn pow(self, exp: impl Into<ConstValue>) -> Self {
        self.binary(BinaryOp::Pow, ConstExpr::lit(exp))
    }

    /// `clog2(self)`.
    pub fn clog2(self) -> Self {
        ConstExpr::Clog2(Box::new(self))
    }

    /// Evaluates the expression against `env`.
    pub fn eval(&self, env: &ConstEnv) -> Result<ConstValue, ElabError> {
        eval_const_expr(self, env)
    }
}

impl Add for ConstExpr {
    type Output = ConstExpr;

    fn add(self, rhs: ConstExpr) -> ConstExpr {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl Sub for ConstExpr {
    type Output = ConstExpr;

    fn sub(self, rhs: ConstExpr) -> ConstExpr {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl Mul for ConstExpr {
    type Output = ConstExpr;

    fn mul(self, rhs: ConstExpr) -> ConstExpr {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl Neg for ConstExpr {
    type Output = ConstExpr;

    fn neg(self) -> ConstExpr {
        ConstExpr::Neg(Box::new(self))
    }
}

/// Coerces a [`ConstValue`] to an `i128`, if the value can be represented as one.
///
/// - `Int(n)` returns `Some(n)` directly.
/// - `Bool(b)` returns `Some(1)` for `true`, `Some(0)` for `false`.
/// - `Bits` returns its integer value.
/// - `Str` returns `None`.
pub fn const_to_i128(val: &ConstValue) -> Option<i128> {
    val.as_int()
}

/// Evaluates a constant expression to a single value.
///
/// Literals evaluate to themselves. Any arithmetic produces an
/// [`ConstValue::Int`].
pub fn eval_const_expr(expr: &ConstExpr, env: &ConstEnv) -> Result<ConstValue, ElabError> {
    match expr {
        ConstExpr::Literal(value) => Ok(value.clone()),
        ConstExpr::Field(path) => env
            .get(path)
            .cloned()
            .ok_or_else(|| ElabError::ConstEval(format!("unknown constant `{path}`"))),
        ConstExpr::Neg(inner) => {
            let n = eval_int(inner, env)?;
            n.checked_neg().map(ConstValue::Int).ok_or(ElabError::Overflow)
        }
        ConstExpr::Binary { op, lhs, rhs } => {
            let l = eval_int(lhs, env)?;
            let r = eval_int(rhs, env)?;
            apply_binop(*op, l, r).map(ConstValue::Int)
        }
        ConstExpr::Clog2(inner) => {
            let n = eval_int(inner, env)?;
            if n < 0 {
                return Err(ElabError::ConstEval(format!("clog2 of negative value {n}")));
            }
            Ok(ConstValue::Int(clog2(n)))
        }
    }
}

fn eval_int(expr: &ConstExpr, env: &ConstEnv) -> Result<i128, ElabError> {
    let value = eval_const_expr(expr, env)?;
    const_to_i128(&value)
        .ok_or_else(|| ElabError::ConstEval(format!("{value} is not an integer")))
}

fn apply_binop(op: BinaryOp, lhs: i128, rhs: i128) -> Result<i128, ElabError> {
    let result = match op {
        BinaryOp::Add => lhs.checked_add(rhs),
        BinaryOp::Sub => lhs.checked_sub(rhs),
        BinaryOp::Mul => lhs.checked_mul(rhs),
        BinaryOp::Div | BinaryOp::Mod if rhs == 0 => {
            return Err(ElabError::ConstEval("division by zero".into()));
        }
        BinaryOp::Div => lhs.checked_div(rhs),
        BinaryOp::Mod => lhs.checked_rem(rhs),
        BinaryOp::Pow => {
            let exp = u32::try_from(rhs).map_err(|_| {
                ElabError::ConstEval(format!("exponent {rhs} out of range"))
            })?;
            lhs.checked_pow(exp)
        }
    };
    result.ok_or(ElabError::Overflow)
}

/// Computes the ceiling of log-base-2 for a non-negative integer.
///
/// - `clog2(0) = 0`
/// - `clog2(1) = 0`
/// - `clog2(2) = 1`
/// - `clog2(5) = 3`
fn clog2(n: i128) -> i128 {
    if n <= 1 {
        return 0;
    }
    i128::from(128 - (n - 1).leading_zeros())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> ConstEnv {
        [
            ("a", 9),
            ("b", 10),
            ("c", 1729),
            ("more_constants.const1", 707),
            ("more_constants.const2", 3),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), ConstValue::from(v)))
        .collect()
    }

    #[test]
    fn folds_sum_of_cubes() {
        let expr = ConstExpr::field("a").pow(3) + ConstExpr::field("b").pow(3)
            - ConstExpr::field("c");
        assert_eq!(expr.eval(&env()).unwrap(), ConstValue::Int(0));
    }

    #[test]
    fn folds_nested_paths() {
        let expr = ConstExpr::field("more_constants.const1")
            - ConstExpr::field("more_constants.const2") * ConstExpr::lit(235)
            - ConstExpr::lit(2);
        assert_eq!(expr.eval(&env()).unwrap(), ConstValue::Int(0));
    }

    #[test]
    fn literal_passes_through() {
        let expr = ConstExpr::lit(true);
        assert_eq!(expr.eval(&env()).unwrap(), ConstValue::Bool(true));
        let neg = -ConstExpr::lit(true);
        assert_eq!(neg.eval(&env()).unwrap(), ConstValue::Int(-1));
    }

    #[test]
    fn division_and_remainder() {
        let e = env();
        let div = ConstExpr::lit(-7).binary(BinaryOp::Div, ConstExpr::lit(2));
        let rem = ConstExpr::lit(-7).binary(BinaryOp::Mod, ConstExpr::lit(2));
        assert_eq!(div.eval(&e).unwrap(), ConstValue::Int(-3));
        assert_eq!(rem.eval(&e).unwrap(), ConstValue::Int(-1));

        let by_zero = ConstExpr::lit(1).binary(BinaryOp::Div, ConstExpr::lit(0));
        assert!(matches!(by_zero.eval(&e), Err(ElabError::ConstEval(_))));
    }

    #[test]
    fn overflow_is_reported() {
        let big = ConstExpr::lit(2).pow(127);
        assert!(matches!(big.eval(&env()), Err(ElabError::Overflow)));
        let neg_min = -ConstExpr::lit(i128::MIN);
        assert!(matches!(neg_min.eval(&env()), Err(ElabError::Overflow)));
    }

    #[test]
    fn negative_exponent_rejected() {
        let expr = ConstExpr::lit(2).binary(BinaryOp::Pow, ConstExpr::lit(-1));
        assert!(matches!(expr.eval(&env()), Err(ElabError::ConstEval(_))));
    }

    #[test]
    fn unknown_field_and_strings() {
        let e = env();
        assert!(ConstExpr::field("missing").eval(&e).is_err());
        let s = ConstExpr::lit("text") + ConstExpr::lit(1);
        assert!(matches!(s.eval(&e), Err(ElabError::ConstEval(_))));
    }

    #[test]
    fn clog2_values() {
        assert_eq!(clog2(0), 0);
        assert_eq!(clog2(1), 0);
        assert_eq!(clog2(2), 1);
        assert_eq!(clog2(3), 2);
        assert_eq!(clog2(4), 2);
        assert_eq!(clog2(5), 3);
        let expr = ConstExpr::lit(1024).clog2();
        assert_eq!(expr.eval(&env()).unwrap(), ConstValue::Int(10));
        assert!(ConstExpr::lit(-1).clog2().eval(&env()).is_err());
    }
}
