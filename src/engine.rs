//! The algebra engine as the rest of the crate sees it.
//!
//! Everything above this module (`value`, `function`, `asymptote`,
//! `sampling`) works with opaque [`Expr`] handles and the functions below;
//! nothing there manipulates trees directly.

use log::trace;

use crate::functions::polynomial::Polynomial;
use crate::functions::{calculus, domain, interval::RealSet, range, rewrite};
use crate::syntax::{pair_to_expr, Expr, Number};
use crate::{ExpressionParser, FunctionError, Result};

pub use crate::functions::rewrite::RewriteTarget;

/// `^` is accepted as a power operator and rewritten to `**`.
pub fn normalize(text: &str) -> String {
  text.replace('^', "**")
}

/// Normalize carets, then parse into a canonical tree.
pub fn parse(text: &str) -> Result<Expr> {
  let normalized = normalize(text);
  let mut pairs = ExpressionParser::parse_expression(&normalized)?;
  let program = pairs
    .next()
    .ok_or_else(|| FunctionError::InvalidSyntax("empty input".to_string()))?;
  let expr = pair_to_expr(program)?;
  trace!("parsed {:?} as {}", text, expr);
  Ok(expr)
}

/// Free symbols, sorted by name.
pub fn free_variables(tree: &Expr) -> Vec<String> {
  tree.free_symbols().into_iter().collect()
}

/// Replace the bound symbols by numbers. Unknown names are ignored.
pub fn substitute<S: AsRef<str>>(tree: &Expr, bindings: &[(S, f64)]) -> Expr {
  tree.substitute(&|name| {
    bindings
      .iter()
      .rev()
      .find(|(bound, _)| bound.as_ref() == name)
      .map(|(_, value)| Expr::Number(Number::from_f64(*value)))
  })
}

/// A closed tree as a real finite number.
pub fn to_f64(tree: &Expr) -> Option<f64> {
  if !tree.free_symbols().is_empty() {
    return None;
  }
  tree.eval_f64(&|_| None).filter(|v| v.is_finite())
}

pub fn differentiate(tree: &Expr, var: &str) -> Expr {
  calculus::differentiate(tree, var)
}

pub fn integrate(tree: &Expr, var: &str) -> Result<Expr> {
  calculus::integrate(tree, var)
    .ok_or_else(|| FunctionError::IntegralNotFound(tree.to_string()))
}

pub fn continuous_domain(tree: &Expr, var: &str) -> Result<RealSet> {
  domain::continuous_domain(tree, var)
}

/// May fail with [`FunctionError::RangeUnavailable`].
pub fn function_range(tree: &Expr, var: &str, domain: &RealSet) -> Result<RealSet> {
  range::function_range(tree, var, domain)
}

pub fn as_polynomial(tree: &Expr, var: &str) -> Option<Polynomial> {
  Polynomial::from_expr(tree, var)
}

pub fn numerator_denominator(tree: &Expr) -> (Expr, Expr) {
  crate::functions::polynomial::numerator_denominator(tree)
}

pub fn simplify(tree: &Expr) -> Expr {
  rewrite::simplify(tree)
}

pub fn rewrite(tree: &Expr, target: RewriteTarget) -> Expr {
  rewrite::rewrite(tree, target)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caret_is_power() {
    assert_eq!(normalize("x^2 + y^3"), "x**2 + y**3");
    assert_eq!(parse("x^2").unwrap(), parse("x**2").unwrap());
  }

  #[test]
  fn implicit_multiplication() {
    assert_eq!(parse("2x").unwrap(), parse("2*x").unwrap());
    assert_eq!(parse("2sin(x)").unwrap(), parse("2*sin(x)").unwrap());
    assert_eq!(parse("(x+1)(x-1)").unwrap().to_string(), "(x + 1)*(x - 1)");
    assert_eq!(parse("x(y + 1)").unwrap(), parse("x*(y + 1)").unwrap());
  }

  #[test]
  fn substitution_is_partial() {
    let tree = parse("x + 2y").unwrap();
    let partial = substitute(&tree, &[("x", 1.0)]);
    assert_eq!(partial.to_string(), "2*y + 1");
    assert_eq!(to_f64(&partial), None);
    assert_eq!(to_f64(&substitute(&partial, &[("y", 0.5)])), Some(2.0));
  }

  #[test]
  fn bad_input_is_a_parse_error() {
    assert!(parse("x +").unwrap_err().is_parse_error());
    assert!(parse("sin(x, y)").unwrap_err().is_parse_error());
  }
}
