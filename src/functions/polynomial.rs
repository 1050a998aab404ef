use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, One, Zero};

use crate::syntax::{Expr, Number, Rational};

/// Highest power expanded when converting `(p)^n` into coefficient form.
const MAX_EXPANDED_POWER: i128 = 64;
/// Largest denominator tried when a numeric root is checked as a fraction.
const MAX_ROOT_DENOMINATOR: i128 = 1000;

/// A univariate polynomial whose coefficients are expressions free of `var`.
///
/// `coeffs[i]` multiplies `var^i`; the last coefficient is never zero
/// except for the zero polynomial, which is stored as `[0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
  var: String,
  coeffs: Vec<Expr>,
}

impl Polynomial {
  /// `None` when `expr` is not polynomial in `var` (negative or symbolic
  /// powers of `var`, `var` inside a function call, ...).
  pub fn from_expr(expr: &Expr, var: &str) -> Option<Polynomial> {
    let mut coeffs = coefficients_of(expr, var)?;
    trim(&mut coeffs);
    Some(Polynomial {
      var: var.to_string(),
      coeffs,
    })
  }

  pub fn var(&self) -> &str {
    &self.var
  }

  pub fn degree(&self) -> usize {
    self.coeffs.len() - 1
  }

  pub fn is_zero(&self) -> bool {
    self.coeffs.len() == 1 && self.coeffs[0].is_zero()
  }

  pub fn leading_coefficient(&self) -> &Expr {
    &self.coeffs[self.coeffs.len() - 1]
  }

  /// Coefficients in ascending order of power.
  pub fn coefficients(&self) -> &[Expr] {
    &self.coeffs
  }

  pub fn to_expr(&self) -> Expr {
    let x = Expr::symbol(&self.var);
    Expr::add(
      self
        .coeffs
        .iter()
        .enumerate()
        .map(|(i, c)| Expr::mul(vec![c.clone(), Expr::pow(x.clone(), Expr::int(i as i128))]))
        .collect(),
    )
  }

  pub fn from_rationals(var: &str, coeffs: &[Rational]) -> Polynomial {
    let mut coeffs: Vec<Expr> = coeffs
      .iter()
      .map(|c| Expr::Number(Number::Rational(*c)))
      .collect();
    trim(&mut coeffs);
    Polynomial {
      var: var.to_string(),
      coeffs,
    }
  }

  /// Exact coefficients, if every coefficient is a rational number.
  pub fn rational_coefficients(&self) -> Option<Vec<Rational>> {
    self
      .coeffs
      .iter()
      .map(|c| c.as_number().and_then(Number::as_rational))
      .collect()
  }

  /// Numeric coefficients, if every coefficient is a closed real number.
  pub fn numeric_coefficients(&self) -> Option<Vec<f64>> {
    self
      .coeffs
      .iter()
      .map(|c| c.eval_f64(&|_| None).filter(|v| v.is_finite()))
      .collect()
  }
}

fn trim(coeffs: &mut Vec<Expr>) {
  while coeffs.len() > 1 && coeffs.last().is_some_and(Expr::is_zero) {
    coeffs.pop();
  }
  if coeffs.is_empty() {
    coeffs.push(Expr::zero());
  }
}

fn coefficients_of(expr: &Expr, var: &str) -> Option<Vec<Expr>> {
  if expr.is_constant_wrt(var) {
    return Some(vec![expr.clone()]);
  }
  match expr {
    Expr::Symbol(_) => Some(vec![Expr::zero(), Expr::one()]),
    Expr::Add(terms) => {
      let mut acc = vec![Expr::zero()];
      for term in terms {
        acc = add_coeffs(&acc, &coefficients_of(term, var)?);
      }
      Some(acc)
    }
    Expr::Mul(factors) => {
      let mut acc = vec![Expr::one()];
      for factor in factors {
        acc = mul_coeffs(&acc, &coefficients_of(factor, var)?);
      }
      Some(acc)
    }
    Expr::Pow(base, exp) => {
      let n = exp.as_number().and_then(Number::as_integer)?;
      if !(0..=MAX_EXPANDED_POWER).contains(&n) {
        return None;
      }
      let base = coefficients_of(base, var)?;
      let mut acc = vec![Expr::one()];
      for _ in 0..n {
        acc = mul_coeffs(&acc, &base);
      }
      Some(acc)
    }
    _ => None,
  }
}

fn add_coeffs(a: &[Expr], b: &[Expr]) -> Vec<Expr> {
  let len = a.len().max(b.len());
  (0..len)
    .map(|i| match (a.get(i), b.get(i)) {
      (Some(x), Some(y)) => Expr::add(vec![x.clone(), y.clone()]),
      (Some(x), None) | (None, Some(x)) => x.clone(),
      (None, None) => Expr::zero(),
    })
    .collect()
}

fn mul_coeffs(a: &[Expr], b: &[Expr]) -> Vec<Expr> {
  let mut out = vec![Expr::zero(); a.len() + b.len() - 1];
  for (i, x) in a.iter().enumerate() {
    if x.is_zero() {
      continue;
    }
    for (j, y) in b.iter().enumerate() {
      let product = Expr::mul(vec![x.clone(), y.clone()]);
      out[i + j] = Expr::add(vec![out[i + j].clone(), product]);
    }
  }
  out
}

// ─── Numerator / denominator ────────────────────────────────────────────────

/// Split an expression into a numerator and a denominator over a common
/// denominator. The denominator is `1` for expressions without quotients.
pub fn numerator_denominator(expr: &Expr) -> (Expr, Expr) {
  match expr {
    Expr::Number(Number::Rational(r)) if !r.is_integer() => {
      (Expr::int(*r.numer()), Expr::int(*r.denom()))
    }
    Expr::Pow(base, exp) if is_negative_exponent(exp) => {
      (Expr::one(), Expr::pow(*base.clone(), Expr::neg(*exp.clone())))
    }
    Expr::Pow(base, exp) => {
      let (n, d) = numerator_denominator(base);
      if d.is_one() || exp.as_number().and_then(Number::as_integer).is_none() {
        (expr.clone(), Expr::one())
      } else {
        (Expr::pow(n, *exp.clone()), Expr::pow(d, *exp.clone()))
      }
    }
    Expr::Mul(factors) => {
      let mut num = Vec::new();
      let mut den = Vec::new();
      for factor in factors {
        let (n, d) = numerator_denominator(factor);
        num.push(n);
        den.push(d);
      }
      (Expr::mul(num), Expr::mul(den))
    }
    Expr::Add(terms) => {
      let mut parts = terms.iter().map(numerator_denominator);
      let first = parts.next().unwrap_or((Expr::zero(), Expr::one()));
      parts.fold(first, |(n1, d1), (n2, d2)| {
        if d1 == d2 {
          (Expr::add(vec![n1, n2]), d1)
        } else {
          (
            Expr::add(vec![
              Expr::mul(vec![n1, d2.clone()]),
              Expr::mul(vec![n2, d1.clone()]),
            ]),
            Expr::mul(vec![d1, d2]),
          )
        }
      })
    }
    _ => (expr.clone(), Expr::one()),
  }
}

fn is_negative_exponent(exp: &Expr) -> bool {
  crate::syntax::has_negative_sign(exp)
}

// ─── Real roots ─────────────────────────────────────────────────────────────

fn horner(coeffs: &[f64], x: f64) -> f64 {
  coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn derivative_coeffs(coeffs: &[f64]) -> Vec<f64> {
  coeffs
    .iter()
    .enumerate()
    .skip(1)
    .map(|(i, c)| c * i as f64)
    .collect()
}

/// Size of `p(x)` rounding error at `x`.
fn tolerance(coeffs: &[f64], x: f64) -> f64 {
  let scale: f64 = coeffs
    .iter()
    .enumerate()
    .map(|(i, c)| c.abs() * x.abs().max(1.0).powi(i as i32))
    .sum();
  scale * 1e-10
}

fn bisect(coeffs: &[f64], mut lo: f64, mut hi: f64) -> f64 {
  let mut f_lo = horner(coeffs, lo);
  for _ in 0..200 {
    let mid = 0.5 * (lo + hi);
    if mid == lo || mid == hi {
      break;
    }
    let f_mid = horner(coeffs, mid);
    if f_mid == 0.0 {
      return mid;
    }
    if (f_mid < 0.0) == (f_lo < 0.0) {
      lo = mid;
      f_lo = f_mid;
    } else {
      hi = mid;
    }
  }
  0.5 * (lo + hi)
}

/// Replace a root by a nearby fraction with a small denominator when the
/// fraction is at least as good a root.
fn snap(coeffs: &[f64], root: f64) -> f64 {
  for d in 1..=12 {
    let candidate = (root * d as f64).round() / d as f64;
    if (candidate - root).abs() < 1e-7 * root.abs().max(1.0)
      && horner(coeffs, candidate).abs() <= horner(coeffs, root).abs()
    {
      return candidate;
    }
  }
  root
}

/// Distinct real roots in ascending order. `coeffs[i]` multiplies `x^i`.
pub fn real_roots(coeffs: &[f64]) -> Vec<f64> {
  let mut coeffs = coeffs.to_vec();
  while coeffs.last().is_some_and(|c| *c == 0.0) {
    coeffs.pop();
  }
  if coeffs.len() < 2 {
    return Vec::new();
  }

  let mut roots = Vec::new();
  let zeros = coeffs.iter().take_while(|c| **c == 0.0).count();
  if zeros > 0 {
    roots.push(0.0);
    coeffs.drain(..zeros);
  }
  roots.extend(isolate(&coeffs));

  roots.sort_by(|a, b| a.total_cmp(b));
  roots.dedup_by(|a, b| (*a - *b).abs() < 1e-9 * b.abs().max(1.0));
  roots
}

fn isolate(coeffs: &[f64]) -> Vec<f64> {
  let degree = coeffs.len() - 1;
  if degree == 0 {
    return Vec::new();
  }
  if degree == 1 {
    let root = -coeffs[0] / coeffs[1];
    return vec![snap(coeffs, root)];
  }

  let lead = coeffs[degree];
  let bound = 1.0
    + coeffs[..degree]
      .iter()
      .map(|c| (c / lead).abs())
      .fold(0.0, f64::max);

  let mut points = vec![-bound];
  points.extend(
    isolate(&derivative_coeffs(coeffs))
      .into_iter()
      .filter(|c| c.abs() < bound),
  );
  points.push(bound);

  let mut roots = Vec::new();
  for &p in &points[1..points.len() - 1] {
    if horner(coeffs, p).abs() <= tolerance(coeffs, p) {
      roots.push(snap(coeffs, p));
    }
  }
  for window in points.windows(2) {
    let (a, b) = (window[0], window[1]);
    let (fa, fb) = (horner(coeffs, a), horner(coeffs, b));
    if fa.abs() <= tolerance(coeffs, a) || fb.abs() <= tolerance(coeffs, b) {
      continue;
    }
    if (fa < 0.0) != (fb < 0.0) {
      roots.push(snap(coeffs, bisect(coeffs, a, b)));
    }
  }
  roots
}

// ─── Exact arithmetic ───────────────────────────────────────────────────────
//
// Coefficient vectors over the rationals, ascending powers. Every operation
// returns `None` on `i128` overflow.

fn trim_exact(coeffs: &mut Vec<Rational>) {
  while coeffs.len() > 1 && coeffs.last().is_some_and(Zero::is_zero) {
    coeffs.pop();
  }
  if coeffs.is_empty() {
    coeffs.push(Rational::zero());
  }
}

pub fn is_zero_exact(coeffs: &[Rational]) -> bool {
  coeffs.iter().all(Zero::is_zero)
}

pub fn multiply_exact(a: &[Rational], b: &[Rational]) -> Option<Vec<Rational>> {
  let mut out = vec![Rational::zero(); (a.len() + b.len()).max(2) - 1];
  for (i, x) in a.iter().enumerate() {
    for (j, y) in b.iter().enumerate() {
      out[i + j] = out[i + j].checked_add(&x.checked_mul(y)?)?;
    }
  }
  trim_exact(&mut out);
  Some(out)
}

pub fn derivative_exact(coeffs: &[Rational]) -> Option<Vec<Rational>> {
  let mut out = coeffs
    .iter()
    .enumerate()
    .skip(1)
    .map(|(i, c)| c.checked_mul(&Rational::from_integer(i as i128)))
    .collect::<Option<Vec<_>>>()?;
  trim_exact(&mut out);
  Some(out)
}

/// `(quotient, remainder)` of polynomial long division.
pub fn divide_exact(
  num: &[Rational],
  den: &[Rational],
) -> Option<(Vec<Rational>, Vec<Rational>)> {
  let mut den = den.to_vec();
  trim_exact(&mut den);
  let lead = den[den.len() - 1];
  if lead.is_zero() {
    return None;
  }
  let mut rem = num.to_vec();
  trim_exact(&mut rem);
  if rem.len() < den.len() {
    return Some((vec![Rational::zero()], rem));
  }

  let mut quot = vec![Rational::zero(); rem.len() - den.len() + 1];
  for i in (0..quot.len()).rev() {
    let c = rem[i + den.len() - 1].checked_div(&lead)?;
    quot[i] = c;
    for (j, d) in den.iter().enumerate() {
      let t = c.checked_mul(d)?;
      rem[i + j] = rem[i + j].checked_sub(&t)?;
    }
  }
  rem.truncate(den.len() - 1);
  trim_exact(&mut rem);
  Some((quot, rem))
}

fn evaluate_exact(coeffs: &[Rational], x: Rational) -> Option<Rational> {
  coeffs
    .iter()
    .rev()
    .try_fold(Rational::zero(), |acc, c| acc.checked_mul(&x)?.checked_add(c))
}

/// The fraction close to `root` that is an exact root of `coeffs`.
fn rationalize(root: f64, coeffs: &[Rational]) -> Option<Rational> {
  (1..=MAX_ROOT_DENOMINATOR).find_map(|q| {
    let p = (root * q as f64).round();
    if p.abs() > 1e15 || (p / q as f64 - root).abs() > 1e-6 * root.abs().max(1.0) {
      return None;
    }
    let candidate = Rational::new(p as i128, q);
    evaluate_exact(coeffs, candidate)
      .filter(Zero::is_zero)
      .map(|_| candidate)
  })
}

/// Rational roots of `coeffs` with their multiplicities, and the cofactor
/// left once every `(x - root)` factor is divided out.
pub fn rational_root_factors(
  coeffs: &[Rational],
) -> Option<(Vec<(Rational, usize)>, Vec<Rational>)> {
  let numeric: Vec<f64> = coeffs
    .iter()
    .map(|c| *c.numer() as f64 / *c.denom() as f64)
    .collect();
  let mut rest = coeffs.to_vec();
  trim_exact(&mut rest);
  let mut factors = Vec::new();
  for root in real_roots(&numeric) {
    let Some(r) = rationalize(root, &rest) else {
      continue;
    };
    let linear = [-r, Rational::one()];
    let mut multiplicity = 0;
    loop {
      let (quot, rem) = divide_exact(&rest, &linear)?;
      if !is_zero_exact(&rem) {
        break;
      }
      rest = quot;
      multiplicity += 1;
    }
    if multiplicity > 0 {
      factors.push((r, multiplicity));
    }
  }
  Some((factors, rest))
}

/// Solve `sum_j x_j * columns[j] = rhs` for `n` unknowns, where each column
/// and `rhs` are read as coefficient vectors padded to length `n`.
pub fn solve_exact(
  columns: &[Vec<Rational>],
  rhs: &[Rational],
  n: usize,
) -> Option<Vec<Rational>> {
  if columns.len() != n {
    return None;
  }
  let at = |v: &[Rational], i: usize| v.get(i).copied().unwrap_or_else(Rational::zero);
  let mut rows: Vec<Vec<Rational>> = (0..n)
    .map(|i| {
      let mut row: Vec<Rational> = columns.iter().map(|c| at(c, i)).collect();
      row.push(at(rhs, i));
      row
    })
    .collect();

  for col in 0..n {
    let pivot = (col..n).find(|&r| !rows[r][col].is_zero())?;
    rows.swap(col, pivot);
    let p = rows[col][col];
    for k in col..=n {
      rows[col][k] = rows[col][k].checked_div(&p)?;
    }
    for r in 0..n {
      let factor = rows[r][col];
      if r == col || factor.is_zero() {
        continue;
      }
      for k in col..=n {
        let t = factor.checked_mul(&rows[col][k])?;
        rows[r][k] = rows[r][k].checked_sub(&t)?;
      }
    }
  }
  Some(rows.into_iter().map(|row| row[n]).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine;

  fn poly(text: &str) -> Polynomial {
    let expr = engine::parse(text).unwrap();
    Polynomial::from_expr(&expr, "x").unwrap()
  }

  #[test]
  fn degree_and_leading_coefficient() {
    let p = poly("x^3 - 4x + 1");
    assert_eq!(p.degree(), 3);
    assert_eq!(p.leading_coefficient(), &Expr::one());
    let p = poly("(2x + 1)^2");
    assert_eq!(p.degree(), 2);
    assert_eq!(p.leading_coefficient(), &Expr::int(4));
  }

  #[test]
  fn symbolic_coefficients() {
    let p = poly("a x^2 + b");
    assert_eq!(p.degree(), 2);
    assert_eq!(p.leading_coefficient().to_string(), "a");
  }

  #[test]
  fn non_polynomials_are_rejected() {
    for text in ["1/x", "sin(x)", "x^(1/2)", "2^x"] {
      let expr = engine::parse(text).unwrap();
      assert!(Polynomial::from_expr(&expr, "x").is_none(), "{}", text);
    }
  }

  #[test]
  fn roots_of_cubic() {
    // (x - 1)(x + 2)(2x - 1)
    let roots = real_roots(&[2.0, -5.0, 1.0, 2.0]);
    assert_eq!(roots, vec![-2.0, 0.5, 1.0]);
  }

  #[test]
  fn double_root_is_found() {
    assert_eq!(real_roots(&[1.0, -2.0, 1.0]), vec![1.0]);
    assert_eq!(real_roots(&[0.0, 0.0, 1.0]), vec![0.0]);
  }

  #[test]
  fn no_real_roots() {
    assert!(real_roots(&[1.0, 0.0, 1.0]).is_empty());
    assert!(real_roots(&[5.0]).is_empty());
  }

  fn q(values: &[i128]) -> Vec<Rational> {
    values.iter().map(|v| Rational::from_integer(*v)).collect()
  }

  #[test]
  fn long_division() {
    // x^2 + 1 = (x + 2)(x - 2) + 5
    let (quot, rem) = divide_exact(&q(&[1, 0, 1]), &q(&[-2, 1])).unwrap();
    assert_eq!(quot, q(&[2, 1]));
    assert_eq!(rem, q(&[5]));
    let (quot, rem) = divide_exact(&q(&[1]), &q(&[1, 0, 1])).unwrap();
    assert_eq!(quot, q(&[0]));
    assert_eq!(rem, q(&[1]));
  }

  #[test]
  fn rational_roots_with_multiplicity() {
    // (x - 1)^2 (2x + 1) (x^2 + 1)
    let coeffs = multiply_exact(
      &multiply_exact(&q(&[1, -2, 1]), &q(&[1, 2])).unwrap(),
      &q(&[1, 0, 1]),
    )
    .unwrap();
    let (roots, rest) = rational_root_factors(&coeffs).unwrap();
    assert_eq!(
      roots,
      vec![(Rational::new(-1, 2), 1), (Rational::from_integer(1), 2)]
    );
    assert_eq!(rest, q(&[2, 0, 2]));
  }

  #[test]
  fn exact_linear_system() {
    // a (x - 1) + b (x + 1) = 1
    let solution = solve_exact(&[q(&[-1, 1]), q(&[1, 1])], &q(&[1]), 2).unwrap();
    assert_eq!(solution, vec![Rational::new(-1, 2), Rational::new(1, 2)]);
    assert!(solve_exact(&[q(&[1, 1]), q(&[2, 2])], &q(&[1]), 2).is_none());
  }

  #[test]
  fn common_denominator() {
    let expr = engine::parse("x + 1/x").unwrap();
    let (n, d) = numerator_denominator(&expr);
    assert_eq!(n.to_string(), "x**2 + 1");
    assert_eq!(d.to_string(), "x");
  }
}
