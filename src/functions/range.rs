use log::debug;
use num_traits::Signed;

use crate::functions::calculus::differentiate;
use crate::functions::interval::{Endpoint, Interval, RealSet};
use crate::functions::polynomial::{numerator_denominator, real_roots, Polynomial};
use crate::syntax::{Expr, Func, Number, Rational};
use crate::{FunctionError, Result};

/// Number of grid steps in the numeric critical-point scan.
const SCAN_STEPS: usize = 4000;
/// The numeric scan never looks beyond `[-SCAN_BOUND, SCAN_BOUND]`.
const SCAN_BOUND: f64 = 100.0;
/// Points approach a limit as `10^k` (or `p ± 10^-k`) for `k` up to this.
const LIMIT_STEPS: i32 = 12;

/// One-sided behaviour at the end of a domain piece.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Limit {
  Finite(f64),
  PosInfinity,
  NegInfinity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
  Left,
  Right,
}

/// A value the function reaches (`attained`) or approaches.
#[derive(Debug, Clone, Copy)]
struct Candidate {
  value: f64,
  attained: bool,
}

/// The set of values `expr` takes as `var` ranges over `domain`.
pub fn function_range(expr: &Expr, var: &str, domain: &RealSet) -> Result<RealSet> {
  let others: Vec<String> = expr
    .free_symbols()
    .into_iter()
    .filter(|s| s != var)
    .collect();
  if !others.is_empty() {
    return Err(FunctionError::RangeUnavailable(format!(
      "{} depends on {}",
      expr,
      others.join(", ")
    )));
  }
  if domain.is_empty() {
    return Ok(RealSet::empty());
  }
  if expr.is_constant_wrt(var) {
    let value = expr
      .eval_f64(&|_| None)
      .filter(|v| v.is_finite())
      .ok_or_else(|| unavailable(expr, "constant is not a real number"))?;
    return Ok(RealSet::point(snap_value(value)));
  }

  let derivative = differentiate(expr, var);
  let spans_reals = covers_reals(domain);

  let pieces = match periodic_window(expr, var) {
    Some(period) if spans_reals => {
      debug!("range of {} over one period {}", expr, period);
      RealSet::closed(0.0, period)
        .intersect(domain)
        .pieces_within(period + 1.0)
    }
    _ if !domain.excluded().is_empty() => {
      return Err(unavailable(expr, "domain has infinitely many holes"));
    }
    _ => domain.intervals().to_vec(),
  };

  let mut range = RealSet::empty();
  for piece in pieces {
    range = range.union(&piece_range(expr, &derivative, var, &piece)?);
  }
  Ok(range)
}

fn unavailable(expr: &Expr, reason: &str) -> FunctionError {
  FunctionError::RangeUnavailable(format!("{}: {}", expr, reason))
}

fn covers_reals(domain: &RealSet) -> bool {
  let intervals = domain.intervals();
  intervals.len() == 1
    && intervals[0].lo.value == f64::NEG_INFINITY
    && intervals[0].hi.value == f64::INFINITY
}

// ─── Periodicity ────────────────────────────────────────────────────────────

/// The period of `expr` in `var` when every occurrence of `var` sits inside
/// a trigonometric function of a linear argument with rational frequency.
fn periodic_window(expr: &Expr, var: &str) -> Option<f64> {
  let mut periods = Vec::new();
  if !collect_periods(expr, var, &mut periods) || periods.is_empty() {
    return None;
  }
  let mut combined = periods[0];
  for p in &periods[1..] {
    combined = rational_lcm(combined, *p);
  }
  Some(*combined.numer() as f64 / *combined.denom() as f64 * std::f64::consts::PI)
}

/// Periods are collected in units of `pi`.
fn collect_periods(expr: &Expr, var: &str, out: &mut Vec<Rational>) -> bool {
  if expr.is_constant_wrt(var) {
    return true;
  }
  match expr {
    Expr::Symbol(_) => false,
    Expr::Add(items) | Expr::Mul(items) => {
      items.iter().all(|i| collect_periods(i, var, out))
    }
    Expr::Pow(b, e) => collect_periods(b, var, out) && collect_periods(e, var, out),
    Expr::Call(func, arg) if func.is_trigonometric() => {
      let Some(poly) = Polynomial::from_expr(arg, var) else {
        return false;
      };
      if poly.degree() != 1 {
        return false;
      }
      let Some(a) = poly.coefficients()[1].as_number().and_then(Number::as_rational)
      else {
        return false;
      };
      let turn = match func {
        Func::Tan | Func::Cot => Rational::from_integer(1),
        _ => Rational::from_integer(2),
      };
      out.push(turn / a.abs());
      true
    }
    Expr::Call(_, arg) => collect_periods(arg, var, out),
    Expr::Number(_) | Expr::Constant(_) => true,
  }
}

fn rational_lcm(a: Rational, b: Rational) -> Rational {
  Rational::new(
    lcm(*a.numer(), *b.numer()),
    gcd(*a.denom(), *b.denom()),
  )
}

fn gcd(a: i128, b: i128) -> i128 {
  let (mut a, mut b) = (a.abs(), b.abs());
  while b != 0 {
    let t = b;
    b = a % b;
    a = t;
  }
  a
}

fn lcm(a: i128, b: i128) -> i128 {
  if a == 0 || b == 0 {
    return 0;
  }
  (a / gcd(a, b) * b).abs()
}

// ─── Piecewise analysis ─────────────────────────────────────────────────────

fn piece_range(
  expr: &Expr,
  derivative: &Expr,
  var: &str,
  piece: &Interval,
) -> Result<RealSet> {
  let f = |x: f64| expr.eval_at(var, x).filter(|v| v.is_finite());
  let mut candidates = Vec::new();
  let mut lower = None;
  let mut upper = None;

  for (end, side) in [(piece.lo, Side::Right), (piece.hi, Side::Left)] {
    if end.closed {
      if let Some(v) = f(end.value) {
        candidates.push(Candidate {
          value: snap_value(v),
          attained: true,
        });
        continue;
      }
    }
    match limit(expr, var, end.value, side)? {
      Limit::Finite(v) => candidates.push(Candidate {
        value: v,
        attained: false,
      }),
      Limit::PosInfinity => upper = Some(f64::INFINITY),
      Limit::NegInfinity => lower = Some(f64::NEG_INFINITY),
    }
  }

  for x in critical_points(derivative, var, piece) {
    if let Some(v) = f(x) {
      candidates.push(Candidate {
        value: snap_value(v),
        attained: true,
      });
    }
  }

  if candidates.is_empty() && (lower.is_none() || upper.is_none()) {
    return Err(unavailable(expr, "no values found"));
  }

  let same = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(1.0);
  let attained = |value: f64| {
    candidates
      .iter()
      .any(|c| c.attained && same(c.value, value))
  };

  let lo = match lower {
    Some(v) => Endpoint::open(v),
    None => {
      let v = candidates.iter().map(|c| c.value).fold(f64::INFINITY, f64::min);
      Endpoint::new(v, attained(v))
    }
  };
  let hi = match upper {
    Some(v) => Endpoint::open(v),
    None => {
      let v = candidates
        .iter()
        .map(|c| c.value)
        .fold(f64::NEG_INFINITY, f64::max);
      Endpoint::new(v, attained(v))
    }
  };
  Ok(RealSet::interval(lo, hi))
}

/// Numeric one-sided limit of `expr` at `point`.
fn limit(expr: &Expr, var: &str, point: f64, side: Side) -> Result<Limit> {
  let exponents: Vec<f64> = (1..=LIMIT_STEPS).map(f64::from).collect();
  let values = approach(expr, var, point, side, &exponents);
  if let Some(limit) = classify_limit(&values) {
    return Ok(limit);
  }
  let far = approach(expr, var, point, side, &doubling_exponents(point));
  classify_divergence(&far).ok_or_else(|| {
    debug!(
      "limit of {} at {} does not settle: {:?} then {:?}",
      expr, point, values, far
    );
    unavailable(expr, "limit does not settle")
  })
}

/// Values of `expr` at distance `10^-k` from `point` (or at `±10^k` when
/// the point is infinite) for each `k` in `exponents`.
fn approach(
  expr: &Expr,
  var: &str,
  point: f64,
  side: Side,
  exponents: &[f64],
) -> Vec<f64> {
  exponents
    .iter()
    .map(|k| {
      let step = 10f64.powf(*k);
      let x = if point == f64::INFINITY {
        step
      } else if point == f64::NEG_INFINITY {
        -step
      } else {
        let h = point.abs().max(1.0) / step;
        match side {
          Side::Left => point - h,
          Side::Right => point + h,
        }
      };
      expr.eval_at(var, x).unwrap_or(f64::NAN)
    })
    .collect()
}

/// Exponents that double at each step. Away from zero the step has to stay
/// above the float resolution of `point`.
fn doubling_exponents(point: f64) -> Vec<f64> {
  if point.is_infinite() || point == 0.0 {
    vec![12.0, 24.0, 48.0, 96.0, 192.0]
  } else {
    vec![1.5, 3.0, 6.0, 12.0]
  }
}

/// Settled values or an overflow. Anything else is left to
/// [`classify_divergence`].
fn classify_limit(values: &[f64]) -> Option<Limit> {
  let n = values.len();
  let tail = &values[n - 4..];
  let last = tail[3];
  if last.is_infinite() {
    return Some(infinity(last));
  }
  if tail.iter().any(|v| v.is_nan()) {
    return None;
  }
  let d1 = tail[3] - tail[2];
  let d2 = tail[2] - tail[1];
  let scale = last.abs().max(1.0);
  if d1.abs() <= 1e-7 * scale && d2.abs() <= 1e-5 * scale {
    return Some(Limit::Finite(snap_value(last)));
  }
  None
}

/// Values taken at doubling exponents. A divergent function keeps (at
/// least) constant steps, a slowly converging one like `1/log(x)` halves
/// them.
fn classify_divergence(values: &[f64]) -> Option<Limit> {
  let mut finite = Vec::new();
  for &v in values {
    if v.is_nan() {
      break;
    }
    if v.is_infinite() {
      return Some(infinity(v));
    }
    finite.push(v);
  }
  let steps: Vec<f64> = finite.windows(2).map(|w| w[1] - w[0]).collect();
  if steps.len() < 2 {
    return None;
  }
  let rising = steps.iter().all(|d| *d > 0.0);
  let falling = steps.iter().all(|d| *d < 0.0);
  if !(rising || falling) {
    return None;
  }
  if steps.windows(2).all(|w| w[1].abs() >= 0.9 * w[0].abs()) {
    Some(if rising {
      Limit::PosInfinity
    } else {
      Limit::NegInfinity
    })
  } else {
    None
  }
}

fn infinity(v: f64) -> Limit {
  if v > 0.0 {
    Limit::PosInfinity
  } else {
    Limit::NegInfinity
  }
}

/// Interior points of `piece` where the derivative vanishes or changes sign.
fn critical_points(derivative: &Expr, var: &str, piece: &Interval) -> Vec<f64> {
  let inside = |x: &f64| {
    *x > piece.lo.value && *x < piece.hi.value
  };
  if let Some(roots) = rational_roots(derivative, var) {
    return roots.into_iter().filter(inside).collect();
  }

  let lo = piece.lo.value.max(-SCAN_BOUND);
  let hi = piece.hi.value.min(SCAN_BOUND);
  if lo >= hi {
    return Vec::new();
  }
  debug!("scanning {} for sign changes on [{}, {}]", derivative, lo, hi);
  let d = |x: f64| derivative.eval_at(var, x).filter(|v| v.is_finite());
  let step = (hi - lo) / SCAN_STEPS as f64;
  let mut points = Vec::new();
  // last nonzero sample, and the exact zeros seen since
  let mut previous: Option<(f64, f64)> = None;
  let mut zeros = Vec::new();
  for i in 1..SCAN_STEPS {
    let x = lo + step * i as f64;
    let Some(v) = d(x) else {
      previous = None;
      zeros.clear();
      continue;
    };
    if v == 0.0 {
      // a run of zeros that reaches the end of the scan is underflow
      if previous.is_some() {
        zeros.push(x);
      }
      continue;
    }
    if let Some((px, pv)) = previous {
      if !zeros.is_empty() {
        points.push(zeros[zeros.len() / 2]);
      } else if (pv < 0.0) != (v < 0.0) {
        points.push(bisect(&d, px, x));
      }
    }
    zeros.clear();
    previous = Some((x, v));
  }
  points.retain(inside);
  points
}

/// Roots of the derivative's numerator when it is a polynomial with
/// numeric coefficients.
fn rational_roots(derivative: &Expr, var: &str) -> Option<Vec<f64>> {
  let (num, den) = numerator_denominator(derivative);
  Polynomial::from_expr(&den, var)?;
  let coeffs = Polynomial::from_expr(&num, var)?.numeric_coefficients()?;
  Some(real_roots(&coeffs))
}

fn bisect(d: &dyn Fn(f64) -> Option<f64>, mut lo: f64, mut hi: f64) -> f64 {
  let negative_at_lo = d(lo).is_some_and(|v| v < 0.0);
  for _ in 0..80 {
    let mid = 0.5 * (lo + hi);
    match d(mid) {
      Some(v) if v == 0.0 => return mid,
      Some(v) if (v < 0.0) == negative_at_lo => lo = mid,
      Some(_) => hi = mid,
      None => break,
    }
  }
  0.5 * (lo + hi)
}

/// Round to a nearby fraction with a small denominator when one is within
/// rounding distance.
fn snap_value(v: f64) -> f64 {
  for d in 1..=12 {
    let candidate = (v * d as f64).round() / d as f64;
    if (candidate - v).abs() <= 1e-9 * v.abs().max(1.0) {
      return candidate;
    }
  }
  v
}
