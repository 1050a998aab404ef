use std::cmp::Ordering;
use std::fmt;

use crate::syntax::{Expr, Number};

// ─── Endpoints and intervals ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
  pub value: f64,
  pub closed: bool,
}

impl Endpoint {
  pub fn open(value: f64) -> Endpoint {
    Endpoint {
      value,
      closed: false,
    }
  }

  pub fn closed(value: f64) -> Endpoint {
    Endpoint {
      value,
      // infinities are never attained
      closed: value.is_finite(),
    }
  }

  pub fn new(value: f64, closed: bool) -> Endpoint {
    Endpoint {
      value,
      closed: closed && value.is_finite(),
    }
  }

  pub fn neg_infinity() -> Endpoint {
    Endpoint::open(f64::NEG_INFINITY)
  }

  pub fn infinity() -> Endpoint {
    Endpoint::open(f64::INFINITY)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
  pub lo: Endpoint,
  pub hi: Endpoint,
}

impl Interval {
  pub fn new(lo: Endpoint, hi: Endpoint) -> Interval {
    Interval { lo, hi }
  }

  pub fn is_empty(&self) -> bool {
    match self.lo.value.partial_cmp(&self.hi.value) {
      Some(Ordering::Less) => false,
      Some(Ordering::Equal) => !(self.lo.closed && self.hi.closed),
      _ => true,
    }
  }

  pub fn contains(&self, x: f64) -> bool {
    let above = x > self.lo.value || (self.lo.closed && x == self.lo.value);
    let below = x < self.hi.value || (self.hi.closed && x == self.hi.value);
    above && below
  }

  pub fn is_point(&self) -> bool {
    self.lo.value == self.hi.value && self.lo.closed && self.hi.closed
  }

  fn intersect(&self, other: &Interval) -> Interval {
    let lo = match self.lo.value.total_cmp(&other.lo.value) {
      Ordering::Greater => self.lo,
      Ordering::Less => other.lo,
      Ordering::Equal => Endpoint::new(
        self.lo.value,
        self.lo.closed && other.lo.closed,
      ),
    };
    let hi = match self.hi.value.total_cmp(&other.hi.value) {
      Ordering::Less => self.hi,
      Ordering::Greater => other.hi,
      Ordering::Equal => Endpoint::new(
        self.hi.value,
        self.hi.closed && other.hi.closed,
      ),
    };
    Interval { lo, hi }
  }
}

// ─── Excluded lattices ──────────────────────────────────────────────────────

/// The points `offset + k*period` for every integer `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLattice {
  pub offset: Expr,
  pub period: Expr,
}

impl PointLattice {
  /// `offset` is reduced into `[0, period)` when both are numeric.
  pub fn new(offset: Expr, period: Expr) -> PointLattice {
    let reduced = match (numeric(&offset), numeric(&period)) {
      (Some(o), Some(p)) if p > 0.0 && (o < 0.0 || o >= p) => {
        let k = (o / p).floor() as i128;
        Expr::sub(offset, Expr::mul(vec![Expr::int(k), period.clone()]))
      }
      _ => offset,
    };
    PointLattice {
      offset: reduced,
      period,
    }
  }

  pub fn offset_value(&self) -> Option<f64> {
    numeric(&self.offset)
  }

  pub fn period_value(&self) -> Option<f64> {
    numeric(&self.period)
  }

  pub fn contains(&self, x: f64) -> bool {
    match (self.offset_value(), self.period_value()) {
      (Some(o), Some(p)) if p > 0.0 => {
        let k = ((x - o) / p).round();
        (o + k * p - x).abs() <= 1e-9 * x.abs().max(1.0)
      }
      _ => false,
    }
  }

  /// Lattice points inside `[lo, hi]`, ascending.
  pub fn points_between(&self, lo: f64, hi: f64) -> Vec<f64> {
    let (Some(o), Some(p)) = (self.offset_value(), self.period_value()) else {
      return Vec::new();
    };
    if p <= 0.0 || !lo.is_finite() || !hi.is_finite() {
      return Vec::new();
    }
    let first = ((lo - o) / p).ceil() as i64;
    let last = ((hi - o) / p).floor() as i64;
    (first..=last).map(|k| o + k as f64 * p).collect()
  }
}

fn numeric(expr: &Expr) -> Option<f64> {
  expr.eval_f64(&|_| None).filter(|v| v.is_finite())
}

impl fmt::Display for PointLattice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let step = match &self.period {
      Expr::Add(_) => format!("k*({})", self.period),
      p if p.is_one() => "k".to_string(),
      p => format!("k*{}", p),
    };
    if self.offset.is_zero() {
      write!(f, "{{{} | k in Z}}", step)
    } else {
      write!(f, "{{{} + {} | k in Z}}", self.offset, step)
    }
  }
}

// ─── Sets ───────────────────────────────────────────────────────────────────

/// A subset of the real line: a union of disjoint intervals minus zero or
/// more periodic point lattices.
#[derive(Debug, Clone, PartialEq)]
pub struct RealSet {
  intervals: Vec<Interval>,
  excluded: Vec<PointLattice>,
}

impl RealSet {
  pub fn reals() -> RealSet {
    RealSet::from_intervals(vec![Interval::new(
      Endpoint::neg_infinity(),
      Endpoint::infinity(),
    )])
  }

  pub fn empty() -> RealSet {
    RealSet {
      intervals: Vec::new(),
      excluded: Vec::new(),
    }
  }

  pub fn interval(lo: Endpoint, hi: Endpoint) -> RealSet {
    RealSet::from_intervals(vec![Interval::new(lo, hi)])
  }

  /// `(lo, hi)`
  pub fn open(lo: f64, hi: f64) -> RealSet {
    RealSet::interval(Endpoint::open(lo), Endpoint::open(hi))
  }

  /// `[lo, hi]`, infinite ends stay open.
  pub fn closed(lo: f64, hi: f64) -> RealSet {
    RealSet::interval(Endpoint::closed(lo), Endpoint::closed(hi))
  }

  pub fn point(x: f64) -> RealSet {
    RealSet::closed(x, x)
  }

  pub fn from_intervals(intervals: Vec<Interval>) -> RealSet {
    RealSet {
      intervals: normalize_intervals(intervals),
      excluded: Vec::new(),
    }
  }

  /// Remove a lattice of points from the set.
  pub fn without_lattice(mut self, lattice: PointLattice) -> RealSet {
    if !self.excluded.contains(&lattice) {
      self.excluded.push(lattice);
    }
    self
  }

  pub fn intervals(&self) -> &[Interval] {
    &self.intervals
  }

  pub fn excluded(&self) -> &[PointLattice] {
    &self.excluded
  }

  pub fn is_empty(&self) -> bool {
    self.intervals.is_empty()
  }

  pub fn is_reals(&self) -> bool {
    self.excluded.is_empty()
      && self.intervals.len() == 1
      && self.intervals[0].lo.value == f64::NEG_INFINITY
      && self.intervals[0].hi.value == f64::INFINITY
  }

  pub fn contains(&self, x: f64) -> bool {
    self.intervals.iter().any(|i| i.contains(x))
      && !self.excluded.iter().any(|l| l.contains(x))
  }

  pub fn union(&self, other: &RealSet) -> RealSet {
    let mut all = self.intervals.clone();
    all.extend(other.intervals.iter().copied());
    let mut set = RealSet::from_intervals(all);
    // A lattice survives a union only if both sides exclude it.
    set.excluded = self
      .excluded
      .iter()
      .filter(|l| other.excluded.contains(l) || other.is_empty())
      .chain(other.excluded.iter().filter(|_| self.is_empty()))
      .cloned()
      .collect();
    set
  }

  pub fn intersect(&self, other: &RealSet) -> RealSet {
    let mut out = Vec::new();
    for a in &self.intervals {
      for b in &other.intervals {
        let i = a.intersect(b);
        if !i.is_empty() {
          out.push(i);
        }
      }
    }
    let mut set = RealSet::from_intervals(out);
    for lattice in self.excluded.iter().chain(other.excluded.iter()) {
      set = set.without_lattice(lattice.clone());
    }
    set
  }

  /// Connected pieces with lattice points split out, limited to the
  /// lattice points that fall inside `[-bound, bound]`.
  pub fn pieces_within(&self, bound: f64) -> Vec<Interval> {
    let mut out = Vec::new();
    for interval in &self.intervals {
      let lo = interval.lo.value.max(-bound);
      let hi = interval.hi.value.min(bound);
      let mut holes: Vec<f64> = self
        .excluded
        .iter()
        .flat_map(|l| l.points_between(lo, hi))
        .collect();
      holes.sort_by(|a, b| a.total_cmp(b));
      holes.dedup();
      let mut start = interval.lo;
      for h in holes {
        let piece = Interval::new(start, Endpoint::open(h));
        if !piece.is_empty() {
          out.push(piece);
        }
        start = Endpoint::open(h);
      }
      let piece = Interval::new(start, interval.hi);
      if !piece.is_empty() {
        out.push(piece);
      }
    }
    out
  }

  /// Same intervals up to `eps` and identical excluded lattices.
  pub fn approx_eq(&self, other: &RealSet, eps: f64) -> bool {
    let close = |a: f64, b: f64| {
      a == b || (a.is_finite() && b.is_finite() && (a - b).abs() <= eps)
    };
    self.excluded == other.excluded
      && self.intervals.len() == other.intervals.len()
      && self.intervals.iter().zip(&other.intervals).all(|(a, b)| {
        close(a.lo.value, b.lo.value)
          && close(a.hi.value, b.hi.value)
          && a.lo.closed == b.lo.closed
          && a.hi.closed == b.hi.closed
      })
  }
}

/// Sort by lower bound and merge overlapping or touching intervals.
fn normalize_intervals(spans: Vec<Interval>) -> Vec<Interval> {
  let mut spans: Vec<Interval> =
    spans.into_iter().filter(|s| !s.is_empty()).collect();
  if spans.is_empty() {
    return spans;
  }

  spans.sort_by(|a, b| {
    a.lo
      .value
      .total_cmp(&b.lo.value)
      .then_with(|| b.lo.closed.cmp(&a.lo.closed))
  });

  let mut merged: Vec<Interval> = vec![spans.remove(0)];
  for span in spans {
    let Some(last) = merged.last_mut() else {
      break;
    };
    let touches = match span.lo.value.partial_cmp(&last.hi.value) {
      Some(Ordering::Less) => true,
      Some(Ordering::Equal) => span.lo.closed || last.hi.closed,
      _ => false,
    };
    if touches {
      match span.hi.value.partial_cmp(&last.hi.value) {
        Some(Ordering::Greater) => last.hi = span.hi,
        Some(Ordering::Equal) => last.hi.closed |= span.hi.closed,
        _ => {}
      }
    } else {
      merged.push(span);
    }
  }
  merged
}

// ─── Rendering ──────────────────────────────────────────────────────────────

/// Integers and simple fractions exactly, other values with ten
/// significant digits.
pub fn format_endpoint(x: f64) -> String {
  if x == f64::INFINITY {
    return "oo".to_string();
  }
  if x == f64::NEG_INFINITY {
    return "-oo".to_string();
  }
  if x.fract() == 0.0 && x.abs() < 1e15 {
    return format!("{}", x as i128);
  }
  for d in 2..=12_i128 {
    let n = (x * d as f64).round();
    if (n / d as f64 - x).abs() < 1e-12 * x.abs().max(1.0) {
      return Number::ratio(n as i128, d).to_string();
    }
  }
  let s = format!("{:.*e}", 9, x);
  match s.parse::<f64>() {
    Ok(v) => format!("{}", v),
    Err(_) => s,
  }
}

impl fmt::Display for Interval {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_point() {
      return write!(f, "{{{}}}", format_endpoint(self.lo.value));
    }
    write!(
      f,
      "{}{}, {}{}",
      if self.lo.closed { "[" } else { "(" },
      format_endpoint(self.lo.value),
      format_endpoint(self.hi.value),
      if self.hi.closed { "]" } else { ")" },
    )
  }
}

impl fmt::Display for RealSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.intervals.is_empty() {
      return write!(f, "EmptySet");
    }
    let parts: Vec<String> =
      self.intervals.iter().map(|i| i.to_string()).collect();
    write!(f, "{}", parts.join(" U "))?;
    for lattice in &self.excluded {
      write!(f, " \\ {}", lattice)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn touching_intervals_merge() {
    let a = RealSet::closed(0.0, 1.0);
    let b = RealSet::interval(Endpoint::open(1.0), Endpoint::infinity());
    assert_eq!(a.union(&b).to_string(), "[0, oo)");
  }

  #[test]
  fn open_ends_at_the_same_point_stay_apart() {
    let a = RealSet::open(f64::NEG_INFINITY, 2.0);
    let b = RealSet::open(2.0, f64::INFINITY);
    let u = a.union(&b);
    assert_eq!(u.to_string(), "(-oo, 2) U (2, oo)");
    assert!(!u.contains(2.0));
  }

  #[test]
  fn intersection() {
    let a = RealSet::closed(-1.0, 3.0);
    let b = RealSet::open(0.0, f64::INFINITY);
    assert_eq!(a.intersect(&b).to_string(), "(0, 3]");
    let c = RealSet::open(5.0, 6.0);
    assert!(a.intersect(&c).is_empty());
    assert_eq!(a.intersect(&c).to_string(), "EmptySet");
  }

  #[test]
  fn points_and_fractions() {
    assert_eq!(RealSet::point(3.0).to_string(), "{3}");
    assert_eq!(RealSet::closed(-0.5, 1.0 / 3.0).to_string(), "[-1/2, 1/3]");
  }

  #[test]
  fn lattice_exclusion() {
    let half_pi = Expr::mul(vec![Expr::rational(1, 2), Expr::pi()]);
    let set = RealSet::reals().without_lattice(PointLattice::new(half_pi, Expr::pi()));
    assert_eq!(set.to_string(), "(-oo, oo) \\ {pi/2 + k*pi | k in Z}");
    assert!(!set.contains(std::f64::consts::FRAC_PI_2));
    assert!(!set.contains(-std::f64::consts::FRAC_PI_2));
    assert!(set.contains(0.0));
    assert!(!set.is_reals());
  }

  #[test]
  fn pieces_split_at_lattice_points() {
    let set = RealSet::closed(0.5, 2.5)
      .without_lattice(PointLattice::new(Expr::one(), Expr::one()));
    let pieces = set.pieces_within(10.0);
    assert_eq!(pieces.len(), 3);
    assert_eq!(pieces[0].to_string(), "[1/2, 1)");
    assert_eq!(pieces[1].to_string(), "(1, 2)");
    assert_eq!(pieces[2].to_string(), "(2, 5/2]");
  }
}
