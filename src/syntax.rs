//! Expression trees.
//!
//! Every tree is built through the canonical constructors (`Expr::add`,
//! `Expr::mul`, `Expr::pow`, `Expr::call`), so two trees for the same
//! expression compare equal and render to the same text. The rendered text
//! parses back to an equal tree.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, Zero};
use pest::iterators::Pair;

use crate::{FunctionError, Rule};

pub type Rational = Ratio<i128>;

/// Largest integer power that is expanded exactly.
const MAX_EXACT_POWER: i128 = 256;

// ─── Numbers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
  Rational(Rational),
  Real(f64),
}

impl std::ops::Add for Number {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    match (self, rhs) {
      (Self::Rational(a), Self::Rational(b)) => a
        .checked_add(&b)
        .map(Self::Rational)
        .unwrap_or_else(|| Self::Real(ratio_to_f64(a) + ratio_to_f64(b))),
      (a, b) => Self::Real(a.to_f64() + b.to_f64()),
    }
  }
}

impl std::ops::Mul for Number {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    match (self, rhs) {
      (Self::Rational(a), Self::Rational(b)) => a
        .checked_mul(&b)
        .map(Self::Rational)
        .unwrap_or_else(|| Self::Real(ratio_to_f64(a) * ratio_to_f64(b))),
      (a, b) => Self::Real(a.to_f64() * b.to_f64()),
    }
  }
}

impl std::ops::Neg for Number {
  type Output = Self;

  fn neg(self) -> Self {
    match self {
      Self::Rational(r) => Self::Rational(-r),
      Self::Real(x) => Self::Real(-x),
    }
  }
}

impl std::ops::Sub for Number {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self {
    self + (-rhs)
  }
}

fn ratio_to_f64(r: Rational) -> f64 {
  *r.numer() as f64 / *r.denom() as f64
}

impl Number {
  pub fn int(n: i128) -> Self {
    Number::Rational(Rational::from_integer(n))
  }

  /// `n/d`; `d` must not be zero.
  pub fn ratio(n: i128, d: i128) -> Self {
    Number::Rational(Rational::new(n, d))
  }

  /// Integral values become exact integers, everything else stays real.
  pub fn from_f64(x: f64) -> Self {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
      Number::int(x as i128)
    } else {
      Number::Real(x)
    }
  }

  pub fn to_f64(self) -> f64 {
    match self {
      Number::Rational(r) => ratio_to_f64(r),
      Number::Real(x) => x,
    }
  }

  pub fn is_zero(self) -> bool {
    match self {
      Number::Rational(r) => r.is_zero(),
      Number::Real(x) => x == 0.0,
    }
  }

  /// Exact one only; `1.0` keeps its real-ness.
  pub fn is_one(self) -> bool {
    matches!(self, Number::Rational(r) if r.is_one())
  }

  pub fn is_negative(self) -> bool {
    match self {
      Number::Rational(r) => r.is_negative(),
      Number::Real(x) => x < 0.0,
    }
  }

  pub fn as_integer(self) -> Option<i128> {
    match self {
      Number::Rational(r) if r.is_integer() => Some(*r.numer()),
      _ => None,
    }
  }

  pub fn as_rational(self) -> Option<Rational> {
    match self {
      Number::Rational(r) => Some(r),
      Number::Real(_) => None,
    }
  }

  pub fn abs(self) -> Self {
    match self {
      Number::Rational(r) => Number::Rational(r.abs()),
      Number::Real(x) => Number::Real(x.abs()),
    }
  }

  pub fn recip(self) -> Option<Self> {
    if self.is_zero() {
      return None;
    }
    Some(match self {
      Number::Rational(r) => Number::Rational(r.recip()),
      Number::Real(x) => Number::Real(1.0 / x),
    })
  }

  /// Integer power, `None` for `0^-n` and for exponents too large to keep
  /// exact.
  pub fn powi(self, n: i128) -> Option<Self> {
    if n < 0 {
      return self.recip()?.powi(-n);
    }
    match self {
      Number::Real(x) => Some(Number::Real(x.powi(n.min(i32::MAX as i128) as i32))),
      Number::Rational(r) => {
        if r.is_zero() || r.is_one() {
          return Some(self);
        }
        if r == -Rational::one() {
          return Some(Number::int(if n % 2 == 0 { 1 } else { -1 }));
        }
        if n > MAX_EXACT_POWER {
          return None;
        }
        let mut acc = Rational::one();
        for _ in 0..n {
          acc = acc.checked_mul(&r)?;
        }
        Some(Number::Rational(acc))
      }
    }
  }
}

fn exact_root(n: i128, q: u32) -> Option<i128> {
  if n < 0 {
    return None;
  }
  let guess = (n as f64).powf(1.0 / q as f64).round() as i128;
  (guess.saturating_sub(1)..=guess.saturating_add(1))
    .filter(|r| *r >= 0)
    .find(|r| {
      let mut acc: i128 = 1;
      for _ in 0..q {
        match acc.checked_mul(*r) {
          Some(v) => acc = v,
          None => return false,
        }
      }
      acc == n
    })
}

/// Numeric power that stays exact where possible. `None` leaves the power
/// symbolic (e.g. `2**(1/2)` or `0**-1`).
fn numeric_pow(base: Number, exponent: Number) -> Option<Number> {
  match (base, exponent) {
    (Number::Rational(_), Number::Rational(e)) if e.is_integer() => {
      base.powi(*e.numer())
    }
    (Number::Rational(b), Number::Rational(e)) => {
      if b.is_negative() || *e.denom() > 64 {
        return None;
      }
      let q = *e.denom() as u32;
      let num = exact_root(*b.numer(), q)?;
      let den = exact_root(*b.denom(), q)?;
      Number::ratio(num, den).powi(*e.numer())
    }
    _ => {
      let value = base.to_f64().powf(exponent.to_f64());
      if value.is_finite() {
        Some(Number::Real(value))
      } else {
        None
      }
    }
  }
}

impl fmt::Display for Number {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Number::Rational(r) if r.is_integer() => write!(f, "{}", r.numer()),
      Number::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
      Number::Real(x) => write!(f, "{}", format_real(*x)),
    }
  }
}

/// Reals always carry a decimal point or an exponent so they reparse as
/// reals.
fn format_real(x: f64) -> String {
  if !x.is_finite() || x.fract() != 0.0 {
    format!("{}", x)
  } else if x.abs() < 1e16 {
    format!("{:.1}", x)
  } else {
    format!("{:e}", x)
  }
}

// ─── Symbols of the language ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
  Pi,
  E,
}

impl Constant {
  pub fn value(self) -> f64 {
    match self {
      Constant::Pi => std::f64::consts::PI,
      Constant::E => std::f64::consts::E,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
  Sin,
  Cos,
  Tan,
  Cot,
  Sec,
  Csc,
  Asin,
  Acos,
  Atan,
  Sinh,
  Cosh,
  Tanh,
  Exp,
  Log,
  Abs,
  Sign,
}

impl Func {
  pub fn name(self) -> &'static str {
    match self {
      Func::Sin => "sin",
      Func::Cos => "cos",
      Func::Tan => "tan",
      Func::Cot => "cot",
      Func::Sec => "sec",
      Func::Csc => "csc",
      Func::Asin => "asin",
      Func::Acos => "acos",
      Func::Atan => "atan",
      Func::Sinh => "sinh",
      Func::Cosh => "cosh",
      Func::Tanh => "tanh",
      Func::Exp => "exp",
      Func::Log => "log",
      Func::Abs => "Abs",
      Func::Sign => "sign",
    }
  }

  pub fn from_name(name: &str) -> Option<Func> {
    Some(match name {
      "sin" => Func::Sin,
      "cos" => Func::Cos,
      "tan" => Func::Tan,
      "cot" => Func::Cot,
      "sec" => Func::Sec,
      "csc" => Func::Csc,
      "asin" | "arcsin" => Func::Asin,
      "acos" | "arccos" => Func::Acos,
      "atan" | "arctan" => Func::Atan,
      "sinh" => Func::Sinh,
      "cosh" => Func::Cosh,
      "tanh" => Func::Tanh,
      "exp" => Func::Exp,
      "log" | "ln" => Func::Log,
      "Abs" | "abs" => Func::Abs,
      "sign" => Func::Sign,
      _ => return None,
    })
  }

  pub fn is_trigonometric(self) -> bool {
    matches!(
      self,
      Func::Sin | Func::Cos | Func::Tan | Func::Cot | Func::Sec | Func::Csc
    )
  }

  fn is_odd(self) -> bool {
    matches!(
      self,
      Func::Sin
        | Func::Tan
        | Func::Cot
        | Func::Csc
        | Func::Asin
        | Func::Atan
        | Func::Sinh
        | Func::Tanh
        | Func::Sign
    )
  }

  fn is_even(self) -> bool {
    matches!(self, Func::Cos | Func::Sec | Func::Cosh | Func::Abs)
  }

  pub fn apply(self, x: f64) -> f64 {
    match self {
      Func::Sin => x.sin(),
      Func::Cos => x.cos(),
      Func::Tan => x.tan(),
      Func::Cot => 1.0 / x.tan(),
      Func::Sec => 1.0 / x.cos(),
      Func::Csc => 1.0 / x.sin(),
      Func::Asin => x.asin(),
      Func::Acos => x.acos(),
      Func::Atan => x.atan(),
      Func::Sinh => x.sinh(),
      Func::Cosh => x.cosh(),
      Func::Tanh => x.tanh(),
      Func::Exp => x.exp(),
      Func::Log => x.ln(),
      Func::Abs => x.abs(),
      Func::Sign => {
        if x > 0.0 {
          1.0
        } else if x < 0.0 {
          -1.0
        } else {
          0.0
        }
      }
    }
  }
}

// ─── Expressions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(Number),
  Constant(Constant),
  Symbol(String),
  Add(Vec<Expr>),
  Mul(Vec<Expr>),
  Pow(Box<Expr>, Box<Expr>),
  Call(Func, Box<Expr>),
}

impl Expr {
  pub fn int(n: i128) -> Expr {
    Expr::Number(Number::int(n))
  }

  pub fn rational(n: i128, d: i128) -> Expr {
    Expr::Number(Number::ratio(n, d))
  }

  pub fn real(x: f64) -> Expr {
    Expr::Number(Number::Real(x))
  }

  pub fn zero() -> Expr {
    Expr::int(0)
  }

  pub fn one() -> Expr {
    Expr::int(1)
  }

  pub fn symbol(name: &str) -> Expr {
    Expr::Symbol(name.to_string())
  }

  pub fn pi() -> Expr {
    Expr::Constant(Constant::Pi)
  }

  pub fn as_number(&self) -> Option<Number> {
    match self {
      Expr::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn is_zero(&self) -> bool {
    matches!(self, Expr::Number(n) if n.is_zero())
  }

  pub fn is_one(&self) -> bool {
    matches!(self, Expr::Number(n) if n.is_one())
  }

  fn is_integer_number(&self) -> Option<i128> {
    self.as_number().and_then(Number::as_integer)
  }

  // ─── Canonical constructors ───────────────────────────────────────────

  pub fn neg(expr: Expr) -> Expr {
    Expr::mul(vec![Expr::int(-1), expr])
  }

  pub fn sub(a: Expr, b: Expr) -> Expr {
    Expr::add(vec![a, Expr::neg(b)])
  }

  pub fn div(a: Expr, b: Expr) -> Expr {
    Expr::mul(vec![a, Expr::pow(b, Expr::int(-1))])
  }

  pub fn sqrt(a: Expr) -> Expr {
    Expr::pow(a, Expr::rational(1, 2))
  }

  pub fn add(terms: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(terms.len());
    for term in terms {
      match term {
        Expr::Add(inner) => flat.extend(inner),
        other => flat.push(other),
      }
    }

    let mut constant = Number::int(0);
    let mut collected: Vec<(Expr, Number)> = Vec::new();
    for term in flat {
      if let Expr::Number(n) = term {
        constant = constant + n;
        continue;
      }
      let (coeff, rest) = split_coefficient(term);
      match collected.iter_mut().find(|(r, _)| *r == rest) {
        Some(entry) => entry.1 = entry.1 + coeff,
        None => collected.push((rest, coeff)),
      }
    }

    let mut result: Vec<Expr> = collected
      .into_iter()
      .filter(|(_, c)| !c.is_zero())
      .map(|(rest, c)| {
        if c.is_one() {
          rest
        } else {
          Expr::mul(vec![Expr::Number(c), rest])
        }
      })
      .collect();
    sort_terms(&mut result);
    if !constant.is_zero() {
      result.push(Expr::Number(constant));
    }

    match result.len() {
      0 => Expr::Number(if let Number::Real(_) = constant {
        constant
      } else {
        Number::int(0)
      }),
      1 => result.pop().unwrap_or_else(Expr::zero),
      _ => Expr::Add(result),
    }
  }

  pub fn mul(factors: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(factors.len());
    for factor in factors {
      match factor {
        Expr::Mul(inner) => flat.extend(inner),
        other => flat.push(other),
      }
    }

    let mut coeff = Number::int(1);
    let mut bases: Vec<(Expr, Vec<Expr>)> = Vec::new();
    for factor in flat {
      if let Expr::Number(n) = factor {
        coeff = coeff * n;
        continue;
      }
      let (base, exponent) = split_power(factor);
      match bases.iter_mut().find(|(b, _)| *b == base) {
        Some(entry) => entry.1.push(exponent),
        None => bases.push((base, vec![exponent])),
      }
    }
    if coeff.is_zero() {
      return Expr::Number(coeff);
    }

    let mut rebuilt = Vec::with_capacity(bases.len());
    let mut needs_another_pass = false;
    for (base, mut exponents) in bases {
      let exponent = if exponents.len() == 1 {
        exponents.pop().unwrap_or_else(Expr::one)
      } else {
        Expr::add(exponents)
      };
      match Expr::pow(base, exponent) {
        Expr::Number(n) => coeff = coeff * n,
        product @ Expr::Mul(_) => {
          needs_another_pass = true;
          rebuilt.push(product);
        }
        other => rebuilt.push(other),
      }
    }
    if needs_another_pass {
      rebuilt.insert(0, Expr::Number(coeff));
      return Expr::mul(rebuilt);
    }
    if coeff.is_zero() {
      return Expr::Number(coeff);
    }

    match rebuilt.len() {
      0 => return Expr::Number(coeff),
      1 if coeff.is_one() => return rebuilt.pop().unwrap_or_else(Expr::one),
      1 => {
        if let Expr::Add(terms) = &rebuilt[0] {
          return Expr::add(
            terms
              .iter()
              .map(|t| Expr::mul(vec![Expr::Number(coeff), t.clone()]))
              .collect(),
          );
        }
      }
      _ => {}
    }
    sort_factors(&mut rebuilt);
    if !coeff.is_one() {
      rebuilt.insert(0, Expr::Number(coeff));
    }
    Expr::Mul(rebuilt)
  }

  pub fn pow(base: Expr, exponent: Expr) -> Expr {
    if exponent.is_zero() {
      return Expr::one();
    }
    if exponent.is_one() {
      return base;
    }
    if base.is_one() {
      return Expr::one();
    }
    if let (Expr::Number(b), Expr::Number(e)) = (&base, &exponent) {
      return match numeric_pow(*b, *e) {
        Some(n) => Expr::Number(n),
        None => Expr::Pow(Box::new(base), Box::new(exponent)),
      };
    }
    if base.is_zero() {
      if let Expr::Number(e) = &exponent {
        if !e.is_negative() {
          return Expr::zero();
        }
      }
    }
    let integer_exponent = exponent.is_integer_number().is_some();
    match base {
      Expr::Constant(Constant::E) => Expr::call(Func::Exp, exponent),
      Expr::Call(Func::Exp, arg) if integer_exponent => {
        Expr::call(Func::Exp, Expr::mul(vec![*arg, exponent]))
      }
      Expr::Pow(inner, inner_exp) if integer_exponent => {
        Expr::pow(*inner, Expr::mul(vec![*inner_exp, exponent]))
      }
      Expr::Mul(factors) if integer_exponent => Expr::mul(
        factors
          .into_iter()
          .map(|f| Expr::pow(f, exponent.clone()))
          .collect(),
      ),
      base => Expr::Pow(Box::new(base), Box::new(exponent)),
    }
  }

  pub fn call(func: Func, arg: Expr) -> Expr {
    if let Expr::Number(Number::Real(x)) = arg {
      let value = func.apply(x);
      if value.is_finite() {
        return Expr::real(value);
      }
    }
    if func.is_odd() && has_negative_sign(&arg) {
      return Expr::neg(Expr::call(func, Expr::neg(arg)));
    }
    if func.is_even() && has_negative_sign(&arg) {
      return Expr::call(func, Expr::neg(arg));
    }
    if let Some(value) = special_value(func, &arg) {
      return value;
    }
    Expr::Call(func, Box::new(arg))
  }

  // ─── Queries ──────────────────────────────────────────────────────────

  pub fn free_symbols(&self) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    self.collect_symbols(&mut out);
    out
  }

  fn collect_symbols(&self, out: &mut BTreeSet<String>) {
    match self {
      Expr::Symbol(name) => {
        out.insert(name.clone());
      }
      Expr::Add(items) | Expr::Mul(items) => {
        items.iter().for_each(|i| i.collect_symbols(out))
      }
      Expr::Pow(b, e) => {
        b.collect_symbols(out);
        e.collect_symbols(out);
      }
      Expr::Call(_, arg) => arg.collect_symbols(out),
      Expr::Number(_) | Expr::Constant(_) => {}
    }
  }

  pub fn is_constant_wrt(&self, var: &str) -> bool {
    match self {
      Expr::Symbol(name) => name != var,
      Expr::Add(items) | Expr::Mul(items) => {
        items.iter().all(|i| i.is_constant_wrt(var))
      }
      Expr::Pow(b, e) => b.is_constant_wrt(var) && e.is_constant_wrt(var),
      Expr::Call(_, arg) => arg.is_constant_wrt(var),
      Expr::Number(_) | Expr::Constant(_) => true,
    }
  }

  /// Replace symbols for which `lookup` has a value and rebuild canonically.
  pub fn substitute(&self, lookup: &dyn Fn(&str) -> Option<Expr>) -> Expr {
    match self {
      Expr::Symbol(name) => lookup(name).unwrap_or_else(|| self.clone()),
      Expr::Add(items) => {
        Expr::add(items.iter().map(|i| i.substitute(lookup)).collect())
      }
      Expr::Mul(items) => {
        Expr::mul(items.iter().map(|i| i.substitute(lookup)).collect())
      }
      Expr::Pow(b, e) => Expr::pow(b.substitute(lookup), e.substitute(lookup)),
      Expr::Call(f, arg) => Expr::call(*f, arg.substitute(lookup)),
      Expr::Number(_) | Expr::Constant(_) => self.clone(),
    }
  }

  pub fn substitute_var(&self, var: &str, value: &Expr) -> Expr {
    self.substitute(&|name| (name == var).then(|| value.clone()))
  }

  /// Floating point evaluation. `None` only when a symbol has no value;
  /// NaN and infinities are passed through for the caller to judge.
  pub fn eval_f64(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
    Some(match self {
      Expr::Number(n) => n.to_f64(),
      Expr::Constant(c) => c.value(),
      Expr::Symbol(name) => lookup(name)?,
      Expr::Add(items) => {
        let mut sum = 0.0;
        for item in items {
          sum += item.eval_f64(lookup)?;
        }
        sum
      }
      Expr::Mul(items) => {
        let mut product = 1.0;
        for item in items {
          product *= item.eval_f64(lookup)?;
        }
        product
      }
      Expr::Pow(b, e) => {
        let base = b.eval_f64(lookup)?;
        match e.is_integer_number() {
          Some(n) if n.abs() <= i32::MAX as i128 => base.powi(n as i32),
          _ => base.powf(e.eval_f64(lookup)?),
        }
      }
      Expr::Call(f, arg) => f.apply(arg.eval_f64(lookup)?),
    })
  }

  pub fn eval_at(&self, var: &str, x: f64) -> Option<f64> {
    self.eval_f64(&|name| (name == var).then_some(x))
  }
}

// ─── Canonical ordering helpers ─────────────────────────────────────────────

/// `3*x*y` → `(3, x*y)`; terms without a numeric coefficient get `1`.
pub(crate) fn split_coefficient(term: Expr) -> (Number, Expr) {
  match term {
    Expr::Mul(mut factors) => {
      if let Some(Expr::Number(n)) = factors.first() {
        let n = *n;
        factors.remove(0);
        let rest = if factors.len() == 1 {
          factors.pop().unwrap_or_else(Expr::one)
        } else {
          Expr::Mul(factors)
        };
        (n, rest)
      } else {
        (Number::int(1), Expr::Mul(factors))
      }
    }
    other => (Number::int(1), other),
  }
}

fn split_power(factor: Expr) -> (Expr, Expr) {
  match factor {
    Expr::Pow(b, e) => (*b, *e),
    Expr::Call(Func::Exp, arg) => (Expr::Constant(Constant::E), *arg),
    other => (other, Expr::one()),
  }
}

pub(crate) fn has_negative_sign(expr: &Expr) -> bool {
  match expr {
    Expr::Number(n) => n.is_negative(),
    Expr::Mul(factors) => {
      matches!(factors.first(), Some(Expr::Number(n)) if n.is_negative())
    }
    _ => false,
  }
}

fn ordering_degree(expr: &Expr) -> f64 {
  match expr {
    Expr::Symbol(_) => 1.0,
    Expr::Pow(b, e) => match e.as_number() {
      Some(n) => ordering_degree(b) * n.to_f64(),
      None => 0.0,
    },
    Expr::Mul(factors) => factors.iter().map(ordering_degree).sum(),
    Expr::Add(terms) => terms.iter().map(ordering_degree).fold(0.0, f64::max),
    _ => 0.0,
  }
}

/// Descending degree, then the rendering of the coefficient-free part.
fn sort_terms(terms: &mut [Expr]) {
  terms.sort_by_cached_key(|term| {
    let (coeff, rest) = split_coefficient(term.clone());
    let degree = ordering_degree(&rest);
    (
      OrderedF64(-degree),
      rest.to_string(),
      OrderedF64(coeff.to_f64()),
    )
  });
}

fn base_rank(base: &Expr) -> u8 {
  match base {
    Expr::Number(_) => 0,
    Expr::Constant(_) => 1,
    Expr::Symbol(_) => 2,
    Expr::Call(..) => 3,
    Expr::Add(_) => 4,
    _ => 5,
  }
}

fn sort_factors(factors: &mut [Expr]) {
  factors.sort_by_cached_key(|factor| {
    let (base, exponent) = split_power(factor.clone());
    let rank = match factor {
      Expr::Call(..) => base_rank(factor),
      _ => base_rank(&base),
    };
    (rank, base.to_string(), exponent.to_string())
  });
}

#[derive(PartialEq, PartialOrd)]
struct OrderedF64(f64);

impl Eq for OrderedF64 {}

impl Ord for OrderedF64 {
  fn cmp(&self, other: &Self) -> Ordering {
    self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
  }
}

// ─── Special values ─────────────────────────────────────────────────────────

/// `r` for `r*pi` (and `0` for zero).
pub(crate) fn pi_multiple(expr: &Expr) -> Option<Rational> {
  match expr {
    Expr::Number(Number::Rational(r)) if r.is_zero() => Some(*r),
    Expr::Constant(Constant::Pi) => Some(Rational::one()),
    Expr::Mul(factors) if factors.len() == 2 => match (&factors[0], &factors[1]) {
      (Expr::Number(Number::Rational(r)), Expr::Constant(Constant::Pi)) => {
        Some(*r)
      }
      _ => None,
    },
    _ => None,
  }
}

fn special_value(func: Func, arg: &Expr) -> Option<Expr> {
  if func.is_trigonometric() {
    let r = pi_multiple(arg)?;
    let half_turns = r * Rational::from_integer(2);
    if !half_turns.is_integer() {
      return None;
    }
    let k = half_turns.numer().rem_euclid(4);
    let sin = [0, 1, 0, -1][k as usize];
    let cos = [1, 0, -1, 0][k as usize];
    let value = match func {
      Func::Sin => sin,
      Func::Cos => cos,
      Func::Tan if cos != 0 => sin / cos,
      Func::Cot if sin != 0 => cos / sin,
      Func::Sec if cos != 0 => cos,
      Func::Csc if sin != 0 => sin,
      _ => return None,
    };
    return Some(Expr::int(value as i128));
  }
  match (func, arg) {
    (Func::Exp, a) if a.is_zero() => Some(Expr::one()),
    (Func::Exp, Expr::Call(Func::Log, inner)) => Some(*inner.clone()),
    (Func::Log, a) if a.is_one() => Some(Expr::zero()),
    (Func::Log, Expr::Constant(Constant::E)) => Some(Expr::one()),
    (Func::Log, Expr::Call(Func::Exp, inner)) => Some(*inner.clone()),
    (Func::Abs, Expr::Number(n)) => Some(Expr::Number(n.abs())),
    (Func::Abs, Expr::Constant(_)) => Some(arg.clone()),
    (Func::Abs, Expr::Call(Func::Abs, _)) => Some(arg.clone()),
    (Func::Abs, Expr::Call(Func::Exp, _)) => Some(arg.clone()),
    (Func::Abs, Expr::Pow(_, e))
      if e.is_integer_number().is_some_and(|n| n % 2 == 0) =>
    {
      Some(arg.clone())
    }
    (Func::Sign, Expr::Number(n)) => Some(Expr::int(if n.is_zero() {
      0
    } else if n.is_negative() {
      -1
    } else {
      1
    })),
    (Func::Asin | Func::Atan | Func::Sinh | Func::Tanh, a) if a.is_zero() => {
      Some(Expr::zero())
    }
    (Func::Acos, a) if a.is_one() => Some(Expr::zero()),
    (Func::Cosh, a) if a.is_zero() => Some(Expr::one()),
    _ => None,
  }
}

// ─── Rendering ──────────────────────────────────────────────────────────────

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&format_expr(self))
  }
}

fn format_expr(expr: &Expr) -> String {
  match expr {
    Expr::Number(n) => n.to_string(),
    Expr::Constant(Constant::Pi) => "pi".to_string(),
    Expr::Constant(Constant::E) => "E".to_string(),
    Expr::Symbol(name) => name.clone(),
    Expr::Add(terms) => format_additive(terms),
    Expr::Mul(factors) => format_product(factors),
    Expr::Pow(base, exp) => format_power(base, exp),
    Expr::Call(func, arg) => format!("{}({})", func.name(), format_expr(arg)),
  }
}

/// Sum with subtraction written out: `x**2 - 4*x + 1`
fn format_additive(terms: &[Expr]) -> String {
  let mut out = String::new();
  for (i, term) in terms.iter().enumerate() {
    let negative = has_negative_sign(term);
    let body = if negative {
      format_expr(&Expr::neg(term.clone()))
    } else {
      format_expr(term)
    };
    match (i, negative) {
      (0, true) => out.push('-'),
      (0, false) => {}
      (_, true) => out.push_str(" - "),
      (_, false) => out.push_str(" + "),
    }
    out.push_str(&body);
  }
  out
}

/// Product with negative powers and rational coefficients as a quotient.
fn format_product(factors: &[Expr]) -> String {
  let (coeff, rest) = match factors.first() {
    Some(Expr::Number(n)) => (*n, &factors[1..]),
    _ => (Number::int(1), factors),
  };
  if coeff.is_negative() {
    return format!("-{}", format_positive_product(-coeff, rest));
  }
  format_positive_product(coeff, rest)
}

fn format_positive_product(coeff: Number, rest: &[Expr]) -> String {
  let mut numerator: Vec<String> = Vec::new();
  let mut denominator: Vec<String> = Vec::new();

  let (coeff_num, coeff_den) = match coeff {
    Number::Rational(r) => (r.numer().to_string(), *r.denom()),
    Number::Real(x) => (format_real(x), 1),
  };
  if coeff_den != 1 {
    denominator.push(coeff_den.to_string());
  }

  for factor in rest {
    match factor {
      Expr::Pow(base, exp) if exp.as_number().is_some_and(Number::is_negative) => {
        let flipped = Expr::pow(*base.clone(), Expr::neg(*exp.clone()));
        denominator.push(format_factor(&flipped));
      }
      other => numerator.push(format_factor(other)),
    }
  }
  if coeff_num != "1" || numerator.is_empty() {
    numerator.insert(0, coeff_num);
  }

  let num = numerator.join("*");
  match denominator.len() {
    0 => num,
    1 => format!("{}/{}", num, denominator[0]),
    _ => format!("{}/({})", num, denominator.join("*")),
  }
}

/// Format a factor (adds parentheses for sums)
fn format_factor(expr: &Expr) -> String {
  match expr {
    Expr::Add(_) => format!("({})", format_expr(expr)),
    _ => format_expr(expr),
  }
}

fn format_power(base: &Expr, exp: &Expr) -> String {
  if let Some(Number::Rational(r)) = exp.as_number() {
    if r == Rational::new(1, 2) {
      return format!("sqrt({})", format_expr(base));
    }
    if r == Rational::new(-1, 2) {
      return format!("1/sqrt({})", format_expr(base));
    }
    if r == -Rational::one() {
      return format!("1/{}", format_power_base(base));
    }
  }
  let exp_s = format_expr(exp);
  if needs_parens_exp(exp) {
    format!("{}**({})", format_power_base(base), exp_s)
  } else {
    format!("{}**{}", format_power_base(base), exp_s)
  }
}

fn format_power_base(base: &Expr) -> String {
  let wrap = match base {
    Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => true,
    Expr::Number(Number::Rational(r)) => r.is_negative() || !r.is_integer(),
    Expr::Number(Number::Real(x)) => *x < 0.0,
    _ => false,
  };
  if wrap {
    format!("({})", format_expr(base))
  } else {
    format_expr(base)
  }
}

/// Check if expression needs parentheses in exponent position
fn needs_parens_exp(expr: &Expr) -> bool {
  match expr {
    Expr::Number(Number::Rational(r)) => r.is_negative() || !r.is_integer(),
    Expr::Number(Number::Real(x)) => *x < 0.0,
    Expr::Symbol(_) | Expr::Constant(_) | Expr::Call(..) => false,
    _ => true,
  }
}

// ─── Parse tree conversion ──────────────────────────────────────────────────

/// Convert a pest pair into a canonical expression.
pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, FunctionError> {
  match pair.as_rule() {
    Rule::Program | Rule::Group | Rule::Implicit => {
      let inner = pair.into_inner().find(|p| p.as_rule() != Rule::EOI);
      match inner {
        Some(p) => pair_to_expr(p),
        None => Err(FunctionError::InvalidSyntax("empty expression".into())),
      }
    }
    Rule::Expression => {
      let mut terms = Vec::new();
      let mut negate_next = false;
      for item in pair.into_inner() {
        match item.as_rule() {
          Rule::AddOperator => negate_next = item.as_str() == "-",
          _ => {
            let term = pair_to_expr(item)?;
            terms.push(if negate_next { Expr::neg(term) } else { term });
            negate_next = false;
          }
        }
      }
      Ok(Expr::add(terms))
    }
    Rule::Term => {
      let mut factors = Vec::new();
      let mut divide_next = false;
      for item in pair.into_inner() {
        match item.as_rule() {
          Rule::MulOperator => divide_next = item.as_str() == "/",
          _ => {
            let factor = pair_to_expr(item)?;
            factors.push(if divide_next {
              Expr::pow(factor, Expr::int(-1))
            } else {
              factor
            });
            divide_next = false;
          }
        }
      }
      Ok(Expr::mul(factors))
    }
    Rule::Signed => {
      let mut negative = false;
      let mut value = None;
      for item in pair.into_inner() {
        match item.as_rule() {
          Rule::Sign => negative ^= item.as_str() == "-",
          _ => value = Some(pair_to_expr(item)?),
        }
      }
      let value = value.ok_or_else(|| {
        FunctionError::InvalidSyntax("sign without operand".into())
      })?;
      Ok(if negative { Expr::neg(value) } else { value })
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = match inner.next() {
        Some(p) => pair_to_expr(p)?,
        None => return Err(FunctionError::InvalidSyntax("empty power".into())),
      };
      // PowOperator, then the exponent
      match inner.nth(1) {
        Some(exponent) => Ok(Expr::pow(base, pair_to_expr(exponent)?)),
        None => Ok(base),
      }
    }
    Rule::Call => {
      let mut inner = pair.into_inner();
      let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
      let args = inner.map(pair_to_expr).collect::<Result<Vec<_>, _>>()?;
      call_to_expr(&name, args)
    }
    Rule::Number => parse_number(pair.as_str()),
    Rule::Identifier => Ok(identifier_to_expr(pair.as_str())),
    rule => Err(FunctionError::InvalidSyntax(format!(
      "unexpected {:?} in expression",
      rule
    ))),
  }
}

fn identifier_to_expr(name: &str) -> Expr {
  match name {
    "pi" => Expr::pi(),
    "E" => Expr::Constant(Constant::E),
    _ => Expr::Symbol(name.to_string()),
  }
}

fn call_to_expr(name: &str, mut args: Vec<Expr>) -> Result<Expr, FunctionError> {
  let arity_error = |expected: &str, found: usize| {
    FunctionError::InvalidSyntax(format!(
      "{} expects {} argument(s), got {}",
      name, expected, found
    ))
  };
  if name == "sqrt" {
    if args.len() != 1 {
      return Err(arity_error("1", args.len()));
    }
    return Ok(Expr::sqrt(args.remove(0)));
  }
  match Func::from_name(name) {
    Some(Func::Log) if args.len() == 2 => {
      let base = args.remove(1);
      let value = args.remove(0);
      Ok(Expr::div(
        Expr::call(Func::Log, value),
        Expr::call(Func::Log, base),
      ))
    }
    Some(Func::Log) if args.len() != 1 => Err(arity_error("1 or 2", args.len())),
    Some(func) => {
      if args.len() != 1 {
        return Err(arity_error("1", args.len()));
      }
      Ok(Expr::call(func, args.remove(0)))
    }
    // Not a function: `x(y + 1)` is a product
    None => {
      if args.len() != 1 {
        return Err(FunctionError::InvalidSyntax(format!(
          "unknown function {}",
          name
        )));
      }
      Ok(Expr::mul(vec![identifier_to_expr(name), args.remove(0)]))
    }
  }
}

fn parse_number(text: &str) -> Result<Expr, FunctionError> {
  let invalid = || FunctionError::InvalidSyntax(format!("invalid number {}", text));
  let real = || {
    text
      .parse::<f64>()
      .ok()
      .filter(|x| x.is_finite())
      .map(Expr::real)
      .ok_or_else(invalid)
  };
  if text.contains(['.', 'e', 'E']) {
    return real();
  }
  match text.parse::<i128>() {
    Ok(n) => Ok(Expr::int(n)),
    Err(_) => real(),
  }
}
