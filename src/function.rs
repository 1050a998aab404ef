use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::asymptote::{self, AsymptoteReport, HorizontalAsymptote, VerticalAsymptotes};
use crate::engine::{self, RewriteTarget};
use crate::functions::interval::{Endpoint, RealSet};
use crate::syntax::{Expr, Func, Number};
use crate::value::ExpressionValue;
use crate::{FunctionError, Result};

// ─── Categories ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
  Generic,
  Polynomial,
  Trigonometric,
  Rational,
  Exponential,
  Logarithmic,
  Absolute,
}

/// How a category computes its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomainRule {
  AllReals,
  Continuous,
}

/// How a category computes its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeRule {
  /// Engine range over the given domain, all reals by default.
  OverReals,
  /// `[0, oo)` when the whole expression is one `Abs(...)`.
  AbsoluteShortcut,
  /// Engine range over the given domain, the continuous domain by default.
  Generic,
}

impl Category {
  pub const ALL: [Category; 7] = [
    Category::Generic,
    Category::Polynomial,
    Category::Trigonometric,
    Category::Rational,
    Category::Exponential,
    Category::Logarithmic,
    Category::Absolute,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Category::Generic => "generic",
      Category::Polynomial => "polynomial",
      Category::Trigonometric => "trigonometric",
      Category::Rational => "rational",
      Category::Exponential => "exponential",
      Category::Logarithmic => "logarithmic",
      Category::Absolute => "absolute",
    }
  }

  fn domain_rule(self) -> DomainRule {
    match self {
      Category::Polynomial => DomainRule::AllReals,
      _ => DomainRule::Continuous,
    }
  }

  fn range_rule(self) -> RangeRule {
    match self {
      Category::Polynomial => RangeRule::OverReals,
      Category::Absolute => RangeRule::AbsoluteShortcut,
      _ => RangeRule::Generic,
    }
  }

  /// Build a function of this category from text.
  pub fn construct(self, text: &str) -> Result<Function> {
    Ok(Function {
      category: self,
      value: ExpressionValue::parse(text)?,
    })
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Category {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    if let Some(c) = Category::ALL.into_iter().find(|c| c.name() == lower) {
      return Ok(c);
    }
    match lower.as_str() {
      "poly" => Ok(Category::Polynomial),
      "trig" => Ok(Category::Trigonometric),
      "exp" => Ok(Category::Exponential),
      "log" => Ok(Category::Logarithmic),
      "abs" => Ok(Category::Absolute),
      _ => Err(format!(
        "unknown category {:?}, expected one of: {}",
        s,
        Category::ALL.map(Category::name).join(", ")
      )),
    }
  }
}

// ─── Results ────────────────────────────────────────────────────────────────

/// Result of [`Function::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
  Number(f64),
  /// Free variables remain, or the closed value is not a real number.
  Residual(Expr),
}

impl Evaluation {
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Evaluation::Number(v) => Some(*v),
      Evaluation::Residual(_) => None,
    }
  }
}

impl fmt::Display for Evaluation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Evaluation::Number(v) => write!(f, "{}", v),
      Evaluation::Residual(e) => write!(f, "{}", e),
    }
  }
}

/// Result of [`Function::range`]. Failing to find a range is an expected
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeOutcome {
  Computed(RealSet),
  NotComputable(String),
}

impl RangeOutcome {
  pub fn computed(&self) -> Option<&RealSet> {
    match self {
      RangeOutcome::Computed(set) => Some(set),
      RangeOutcome::NotComputable(_) => None,
    }
  }
}

impl fmt::Display for RangeOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RangeOutcome::Computed(set) => write!(f, "{}", set),
      RangeOutcome::NotComputable(_) => write!(f, "not computable"),
    }
  }
}

// ─── Functions ──────────────────────────────────────────────────────────────

/// An immutable expression tagged with a category. Operations that derive
/// a new expression return a new `Function` of the same category.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
  category: Category,
  value: ExpressionValue,
}

impl Function {
  /// A Generic function.
  pub fn new(text: &str) -> Result<Function> {
    Category::Generic.construct(text)
  }

  pub fn with_category(text: &str, category: Category) -> Result<Function> {
    category.construct(text)
  }

  pub fn polynomial(text: &str) -> Result<Function> {
    Category::Polynomial.construct(text)
  }

  pub fn trigonometric(text: &str) -> Result<Function> {
    Category::Trigonometric.construct(text)
  }

  pub fn rational(text: &str) -> Result<Function> {
    Category::Rational.construct(text)
  }

  pub fn exponential(text: &str) -> Result<Function> {
    Category::Exponential.construct(text)
  }

  pub fn logarithmic(text: &str) -> Result<Function> {
    Category::Logarithmic.construct(text)
  }

  pub fn absolute(text: &str) -> Result<Function> {
    Category::Absolute.construct(text)
  }

  pub fn category(&self) -> Category {
    self.category
  }

  pub fn expr(&self) -> &Expr {
    self.value.tree()
  }

  pub fn value(&self) -> &ExpressionValue {
    &self.value
  }

  /// The caret-normalized input text.
  pub fn text(&self) -> &str {
    self.value.text()
  }

  pub fn variables(&self) -> &[String] {
    self.value.variables()
  }

  pub fn number_of_variables(&self) -> usize {
    self.value.variables().len()
  }

  pub fn tokens(&self) -> Vec<&str> {
    self.value.tokens()
  }

  /// The given variable, or the only free variable when none is given.
  pub(crate) fn resolve_variable(
    &self,
    operation: &'static str,
    var: Option<&str>,
  ) -> Result<String> {
    match var {
      Some(v) => Ok(v.trim().to_string()),
      None => match self.variables() {
        [only] => Ok(only.clone()),
        vars => Err(FunctionError::AmbiguousVariable {
          operation,
          found: vars.len(),
        }),
      },
    }
  }

  /// Reparse `expr` as a function of this category.
  fn derive(&self, expr: &Expr) -> Result<Function> {
    let text = expr.to_string();
    debug!("derived {} function {}", self.category, text);
    self.category.construct(&text)
  }

  fn require(&self, category: Category, operation: &'static str) -> Result<()> {
    if self.category == category {
      Ok(())
    } else {
      Err(FunctionError::UnsupportedOperation {
        operation,
        category: self.category,
      })
    }
  }

  /// Substitute the bindings. Names that are not variables are ignored.
  pub fn evaluate<I, S>(&self, bindings: I) -> Evaluation
  where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
  {
    let bindings: Vec<(S, f64)> = bindings.into_iter().collect();
    let result = engine::substitute(self.expr(), &bindings);
    match engine::to_f64(&result) {
      Some(v) => Evaluation::Number(v),
      None => Evaluation::Residual(result),
    }
  }

  // ─── Calculus ─────────────────────────────────────────────────────────

  pub fn derivative(&self, var: Option<&str>) -> Result<Function> {
    let var = self.resolve_variable("derivative", var)?;
    self.derive(&engine::differentiate(self.expr(), &var))
  }

  /// Indefinite integral, without a constant of integration.
  pub fn integral(&self, var: Option<&str>) -> Result<Function> {
    let var = self.resolve_variable("integral", var)?;
    self.derive(&engine::integrate(self.expr(), &var)?)
  }

  // ─── Domain and range ─────────────────────────────────────────────────

  pub fn domain(&self, var: Option<&str>) -> Result<RealSet> {
    let var = self.resolve_variable("domain", var)?;
    match self.category.domain_rule() {
      DomainRule::AllReals => Ok(RealSet::reals()),
      DomainRule::Continuous => engine::continuous_domain(self.expr(), &var),
    }
  }

  /// The range over `domain`. Without a domain, Polynomial functions use
  /// all reals and every other category its own domain.
  pub fn range(
    &self,
    var: Option<&str>,
    domain: Option<&RealSet>,
  ) -> Result<RangeOutcome> {
    let var = self.resolve_variable("range", var)?;
    let rule = self.category.range_rule();
    if rule == RangeRule::AbsoluteShortcut {
      if let Expr::Call(Func::Abs, _) = self.expr() {
        return Ok(RangeOutcome::Computed(RealSet::interval(
          Endpoint::closed(0.0),
          Endpoint::infinity(),
        )));
      }
    }

    let domain = match (domain, rule) {
      (Some(d), _) => d.clone(),
      (None, RangeRule::OverReals) => RealSet::reals(),
      (None, _) => match self.domain(Some(&var)) {
        Ok(d) => d,
        Err(FunctionError::DomainUnavailable(reason)) => {
          return Ok(RangeOutcome::NotComputable(reason));
        }
        Err(e) => return Err(e),
      },
    };

    match engine::function_range(self.expr(), &var, &domain) {
      Ok(set) => Ok(RangeOutcome::Computed(set)),
      Err(FunctionError::RangeUnavailable(reason)) => {
        debug!("range of {} not computable: {}", self, reason);
        Ok(RangeOutcome::NotComputable(reason))
      }
      Err(e) => Err(e),
    }
  }

  // ─── Polynomial ───────────────────────────────────────────────────────

  pub fn degree(&self) -> Result<usize> {
    self.require(Category::Polynomial, "degree")?;
    let var = self.resolve_variable("degree", None)?;
    engine::as_polynomial(self.expr(), &var)
      .map(|p| p.degree())
      .ok_or_else(|| FunctionError::NotAPolynomial(self.to_string()))
  }

  // ─── Rational ─────────────────────────────────────────────────────────

  pub fn numerator(&self) -> Result<Function> {
    self.require(Category::Rational, "numerator")?;
    self.derive(&engine::numerator_denominator(self.expr()).0)
  }

  pub fn denominator(&self) -> Result<Function> {
    self.require(Category::Rational, "denominator")?;
    self.derive(&engine::numerator_denominator(self.expr()).1)
  }

  pub fn vertical_asymptotes(&self) -> Result<VerticalAsymptotes> {
    self.require(Category::Rational, "vertical_asymptotes")?;
    Ok(asymptote::vertical_asymptotes(self.expr()))
  }

  /// Leading-degree comparison in the first variable (sorted by name).
  pub fn horizontal_asymptote(&self) -> Result<HorizontalAsymptote> {
    self.require(Category::Rational, "horizontal_asymptote")?;
    let var = self.variables().first().map(String::as_str);
    Ok(asymptote::horizontal_asymptote(self.expr(), var))
  }

  pub fn asymptotes(&self) -> Result<AsymptoteReport> {
    Ok(AsymptoteReport {
      vertical: self.vertical_asymptotes()?,
      horizontal: self.horizontal_asymptote()?,
    })
  }

  // ─── Trigonometric ────────────────────────────────────────────────────

  pub fn simplify_trig(&self) -> Result<Function> {
    self.require(Category::Trigonometric, "simplify_trig")?;
    self.derive(&engine::simplify(self.expr()))
  }

  /// Simplify, then write trigonometric values at rational multiples of
  /// `pi` as radicals.
  pub fn to_algebraic_if_possible(&self) -> Result<Function> {
    self.require(Category::Trigonometric, "to_algebraic_if_possible")?;
    let simplified = engine::simplify(self.expr());
    self.derive(&engine::rewrite(&simplified, RewriteTarget::Radicals))
  }

  // ─── Arithmetic ───────────────────────────────────────────────────────

  fn combine(&self, other: &Function, op: fn(Expr, Expr) -> Expr) -> Result<Function> {
    self.derive(&op(self.expr().clone(), other.expr().clone()))
  }

  /// `self ** exponent`; the result keeps this function's category.
  pub fn pow<E: Exponent>(&self, exponent: E) -> Result<Function> {
    self.derive(&Expr::pow(self.expr().clone(), exponent.to_exponent()))
  }
}

/// Anything usable as the exponent of [`Function::pow`].
pub trait Exponent {
  fn to_exponent(&self) -> Expr;
}

impl Exponent for &Function {
  fn to_exponent(&self) -> Expr {
    self.expr().clone()
  }
}

impl Exponent for Function {
  fn to_exponent(&self) -> Expr {
    self.expr().clone()
  }
}

impl Exponent for i64 {
  fn to_exponent(&self) -> Expr {
    Expr::int(*self as i128)
  }
}

impl Exponent for f64 {
  fn to_exponent(&self) -> Expr {
    Expr::Number(Number::from_f64(*self))
  }
}

impl fmt::Display for Function {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.expr())
  }
}

macro_rules! function_operator {
  ($trait:ident, $method:ident, $build:path) => {
    impl std::ops::$trait<&Function> for &Function {
      type Output = Result<Function>;

      fn $method(self, rhs: &Function) -> Result<Function> {
        self.combine(rhs, $build)
      }
    }

    impl std::ops::$trait<Function> for Function {
      type Output = Result<Function>;

      fn $method(self, rhs: Function) -> Result<Function> {
        self.combine(&rhs, $build)
      }
    }
  };
}

fn add_two(a: Expr, b: Expr) -> Expr {
  Expr::add(vec![a, b])
}

fn mul_two(a: Expr, b: Expr) -> Expr {
  Expr::mul(vec![a, b])
}

function_operator!(Add, add, add_two);
function_operator!(Sub, sub, Expr::sub);
function_operator!(Mul, mul, mul_two);
function_operator!(Div, div, Expr::div);
