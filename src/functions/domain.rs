use crate::functions::interval::{Endpoint, Interval, PointLattice, RealSet};
use crate::functions::polynomial::{numerator_denominator, real_roots, Polynomial};
use crate::syntax::{Expr, Func, Number};
use crate::{FunctionError, Result};

/// A condition a subterm places on the variable.
#[derive(Debug, Clone, PartialEq)]
enum Constraint {
  NonZero(Expr),
  Positive(Expr),
  NonNegative(Expr),
}

impl Constraint {
  fn holds_for(&self, value: f64) -> bool {
    match self {
      Constraint::NonZero(_) => value != 0.0,
      Constraint::Positive(_) => value > 0.0,
      Constraint::NonNegative(_) => value >= 0.0,
    }
  }

  fn expr(&self) -> &Expr {
    match self {
      Constraint::NonZero(e)
      | Constraint::Positive(e)
      | Constraint::NonNegative(e) => e,
    }
  }

  fn with_expr(&self, expr: Expr) -> Constraint {
    match self {
      Constraint::NonZero(_) => Constraint::NonZero(expr),
      Constraint::Positive(_) => Constraint::Positive(expr),
      Constraint::NonNegative(_) => Constraint::NonNegative(expr),
    }
  }
}

/// The largest subset of the reals on which `expr` is real-valued and
/// defined, as a function of `var`.
pub fn continuous_domain(expr: &Expr, var: &str) -> Result<RealSet> {
  let mut constraints = Vec::new();
  collect_constraints(expr, var, &mut constraints);
  constraints.dedup();

  let mut domain = RealSet::reals();
  for constraint in &constraints {
    domain = domain.intersect(&solve(constraint, var)?);
    if domain.is_empty() {
      break;
    }
  }
  Ok(domain)
}

fn collect_constraints(expr: &Expr, var: &str, out: &mut Vec<Constraint>) {
  if expr.is_constant_wrt(var) && !matches!(expr, Expr::Pow(..) | Expr::Call(..)) {
    return;
  }
  match expr {
    Expr::Add(items) | Expr::Mul(items) => {
      for item in items {
        collect_constraints(item, var, out);
      }
    }
    Expr::Pow(base, exp) => {
      collect_constraints(base, var, out);
      collect_constraints(exp, var, out);
      match exp.as_number() {
        Some(n) if n.as_integer().is_some() => {
          if n.is_negative() {
            out.push(Constraint::NonZero(*base.clone()));
          }
        }
        Some(n) => {
          if n.is_negative() {
            out.push(Constraint::Positive(*base.clone()));
          } else {
            out.push(Constraint::NonNegative(*base.clone()));
          }
        }
        None => {
          if !base.is_constant_wrt(var) {
            out.push(Constraint::Positive(*base.clone()));
          }
        }
      }
    }
    Expr::Call(func, arg) => {
      collect_constraints(arg, var, out);
      let u = *arg.clone();
      match func {
        Func::Log => out.push(Constraint::Positive(u)),
        Func::Asin | Func::Acos => {
          out.push(Constraint::NonNegative(Expr::sub(Expr::one(), u.clone())));
          out.push(Constraint::NonNegative(Expr::add(vec![Expr::one(), u])));
        }
        Func::Tan | Func::Sec => {
          out.push(Constraint::NonZero(Expr::call(Func::Cos, u)));
        }
        Func::Cot | Func::Csc => {
          out.push(Constraint::NonZero(Expr::call(Func::Sin, u)));
        }
        _ => {}
      }
    }
    Expr::Number(_) | Expr::Constant(_) | Expr::Symbol(_) => {}
  }
}

fn solve(constraint: &Constraint, var: &str) -> Result<RealSet> {
  let u = constraint.expr();
  if u.is_constant_wrt(var) {
    return Ok(match u.eval_f64(&|_| None) {
      Some(value) if !constraint.holds_for(value) => RealSet::empty(),
      _ => RealSet::reals(),
    });
  }

  match u {
    Expr::Call(Func::Exp, _) => return Ok(RealSet::reals()),
    // log(v) compared with 0 is v compared with 1; v > 0 is collected apart
    Expr::Call(Func::Log, inner) => {
      let shifted = Expr::sub(*inner.clone(), Expr::one());
      return solve(&constraint.with_expr(shifted), var);
    }
    Expr::Call(Func::Abs, inner) => {
      return match constraint {
        Constraint::NonNegative(_) => Ok(RealSet::reals()),
        _ => solve(&Constraint::NonZero(*inner.clone()), var),
      };
    }
    Expr::Pow(base, exp) => {
      let n = exp.as_number();
      if n.and_then(Number::as_integer).is_some_and(|k| k % 2 == 0) {
        return match constraint {
          Constraint::NonNegative(_) => Ok(RealSet::reals()),
          _ => solve(&Constraint::NonZero(*base.clone()), var),
        };
      }
      if n.is_some_and(|n| n.as_integer().is_none() && !n.is_negative()) {
        // even roots: the base is already required to be non-negative
        return match constraint {
          Constraint::NonNegative(_) => Ok(RealSet::reals()),
          _ => solve(&Constraint::Positive(*base.clone()), var),
        };
      }
    }
    Expr::Call(func @ (Func::Sin | Func::Cos), arg) => {
      if let Constraint::NonZero(_) = constraint {
        return zero_lattice(*func, arg, var, u);
      }
    }
    Expr::Add(_) => {
      if let Constraint::NonZero(_) = constraint {
        if let Some(set) = level_lattices(u, var) {
          return Ok(set);
        }
      }
    }
    Expr::Mul(factors) => {
      if let Constraint::NonZero(_) = constraint {
        let mut set = RealSet::reals();
        for factor in factors.iter().filter(|f| !f.is_constant_wrt(var)) {
          set = set.intersect(&solve(&constraint.with_expr(factor.clone()), var)?);
        }
        return Ok(set);
      }
    }
    _ => {}
  }

  sign_chart(constraint, var)
}

/// `sin(a x + c) != 0` or `cos(a x + c) != 0` as a periodic exclusion.
fn zero_lattice(func: Func, arg: &Expr, var: &str, u: &Expr) -> Result<RealSet> {
  let unavailable = || {
    FunctionError::DomainUnavailable(format!("cannot solve {} != 0", u))
  };
  let poly = Polynomial::from_expr(arg, var).ok_or_else(unavailable)?;
  if poly.degree() != 1 {
    return Err(unavailable());
  }
  let a = poly.coefficients()[1].clone();
  let c = poly.coefficients()[0].clone();
  let first_zero = match func {
    Func::Cos => Expr::mul(vec![Expr::rational(1, 2), Expr::pi()]),
    _ => Expr::zero(),
  };
  let offset = Expr::div(Expr::sub(first_zero, c), a.clone());
  let period = Expr::div(Expr::pi(), Expr::call(Func::Abs, a));
  Ok(RealSet::reals().without_lattice(PointLattice::new(offset, period)))
}

/// `c + k sin(a x + b) != 0` (or `cos`) as the lattices where the call
/// reaches the level `-c/k`.
fn level_lattices(u: &Expr, var: &str) -> Option<RealSet> {
  let Expr::Add(terms) = u else {
    return None;
  };
  let (constant, varying): (Vec<Expr>, Vec<Expr>) =
    terms.iter().cloned().partition(|t| t.is_constant_wrt(var));
  let [term] = varying.as_slice() else {
    return None;
  };
  let (scale, call) = match term {
    Expr::Mul(factors) => {
      let (k, rest): (Vec<Expr>, Vec<Expr>) =
        factors.iter().cloned().partition(|f| f.is_constant_wrt(var));
      let [call] = rest.as_slice() else {
        return None;
      };
      (Expr::mul(k), call.clone())
    }
    other => (Expr::one(), other.clone()),
  };
  let Expr::Call(func @ (Func::Sin | Func::Cos), arg) = &call else {
    return None;
  };
  let poly = Polynomial::from_expr(arg, var).filter(|p| p.degree() == 1)?;
  let level = Expr::neg(Expr::div(Expr::add(constant), scale));
  let s = level.eval_f64(&|_| None).filter(|v| v.is_finite())?;
  if s.abs() > 1.0 {
    return Some(RealSet::reals());
  }

  let half_pi = || Expr::mul(vec![Expr::rational(1, 2), Expr::pi()]);
  // where func(t) = s within one turn
  let angles = match *func {
    Func::Sin if s == 1.0 => vec![half_pi()],
    Func::Sin if s == -1.0 => vec![Expr::neg(half_pi())],
    Func::Cos if s == 1.0 => vec![Expr::zero()],
    Func::Cos if s == -1.0 => vec![Expr::pi()],
    Func::Sin => {
      let t = Expr::call(Func::Asin, level);
      vec![t.clone(), Expr::sub(Expr::pi(), t)]
    }
    _ => {
      let t = Expr::call(Func::Acos, level);
      vec![t.clone(), Expr::neg(t)]
    }
  };
  let a = poly.coefficients()[1].clone();
  let c = poly.coefficients()[0].clone();
  let period = Expr::div(
    Expr::mul(vec![Expr::int(2), Expr::pi()]),
    Expr::call(Func::Abs, a.clone()),
  );
  Some(angles.into_iter().fold(RealSet::reals(), |set, t| {
    let offset = Expr::div(Expr::sub(t, c.clone()), a.clone());
    set.without_lattice(PointLattice::new(offset, period.clone()))
  }))
}

/// Solve a constraint on a rational expression by testing its sign
/// between consecutive real roots of numerator and denominator.
fn sign_chart(constraint: &Constraint, var: &str) -> Result<RealSet> {
  let u = constraint.expr();
  let unavailable = || {
    FunctionError::DomainUnavailable(format!(
      "cannot solve the condition on {} for {}",
      u, var
    ))
  };
  let (num, den) = numerator_denominator(u);
  let roots_of = |e: &Expr| -> Result<Vec<f64>> {
    let coeffs = Polynomial::from_expr(e, var)
      .and_then(|p| p.numeric_coefficients())
      .ok_or_else(unavailable)?;
    Ok(real_roots(&coeffs))
  };
  let num_roots = roots_of(&num)?;
  let den_roots = roots_of(&den)?;

  let mut points: Vec<f64> = num_roots.iter().chain(&den_roots).copied().collect();
  points.sort_by(|a, b| a.total_cmp(b));
  points.dedup();

  let holds_at = |x: f64| {
    u.eval_at(var, x)
      .filter(|v| v.is_finite())
      .is_some_and(|v| constraint.holds_for(v))
  };

  let mut pieces = Vec::new();
  let mut lo = f64::NEG_INFINITY;
  for (i, &p) in points.iter().enumerate() {
    let test_point = if i == 0 { p - 1.0 } else { 0.5 * (lo + p) };
    if holds_at(test_point) {
      pieces.push(Interval::new(Endpoint::open(lo), Endpoint::open(p)));
    }
    let is_pole = den_roots.contains(&p);
    if !is_pole && constraint.holds_for(0.0) {
      pieces.push(Interval::new(Endpoint::closed(p), Endpoint::closed(p)));
    }
    lo = p;
  }
  let test_point = if points.is_empty() { 0.0 } else { lo + 1.0 };
  if holds_at(test_point) {
    pieces.push(Interval::new(Endpoint::open(lo), Endpoint::infinity()));
  }
  Ok(RealSet::from_intervals(pieces))
}
