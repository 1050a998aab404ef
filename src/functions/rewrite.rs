use crate::syntax::{pi_multiple, split_coefficient, Expr, Func, Number, Rational};

/// Passes of the trigonometric identity rules before giving up on a
/// fixpoint.
const MAX_SIMPLIFY_PASSES: usize = 8;

/// Target form for [`rewrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteTarget {
  /// Trigonometric values at rational multiples of `pi` as radicals.
  Radicals,
  /// `tan`, `cot`, `sec` and `csc` through `sin` and `cos`.
  SinCos,
}

// ─── Simplification ─────────────────────────────────────────────────────────

/// Canonical form plus the usual trigonometric identities.
pub fn simplify(expr: &Expr) -> Expr {
  let mut current = expr.clone();
  for _ in 0..MAX_SIMPLIFY_PASSES {
    let next = simplify_once(&current);
    if next == current {
      break;
    }
    current = next;
  }
  current
}

fn simplify_once(expr: &Expr) -> Expr {
  match expr {
    Expr::Add(terms) => {
      let terms: Vec<Expr> = terms.iter().map(simplify_once).collect();
      match simplify_sum(&terms) {
        Some(e) => e,
        None => Expr::add(terms),
      }
    }
    Expr::Mul(factors) => {
      let factors: Vec<Expr> = factors.iter().map(simplify_once).collect();
      match simplify_product(&factors) {
        Some(e) => e,
        None => Expr::mul(factors),
      }
    }
    Expr::Pow(b, e) => Expr::pow(simplify_once(b), simplify_once(e)),
    Expr::Call(f, arg) => Expr::call(*f, simplify_once(arg)),
    Expr::Number(_) | Expr::Constant(_) | Expr::Symbol(_) => expr.clone(),
  }
}

fn split_factors(term: &Expr) -> (Number, Vec<Expr>) {
  let (coeff, rest) = split_coefficient(term.clone());
  match rest {
    Expr::Mul(factors) => (coeff, factors),
    e if e.is_one() => (coeff, Vec::new()),
    e => (coeff, vec![e]),
  }
}

fn rebuild(coeff: Number, factors: Vec<Expr>) -> Expr {
  let mut all = vec![Expr::Number(coeff)];
  all.extend(factors);
  Expr::mul(all)
}

fn trig_power(factor: &Expr, func: Func, k: i128) -> Option<Expr> {
  match factor {
    Expr::Pow(b, e) if e.as_number() == Some(Number::int(k)) => match &**b {
      Expr::Call(f, u) if *f == func => Some(*u.clone()),
      _ => None,
    },
    Expr::Call(f, u) if k == 1 && *f == func => Some(*u.clone()),
    _ => None,
  }
}

fn squared(func: Func, u: &Expr) -> Expr {
  Expr::pow(Expr::call(func, u.clone()), Expr::int(2))
}

/// Apply the first matching identity to a pair of terms.
fn simplify_sum(terms: &[Expr]) -> Option<Expr> {
  for (i, term) in terms.iter().enumerate() {
    let (c, factors) = split_factors(term);
    for (j, factor) in factors.iter().enumerate() {
      let others = || {
        let mut rest = factors.clone();
        rest.remove(j);
        rest
      };
      let with = |replacement: Expr| {
        let mut rest = factors.clone();
        rest[j] = replacement;
        rebuild(c, rest)
      };

      if let Some(u) = trig_power(factor, Func::Sin, 2) {
        // c sin²u + c cos²u = c
        let partner = with(squared(Func::Cos, &u));
        if let Some(k) = find_other(terms, i, &partner) {
          return Some(replace_pair(terms, i, k, rebuild(c, others())));
        }
        // c - c sin²u = c cos²u
        if factors.len() == 1 {
          if let Some(k) = find_other(terms, i, &Expr::Number(-c)) {
            let cos2 = rebuild(-c, vec![squared(Func::Cos, &u)]);
            return Some(replace_pair(terms, i, k, cos2));
          }
        }
      }

      if let Some(u) = trig_power(factor, Func::Cos, 2) {
        // c cos²u - c sin²u = c cos(2u)
        let partner = rebuild(-c, {
          let mut rest = factors.clone();
          rest[j] = squared(Func::Sin, &u);
          rest
        });
        if let Some(k) = find_other(terms, i, &partner) {
          let double = Expr::call(Func::Cos, Expr::mul(vec![Expr::int(2), u]));
          return Some(replace_pair(terms, i, k, with(double)));
        }
        // c - c cos²u = c sin²u
        if factors.len() == 1 {
          if let Some(k) = find_other(terms, i, &Expr::Number(-c)) {
            let sin2 = rebuild(-c, vec![squared(Func::Sin, &u)]);
            return Some(replace_pair(terms, i, k, sin2));
          }
        }
      }

      if let (Some(u), 1) = (trig_power(factor, Func::Sin, 1), factors.len()) {
        // c sin u ± c cos u = sqrt(2) c sin(u ± pi/4)
        let cos = Expr::call(Func::Cos, u.clone());
        for (sign, shift) in [(c, Expr::rational(1, 4)), (-c, Expr::rational(-1, 4))] {
          if let Some(k) = find_other(terms, i, &rebuild(sign, vec![cos.clone()])) {
            let shifted = Expr::call(
              Func::Sin,
              Expr::add(vec![u.clone(), Expr::mul(vec![shift, Expr::pi()])]),
            );
            let combined = Expr::mul(vec![
              Expr::Number(c),
              Expr::sqrt(Expr::int(2)),
              shifted,
            ]);
            return Some(replace_pair(terms, i, k, combined));
          }
        }
      }
    }
  }
  None
}

fn find_other(terms: &[Expr], skip: usize, target: &Expr) -> Option<usize> {
  terms
    .iter()
    .enumerate()
    .find(|(k, t)| *k != skip && *t == target)
    .map(|(k, _)| k)
}

fn replace_pair(terms: &[Expr], i: usize, k: usize, replacement: Expr) -> Expr {
  let mut out: Vec<Expr> = terms
    .iter()
    .enumerate()
    .filter(|(idx, _)| *idx != i && *idx != k)
    .map(|(_, t)| t.clone())
    .collect();
  out.push(replacement);
  Expr::add(out)
}

/// sin/cos quotients and the double angle inside a product.
fn simplify_product(factors: &[Expr]) -> Option<Expr> {
  for (i, factor) in factors.iter().enumerate() {
    let (base, exponent) = match factor {
      Expr::Pow(b, e) => match e.as_number().and_then(Number::as_integer) {
        Some(n) if n > 0 => (&**b, n),
        _ => continue,
      },
      other => (other, 1),
    };
    let (func, u) = match base {
      Expr::Call(f @ (Func::Sin | Func::Cos), u) => (*f, &**u),
      _ => continue,
    };
    let other_func = if func == Func::Sin { Func::Cos } else { Func::Sin };
    let quotient = if func == Func::Sin { Func::Tan } else { Func::Cot };

    for (k, candidate) in factors.iter().enumerate() {
      if k == i {
        continue;
      }
      if trig_power(candidate, other_func, -exponent).as_ref() == Some(u) {
        // sin^n u / cos^n u = tan^n u
        let replacement =
          Expr::pow(Expr::call(quotient, u.clone()), Expr::int(exponent));
        return Some(replace_factors(factors, i, k, vec![replacement]));
      }
      if func == Func::Sin
        && exponent == 1
        && trig_power(candidate, Func::Cos, 1).as_ref() == Some(u)
      {
        // sin u cos u = sin(2u)/2
        let double = Expr::call(
          Func::Sin,
          Expr::mul(vec![Expr::int(2), u.clone()]),
        );
        return Some(replace_factors(
          factors,
          i,
          k,
          vec![Expr::rational(1, 2), double],
        ));
      }
    }
  }
  None
}

fn replace_factors(
  factors: &[Expr],
  i: usize,
  k: usize,
  replacement: Vec<Expr>,
) -> Expr {
  let mut out: Vec<Expr> = factors
    .iter()
    .enumerate()
    .filter(|(idx, _)| *idx != i && *idx != k)
    .map(|(_, f)| f.clone())
    .collect();
  out.extend(replacement);
  Expr::mul(out)
}

// ─── Rewrites ───────────────────────────────────────────────────────────────

pub fn rewrite(expr: &Expr, target: RewriteTarget) -> Expr {
  match expr {
    Expr::Add(terms) => {
      Expr::add(terms.iter().map(|t| rewrite(t, target)).collect())
    }
    Expr::Mul(factors) => {
      Expr::mul(factors.iter().map(|f| rewrite(f, target)).collect())
    }
    Expr::Pow(b, e) => Expr::pow(rewrite(b, target), rewrite(e, target)),
    Expr::Call(func, arg) => {
      let arg = rewrite(arg, target);
      let rewritten = match target {
        RewriteTarget::Radicals => radical_value(*func, &arg),
        RewriteTarget::SinCos => through_sin_cos(*func, &arg),
      };
      rewritten.unwrap_or_else(|| Expr::call(*func, arg))
    }
    Expr::Number(_) | Expr::Constant(_) | Expr::Symbol(_) => expr.clone(),
  }
}

fn through_sin_cos(func: Func, u: &Expr) -> Option<Expr> {
  let sin = Expr::call(Func::Sin, u.clone());
  let cos = Expr::call(Func::Cos, u.clone());
  Some(match func {
    Func::Tan => Expr::div(sin, cos),
    Func::Cot => Expr::div(cos, sin),
    Func::Sec => Expr::div(Expr::one(), cos),
    Func::Csc => Expr::div(Expr::one(), sin),
    _ => return None,
  })
}

/// `sin(k*pi/12)` for `k` in `0..=6`.
fn sin_twelfth(k: i128) -> Expr {
  let sqrt = |n: i128| Expr::sqrt(Expr::int(n));
  match k {
    0 => Expr::zero(),
    1 => Expr::mul(vec![
      Expr::rational(1, 4),
      Expr::sub(sqrt(6), sqrt(2)),
    ]),
    2 => Expr::rational(1, 2),
    3 => Expr::mul(vec![Expr::rational(1, 2), sqrt(2)]),
    4 => Expr::mul(vec![Expr::rational(1, 2), sqrt(3)]),
    5 => Expr::mul(vec![
      Expr::rational(1, 4),
      Expr::add(vec![sqrt(6), sqrt(2)]),
    ]),
    _ => Expr::one(),
  }
}

/// `sin(k*pi/12)` for any integer `k`.
fn sin_multiple(k: i128) -> Expr {
  let k = k.rem_euclid(24);
  match k {
    0..=6 => sin_twelfth(k),
    7..=12 => sin_twelfth(12 - k),
    _ => Expr::neg(sin_multiple(k - 12)),
  }
}

fn radical_value(func: Func, arg: &Expr) -> Option<Expr> {
  if !func.is_trigonometric() {
    return None;
  }
  let r = pi_multiple(arg)?;
  let twelfths = r * Rational::from_integer(12);
  if !twelfths.is_integer() {
    return None;
  }
  let k = *twelfths.numer();
  let sin = sin_multiple(k);
  let cos = sin_multiple(k + 6);
  let nonzero = |e: &Expr| (!e.is_zero()).then(|| e.clone());
  Some(match func {
    Func::Sin => sin,
    Func::Cos => cos,
    Func::Tan => Expr::div(sin, nonzero(&cos)?),
    Func::Cot => Expr::div(cos, nonzero(&sin)?),
    Func::Sec => Expr::div(Expr::one(), nonzero(&cos)?),
    Func::Csc => Expr::div(Expr::one(), nonzero(&sin)?),
    _ => return None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine;

  fn simplified(text: &str) -> String {
    simplify(&engine::parse(text).unwrap()).to_string()
  }

  fn radicals(text: &str) -> String {
    rewrite(&engine::parse(text).unwrap(), RewriteTarget::Radicals).to_string()
  }

  #[test]
  fn pythagorean_identity() {
    assert_eq!(simplified("sin(x)^2 + cos(x)^2"), "1");
    assert_eq!(simplified("3sin(2x)^2 + 3cos(2x)^2 + x"), "x + 3");
    assert_eq!(simplified("1 - sin(x)^2"), "cos(x)**2");
  }

  #[test]
  fn quotients_and_double_angles() {
    assert_eq!(simplified("sin(x)/cos(x)"), "tan(x)");
    assert_eq!(simplified("cos(x)/sin(x)"), "cot(x)");
    assert_eq!(simplified("2sin(x)cos(x)"), "sin(2*x)");
    assert_eq!(simplified("cos(x)^2 - sin(x)^2"), "cos(2*x)");
  }

  #[test]
  fn sine_plus_cosine() {
    assert_eq!(simplified("sin(x) + cos(x)"), "sqrt(2)*sin(x + pi/4)");
  }

  #[test]
  fn radical_values() {
    assert_eq!(radicals("sin(pi/4)"), "sqrt(2)/2");
    assert_eq!(radicals("cos(pi/6)"), "sqrt(3)/2");
    assert_eq!(radicals("sin(pi/6) + x"), "x + 1/2");
    assert_eq!(radicals("tan(pi/3)"), "sqrt(3)");
    assert_eq!(radicals("sin(x)"), "sin(x)");
  }

  #[test]
  fn sin_cos_form() {
    let e = rewrite(&engine::parse("tan(x)").unwrap(), RewriteTarget::SinCos);
    assert_eq!(e.to_string(), "sin(x)/cos(x)");
  }
}
