use std::fmt;

use crate::engine;
use crate::syntax::Expr;

/// The unsolved condition `denominator = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalAsymptotes {
  pub denominator: Expr,
}

impl fmt::Display for VerticalAsymptotes {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Solutions of: {} = 0", self.denominator)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HorizontalAsymptote {
  /// Numerator degree below denominator degree.
  Zero,
  /// Equal degrees: the ratio of the leading coefficients, unreduced.
  Ratio {
    numerator_lc: Expr,
    denominator_lc: Expr,
  },
  /// Numerator degree above denominator degree (slant or higher).
  None,
  NotRationalPolynomial,
}

impl fmt::Display for HorizontalAsymptote {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HorizontalAsymptote::Zero => write!(f, "y = 0"),
      HorizontalAsymptote::Ratio {
        numerator_lc,
        denominator_lc,
      } => write!(f, "y = {}/{}", numerator_lc, denominator_lc),
      HorizontalAsymptote::None => {
        write!(f, "No horizontal asymptote (slant or higher).")
      }
      HorizontalAsymptote::NotRationalPolynomial => {
        write!(f, "Not a rational polynomial function.")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsymptoteReport {
  pub vertical: VerticalAsymptotes,
  pub horizontal: HorizontalAsymptote,
}

impl fmt::Display for AsymptoteReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "vertical: {}; horizontal: {}", self.vertical, self.horizontal)
  }
}

pub fn vertical_asymptotes(tree: &Expr) -> VerticalAsymptotes {
  let (_, denominator) = engine::numerator_denominator(tree);
  VerticalAsymptotes { denominator }
}

/// Degree comparison of numerator and denominator in `var`. Without a
/// variable both sides are constants of degree zero.
pub fn horizontal_asymptote(tree: &Expr, var: Option<&str>) -> HorizontalAsymptote {
  let (num, den) = engine::numerator_denominator(tree);
  let Some(var) = var else {
    return HorizontalAsymptote::Ratio {
      numerator_lc: num,
      denominator_lc: den,
    };
  };
  let (Some(p_num), Some(p_den)) =
    (engine::as_polynomial(&num, var), engine::as_polynomial(&den, var))
  else {
    return HorizontalAsymptote::NotRationalPolynomial;
  };

  match p_num.degree().cmp(&p_den.degree()) {
    std::cmp::Ordering::Less => HorizontalAsymptote::Zero,
    std::cmp::Ordering::Equal => HorizontalAsymptote::Ratio {
      numerator_lc: p_num.leading_coefficient().clone(),
      denominator_lc: p_den.leading_coefficient().clone(),
    },
    std::cmp::Ordering::Greater => HorizontalAsymptote::None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn horizontal(text: &str) -> String {
    let tree = engine::parse(text).unwrap();
    horizontal_asymptote(&tree, Some("x")).to_string()
  }

  #[test]
  fn degree_comparison() {
    assert_eq!(
      horizontal("(x^2+1)/(x-2)"),
      "No horizontal asymptote (slant or higher)."
    );
    assert_eq!(horizontal("(x+1)/(x^2+1)"), "y = 0");
    assert_eq!(horizontal("(2x+1)/(x+3)"), "y = 2/1");
    assert_eq!(horizontal("1/x"), "y = 0");
    assert_eq!(horizontal("sin(x)/x"), "Not a rational polynomial function.");
  }

  #[test]
  fn vertical_condition_is_unsolved() {
    let tree = engine::parse("(x^2 + 1)/(x - 2)").unwrap();
    assert_eq!(vertical_asymptotes(&tree).to_string(), "Solutions of: x - 2 = 0");
  }
}
