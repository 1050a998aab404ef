use super::*;

fn range_text(f: &Function) -> String {
  f.range(None, None).unwrap().to_string()
}

mod domain {
  use super::*;

  #[test]
  fn logarithm() {
    let f = Function::logarithmic("log(x)").unwrap();
    assert_eq!(f.domain(Some("x")).unwrap().to_string(), "(0, oo)");
  }

  #[test]
  fn polynomial_is_all_reals() {
    let f = Function::polynomial("x^3 - 4x + 1").unwrap();
    assert!(f.domain(None).unwrap().is_reals());
  }

  #[test]
  fn square_root() {
    let f = Function::new("sqrt(x - 1)").unwrap();
    assert_eq!(f.domain(None).unwrap().to_string(), "[1, oo)");
  }

  #[test]
  fn rational_poles() {
    let f = Function::rational("(x^2 + 1)/(x - 2)").unwrap();
    let domain = f.domain(None).unwrap();
    assert_eq!(domain.to_string(), "(-oo, 2) U (2, oo)");
    assert!(!domain.contains(2.0));
  }

  #[test]
  fn tangent_lattice() {
    let f = Function::trigonometric("tan(x)").unwrap();
    assert_eq!(
      f.domain(None).unwrap().to_string(),
      "(-oo, oo) \\ {pi/2 + k*pi | k in Z}"
    );
  }

  #[test]
  fn logarithm_in_a_denominator() {
    let f = Function::new("sqrt(x)/log(x)").unwrap();
    assert_eq!(f.domain(None).unwrap().to_string(), "(0, 1) U (1, oo)");
  }

  #[test]
  fn sine_reaching_a_level() {
    let f = Function::new("1/(sin(x) - 1)").unwrap();
    let domain = f.domain(None).unwrap();
    assert!(!domain.contains(std::f64::consts::FRAC_PI_2));
    assert!(domain.contains(0.0));
    assert!(domain.contains(-std::f64::consts::FRAC_PI_2));
  }

  #[test]
  fn ambiguous_variable() {
    let f = Function::new("x - 2w + 3z").unwrap();
    assert_eq!(f.number_of_variables(), 3);
    assert!(matches!(
      f.domain(None),
      Err(FunctionError::AmbiguousVariable { found: 3, .. })
    ));
  }
}

mod range {
  use super::*;

  #[test]
  fn absolute_shortcut() {
    let f = Function::absolute("Abs(x - 1)").unwrap();
    assert_eq!(
      f.range(Some("x"), None).unwrap().computed().unwrap().to_string(),
      "[0, oo)"
    );
  }

  #[test]
  fn polynomial() {
    assert_eq!(range_text(&Function::polynomial("x^2").unwrap()), "[0, oo)");
    assert_eq!(
      range_text(&Function::polynomial("1 - x^2").unwrap()),
      "(-oo, 1]"
    );
  }

  #[test]
  fn polynomial_over_a_given_domain() {
    let f = Function::polynomial("x^2").unwrap();
    let domain = RealSet::closed(-1.0, 2.0);
    assert_eq!(f.range(None, Some(&domain)).unwrap().to_string(), "[0, 4]");
  }

  #[test]
  fn rational() {
    assert_eq!(
      range_text(&Function::rational("1/x").unwrap()),
      "(-oo, 0) U (0, oo)"
    );
    assert_eq!(
      range_text(&Function::rational("1/(x^2 + 1)").unwrap()),
      "(0, 1]"
    );
  }

  #[test]
  fn exponential() {
    let f = Function::exponential("exp(x)").unwrap();
    assert_eq!(range_text(&f), "(0, oo)");
  }

  #[test]
  fn periodic() {
    let f = Function::trigonometric("3cos(2x) + 1").unwrap();
    assert_eq!(range_text(&f), "[-2, 4]");
  }

  #[test]
  fn not_computable_is_data() {
    let f = Function::new("sin(1/x)").unwrap();
    let outcome = f.range(None, None).unwrap();
    assert!(matches!(outcome, RangeOutcome::NotComputable(_)));
    assert_eq!(outcome.to_string(), "not computable");
    assert!(outcome.computed().is_none());
  }

  #[test]
  fn flat_tails_are_not_critical_points() {
    let f = Function::exponential("exp(-x^2)").unwrap();
    assert_eq!(range_text(&f), "(0, 1]");
  }

  #[test]
  fn slowly_converging_limits() {
    for (text, left) in [("1 - 1/log(x)", 2.0), ("log(x)/(log(x) + 1)", 1.0)] {
      let f = Function::logarithmic(text).unwrap();
      let domain = RealSet::open(left, f64::INFINITY);
      let outcome = f.range(None, Some(&domain)).unwrap();
      assert!(matches!(outcome, RangeOutcome::NotComputable(_)), "{}", text);
    }
  }
}
