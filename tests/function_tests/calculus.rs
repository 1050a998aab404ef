use super::*;

mod derivative {
  use super::*;

  #[test]
  fn polynomial() {
    let f = Function::new("x^2 + 1").unwrap();
    assert_eq!(f.derivative(Some("x")).unwrap().to_string(), "2*x");
  }

  #[test]
  fn implicit_variable() {
    let f = Function::new("x^2 + 1").unwrap();
    assert_eq!(f.derivative(None).unwrap(), f.derivative(Some("x")).unwrap());
  }

  #[test]
  fn chain_rule() {
    let f = Function::trigonometric("sin(2x)").unwrap();
    assert_eq!(f.derivative(None).unwrap().to_string(), "2*cos(2*x)");
  }

  #[test]
  fn exponential_and_logarithm() {
    let f = Function::exponential("exp(3x)").unwrap();
    assert_eq!(f.derivative(None).unwrap().to_string(), "3*exp(3*x)");
    let g = Function::logarithmic("log(x)").unwrap();
    assert_eq!(g.derivative(None).unwrap().to_string(), "1/x");
  }

  #[test]
  fn partial_derivative() {
    let f = Function::new("x y").unwrap();
    assert_eq!(f.derivative(Some("x")).unwrap().to_string(), "y");
  }

  #[test]
  fn keeps_category() {
    let f = Function::polynomial("x^3 - 4x + 1").unwrap();
    let d = f.derivative(None).unwrap();
    assert_eq!(d.category(), Category::Polynomial);
    assert_eq!(d.degree().unwrap(), 2);
  }

  #[test]
  fn needs_a_variable_when_ambiguous() {
    let f = Function::new("x y").unwrap();
    assert!(matches!(
      f.derivative(None),
      Err(FunctionError::AmbiguousVariable { found: 2, .. })
    ));
  }
}

mod integral {
  use super::*;

  #[test]
  fn polynomial() {
    let f = Function::polynomial("x^2 + 1").unwrap();
    let i = f.integral(None).unwrap();
    assert_eq!(i.to_string(), "x**3/3 + x");
    assert_eq!(i.category(), Category::Polynomial);
  }

  #[test]
  fn reciprocal() {
    let f = Function::rational("1/x").unwrap();
    assert_eq!(f.integral(None).unwrap().to_string(), "log(x)");
  }

  #[test]
  fn atan() {
    let f = Function::rational("1/(x^2 + 1)").unwrap();
    assert_eq!(f.integral(None).unwrap().to_string(), "atan(x)");
  }

  #[test]
  fn by_parts() {
    let f = Function::exponential("x exp(x)").unwrap();
    assert_eq!(f.integral(None).unwrap().to_string(), "x*exp(x) - exp(x)");
  }

  /// The derivative of the integral agrees with `f` where every log in the
  /// result is real.
  fn assert_antiderivative(text: &str) {
    let f = Function::rational(text).unwrap();
    let i = f.integral(None).unwrap();
    assert_eq!(i.category(), Category::Rational);
    let back = i.derivative(None).unwrap();
    for x in [3.0, 4.5, 7.0] {
      let want = f.evaluate([("x", x)]).as_number().unwrap();
      let got = back.evaluate([("x", x)]).as_number().unwrap();
      assert!((want - got).abs() < 1e-9, "{} at {}: {} vs {}", text, x, want, got);
    }
  }

  #[test]
  fn rational_functions() {
    for text in [
      "(x^2 + 1)/(x - 2)",
      "(2x + 1)/(x + 3)",
      "x/(x + 1)",
      "1/(x^2 - 1)",
      "x/(x^2 + 1)",
      "1/((x - 1)^2 * (x + 2))",
      "(x + 5)/((x - 1)*(x^2 + 2x + 2))",
    ] {
      assert_antiderivative(text);
    }
  }

  #[test]
  fn numerator_is_the_denominator_derivative() {
    let f = Function::rational("x/(x^2 + 1)").unwrap();
    assert_eq!(f.integral(None).unwrap().to_string(), "log(x**2 + 1)/2");
  }

  #[test]
  fn irreducible_irrational_factor() {
    let f = Function::rational("1/(x^2 - 2)").unwrap();
    assert!(matches!(
      f.integral(None),
      Err(FunctionError::IntegralNotFound(_))
    ));
  }

  #[test]
  fn no_elementary_antiderivative() {
    let f = Function::exponential("exp(x^2)").unwrap();
    assert!(matches!(
      f.integral(None),
      Err(FunctionError::IntegralNotFound(_))
    ));
  }
}
