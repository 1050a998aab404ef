use super::*;

mod polynomial {
  use super::*;

  #[test]
  fn degree() {
    let f = Function::polynomial("x^3 - 4x + 1").unwrap();
    assert_eq!(f.degree().unwrap(), 3);
    assert_eq!(Function::polynomial("x^2 - 1").unwrap().degree().unwrap(), 2);
  }

  #[test]
  fn degree_of_non_polynomial() {
    let f = Function::polynomial("sin(x)").unwrap();
    assert!(matches!(f.degree(), Err(FunctionError::NotAPolynomial(_))));
  }

  #[test]
  fn degree_needs_one_variable() {
    let f = Function::polynomial("x y").unwrap();
    assert!(matches!(
      f.degree(),
      Err(FunctionError::AmbiguousVariable { .. })
    ));
    let c = Function::polynomial("7").unwrap();
    assert!(matches!(
      c.degree(),
      Err(FunctionError::AmbiguousVariable { found: 0, .. })
    ));
  }
}

mod rational {
  use super::*;

  #[test]
  fn numerator_and_denominator() {
    let f = Function::rational("(x^2 + 1)/(x - 2)").unwrap();
    assert_eq!(f.numerator().unwrap().to_string(), "x**2 + 1");
    assert_eq!(f.denominator().unwrap().to_string(), "x - 2");
    assert_eq!(f.numerator().unwrap().category(), Category::Rational);
  }

  #[test]
  fn common_denominator() {
    let f = Function::rational("x + 1/x").unwrap();
    assert_eq!(f.numerator().unwrap().to_string(), "x**2 + 1");
    assert_eq!(f.denominator().unwrap().to_string(), "x");
  }
}

mod trigonometric {
  use super::*;

  #[test]
  fn simplify() {
    let f = Function::trigonometric("sin(x)^2 + cos(x)^2").unwrap();
    assert_eq!(f.simplify_trig().unwrap().to_string(), "1");
    let g = Function::trigonometric("sin(x)/cos(x)").unwrap();
    assert_eq!(g.simplify_trig().unwrap().to_string(), "tan(x)");
  }

  #[test]
  fn algebraic_values() {
    let f = Function::trigonometric("sin(pi/4)").unwrap();
    assert_eq!(f.to_algebraic_if_possible().unwrap().to_string(), "sqrt(2)/2");
    let g = Function::trigonometric("cos(pi/6)").unwrap();
    assert_eq!(g.to_algebraic_if_possible().unwrap().to_string(), "sqrt(3)/2");
  }

  #[test]
  fn keeps_category() {
    let f = Function::trigonometric("2sin(x)cos(x)").unwrap();
    let s = f.simplify_trig().unwrap();
    assert_eq!(s.to_string(), "sin(2*x)");
    assert_eq!(s.category(), Category::Trigonometric);
  }
}

mod unsupported {
  use super::*;

  #[test]
  fn category_operations_check_the_tag() {
    let f = Function::new("(x + 1)/(x - 1)").unwrap();
    assert!(matches!(
      f.numerator(),
      Err(FunctionError::UnsupportedOperation {
        category: Category::Generic,
        ..
      })
    ));
    assert!(Function::rational("x^2").unwrap().degree().is_err());
    assert!(Function::polynomial("sin(x)").unwrap().simplify_trig().is_err());
  }
}

mod factory {
  use super::*;

  #[test]
  fn every_category_builds() {
    for category in Category::ALL {
      let f = Function::with_category("x + 1", category).unwrap();
      assert_eq!(f.category(), category);
      assert_eq!(f.to_string(), "x + 1");
    }
  }

  #[test]
  fn names() {
    assert_eq!("polynomial".parse::<Category>(), Ok(Category::Polynomial));
    assert_eq!("abs".parse::<Category>(), Ok(Category::Absolute));
    assert_eq!(Category::Logarithmic.to_string(), "logarithmic");
  }
}
