use super::*;

#[test]
fn all_variables_bound() {
  let f = Function::new("x - 2w + 3z").unwrap();
  let result = f.evaluate([("x", 1.0), ("w", 2.0), ("z", 3.0)]);
  assert_eq!(result, Evaluation::Number(6.0));
}

#[test]
fn residual_expression() {
  let f = Function::new("x y + 1").unwrap();
  let result = f.evaluate([("x", 2.0)]);
  assert_eq!(result.to_string(), "2*y + 1");
  assert_eq!(result.as_number(), None);
}

#[test]
fn unknown_names_are_ignored() {
  let f = Function::new("x^2").unwrap();
  assert_eq!(f.evaluate([("x", 3.0), ("q", 1.0)]).as_number(), Some(9.0));
}

#[test]
fn constants() {
  let f = Function::new("sin(pi/2) + E").unwrap();
  let v = f.evaluate(Vec::<(String, f64)>::new()).as_number().unwrap();
  assert!((v - (1.0 + std::f64::consts::E)).abs() < 1e-12);
}

mod construction {
  use super::*;

  #[test]
  fn caret_and_implicit_multiplication() {
    assert_eq!(
      Function::new("4x^2").unwrap().expr(),
      Function::new("4*x**2").unwrap().expr()
    );
    assert_eq!(
      Function::new("2sin(x)").unwrap().expr(),
      Function::new("2*sin(x)").unwrap().expr()
    );
  }

  #[test]
  fn parse_errors() {
    assert!(Function::new("x +").unwrap_err().is_parse_error());
    assert!(Function::new("sin(x, y)").unwrap_err().is_parse_error());
    assert!(Function::polynomial("(x").unwrap_err().is_parse_error());
  }

  #[test]
  fn tokens_view_the_normalized_text() {
    let f = Function::new("x^2 + 2x").unwrap();
    assert_eq!(f.tokens(), vec!["x**2", "+", "2x"]);
    assert_eq!(f.text(), "x**2 + 2x");
  }

  #[test]
  fn variables_are_sorted() {
    let f = Function::new("z + b a").unwrap();
    assert_eq!(f.variables(), ["a", "b", "z"]);
  }
}
