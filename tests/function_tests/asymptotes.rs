use super::*;

#[test]
fn slant_or_higher() {
  let f = Function::rational("(x^2+1)/(x-2)").unwrap();
  let h = f.horizontal_asymptote().unwrap();
  assert_eq!(h, HorizontalAsymptote::None);
  assert_eq!(h.to_string(), "No horizontal asymptote (slant or higher).");
}

#[test]
fn lower_numerator_degree() {
  let f = Function::rational("(x+1)/(x^2+1)").unwrap();
  let h = f.horizontal_asymptote().unwrap();
  assert_eq!(h, HorizontalAsymptote::Zero);
  assert_eq!(h.to_string(), "y = 0");
}

#[test]
fn equal_degrees_keep_the_unreduced_ratio() {
  let f = Function::rational("(2x+1)/(x+3)").unwrap();
  assert_eq!(f.horizontal_asymptote().unwrap().to_string(), "y = 2/1");
  let g = Function::rational("(4x^2)/(2x^2 + 1)").unwrap();
  assert_eq!(g.horizontal_asymptote().unwrap().to_string(), "y = 4/2");
}

#[test]
fn not_rational_polynomial() {
  let f = Function::rational("sin(x)/x").unwrap();
  assert_eq!(
    f.horizontal_asymptote().unwrap(),
    HorizontalAsymptote::NotRationalPolynomial
  );
}

#[test]
fn vertical_condition() {
  let f = Function::rational("(x^2 + 1)/(x - 2)").unwrap();
  assert_eq!(
    f.vertical_asymptotes().unwrap().to_string(),
    "Solutions of: x - 2 = 0"
  );
}

#[test]
fn report() {
  let f = Function::rational("1/x").unwrap();
  assert_eq!(
    f.asymptotes().unwrap().to_string(),
    "vertical: Solutions of: x = 0; horizontal: y = 0"
  );
}

#[test]
fn only_for_rational_functions() {
  let f = Function::polynomial("x^2").unwrap();
  assert!(matches!(
    f.horizontal_asymptote(),
    Err(FunctionError::UnsupportedOperation { .. })
  ));
}
