use symfun::parse;

#[cfg(test)]
mod tests {
  use symfun::Rule;

  use super::*;

  #[test]
  fn test_parse_calculation() {
    let pair = parse("1 + 2").unwrap().next().unwrap();
    assert_eq!(pair.as_rule(), Rule::Program);
  }

  #[test]
  fn test_parse_symbolic_calculation() {
    let pair = parse("x + 2").unwrap().next().unwrap();
    assert_eq!(pair.as_rule(), Rule::Program);
  }

  #[test]
  fn test_parse_function_call() {
    let pair = parse("sin(pi/4)").unwrap().next().unwrap();
    assert_eq!(pair.as_rule(), Rule::Program);
  }

  #[test]
  fn test_parse_power_operator() {
    assert!(parse("x**2 + 1").is_ok());
    assert!(parse("x^2 + 1").is_ok());
    assert!(parse("2**-1").is_ok());
  }

  #[test]
  fn test_parse_implicit_multiplication() {
    assert!(parse("2x").is_ok());
    assert!(parse("2sin(x)").is_ok());
    assert!(parse("(x + 1)(x - 1)").is_ok());
  }

  #[test]
  fn test_parse_numbers() {
    assert!(parse("3.25").is_ok());
    assert!(parse("-0.5x").is_ok());
  }

  #[test]
  fn test_program_holds_one_expression() {
    let program = parse("x + 1").unwrap().next().unwrap();
    let inner: Vec<Rule> = program
      .into_inner()
      .map(|p| p.as_rule())
      .filter(|r| *r != Rule::EOI)
      .collect();
    assert_eq!(inner, vec![Rule::Expression]);
  }

  #[test]
  fn test_parse_failures() {
    assert!(parse("x +").is_err());
    assert!(parse("(x + 1").is_err());
    assert!(parse("2 * * x").is_err());
    assert!(parse("").is_err());
  }
}
