use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use symfun::Function;

const CASES: usize = 200;

// powers and products of these stay below f64::MAX at depth 3
const REAL_LITERALS: [&str; 5] = ["0.75", "2.0", "1.5e-8", "1e16", "2.5e16"];

fn random_polynomial(rng: &mut ChaCha8Rng) -> String {
  let degree = rng.gen_range(0..=5);
  let mut terms = Vec::new();
  for k in (0..=degree).rev() {
    let mut c: i64 = rng.gen_range(-6..=6);
    if k == degree && c == 0 {
      c = 1;
    }
    if c == 0 {
      continue;
    }
    terms.push(match k {
      0 => format!("({})", c),
      1 => format!("({})x", c),
      _ => format!("({})x^{}", c, k),
    });
  }
  terms.join(" + ")
}

fn random_expression(rng: &mut ChaCha8Rng, depth: u32) -> String {
  if depth == 0 || rng.gen_bool(0.25) {
    return match rng.gen_range(0..5) {
      0 => rng.gen_range(1..=5).to_string(),
      1 => REAL_LITERALS[rng.gen_range(0..REAL_LITERALS.len())].to_string(),
      2 => "y".to_string(),
      _ => "x".to_string(),
    };
  }
  let a = random_expression(rng, depth - 1);
  match rng.gen_range(0..9) {
    0 => format!("({}) + ({})", a, random_expression(rng, depth - 1)),
    1 => format!("({}) - ({})", a, random_expression(rng, depth - 1)),
    2 => format!("({})*({})", a, random_expression(rng, depth - 1)),
    3 => format!("({})/({})", a, rng.gen_range(1..=5)),
    4 => format!("({})^{}", a, rng.gen_range(2..=3)),
    5 => format!("sin({})", a),
    6 => format!("exp({})", a),
    7 => format!("log({})", a),
    _ => format!("sqrt({})", a),
  }
}

#[test]
fn rendering_reparses_to_the_same_tree() {
  let mut rng = ChaCha8Rng::seed_from_u64(42);
  for _ in 0..CASES {
    let text = random_expression(&mut rng, 3);
    let f = Function::new(&text).unwrap();
    let again = Function::new(&f.to_string()).unwrap();
    assert_eq!(f.expr(), again.expr(), "{} rendered as {}", text, f);
  }
}

#[test]
fn large_reals_stay_real() {
  for text in ["1e20", "-2.5e17", "1e300", "0.001"] {
    let f = Function::new(text).unwrap();
    let again = Function::new(&f.to_string()).unwrap();
    assert_eq!(f.expr(), again.expr(), "{} rendered as {}", text, f);
    assert!(again.variables().is_empty());
  }
}

#[test]
fn non_finite_literals_are_rejected() {
  assert!(Function::new("1e400").unwrap_err().is_parse_error());
  assert!(Function::new("1e400 x").unwrap_err().is_parse_error());
}

#[test]
fn polynomial_integral_differentiates_back() {
  let mut rng = ChaCha8Rng::seed_from_u64(7);
  for _ in 0..CASES {
    let text = random_polynomial(&mut rng);
    let f = Function::polynomial(&text).unwrap();
    let back = f
      .integral(Some("x"))
      .unwrap()
      .derivative(Some("x"))
      .unwrap();
    for x in [-2.0, -0.5, 0.0, 1.0, 3.0] {
      let expected = f.evaluate([("x", x)]).as_number().unwrap();
      let actual = back.evaluate([("x", x)]).as_number().unwrap();
      assert!(
        (expected - actual).abs() <= 1e-9 * expected.abs().max(1.0),
        "{}: {} vs {} at {}",
        text,
        expected,
        actual,
        x
      );
    }
  }
}

#[test]
fn polynomial_integral_raises_the_degree() {
  let mut rng = ChaCha8Rng::seed_from_u64(11);
  for _ in 0..CASES {
    let text = random_polynomial(&mut rng);
    let f = Function::polynomial(&text).unwrap();
    if f.number_of_variables() == 0 {
      continue;
    }
    let integral = f.integral(None).unwrap();
    assert_eq!(
      integral.degree().unwrap(),
      f.degree().unwrap() + 1,
      "{}",
      text
    );
  }
}
