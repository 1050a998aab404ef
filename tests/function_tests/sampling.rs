use super::*;

#[test]
fn undefined_point_is_marked() {
  let f = Function::rational("1/x").unwrap();
  let samples = f.sample(None, Some((-1.0, 1.0)), Some(5)).unwrap();
  let xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
  assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
  let undefined: Vec<f64> =
    samples.iter().filter(|s| s.y.is_none()).map(|s| s.x).collect();
  assert_eq!(undefined, vec![0.0]);
  assert_eq!(samples[1].y, Some(-2.0));
}

#[test]
fn outside_the_domain_is_undefined() {
  let f = Function::logarithmic("log(x)").unwrap();
  let samples = f.sample(None, Some((-1.0, 1.0)), Some(3)).unwrap();
  assert_eq!(samples[0].y, None);
  assert_eq!(samples[1].y, None);
  assert_eq!(samples[2].y, Some(0.0));
}

#[test]
fn default_windows() {
  let p = Function::polynomial("x^2").unwrap();
  let samples = p.sample(None, None, None).unwrap();
  assert_eq!(samples.len(), 500);
  assert_eq!(samples[0].x, -10.0);
  assert!((samples[499].x - 10.0).abs() < 1e-9);

  let t = Function::trigonometric("cos(x)").unwrap();
  let samples = t.sample(None, None, Some(2)).unwrap();
  assert_eq!(samples[0].x, -2.0 * std::f64::consts::PI);
}

#[test]
fn needs_a_variable() {
  let f = Function::new("x y").unwrap();
  assert!(f.sample(None, None, Some(3)).is_err());
  let samples = f.sample(Some("x"), Some((0.0, 1.0)), Some(2)).unwrap();
  assert!(samples.iter().all(|s| s.y.is_none()));
}
