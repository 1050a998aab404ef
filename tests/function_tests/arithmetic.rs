use super::*;

#[test]
fn left_operand_decides_the_category() {
  let p = Function::polynomial("x^2").unwrap();
  let r = Function::rational("1/x").unwrap();
  let sum = (&p + &r).unwrap();
  assert_eq!(sum.category(), Category::Polynomial);
  let other_way = (&r + &p).unwrap();
  assert_eq!(other_way.category(), Category::Rational);
}

#[test]
fn sum_of_polynomials() {
  let a = Function::polynomial("x^2 + 1").unwrap();
  let b = Function::polynomial("x - 1").unwrap();
  assert_eq!((&a + &b).unwrap().to_string(), "x**2 + x");
  assert_eq!((&a - &a).unwrap().to_string(), "0");
}

#[test]
fn product_and_quotient() {
  let x = Function::new("x").unwrap();
  let y = Function::new("y").unwrap();
  assert_eq!((&x * &y).unwrap().variables(), ["x", "y"]);
  assert_eq!((&x / &x).unwrap().to_string(), "1");
}

#[test]
fn owned_operands() {
  let a = Function::trigonometric("sin(x)").unwrap();
  let b = Function::trigonometric("cos(x)").unwrap();
  let q = (a / b).unwrap();
  assert_eq!(q.category(), Category::Trigonometric);
  assert_eq!(q.simplify_trig().unwrap().to_string(), "tan(x)");
}

#[test]
fn power() {
  let x = Function::polynomial("x").unwrap();
  let cube = x.pow(3).unwrap();
  assert_eq!(cube.to_string(), "x**3");
  assert_eq!(cube.degree().unwrap(), 3);
  let n = Function::new("n").unwrap();
  assert_eq!(x.pow(&n).unwrap().to_string(), "x**n");
}
