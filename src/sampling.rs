use std::f64::consts::PI;

use log::debug;

use crate::function::{Category, Function};
use crate::Result;

pub const DEFAULT_SAMPLE_COUNT: usize = 500;

pub const DEFAULT_WINDOW: (f64, f64) = (-10.0, 10.0);

pub const TRIG_WINDOW: (f64, f64) = (-2.0 * PI, 2.0 * PI);

/// The interval sampled when the caller gives none. Rational functions get
/// the plain default window, poles included.
pub fn default_window(category: Category) -> (f64, f64) {
  match category {
    Category::Trigonometric => TRIG_WINDOW,
    _ => DEFAULT_WINDOW,
  }
}

/// One sample point; `y` is `None` where the function is undefined or not
/// a real finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
  pub x: f64,
  pub y: Option<f64>,
}

impl Function {
  /// `count` evenly spaced samples over `interval`, both ends included.
  /// A point that fails to evaluate is recorded as undefined.
  pub fn sample(
    &self,
    var: Option<&str>,
    interval: Option<(f64, f64)>,
    count: Option<usize>,
  ) -> Result<Vec<Sample>> {
    let var = self.resolve_variable("sample", var)?;
    let (x_min, x_max) = interval.unwrap_or_else(|| default_window(self.category()));
    let count = count.unwrap_or(DEFAULT_SAMPLE_COUNT);

    let step = if count > 1 {
      (x_max - x_min) / (count - 1) as f64
    } else {
      0.0
    };
    let samples: Vec<Sample> = (0..count)
      .map(|i| {
        let x = x_min + i as f64 * step;
        let y = self.expr().eval_at(&var, x).filter(|y| y.is_finite());
        Sample { x, y }
      })
      .collect();

    let undefined = samples.iter().filter(|s| s.y.is_none()).count();
    if undefined > 0 {
      debug!("{} of {} samples of {} undefined", undefined, count, self);
    }
    Ok(samples)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trig_functions_default_to_two_periods() {
    let f = Function::trigonometric("sin(x)").unwrap();
    let samples = f.sample(None, None, Some(3)).unwrap();
    assert_eq!(samples[0].x, -2.0 * PI);
    assert_eq!(samples[2].x, 2.0 * PI);
    assert!(samples.iter().all(|s| s.y.is_some()));
  }

  #[test]
  fn single_sample_is_the_left_end() {
    let f = Function::new("x").unwrap();
    let samples = f.sample(None, Some((1.0, 2.0)), Some(1)).unwrap();
    assert_eq!(samples, vec![Sample { x: 1.0, y: Some(1.0) }]);
  }
}
