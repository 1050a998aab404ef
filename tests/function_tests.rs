use symfun::{
  Category, Evaluation, Function, FunctionError, HorizontalAsymptote,
  RangeOutcome, RealSet,
};

mod function_tests {
  use super::*;

  mod arithmetic;
  mod asymptotes;
  mod calculus;
  mod categories;
  mod domain_range;
  mod evaluation;
  mod sampling;
}
