use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod asymptote;
pub mod engine;
pub mod function;
pub mod functions;
pub mod sampling;
pub mod syntax;
pub mod value;

pub use asymptote::{AsymptoteReport, HorizontalAsymptote, VerticalAsymptotes};
pub use function::{Category, Evaluation, Function, RangeOutcome};
pub use functions::interval::{Endpoint, Interval, PointLattice, RealSet};
pub use functions::polynomial::Polynomial;
pub use functions::rewrite::RewriteTarget;
pub use sampling::Sample;
pub use syntax::{Constant, Expr, Func, Number};
pub use value::ExpressionValue;

#[derive(Parser)]
#[grammar = "expression.pest"]
pub struct ExpressionParser;

#[derive(Error, Debug)]
pub enum FunctionError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Parse error: {0}")]
  InvalidSyntax(String),
  #[error(
    "{operation} needs exactly one free variable but found {found}; \
     specify the variable"
  )]
  AmbiguousVariable {
    operation: &'static str,
    found: usize,
  },
  #[error("Expression is not a polynomial: {0}")]
  NotAPolynomial(String),
  #[error("{operation} is not available for {category} functions")]
  UnsupportedOperation {
    operation: &'static str,
    category: Category,
  },
  #[error("Domain cannot be determined: {0}")]
  DomainUnavailable(String),
  #[error("Range cannot be determined: {0}")]
  RangeUnavailable(String),
  #[error("No elementary antiderivative found for {0}")]
  IntegralNotFound(String),
}

impl FunctionError {
  /// True for both grammar failures and malformed calls such as `sin(x, y)`.
  pub fn is_parse_error(&self) -> bool {
    matches!(
      self,
      FunctionError::ParseError(_) | FunctionError::InvalidSyntax(_)
    )
  }
}

pub type Result<T> = std::result::Result<T, FunctionError>;

impl ExpressionParser {
  pub fn parse_expression(
    input: &str,
  ) -> std::result::Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

/// Run the grammar over already normalized text (`**` for powers).
pub fn parse(
  input: &str,
) -> std::result::Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
{
  ExpressionParser::parse_expression(input)
}
