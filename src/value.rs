use crate::engine;
use crate::syntax::Expr;
use crate::Result;

/// A parsed expression together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionValue {
  text: String,
  tree: Expr,
  variables: Vec<String>,
}

impl ExpressionValue {
  pub fn parse(input: &str) -> Result<ExpressionValue> {
    let text = engine::normalize(input);
    let tree = engine::parse(&text)?;
    let variables = engine::free_variables(&tree);
    Ok(ExpressionValue {
      text,
      tree,
      variables,
    })
  }

  /// The input with `^` already rewritten to `**`.
  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn tree(&self) -> &Expr {
    &self.tree
  }

  /// Free variables, sorted by name.
  pub fn variables(&self) -> &[String] {
    &self.variables
  }

  /// Whitespace-split view of the normalized input text.
  pub fn tokens(&self) -> Vec<&str> {
    self.text.split_whitespace().collect()
  }
}
