// Expression parsing and evaluation

pub mod eval;
pub mod parser;

use thiserror::Error;

pub use eval::FieldLookup;
pub use parser::Expr;

use crate::value::PropertyValue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("function {name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("field not found: {0}")]
    UnknownField(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

/// Expression text paired with its parse result.
///
/// The source text is what gets persisted; the AST is rebuilt on construction.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    parsed: Result<Expr, ExpressionError>,
}

impl Expression {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = parser::parse(&source);
        Self { source, parsed }
    }

    pub fn expression(&self) -> &str {
        &self.source
    }

    pub fn has_parser_error(&self) -> bool {
        self.parsed.is_err()
    }

    pub fn parser_error(&self) -> Option<&ExpressionError> {
        self.parsed.as_ref().err()
    }

    pub fn ast(&self) -> Option<&Expr> {
        self.parsed.as_ref().ok()
    }

    pub fn evaluate<L: FieldLookup + ?Sized>(&self, lookup: &L) -> Result<PropertyValue, ExpressionError> {
        match &self.parsed {
            Ok(expr) => eval::evaluate(expr, lookup),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn referenced_columns(&self) -> Vec<String> {
        self.ast().map(parser::referenced_columns).unwrap_or_default()
    }

    /// Quote a column name so it survives re-parsing ("a ""b""").
    pub fn quoted_column_ref(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExpressionContext;

    #[test]
    fn test_expression_keeps_source_verbatim() {
        let expr = Expression::new("1*5");
        assert_eq!(expr.expression(), "1*5");
        assert!(!expr.has_parser_error());
        assert_eq!(
            expr.evaluate(&ExpressionContext::new()).unwrap(),
            PropertyValue::number(5.0)
        );
    }

    #[test]
    fn test_parser_error_surfaces_on_evaluate() {
        let expr = Expression::new("1 +");
        assert!(expr.has_parser_error());
        assert!(expr.referenced_columns().is_empty());
        assert!(matches!(
            expr.evaluate(&ExpressionContext::new()),
            Err(ExpressionError::Parse(_))
        ));
    }

    #[test]
    fn test_quoted_column_ref_round_trips() {
        let quoted = Expression::quoted_column_ref("say \"hi\"");
        assert_eq!(quoted, "\"say \"\"hi\"\"\"");
        let expr = Expression::new(quoted);
        assert_eq!(expr.referenced_columns(), vec!["say \"hi\"".to_string()]);
    }
}
