//! Free-form conditions written in CEL

use crate::Result;
use cel_interpreter::Program;
use ohno::app_err;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// A compiled CEL expression used as a property condition.
///
/// The expression sees the collection context as variables: `hostname`, `version`,
/// `provisioning` (module name to level) and `context` (every bootstrap value).
#[derive(Debug, Clone)]
pub struct Expression {
    program: Arc<Program>,
    source: String,
}

impl Expression {
    /// Compile an expression string
    ///
    /// # Errors
    /// Returns an error if the expression cannot be parsed
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let program = Program::compile(&source).map_err(|e| app_err!("could not parse expression '{source}': {e}"))?;

        Ok(Self {
            program: Arc::new(program),
            source,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Self::new(source).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_expression() {
        let expr = Expression::new("provisioning.afm != 'none'").unwrap();
        assert_eq!(expr.source(), "provisioning.afm != 'none'");
    }

    #[test]
    fn test_create_expression_invalid() {
        let _ = Expression::new("(x > 5").unwrap_err();
    }

    #[test]
    fn test_deserialize_invalid_expression() {
        let err = serde_json::from_str::<Expression>(r#""!!invalid!!(""#).unwrap_err();
        assert!(err.to_string().contains("could not parse expression"));
    }

    #[test]
    fn test_equality_follows_source() {
        let a = Expression::new("x > 5").unwrap();
        let b: Expression = serde_json::from_str(r#""x > 5""#).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Expression::new("x > 6").unwrap());
    }
}
