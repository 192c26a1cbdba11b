//! SQL statements and their bound parameters.
//!
//! A [`Statement`] is SQL text plus an ordered list of [`Parameter`]s.
//! Parameters are either all positional (`?`) or all named (`:name`);
//! mixing the two is accepted here and rejected when the request is encoded.

use crate::value::{SqlValue, ToSqlValue};

/// A single bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name without the leading sigil, `None` for positional.
    pub name: Option<String>,
    /// Bound value.
    pub value: SqlValue,
}

impl Parameter {
    /// Creates a positional parameter.
    pub fn positional(value: impl ToSqlValue) -> Self {
        Self {
            name: None,
            value: value.to_sql_value(),
        }
    }

    /// Creates a named parameter.
    pub fn named(name: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self {
            name: Some(name.into()),
            value: value.to_sql_value(),
        }
    }

    /// Returns `true` if this parameter has a name.
    #[must_use]
    pub const fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// How the parameters of one statement are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    /// No parameters at all.
    Bare,
    /// Every parameter is positional.
    Positional,
    /// Every parameter is named.
    Named,
    /// Named and positional parameters are mixed.
    Mixed,
}

/// A SQL statement with its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    parameters: Vec<Parameter>,
}

impl Statement {
    /// Creates a statement with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates an empty statement, to be filled in with [`Self::sql`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the SQL text.
    #[must_use]
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    /// Appends a positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl ToSqlValue) -> Self {
        self.parameters.push(Parameter::positional(value));
        self
    }

    /// Appends a named parameter.
    ///
    /// Each name may be bound once; a repeated name fails at encode time.
    #[must_use]
    pub fn bind_named(mut self, name: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.parameters.push(Parameter::named(name, value));
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends several parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql_text(&self) -> &str {
        &self.sql
    }

    /// Returns the bound parameters in order.
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns `true` if any parameter is bound.
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Classifies how this statement's parameters are named.
    #[must_use]
    pub fn parameter_style(&self) -> ParameterStyle {
        let named = self.parameters.iter().filter(|p| p.is_named()).count();
        match (named, self.parameters.len()) {
            (_, 0) => ParameterStyle::Bare,
            (0, _) => ParameterStyle::Positional,
            (n, total) if n == total => ParameterStyle::Named,
            _ => ParameterStyle::Mixed,
        }
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}
