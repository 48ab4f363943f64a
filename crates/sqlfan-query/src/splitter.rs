//! Statement splitting
//!
//! Splits a block of SQL text on `;` into an ordered batch of statements.
//! The split is literal: a semicolon inside a string literal or a procedural
//! block still ends a statement. Scripts that must reach the database in one
//! piece are sent through `Session::execute` directly instead.

/// An ordered sequence of trimmed, non-empty statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBatch {
    statements: Vec<String>,
}

impl StatementBatch {
    /// Build a batch from already-split statements, trimming and dropping blanks
    pub fn from_statements<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            statements: statements
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.statements.iter()
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}

impl IntoIterator for StatementBatch {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a StatementBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

/// Split `text` on `;`, trimming each fragment and dropping empty ones.
///
/// Empty or whitespace-only input yields an empty batch.
pub fn split(text: &str) -> StatementBatch {
    StatementBatch::from_statements(text.split(';'))
}
