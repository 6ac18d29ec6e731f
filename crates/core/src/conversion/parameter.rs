//! Ordered argument fragments tagged with their position relative to `-i`.

use serde::{Deserialize, Serialize};

/// Where a fragment is placed relative to the input clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterPosition {
    /// Before `-i`: applies to the demuxer of the following input.
    PreInput,
    /// After every `-i`: applies to the output.
    #[default]
    PostInput,
}

/// A single command-line fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    text: String,
    position: ParameterPosition,
}

impl Parameter {
    pub fn new(text: impl Into<String>, position: ParameterPosition) -> Self {
        Self {
            text: text.into().trim().to_string(),
            position,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> ParameterPosition {
        self.position
    }
}

/// Insertion-ordered set of fragments.
///
/// Adding a fragment whose trimmed text already exists at the same position is
/// a no-op, so fluent calls that rebuild the same fragment do not duplicate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment unless it is already present at `position`.
    pub fn add(&mut self, text: impl Into<String>, position: ParameterPosition) {
        let parameter = Parameter::new(text, position);
        if parameter.text.is_empty() || self.entries.contains(&parameter) {
            return;
        }
        self.entries.push(parameter);
    }

    /// Renders every fragment at `position`, each followed by one space.
    pub fn render(&self, position: ParameterPosition) -> String {
        self.entries
            .iter()
            .filter(|p| p.position == position)
            .map(|p| format!("{} ", p.text))
            .collect()
    }

    /// Replaces any fragment at `position` that starts with `flag`.
    ///
    /// Used by setters that own a single option, such as `-c:v` or `-b:a`, so
    /// a second call overrides the first instead of emitting both.
    pub fn replace(&mut self, flag: &str, text: impl Into<String>, position: ParameterPosition) {
        self.entries.retain(|p| {
            p.position != position
                || !(p.text == flag || p.text.starts_with(&format!("{} ", flag)))
        });
        self.add(text, position);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
