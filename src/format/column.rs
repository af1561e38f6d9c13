/// Column specifications and display-name derivation.
use std::fmt;

/// A source field key plus an optional display-name override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Top-level key looked up in each item (e.g. `disk.percent`).
    pub key: String,
    label: Option<String>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: None,
        }
    }

    /// Override the derived display name.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Display name: the override verbatim, else derived from the key.
    #[must_use]
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| label_from_key(&self.key))
    }

    /// Whether `name` selects this column (key or label, case-insensitive).
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name) || self.label().eq_ignore_ascii_case(name)
    }
}

impl From<&str> for ColumnSpec {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<(&str, &str)> for ColumnSpec {
    fn from((key, label): (&str, &str)) -> Self {
        Self::new(key).labeled(label)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Derive a display name: `.` and `_` become spaces, then title-case.
///
/// `-` is kept, and since it is not a letter the character after it is
/// capitalized (`foo-bar` -> `Foo-Bar`).
#[must_use]
pub fn label_from_key(key: &str) -> String {
    let spaced = key.replace(['.', '_'], " ");
    title_case(&spaced)
}

/// Uppercase every letter that follows a non-letter, lowercase the others.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
