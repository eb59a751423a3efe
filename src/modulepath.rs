// Hierarchical module identifiers
//
// A module path is an ordered list of identifier segments ("app.user").
// Everything here is pure: joining for display, for the filesystem, and
// for the flattened alias used in generated imports.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Ordered identifier segments of a module, e.g. `["app", "user"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// Parse a dotted module path, rejecting empty or non-identifier segments
    pub fn parse(dotted: &str) -> Result<Self> {
        let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
        Self::from_segments(segments).map_err(|_| Error::InvalidModulePath(dotted.to_string()))
    }

    /// Build from already split segments
    pub fn from_segments(segments: Vec<String>) -> Result<Self> {
        if segments.is_empty() || !segments.iter().all(|s| is_identifier(s)) {
            return Err(Error::InvalidModulePath(segments.join(".")));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Dot-joined form used for display and in import statements
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// Location of this module's directory below `base`
    pub fn to_fs_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(&self.0);
        path
    }

    /// Flattened alias (`app__user`) for importing a module under one name
    pub fn mangled(&self) -> String {
        self.0.join("__")
    }

    /// Every prefix of the path, shortest first: `a.b.c` -> `a`, `a.b`, `a.b.c`
    pub fn prefixes(&self) -> Vec<ModulePath> {
        (1..=self.0.len())
            .map(|n| ModulePath(self.0[..n].to_vec()))
            .collect()
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl TryFrom<String> for ModulePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ModulePath> for String {
    fn from(path: ModulePath) -> Self {
        path.dotted()
    }
}

/// Reserved words of the generated language
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Check that a segment is a valid, non-reserved identifier in the generated language
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_keyword(s)
}

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}
