//! Analysis export documents
//!
//! An analysis export is an arbitrarily nested JSON object in which any key may
//! be missing at any depth. [`AnalysisDocument::at`] hands out a [`Lookup`]
//! cursor whose `get` calls compose left to right and never fail: a missing
//! key, or a key on something that is not an object, simply yields an absent
//! lookup.

use serde_json::{Map, Value};
use std::path::Path;

/// A read-only analysis export
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisDocument {
    root: Value,
}

impl AnalysisDocument {
    /// Wrap an already decoded JSON value
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// A document with no content at all
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Parse a document from JSON text
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self::new)
    }

    /// Read and parse a document from disk
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Load a document, degrading to an empty one on any I/O or parse error
    ///
    /// The failure is logged; callers see the same result as an export with no
    /// dependency data.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(doc) => {
                tracing::info!(path = %path.display(), "loaded analysis data");
                doc
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to load analysis data");
                Self::empty()
            }
        }
    }

    /// Start a nested lookup at the document root
    pub fn at(&self) -> Lookup<'_> {
        Lookup(Some(&self.root))
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }
}

impl Default for AnalysisDocument {
    fn default() -> Self {
        Self::empty()
    }
}

/// Cursor into a document; `None` marks an absent value
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a>(Option<&'a Value>);

impl<'a> Lookup<'a> {
    /// Descend into an object key
    pub fn get(self, key: &str) -> Lookup<'a> {
        Lookup(self.0.and_then(|v| v.as_object()).and_then(|m| m.get(key)))
    }

    /// Descend through several keys in order
    pub fn path(self, keys: &[&str]) -> Lookup<'a> {
        keys.iter().fold(self, |lookup, key| lookup.get(key))
    }

    /// Elements of an array; empty when absent or not an array
    pub fn items(self) -> &'a [Value] {
        self.0
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_present(self) -> bool {
        self.0.is_some()
    }
}
