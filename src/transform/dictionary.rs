use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::DictionaryError;

/// Read-only mapping from record identifier to replacement text.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Arc<HashMap<String, String>>,
}

impl Dictionary {
    pub fn new(entries: HashMap<String, String>) -> Result<Self, DictionaryError> {
        if entries.keys().any(|id| id.trim().is_empty()) {
            return Err(DictionaryError::EmptyIdentifier);
        }

        Ok(Self {
            entries: Arc::new(entries),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, DictionaryError> {
        Self::new(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DictionaryError> {
        Self::new(toml::from_str(content)?)
    }

    /// Load a flat `identifier -> replacement` table, picking the format from the file
    /// extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(DictionaryError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Dictionary
where
    K: Into<String>,
    V: Into<String>,
{
    /// Collect entries, silently dropping blank identifiers.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| -> (String, String) { (k.into(), v.into()) })
            .filter(|(k, _)| !k.trim().is_empty())
            .collect();

        Self {
            entries: Arc::new(entries),
        }
    }
}
