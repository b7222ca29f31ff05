//! Credential and settings maps supplied at adapter construction.

use std::collections::HashMap;
use std::fmt;

/// Secret credential fields for one provider (access keys, bucket, region).
///
/// Held only by the adapter instance that was constructed with it, for the
/// lifetime of that instance. Values are redacted from `Debug` output and the
/// type deliberately implements neither `Display` nor `Serialize`, so secrets
/// cannot leak through logging or serialization paths.
#[derive(Clone, Default)]
pub struct Credentials {
    fields: HashMap<String, String>,
}

impl Credentials {
    /// Create an empty credential map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Get a credential value by field name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Whether a field is present with a non-blank value.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }
}

impl From<HashMap<String, String>> for Credentials {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let mut names: Vec<&String> = self.fields.keys().collect();
        names.sort();
        for name in names {
            map.entry(name, &"<redacted>");
        }
        map.finish()
    }
}

/// Optional behavioral knobs for an adapter.
///
/// Defaults to an empty mapping. Recognized keys are adapter-specific and
/// documented on each adapter; unknown keys are ignored.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Create an empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a setting, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a setting value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get a setting parsed as `u64`, `None` if absent or unparseable.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

impl From<HashMap<String, String>> for Settings {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}
