//! MIME type detection module
//!
//! Resolves the Content-Type for a path: suffix overrides are checked first,
//! in order, then the general extension table from `mime_guess`.

use std::collections::HashMap;

/// Fallback for extensions the general table does not know
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Built-in suffix overrides, checked before anything else
const BUILTIN_OVERRIDES: &[(&str, &str)] = &[
    (".wasm", "application/wasm"),
    (".mod", "audio/mod"),
];

/// Process-wide extension table
///
/// Built-in overrides win over configured ones, and both win over the
/// general table.
#[derive(Debug, Clone)]
pub struct MimeTable {
    overrides: Vec<(String, String)>,
}

impl MimeTable {
    /// Build the table, appending configured overrides after the built-ins
    ///
    /// Configured keys may be given with or without the leading dot.
    pub fn new(extra: &HashMap<String, String>) -> Self {
        let mut overrides: Vec<(String, String)> = BUILTIN_OVERRIDES
            .iter()
            .map(|(suffix, ty)| ((*suffix).to_string(), (*ty).to_string()))
            .collect();

        let mut configured: Vec<(String, String)> = extra
            .iter()
            .map(|(suffix, ty)| {
                let suffix = if suffix.starts_with('.') {
                    suffix.clone()
                } else {
                    format!(".{suffix}")
                };
                (suffix, ty.clone())
            })
            .collect();
        // HashMap order is unstable; keep lookups deterministic
        configured.sort();
        overrides.extend(configured);

        Self { overrides }
    }

    /// Get the Content-Type for a request or filesystem path
    ///
    /// # Examples
    /// ```
    /// use isoserve::http::mime::MimeTable;
    /// let table = MimeTable::default();
    /// assert_eq!(table.guess_type("app.wasm"), "application/wasm");
    /// assert_eq!(table.guess_type("song.mod"), "audio/mod");
    /// assert_eq!(table.guess_type("blob"), "application/octet-stream");
    /// ```
    pub fn guess_type(&self, path: &str) -> &str {
        if let Some((_, ty)) = self
            .overrides
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix.as_str()))
        {
            return ty;
        }

        mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}
