//! Request path translation
//!
//! Maps a URI path onto the served directory. `..` segments are resolved
//! lexically and can never climb above the root.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// A request path mapped onto the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPath {
    /// Location under the served root
    pub fs_path: PathBuf,
    /// Whether the request path ended with `/`
    pub trailing_slash: bool,
}

/// Translate a URI path (query already removed) into a filesystem path
///
/// # Examples
/// ```
/// use isoserve::http::path::translate_path;
/// use std::path::Path;
///
/// let t = translate_path(Path::new("/srv"), "/pkg/../app%20bg.wasm");
/// assert_eq!(t.fs_path, Path::new("/srv/app bg.wasm"));
/// assert!(!t.trailing_slash);
/// ```
pub fn translate_path(root: &Path, uri_path: &str) -> TranslatedPath {
    let trailing_slash = uri_path.trim_end().ends_with('/');
    let decoded = percent_decode_str(uri_path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            // A decoded separator would let one segment address a parent path
            s if s.contains('\\') => {}
            s => segments.push(s),
        }
    }

    let mut fs_path = root.to_path_buf();
    fs_path.extend(segments);

    TranslatedPath {
        fs_path,
        trailing_slash,
    }
}
