//! Directory listing page
//!
//! Rendering is pure; the handler collects entries from disk and passes them in.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in link targets (RFC 3986 unreserved plus `/`)
const HREF_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// One directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl ListingEntry {
    fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn link_target(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Render an HTML listing for `display_path` (already percent-decoded)
///
/// Entries are sorted case-insensitively.
pub fn render_listing(display_path: &str, mut entries: Vec<ListingEntry>) -> String {
    entries.sort_by_key(|e| e.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for entry in &entries {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            utf8_percent_encode(&entry.link_target(), HREF_SAFE),
            escape_html(&entry.display_name()),
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

/// Escape text for HTML element and attribute content
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> ListingEntry {
        ListingEntry {
            name: name.to_string(),
            is_dir: false,
            is_symlink: false,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_title_and_entries() {
        let html = render_listing("/assets/", vec![file("app.wasm"), file("song.mod")]);
        assert!(html.contains("<title>Directory listing for /assets/</title>"));
        assert!(html.contains("<li><a href=\"app.wasm\">app.wasm</a></li>"));
        assert!(html.contains("<li><a href=\"song.mod\">song.mod</a></li>"));
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let html = render_listing("/", vec![file("b.txt"), file("C.txt"), file("a.txt")]);
        let a = html.find("a.txt").unwrap();
        let b = html.find("b.txt").unwrap();
        let c = html.find("C.txt").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_dir_and_symlink_markers() {
        let entries = vec![
            ListingEntry {
                name: "src".to_string(),
                is_dir: true,
                is_symlink: false,
            },
            ListingEntry {
                name: "latest".to_string(),
                is_dir: false,
                is_symlink: true,
            },
            ListingEntry {
                name: "vendor".to_string(),
                is_dir: true,
                is_symlink: true,
            },
        ];
        let html = render_listing("/", entries);
        assert!(html.contains("<a href=\"src/\">src/</a>"));
        assert!(html.contains("<a href=\"latest\">latest@</a>"));
        // A link to a directory still navigates like one
        assert!(html.contains("<a href=\"vendor/\">vendor@</a>"));
    }

    #[test]
    fn test_names_are_encoded_and_escaped() {
        let html = render_listing("/<x>/", vec![file("a b&c.mod")]);
        assert!(html.contains("href=\"a%20b%26c.mod\""));
        assert!(html.contains(">a b&amp;c.mod</a>"));
        assert!(html.contains("Directory listing for /&lt;x&gt;/"));
    }
}
