// Licensed under the Apache-2.0 license

use crate::error::{config_err, Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Concrete syntax of a register-map or configuration document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Pick the syntax from a file extension (`.json` or `.toml`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => config_err!(
                "cannot infer a document format from '{}' (expected .json or .toml)",
                path.display()
            ),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Toml => "toml",
        }
    }

    /// Parse a document into a generic tree.
    pub(crate) fn parse(self, text: &str, document: &str) -> Result<Value> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| Error::Parse {
                document: document.to_string(),
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            }),
            Format::Toml => toml::from_str(text).map_err(|e| {
                let (line, column) = e
                    .span()
                    .map(|span| line_column(text, span.start))
                    .unwrap_or((0, 0));
                Error::Parse {
                    document: document.to_string(),
                    line,
                    column,
                    message: e.message().to_string(),
                }
            }),
        }
    }

    /// Render a serializable document, always ending with a newline.
    pub(crate) fn render<T: Serialize>(self, value: &T, target: &str) -> Result<String> {
        let mut text = match self {
            Format::Json => {
                serde_json::to_string_pretty(value).map_err(|e| Error::render(target, e))?
            }
            Format::Toml => toml::to_string(value).map_err(|e| Error::render(target, e))?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 1-based line and column of a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text.as_bytes()[..offset.min(text.len())];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = match before.iter().rposition(|&b| b == b'\n') {
        Some(nl) => before.len() - nl,
        None => before.len() + 1,
    };
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path(Path::new("regs.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("dir/regs.TOML")).unwrap(), Format::Toml);
        for bad in ["regs.yaml", "regs"] {
            let err = Format::from_path(Path::new(bad)).unwrap_err();
            assert!(err.is_config(), "{bad}");
        }
    }

    #[test]
    fn test_json_parse_error_position() {
        let err = Format::Json.parse("{\n  \"a\": ,\n}", "a.json").unwrap_err();
        match err {
            Error::Parse { document, line, .. } => {
                assert_eq!(document, "a.json");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_toml_parse_error_position() {
        let err = Format::Toml.parse("a = 1\nb = = 2\n", "a.toml").unwrap_err();
        match err {
            Error::Parse { line, column, .. } => {
                assert_eq!(line, 2);
                assert!(column >= 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 1));
        assert_eq!(line_column("abc\ndef", 5), (2, 2));
    }
}
