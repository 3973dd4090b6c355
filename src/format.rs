//! Target formats the gateway can ask the engine to produce.

use crate::error::RenderError;
use std::fmt;
use std::str::FromStr;

/// Media type for formats missing from the table below.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Output format requested through the `to` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    /// Office Open XML word-processing document.
    Docx,
    /// Office Open XML presentation.
    Pptx,
    /// HTML fragment, or a full document with `standalone`.
    Html,
}

impl TargetFormat {
    /// Every supported format, in the order they are advertised.
    pub const ALL: [TargetFormat; 3] = [TargetFormat::Docx, TargetFormat::Pptx, TargetFormat::Html];

    /// Name the engine understands after `--to`.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetFormat::Docx => "docx",
            TargetFormat::Pptx => "pptx",
            TargetFormat::Html => "html",
        }
    }

    /// Canonical media type sent as `content-type`.
    pub fn media_type(self) -> &'static str {
        media_type_for(self.as_str())
    }

    /// Whether the converted bytes are text that can travel unencoded in JSON.
    pub fn is_text(self) -> bool {
        matches!(self, TargetFormat::Html)
    }
}

/// Look up the media type for a format name, falling back to octet-stream.
pub fn media_type_for(format: &str) -> &'static str {
    match format {
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "html" => "text/html",
        _ => OCTET_STREAM,
    }
}

impl FromStr for TargetFormat {
    type Err = RenderError;

    /// Exact, case-sensitive match: `"HTML"` and `" html"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| RenderError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_table() {
        assert_eq!(
            TargetFormat::Docx.media_type(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            TargetFormat::Pptx.media_type(),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
        assert_eq!(TargetFormat::Html.media_type(), "text/html");
        assert_eq!(media_type_for("odt"), OCTET_STREAM);
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!("docx".parse::<TargetFormat>().unwrap(), TargetFormat::Docx);
        assert_eq!("html".parse::<TargetFormat>().unwrap(), TargetFormat::Html);
        for bad in ["pdf", "HTML", " html", ""] {
            match bad.parse::<TargetFormat>() {
                Err(RenderError::UnsupportedFormat(v)) => assert_eq!(v, bad),
                other => panic!("expected UnsupportedFormat for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn only_html_is_text() {
        assert!(TargetFormat::Html.is_text());
        assert!(!TargetFormat::Docx.is_text());
        assert!(!TargetFormat::Pptx.is_text());
    }
}
