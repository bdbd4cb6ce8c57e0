//! Raw diagram documents as authored in YAML.
//!
//! Everything here is optional: presence and consistency checks happen in
//! [`crate::validate`], which turns a [`RawDocument`] into the typed model.

use std::path::Path;

use serde::Deserialize;

use crate::error::DocumentError;

/// A diagram document before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocument {
    /// Shapes, texts and groups.
    #[serde(default)]
    pub shapes: Vec<RawEntry>,
    /// Standalone texts.
    #[serde(default)]
    pub texts: Vec<RawEntry>,
    /// Connectors between shapes.
    #[serde(default)]
    pub connectors: Vec<RawConnector>,
}

impl RawDocument {
    /// Parse a document from YAML. An empty document is an empty diagram.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Yaml`] if the text is not a diagram document.
    pub fn from_yaml_str(source: &str) -> Result<Self, DocumentError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let document: Option<Self> = serde_yaml::from_str(source)?;
        Ok(document.unwrap_or_default())
    }

    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the file cannot be read and
    /// [`DocumentError::Yaml`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let source = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }
}

/// A shape, text or group entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    /// Identifier.
    pub id: Option<String>,
    /// `rectangle`, `ellipse`, `diamond`, `text` or `group`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// `[x, y]`, `[x, y, "WxH"]` or `[x, y, w, h]`.
    pub pos: Option<Vec<serde_yaml::Value>>,
    /// Label bound inside a shape.
    pub label: Option<String>,
    /// Text content.
    pub text: Option<String>,
    /// Colors.
    pub color: Option<RawColor>,
    /// Style overrides.
    pub style: Option<RawStyle>,
    /// Font size.
    pub font_size: Option<f64>,
    /// Font family name or numeric identifier.
    pub font_family: Option<RawFontFamily>,
    /// Z-order.
    pub z: Option<i64>,
    /// Group members.
    #[serde(alias = "children")]
    pub shapes: Option<Vec<RawEntry>>,
}

/// A connector entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConnector {
    /// Identifier, defaults to `{from}-to-{to}`.
    pub id: Option<String>,
    /// Source shape.
    pub from: Option<String>,
    /// Target shape.
    pub to: Option<String>,
    /// `arrow` or `line`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Label.
    pub label: Option<String>,
    /// Arrowhead at the start; `none` disables it.
    pub start_arrowhead: Option<String>,
    /// Arrowhead at the end; `none` disables it.
    pub end_arrowhead: Option<String>,
    /// Colors.
    pub color: Option<RawColor>,
    /// Style overrides.
    pub style: Option<RawStyle>,
    /// Label font size.
    pub font_size: Option<f64>,
    /// Label font family.
    pub font_family: Option<RawFontFamily>,
}

/// Colors block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawColor {
    /// Stroke color.
    pub stroke: Option<String>,
    /// Background color.
    #[serde(alias = "background")]
    pub bg: Option<String>,
}

/// Style block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStyle {
    /// Fill style.
    pub fill_style: Option<String>,
    /// Stroke width.
    pub stroke_width: Option<f64>,
    /// Stroke style.
    pub stroke_style: Option<String>,
    /// Roughness.
    pub roughness: Option<f64>,
    /// Opacity.
    pub opacity: Option<f64>,
}

/// Font family as written: a number or a name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFontFamily {
    /// Numeric identifier.
    Id(u8),
    /// Family name.
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let doc = RawDocument::from_yaml_str("").expect("empty is valid");
        assert!(doc.shapes.is_empty());
        assert!(doc.connectors.is_empty());
    }

    #[test]
    fn test_parse_sections() {
        let doc = RawDocument::from_yaml_str(
            r##"
shapes:
  - id: api
    type: rectangle
    pos: [100, 100, 200x80]
    label: API
    color: { bg: "#a5d8ff" }
    fontFamily: Helvetica
  - id: g1
    type: group
    pos: [100, 30]
    children:
      - id: s1
        type: ellipse
        pos: [0, 0, 100x24]
texts:
  - text: Title
    pos: [10, 10]
    fontSize: 28
connectors:
  - from: api
    to: s1
    endArrowhead: none
"##,
        )
        .expect("should parse");

        assert_eq!(doc.shapes.len(), 2);
        assert_eq!(doc.shapes[0].pos.as_ref().map(Vec::len), Some(3));
        assert!(matches!(
            doc.shapes[0].font_family,
            Some(RawFontFamily::Name(ref n)) if n == "Helvetica"
        ));
        let members = doc.shapes[1].shapes.as_ref().expect("children alias");
        assert_eq!(members[0].id.as_deref(), Some("s1"));
        assert_eq!(doc.texts[0].font_size, Some(28.0));
        assert_eq!(doc.connectors[0].end_arrowhead.as_deref(), Some("none"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = RawDocument::from_yaml_str("shapes: 3").unwrap_err();
        assert!(matches!(err, DocumentError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RawDocument::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
