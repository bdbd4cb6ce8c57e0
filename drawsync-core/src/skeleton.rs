//! Skeleton compilation.
//!
//! A skeleton is the element description the canvas server accepts in a batch
//! create: absolute coordinates, explicit style values and numeric font ids.
//! Compilation is pure; the same diagram always yields the same skeletons.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::geometry::{connector_geometry, DEFAULT_PADDING};
use crate::model::{Connector, ConnectorKind, Element, GroupMembership, Shape, ShapeKind, Text};
use crate::style::{
    StyleTables, DEFAULT_BACKGROUND, DEFAULT_FILL_STYLE, DEFAULT_OPACITY, DEFAULT_ROUGHNESS,
    DEFAULT_STROKE, DEFAULT_STROKE_STYLE, DEFAULT_STROKE_WIDTH, LABEL_FONT_SIZE, TEXT_FONT_SIZE,
};
use crate::validate::ValidatedDiagram;

/// Element type as understood by the canvas server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkeletonKind {
    /// Rectangle.
    Rectangle,
    /// Ellipse.
    Ellipse,
    /// Diamond.
    Diamond,
    /// Free-standing text.
    Text,
    /// Arrow.
    Arrow,
    /// Line.
    Line,
}

impl From<ShapeKind> for SkeletonKind {
    fn from(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rectangle => Self::Rectangle,
            ShapeKind::Ellipse => Self::Ellipse,
            ShapeKind::Diamond => Self::Diamond,
        }
    }
}

impl From<ConnectorKind> for SkeletonKind {
    fn from(kind: ConnectorKind) -> Self {
        match kind {
            ConnectorKind::Arrow => Self::Arrow,
            ConnectorKind::Line => Self::Line,
        }
    }
}

/// Canvas-server-ready element description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skeleton {
    /// Element type.
    #[serde(rename = "type")]
    pub kind: SkeletonKind,
    /// Absolute X.
    pub x: f64,
    /// Absolute Y.
    pub y: f64,
    /// Type-specific fields.
    #[serde(flatten)]
    pub body: SkeletonBody,
    /// Native groups the element belongs to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<String>,
}

/// Type-specific part of a [`Skeleton`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SkeletonBody {
    /// Closed shape.
    Shape(ShapeBody),
    /// Free-standing text.
    Text(TextBody),
    /// Arrow or line.
    Linear(LinearBody),
}

/// Fields of a closed shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeBody {
    /// Width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Outline color.
    pub stroke_color: String,
    /// Fill color.
    pub background_color: String,
    /// Fill style.
    pub fill_style: String,
    /// Outline width.
    pub stroke_width: f64,
    /// Outline style.
    pub stroke_style: String,
    /// Roughness.
    pub roughness: f64,
    /// Opacity.
    pub opacity: f64,
    /// Bound label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

/// Fields of a free-standing text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBody {
    /// Content.
    pub text: String,
    /// Font size.
    pub font_size: f64,
    /// Numeric font family.
    pub font_family: u8,
    /// Text color.
    pub stroke_color: String,
}

/// Fields of an arrow or line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearBody {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
    /// Path relative to (`x`, `y`).
    pub points: Vec<[f64; 2]>,
    /// Line color.
    pub stroke_color: String,
    /// Line width.
    pub stroke_width: f64,
    /// Line style.
    pub stroke_style: String,
    /// Arrowhead at the start.
    pub start_arrowhead: Option<String>,
    /// Arrowhead at the end.
    pub end_arrowhead: Option<String>,
    /// Label drawn on the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

/// Text bound to a shape or connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Content.
    pub text: String,
    /// Font size, server default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Numeric font family.
    pub font_family: u8,
}

/// A compiled element ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledElement {
    /// Document identifier.
    pub id: String,
    /// Skeleton to create.
    pub skeleton: Skeleton,
}

/// Body of a merge update (`PUT /api/elements/{id}`).
///
/// Carries every field of a skeleton plus an explicit clear for each optional
/// field the skeleton leaves out: `null` for sizes and labels, `[]` for
/// group ids. A merging server would otherwise keep their old values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ElementPatch(Map<String, Value>);

impl ElementPatch {
    /// Fields of the patch, clears included.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// A single field of the patch.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl Skeleton {
    /// Build the merge-update body that turns any remote element of the same
    /// type into this skeleton.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the skeleton cannot be encoded.
    pub fn merge_patch(&self) -> Result<ElementPatch, serde_json::Error> {
        let Value::Object(mut fields) = serde_json::to_value(self)? else {
            return Err(serde::ser::Error::custom("skeleton is not a JSON object"));
        };

        fields
            .entry("groupIds")
            .or_insert_with(|| Value::Array(Vec::new()));
        let clearable: &[&str] = match self.body {
            SkeletonBody::Shape(_) => &["width", "height", "label"],
            SkeletonBody::Linear(_) => &["label"],
            SkeletonBody::Text(_) => &[],
        };
        for key in clearable {
            fields.entry(*key).or_insert(Value::Null);
        }
        Ok(ElementPatch(fields))
    }
}

/// Compiles validated diagram entries into skeletons.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonCompiler<'a> {
    tables: &'a StyleTables,
    padding: f64,
}

impl Default for SkeletonCompiler<'static> {
    fn default() -> Self {
        Self::new(StyleTables::shared())
    }
}

impl<'a> SkeletonCompiler<'a> {
    /// Create a compiler using the given lookup tables.
    #[must_use]
    pub fn new(tables: &'a StyleTables) -> Self {
        Self {
            tables,
            padding: DEFAULT_PADDING,
        }
    }

    /// Use a different gap between connector ends and shapes.
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Compile a shape or text, applying its group offset if any.
    #[must_use]
    pub fn element(&self, element: &Element, membership: Option<&GroupMembership>) -> Skeleton {
        let (dx, dy) = membership.map_or((0.0, 0.0), |m| (m.offset_x, m.offset_y));
        let group_ids = membership
            .map(|m| vec![m.remote_group_id.clone()])
            .unwrap_or_default();

        match element {
            Element::Shape(shape) => self.shape(shape, dx, dy, group_ids),
            Element::Text(text) => self.text(text, dx, dy, group_ids),
        }
    }

    fn shape(&self, shape: &Shape, dx: f64, dy: f64, group_ids: Vec<String>) -> Skeleton {
        let style = &shape.style;
        let label = shape.label.as_ref().map(|text| Label {
            text: text.clone(),
            font_size: Some(shape.font.size.unwrap_or(LABEL_FONT_SIZE)),
            font_family: self.tables.font_id(shape.font.family.as_ref()),
        });

        Skeleton {
            kind: shape.kind.into(),
            x: shape.position.x + dx,
            y: shape.position.y + dy,
            body: SkeletonBody::Shape(ShapeBody {
                width: shape.position.width,
                height: shape.position.height,
                stroke_color: self.color_or(shape.colors.stroke.as_deref(), DEFAULT_STROKE),
                background_color: self
                    .color_or(shape.colors.background.as_deref(), DEFAULT_BACKGROUND),
                fill_style: style
                    .fill_style
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FILL_STYLE.to_string()),
                stroke_width: style.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
                stroke_style: style
                    .stroke_style
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STROKE_STYLE.to_string()),
                roughness: style.roughness.unwrap_or(DEFAULT_ROUGHNESS),
                opacity: style.opacity.unwrap_or(DEFAULT_OPACITY),
                label,
            }),
            group_ids,
        }
    }

    fn text(&self, text: &Text, dx: f64, dy: f64, group_ids: Vec<String>) -> Skeleton {
        Skeleton {
            kind: SkeletonKind::Text,
            x: text.position.x + dx,
            y: text.position.y + dy,
            body: SkeletonBody::Text(TextBody {
                text: text.content.clone(),
                font_size: text.font.size.unwrap_or(TEXT_FONT_SIZE),
                font_family: self.tables.font_id(text.font.family.as_ref()),
                stroke_color: self.color_or(text.colors.stroke.as_deref(), DEFAULT_STROKE),
            }),
            group_ids,
        }
    }

    /// Compile a connector, clipping it to the absolute boxes of its endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownShape`] if an endpoint is not in the
    /// diagram, which cannot happen for connectors produced by validation.
    pub fn connector(
        &self,
        connector: &Connector,
        diagram: &ValidatedDiagram,
    ) -> Result<Skeleton, ValidationError> {
        let (from, to) = diagram.endpoint_rects(connector)?;
        let geometry = connector_geometry(from, to, self.padding);

        let label = connector.label.as_ref().map(|text| Label {
            text: text.clone(),
            font_size: connector.font.size,
            font_family: self.tables.font_id(connector.font.family.as_ref()),
        });

        Ok(Skeleton {
            kind: connector.kind.into(),
            x: geometry.start.x,
            y: geometry.start.y,
            body: SkeletonBody::Linear(LinearBody {
                width: geometry.width,
                height: geometry.height,
                points: geometry.points.to_vec(),
                stroke_color: self.color_or(connector.colors.stroke.as_deref(), DEFAULT_STROKE),
                stroke_width: connector.style.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
                stroke_style: connector
                    .style
                    .stroke_style
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STROKE_STYLE.to_string()),
                start_arrowhead: connector.start_arrowhead.clone(),
                end_arrowhead: connector.end_arrowhead.clone(),
                label,
            }),
            group_ids: Vec::new(),
        })
    }

    /// Compile a whole diagram in creation order.
    ///
    /// Shapes and texts come first, sorted by z-order with ties kept in
    /// document order; connectors follow in document order so they are drawn
    /// on top.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::connector`].
    pub fn compile(&self, diagram: &ValidatedDiagram) -> Result<Vec<CompiledElement>, ValidationError> {
        let mut elements: Vec<&Element> = diagram.elements.iter().collect();
        elements.sort_by_key(|e| e.z());

        let mut compiled = Vec::with_capacity(diagram.len());
        for element in elements {
            compiled.push(CompiledElement {
                id: element.id().to_string(),
                skeleton: self.element(element, diagram.membership(element.id())),
            });
        }
        for connector in &diagram.connectors {
            compiled.push(CompiledElement {
                id: connector.id.clone(),
                skeleton: self.connector(connector, diagram)?,
            });
        }
        Ok(compiled)
    }

    fn color_or(&self, value: Option<&str>, default: &str) -> String {
        value.map_or_else(|| default.to_string(), |v| self.tables.color(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawDocument;
    use crate::validate::{remote_group_id, validate};
    use serde_json::json;

    fn diagram(yaml: &str) -> ValidatedDiagram {
        validate(&RawDocument::from_yaml_str(yaml).expect("yaml")).expect("valid")
    }

    #[test]
    fn test_shape_defaults_and_label() {
        let d = diagram(
            r##"
shapes:
  - id: api
    type: rectangle
    pos: [100, 100, 200x80]
    label: API Gateway
    color: { bg: light-blue }
    style: { strokeStyle: dashed }
"##,
        );
        let compiler = SkeletonCompiler::default();
        let skeleton = compiler.element(&d.elements[0], None);
        let value = serde_json::to_value(&skeleton).expect("serialize");

        assert_eq!(
            value,
            json!({
                "type": "rectangle",
                "x": 100.0,
                "y": 100.0,
                "width": 200.0,
                "height": 80.0,
                "strokeColor": "#1e1e1e",
                "backgroundColor": "#a5d8ff",
                "fillStyle": "solid",
                "strokeWidth": 2.0,
                "strokeStyle": "dashed",
                "roughness": 1.0,
                "opacity": 100.0,
                "label": { "text": "API Gateway", "fontSize": 16.0, "fontFamily": 1 }
            })
        );
    }

    #[test]
    fn test_merge_patch_clears_omitted_fields() {
        let d = diagram("shapes:\n  - id: bare\n    type: ellipse\n    pos: [10, 20]\n");
        let skeleton = SkeletonCompiler::default().element(&d.elements[0], None);
        let patch = skeleton.merge_patch().expect("patch");

        assert_eq!(patch.get("type"), Some(&json!("ellipse")));
        assert_eq!(patch.get("x"), Some(&json!(10.0)));
        assert_eq!(patch.get("label"), Some(&Value::Null));
        assert_eq!(patch.get("width"), Some(&Value::Null));
        assert_eq!(patch.get("height"), Some(&Value::Null));
        assert_eq!(patch.get("groupIds"), Some(&json!([])));
    }

    #[test]
    fn test_merge_patch_keeps_present_fields() {
        let d = diagram(
            r"
shapes:
  - id: g1
    type: group
    pos: [5, 5]
    shapes:
      - id: s1
        type: rectangle
        pos: [0, 0, 40x20]
        label: Kept
texts:
  - id: t
    text: Note
    pos: [0, 0]
",
        );
        let compiler = SkeletonCompiler::default();
        let s1 = compiler
            .element(d.element("s1").expect("s1"), d.membership("s1"))
            .merge_patch()
            .expect("patch");
        assert_eq!(s1.get("label").and_then(|l| l.get("text")), Some(&json!("Kept")));
        assert_eq!(s1.get("width"), Some(&json!(40.0)));
        assert_eq!(s1.get("groupIds"), Some(&json!([remote_group_id("g1")])));

        let text = compiler
            .element(d.element("t").expect("t"), None)
            .merge_patch()
            .expect("patch");
        assert!(text.get("label").is_none());
        assert_eq!(text.get("groupIds"), Some(&json!([])));
    }

    #[test]
    fn test_text_defaults() {
        let d = diagram("texts:\n  - text: Title\n    pos: [250, 20]\n    fontFamily: Cascadia\n");
        let skeleton = SkeletonCompiler::default().element(&d.elements[0], None);
        let value = serde_json::to_value(&skeleton).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "text",
                "x": 250.0,
                "y": 20.0,
                "text": "Title",
                "fontSize": 20.0,
                "fontFamily": 3,
                "strokeColor": "#1e1e1e"
            })
        );
    }

    #[test]
    fn test_group_member_is_offset_and_tagged() {
        let d = diagram(
            r"
shapes:
  - id: g1
    type: group
    pos: [100, 30]
    shapes:
      - id: s1
        type: rectangle
        pos: [10, 5, 100x24]
",
        );
        let element = d.element("s1").expect("s1");
        let skeleton = SkeletonCompiler::default().element(element, d.membership("s1"));
        assert_eq!((skeleton.x, skeleton.y), (110.0, 35.0));
        assert_eq!(skeleton.group_ids, vec![remote_group_id("g1")]);
    }

    #[test]
    fn test_connector_geometry_and_arrowheads() {
        let d = diagram(
            r"
shapes:
  - id: api
    type: rectangle
    pos: [100, 100, 200x80]
  - id: db
    type: rectangle
    pos: [400, 100, 200x80]
connectors:
  - from: api
    to: db
    label: queries
",
        );
        let skeleton = SkeletonCompiler::default()
            .connector(&d.connectors[0], &d)
            .expect("compile");
        let value = serde_json::to_value(&skeleton).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "arrow",
                "x": 305.0,
                "y": 140.0,
                "width": 90.0,
                "height": 0.0,
                "points": [[0.0, 0.0], [90.0, 0.0]],
                "strokeColor": "#1e1e1e",
                "strokeWidth": 2.0,
                "strokeStyle": "solid",
                "startArrowhead": null,
                "endArrowhead": "arrow",
                "label": { "text": "queries", "fontFamily": 1 }
            })
        );
    }

    #[test]
    fn test_compile_orders_by_z_then_connectors() {
        let d = diagram(
            r"
shapes:
  - id: top
    type: rectangle
    pos: [0, 0, 10x10]
    z: 5
  - id: a
    type: rectangle
    pos: [50, 0, 10x10]
  - id: b
    type: ellipse
    pos: [100, 0, 10x10]
connectors:
  - from: a
    to: b
",
        );
        let compiled = SkeletonCompiler::default().compile(&d).expect("compile");
        let ids: Vec<&str> = compiled.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "top", "a-to-b"]);
    }

    #[test]
    fn test_custom_padding() {
        let d = diagram(
            r"
shapes:
  - id: a
    type: rectangle
    pos: [0, 0, 10x10]
  - id: b
    type: rectangle
    pos: [100, 0, 10x10]
connectors:
  - from: a
    to: b
",
        );
        let skeleton = SkeletonCompiler::default()
            .with_padding(0.0)
            .connector(&d.connectors[0], &d)
            .expect("compile");
        assert_eq!((skeleton.x, skeleton.y), (10.0, 5.0));
    }
}
