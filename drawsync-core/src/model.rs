//! Validated diagram model.
//!
//! Values of these types are only produced by [`crate::validate`], so code
//! further down the pipeline can rely on identifiers being unique and
//! connector endpoints resolving to shapes.

use serde::Serialize;

use crate::geometry::Rect;

/// Kind of a closed shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Rectangle.
    Rectangle,
    /// Ellipse inscribed in the bounding box.
    Ellipse,
    /// Diamond inscribed in the bounding box.
    Diamond,
}

impl ShapeKind {
    /// Parse a shape kind from its document spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rectangle" => Some(Self::Rectangle),
            "ellipse" => Some(Self::Ellipse),
            "diamond" => Some(Self::Diamond),
            _ => None,
        }
    }
}

/// Kind of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// Arrow, with an end arrowhead by default.
    #[default]
    Arrow,
    /// Plain line.
    Line,
}

impl ConnectorKind {
    /// Parse a connector kind from its document spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "arrow" => Some(Self::Arrow),
            "line" => Some(Self::Line),
            _ => None,
        }
    }
}

/// Origin and optional size of an element, as authored.
///
/// For group members the origin is relative to the group origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    /// X of the top-left corner.
    pub x: f64,
    /// Y of the top-left corner.
    pub y: f64,
    /// Width, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Position {
    /// Position without dimensions.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
        }
    }

    /// Position with dimensions.
    #[must_use]
    pub const fn sized(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Bounding box; missing dimensions count as zero.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.width.unwrap_or(0.0),
            self.height.unwrap_or(0.0),
        )
    }
}

/// Stroke and background colors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Colors {
    /// Stroke (outline or text) color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Background fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

/// Per-element overrides of the default drawing style.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleOverrides {
    /// `solid`, `hachure`, `cross-hatch`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    /// Stroke width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// `solid`, `dashed`, `dotted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    /// Sloppiness, 0 to 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    /// Opacity, 0 to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// A font family as written in the document.
///
/// Names are resolved to numeric identifiers by the skeleton compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FontFamily {
    /// Numeric identifier used as is.
    Id(u8),
    /// Family name such as `Virgil`.
    Named(String),
}

/// Font attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Font {
    /// Font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Font family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<FontFamily>,
}

/// A closed shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    /// Stable document identifier.
    pub id: String,
    /// Shape kind.
    pub kind: ShapeKind,
    /// Authored position.
    pub position: Position,
    /// Text bound inside the shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Colors.
    pub colors: Colors,
    /// Style overrides.
    pub style: StyleOverrides,
    /// Label font.
    pub font: Font,
    /// Effective z-order.
    pub z: i64,
}

/// A free-standing text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    /// Stable document identifier (possibly auto-generated).
    pub id: String,
    /// Authored origin.
    pub position: Position,
    /// Text content.
    pub content: String,
    /// Colors (only stroke is used).
    pub colors: Colors,
    /// Font.
    pub font: Font,
    /// Effective z-order.
    pub z: i64,
}

/// A drawable element: a shape or a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// A shape.
    Shape(Shape),
    /// A text.
    Text(Text),
}

impl Element {
    /// Stable document identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Shape(shape) => &shape.id,
            Self::Text(text) => &text.id,
        }
    }

    /// Authored position.
    #[must_use]
    pub fn position(&self) -> &Position {
        match self {
            Self::Shape(shape) => &shape.position,
            Self::Text(text) => &text.position,
        }
    }

    /// Effective z-order.
    #[must_use]
    pub fn z(&self) -> i64 {
        match self {
            Self::Shape(shape) => shape.z,
            Self::Text(text) => text.z,
        }
    }

    /// The shape, if this element is one.
    #[must_use]
    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Self::Shape(shape) => Some(shape),
            Self::Text(_) => None,
        }
    }
}

/// A group of elements positioned relative to a shared origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Stable document identifier.
    pub id: String,
    /// Absolute X of the group origin.
    pub x: f64,
    /// Absolute Y of the group origin.
    pub y: f64,
    /// Members, positioned relative to the origin.
    pub members: Vec<Element>,
}

/// A top-level entry of a diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramElement {
    /// Standalone shape.
    Shape(Shape),
    /// Standalone text.
    Text(Text),
    /// Group of shapes and texts.
    Group(Group),
}

/// Membership of an element in a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMembership {
    /// Document identifier of the group.
    pub group_id: String,
    /// Absolute X of the group origin.
    pub offset_x: f64,
    /// Absolute Y of the group origin.
    pub offset_y: f64,
    /// Identifier used for the canvas server's native grouping.
    pub remote_group_id: String,
}

/// A connector between two shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    /// Stable document identifier.
    pub id: String,
    /// Source shape identifier.
    pub from: String,
    /// Target shape identifier.
    pub to: String,
    /// Connector kind.
    pub kind: ConnectorKind,
    /// Label drawn on the connector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Arrowhead at the start, `None` for no arrowhead.
    pub start_arrowhead: Option<String>,
    /// Arrowhead at the end, `None` for no arrowhead.
    pub end_arrowhead: Option<String>,
    /// Colors (only stroke is used).
    pub colors: Colors,
    /// Style overrides (stroke width and style are used).
    pub style: StyleOverrides,
    /// Label font.
    pub font: Font,
}
