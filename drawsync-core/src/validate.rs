//! Diagram validation.
//!
//! Turns a [`RawDocument`] into a [`ValidatedDiagram`]: groups are flattened
//! into their members, missing identifiers are generated, and referential
//! integrity is checked. Validation either succeeds completely or fails with
//! the first problem found.

use std::collections::{BTreeMap, HashSet};

use serde_yaml::Value;
use uuid::Uuid;

use crate::document::{RawColor, RawConnector, RawDocument, RawEntry, RawFontFamily, RawStyle};
use crate::error::ValidationError;
use crate::geometry::Rect;
use crate::model::{
    Colors, Connector, ConnectorKind, DiagramElement, Element, Font, FontFamily, Group,
    GroupMembership, Position, Shape, ShapeKind, StyleOverrides, Text,
};

/// Namespace for name-based remote group identifiers.
const GROUP_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_4d3b_5c7a_9e0f_1b2c_3d4e_5f60);

/// Arrowhead value that disables an arrowhead.
const NO_ARROWHEAD: &str = "none";

/// A diagram that passed validation, flattened for compilation and diffing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedDiagram {
    /// Shapes and texts in document order, group members in place of their group.
    pub elements: Vec<Element>,
    /// Connectors in document order.
    pub connectors: Vec<Connector>,
    /// Group membership keyed by element identifier.
    pub memberships: BTreeMap<String, GroupMembership>,
}

impl ValidatedDiagram {
    /// Look up an element by identifier.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Group membership of an element, if it belongs to a group.
    #[must_use]
    pub fn membership(&self, id: &str) -> Option<&GroupMembership> {
        self.memberships.get(id)
    }

    /// Bounding box of an element in absolute canvas coordinates.
    #[must_use]
    pub fn absolute_rect(&self, element: &Element) -> Rect {
        let rect = element.position().rect();
        match self.membership(element.id()) {
            Some(m) => rect.offset(m.offset_x, m.offset_y),
            None => rect,
        }
    }

    /// Absolute bounding boxes of a connector's `from` and `to` shapes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownShape`] if an endpoint is not part of
    /// this diagram.
    pub fn endpoint_rects(&self, connector: &Connector) -> Result<(Rect, Rect), ValidationError> {
        let lookup = |end: &'static str, target: &str| {
            self.element(target)
                .map(|element| self.absolute_rect(element))
                .ok_or_else(|| ValidationError::UnknownShape {
                    connector: connector.id.clone(),
                    end,
                    target: target.to_string(),
                })
        };
        Ok((lookup("from", &connector.from)?, lookup("to", &connector.to)?))
    }

    /// Number of elements and connectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len() + self.connectors.len()
    }

    /// Whether the diagram is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.connectors.is_empty()
    }
}

/// Canonical remote group identifier for a document group identifier.
///
/// Name-based, so the same group id always maps to the same remote id.
#[must_use]
pub fn remote_group_id(group_id: &str) -> String {
    Uuid::new_v5(&GROUP_NAMESPACE, group_id.as_bytes()).to_string()
}

/// Validate a raw document.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first offending element or field.
pub fn validate(document: &RawDocument) -> Result<ValidatedDiagram, ValidationError> {
    let mut parser = EntryParser::default();

    let mut items = Vec::with_capacity(document.shapes.len() + document.texts.len());
    for (index, raw) in document.shapes.iter().enumerate() {
        items.push(parser.parse_top_level(raw, &describe("shape", raw.id.as_deref(), index))?);
    }
    for (index, raw) in document.texts.iter().enumerate() {
        if let Some(kind) = raw.kind.as_deref().filter(|k| *k != "text") {
            return Err(ValidationError::InvalidField {
                entity: describe("text", raw.id.as_deref(), index),
                field: "type",
                reason: format!("entries under 'texts' must be texts, got '{kind}'"),
            });
        }
        let text = parser.parse_text(raw, &describe("text", raw.id.as_deref(), index), None)?;
        items.push(DiagramElement::Text(text));
    }

    let (mut diagram, mut claimed) = flatten(items)?;

    let shape_ids: HashSet<&str> = diagram
        .elements
        .iter()
        .filter_map(Element::as_shape)
        .map(|s| s.id.as_str())
        .collect();

    let mut connectors = Vec::with_capacity(document.connectors.len());
    for (index, raw) in document.connectors.iter().enumerate() {
        connectors.push(parse_connector(raw, index, &shape_ids)?);
    }

    for connector in &connectors {
        if !claimed.insert(connector.id.clone()) {
            return Err(ValidationError::DuplicateId(connector.id.clone()));
        }
    }

    diagram.connectors = connectors;
    Ok(diagram)
}

fn describe(what: &str, id: Option<&str>, index: usize) -> String {
    match id {
        Some(id) => format!("{what} '{id}'"),
        None => format!("{what} #{}", index + 1),
    }
}

/// Flatten groups into their members and enforce identifier uniqueness.
///
/// Also returns every identifier claimed, group identifiers included.
fn flatten(
    items: Vec<DiagramElement>,
) -> Result<(ValidatedDiagram, HashSet<String>), ValidationError> {
    let mut seen = HashSet::new();
    let mut diagram = ValidatedDiagram::default();

    let mut claim = |id: &str| {
        if seen.insert(id.to_string()) {
            Ok(())
        } else {
            Err(ValidationError::DuplicateId(id.to_string()))
        }
    };

    for item in items {
        match item {
            DiagramElement::Shape(shape) => {
                claim(&shape.id)?;
                diagram.elements.push(Element::Shape(shape));
            }
            DiagramElement::Text(text) => {
                claim(&text.id)?;
                diagram.elements.push(Element::Text(text));
            }
            DiagramElement::Group(group) => {
                claim(&group.id)?;
                let remote = remote_group_id(&group.id);
                for member in group.members {
                    claim(member.id())?;
                    diagram.memberships.insert(
                        member.id().to_string(),
                        GroupMembership {
                            group_id: group.id.clone(),
                            offset_x: group.x,
                            offset_y: group.y,
                            remote_group_id: remote.clone(),
                        },
                    );
                    diagram.elements.push(member);
                }
            }
        }
    }

    Ok((diagram, seen))
}

#[derive(Default)]
struct EntryParser {
    /// Counter for generated text identifiers.
    unnamed_texts: usize,
}

impl EntryParser {
    fn parse_top_level(
        &mut self,
        raw: &RawEntry,
        entity: &str,
    ) -> Result<DiagramElement, ValidationError> {
        let kind = raw.kind.as_deref().or(raw.text.as_ref().map(|_| "text"));
        match kind {
            Some("group") => self.parse_group(raw, entity).map(DiagramElement::Group),
            Some(_) => match self.parse_element(raw, entity, None)? {
                Element::Shape(shape) => Ok(DiagramElement::Shape(shape)),
                Element::Text(text) => Ok(DiagramElement::Text(text)),
            },
            None => Err(ValidationError::MissingField {
                entity: entity.to_string(),
                field: "type",
            }),
        }
    }

    fn parse_group(&mut self, raw: &RawEntry, entity: &str) -> Result<Group, ValidationError> {
        let id = require(raw.id.as_ref(), entity, "id")?.clone();
        let entity = format!("group '{id}'");
        let pos = parse_pos(require(raw.pos.as_ref(), &entity, "pos")?, &entity)?;

        let raw_members = raw.shapes.as_deref().unwrap_or_default();
        let mut members = Vec::with_capacity(raw_members.len());
        for (index, member) in raw_members.iter().enumerate() {
            let member_entity = describe("member", member.id.as_deref(), index);
            if member.kind.as_deref() == Some("group") {
                return Err(ValidationError::NestedGroup {
                    group: id,
                    member: member.id.clone().unwrap_or(member_entity),
                });
            }
            members.push(self.parse_element(member, &member_entity, raw.z)?);
        }

        Ok(Group {
            id,
            x: pos.x,
            y: pos.y,
            members,
        })
    }

    fn parse_element(
        &mut self,
        raw: &RawEntry,
        entity: &str,
        inherited_z: Option<i64>,
    ) -> Result<Element, ValidationError> {
        let kind = raw.kind.as_deref().or(raw.text.as_ref().map(|_| "text"));
        match kind {
            Some("text") => self.parse_text(raw, entity, inherited_z).map(Element::Text),
            Some(other) => {
                let kind = ShapeKind::parse(other).ok_or_else(|| ValidationError::InvalidField {
                    entity: entity.to_string(),
                    field: "type",
                    reason: format!(
                        "unknown type '{other}' (expected rectangle, ellipse, diamond, text or group)"
                    ),
                })?;
                parse_shape(raw, kind, entity, inherited_z).map(Element::Shape)
            }
            None => Err(ValidationError::MissingField {
                entity: entity.to_string(),
                field: "type",
            }),
        }
    }

    fn parse_text(
        &mut self,
        raw: &RawEntry,
        entity: &str,
        inherited_z: Option<i64>,
    ) -> Result<Text, ValidationError> {
        let id = if let Some(id) = &raw.id {
            id.clone()
        } else {
            let id = format!("_text_{}", self.unnamed_texts);
            self.unnamed_texts += 1;
            id
        };
        let entity = if raw.id.is_some() {
            entity.to_string()
        } else {
            format!("text '{id}'")
        };

        let content = require(raw.text.as_ref(), &entity, "text")?.clone();
        let pos = parse_pos(require(raw.pos.as_ref(), &entity, "pos")?, &entity)?;

        Ok(Text {
            id,
            position: Position::at(pos.x, pos.y),
            content,
            colors: colors(raw.color.as_ref()),
            font: font(raw.font_size, raw.font_family.as_ref()),
            z: raw.z.or(inherited_z).unwrap_or(0),
        })
    }
}

fn parse_shape(
    raw: &RawEntry,
    kind: ShapeKind,
    entity: &str,
    inherited_z: Option<i64>,
) -> Result<Shape, ValidationError> {
    let id = require(raw.id.as_ref(), entity, "id")?.clone();
    let entity = format!("shape '{id}'");
    let position = parse_pos(require(raw.pos.as_ref(), &entity, "pos")?, &entity)?;

    Ok(Shape {
        id,
        kind,
        position,
        label: raw.label.clone().filter(|l| !l.is_empty()),
        colors: colors(raw.color.as_ref()),
        style: style(raw.style.as_ref()),
        font: font(raw.font_size, raw.font_family.as_ref()),
        z: raw.z.or(inherited_z).unwrap_or(0),
    })
}

fn parse_connector(
    raw: &RawConnector,
    index: usize,
    shape_ids: &HashSet<&str>,
) -> Result<Connector, ValidationError> {
    let entity = describe("connector", raw.id.as_deref(), index);
    let from = require(raw.from.as_ref(), &entity, "from")?.clone();
    let to = require(raw.to.as_ref(), &entity, "to")?.clone();
    let id = raw.id.clone().unwrap_or_else(|| format!("{from}-to-{to}"));

    let kind = match raw.kind.as_deref() {
        None => ConnectorKind::default(),
        Some(value) => ConnectorKind::parse(value).ok_or_else(|| ValidationError::InvalidField {
            entity: format!("connector '{id}'"),
            field: "type",
            reason: format!("unknown type '{value}' (expected arrow or line)"),
        })?,
    };

    for (end, target) in [("from", &from), ("to", &to)] {
        if !shape_ids.contains(target.as_str()) {
            return Err(ValidationError::UnknownShape {
                connector: id,
                end,
                target: target.clone(),
            });
        }
    }

    let start_arrowhead = raw
        .start_arrowhead
        .clone()
        .filter(|a| a != NO_ARROWHEAD);
    let end_arrowhead = match raw.end_arrowhead.as_deref() {
        Some(NO_ARROWHEAD) => None,
        Some(head) => Some(head.to_string()),
        None => match kind {
            ConnectorKind::Arrow => Some("arrow".to_string()),
            ConnectorKind::Line => None,
        },
    };

    Ok(Connector {
        id,
        from,
        to,
        kind,
        label: raw.label.clone().filter(|l| !l.is_empty()),
        start_arrowhead,
        end_arrowhead,
        colors: colors(raw.color.as_ref()),
        style: style(raw.style.as_ref()),
        font: font(raw.font_size, raw.font_family.as_ref()),
    })
}

fn require<'a, T>(
    value: Option<&'a T>,
    entity: &str,
    field: &'static str,
) -> Result<&'a T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        entity: entity.to_string(),
        field,
    })
}

/// Parse `[x, y]`, `[x, y, "WxH"]` or `[x, y, w, h]`.
fn parse_pos(values: &[Value], entity: &str) -> Result<Position, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidField {
        entity: entity.to_string(),
        field: "pos",
        reason,
    };
    let number = |value: &Value, what: &str| {
        value
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid(format!("{what} must be a number, got {value:?}")))
    };

    match values {
        [x, y] => Ok(Position::at(number(x, "x")?, number(y, "y")?)),
        [x, y, dims] => {
            let text = dims
                .as_str()
                .ok_or_else(|| invalid(format!("size must look like WIDTHxHEIGHT, got {dims:?}")))?;
            let (w, h) = text
                .split_once(['x', 'X'])
                .ok_or_else(|| invalid(format!("size must look like WIDTHxHEIGHT, got '{text}'")))?;
            let parse_dim = |s: &str| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .ok_or_else(|| invalid(format!("bad dimension '{s}' in '{text}'")))
            };
            Ok(Position::sized(
                number(x, "x")?,
                number(y, "y")?,
                parse_dim(w)?,
                parse_dim(h)?,
            ))
        }
        [x, y, w, h] => {
            let width = number(w, "width")?;
            let height = number(h, "height")?;
            if width < 0.0 || height < 0.0 {
                return Err(invalid("dimensions must not be negative".to_string()));
            }
            Ok(Position::sized(number(x, "x")?, number(y, "y")?, width, height))
        }
        _ => Err(invalid(format!(
            "expected [x, y] or [x, y, WIDTHxHEIGHT], got {} values",
            values.len()
        ))),
    }
}

fn colors(raw: Option<&RawColor>) -> Colors {
    raw.map(|c| Colors {
        stroke: c.stroke.clone(),
        background: c.bg.clone(),
    })
    .unwrap_or_default()
}

fn style(raw: Option<&RawStyle>) -> StyleOverrides {
    raw.map(|s| StyleOverrides {
        fill_style: s.fill_style.clone(),
        stroke_width: s.stroke_width,
        stroke_style: s.stroke_style.clone(),
        roughness: s.roughness,
        opacity: s.opacity,
    })
    .unwrap_or_default()
}

fn font(size: Option<f64>, family: Option<&RawFontFamily>) -> Font {
    Font {
        size,
        family: family.map(|f| match f {
            RawFontFamily::Id(id) => FontFamily::Id(*id),
            RawFontFamily::Name(name) => FontFamily::Named(name.clone()),
        }),
    }
}
