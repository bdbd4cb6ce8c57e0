//! Content fingerprints for change detection.
//!
//! A fingerprint is the first 16 hex digits of the SHA-256 of an entry's
//! canonical JSON form. Group members also hash their group's id and origin,
//! and connectors hash the absolute boxes of both endpoints, so moving a group
//! or an endpoint shape changes every dependent fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::geometry::Rect;
use crate::model::{Connector, Element, GroupMembership};
use crate::validate::ValidatedDiagram;

/// Number of hex digits kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

/// An entry identifier paired with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinted {
    /// Document identifier.
    pub id: String,
    /// Content fingerprint.
    pub fingerprint: String,
}

#[derive(Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
enum Canonical<'a> {
    Element {
        element: &'a Element,
        #[serde(skip_serializing_if = "Option::is_none")]
        group: Option<Placement<'a>>,
    },
    Connector {
        connector: &'a Connector,
        from: Rect,
        to: Rect,
    },
}

#[derive(Serialize)]
struct Placement<'a> {
    id: &'a str,
    x: f64,
    y: f64,
}

/// Fingerprint a shape or text, folding in its group placement.
///
/// # Errors
///
/// Returns the serializer error if the canonical form cannot be encoded.
pub fn element_fingerprint(
    element: &Element,
    membership: Option<&GroupMembership>,
) -> Result<String, serde_json::Error> {
    digest(&Canonical::Element {
        element,
        group: membership.map(|m| Placement {
            id: &m.group_id,
            x: m.offset_x,
            y: m.offset_y,
        }),
    })
}

/// Fingerprint a connector together with the absolute boxes of its endpoints.
///
/// # Errors
///
/// Returns the serializer error if the canonical form cannot be encoded.
pub fn connector_fingerprint(
    connector: &Connector,
    from: Rect,
    to: Rect,
) -> Result<String, serde_json::Error> {
    digest(&Canonical::Connector {
        connector,
        from,
        to,
    })
}

/// Fingerprint every element and connector, in document order.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownShape`] if a connector endpoint is not in
/// the diagram, or [`ValidationError::Unencodable`] if an entry cannot be
/// encoded.
pub fn fingerprint_diagram(
    diagram: &ValidatedDiagram,
) -> Result<Vec<Fingerprinted>, ValidationError> {
    let mut out = Vec::with_capacity(diagram.len());
    for element in &diagram.elements {
        let fingerprint = element_fingerprint(element, diagram.membership(element.id()))
            .map_err(|e| unencodable(element.id(), &e))?;
        out.push(Fingerprinted {
            id: element.id().to_string(),
            fingerprint,
        });
    }
    for connector in &diagram.connectors {
        let (from, to) = diagram.endpoint_rects(connector)?;
        let fingerprint =
            connector_fingerprint(connector, from, to).map_err(|e| unencodable(&connector.id, &e))?;
        out.push(Fingerprinted {
            id: connector.id.clone(),
            fingerprint,
        });
    }
    Ok(out)
}

fn unencodable(id: &str, error: &serde_json::Error) -> ValidationError {
    ValidationError::Unencodable {
        id: id.to_string(),
        reason: error.to_string(),
    }
}

fn digest(value: &impl Serialize) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, value)?;
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(FINGERPRINT_LEN);
    Ok(hex)
}
