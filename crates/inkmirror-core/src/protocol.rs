//! Wire format for drawing snapshots exchanged over a channel.

use crate::stroke::{Stroke, StrokeColor, StrokeId, StrokePoint};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors produced while encoding or decoding a wire payload.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Stroke {0} has no points")]
    EmptyStroke(u64),
    #[error("Stroke {0} has a non-finite coordinate")]
    NonFinite(u64),
    #[error("Stroke {id} has invalid size {size}")]
    InvalidSize { id: u64, size: f64 },
    #[error("Stroke {id} has invalid color {color:?}")]
    InvalidColor { id: u64, color: String },
    #[error("Duplicate stroke id {0}")]
    DuplicateId(u64),
}

/// A stroke as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireStroke {
    pub id: u64,
    pub points: Vec<StrokePoint>,
    /// `#RRGGBB`, or `#RRGGBBAA` for translucent colors.
    pub color: String,
    pub size: f64,
}

impl From<&Stroke> for WireStroke {
    fn from(stroke: &Stroke) -> Self {
        Self {
            id: stroke.id().0,
            points: stroke.points().to_vec(),
            color: stroke.color().to_string(),
            size: stroke.size(),
        }
    }
}

impl TryFrom<WireStroke> for Stroke {
    type Error = ProtocolError;

    fn try_from(wire: WireStroke) -> Result<Self, Self::Error> {
        let id = wire.id;
        if wire.points.is_empty() {
            return Err(ProtocolError::EmptyStroke(id));
        }
        if !(wire.size.is_finite() && wire.size > 0.0) {
            return Err(ProtocolError::InvalidSize { id, size: wire.size });
        }
        let color: StrokeColor = wire
            .color
            .parse()
            .map_err(|_| ProtocolError::InvalidColor { id, color: wire.color.clone() })?;

        let mut points = Vec::with_capacity(wire.points.len());
        for p in wire.points {
            if !p.is_finite() {
                return Err(ProtocolError::NonFinite(id));
            }
            // Re-run construction so out-of-range pressure is clamped.
            points.push(StrokePoint::new(p.x, p.y, p.pressure));
        }

        Ok(Stroke::new(StrokeId(id), points, color, wire.size))
    }
}

/// Message written to the channel. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Full replacement of the drawing.
    Update { strokes: Vec<WireStroke> },
    /// The drawing was cleared.
    Clear,
}

/// A decoded, validated payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Strokes(Vec<Stroke>),
    Cleared,
}

impl Snapshot {
    /// Number of strokes carried; zero for a clear.
    pub fn stroke_count(&self) -> usize {
        match self {
            Snapshot::Strokes(strokes) => strokes.len(),
            Snapshot::Cleared => 0,
        }
    }
}

/// Encode a drawing. An empty drawing is sent as a clear marker.
pub fn encode_snapshot(strokes: &[Stroke]) -> Result<String, ProtocolError> {
    let message = if strokes.is_empty() {
        WireMessage::Clear
    } else {
        WireMessage::Update {
            strokes: strokes.iter().map(WireStroke::from).collect(),
        }
    };
    Ok(serde_json::to_string(&message)?)
}

/// Encode a clear marker.
pub fn encode_clear() -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&WireMessage::Clear)?)
}

/// Parse and validate a payload.
pub fn decode(payload: &str) -> Result<Snapshot, ProtocolError> {
    match serde_json::from_str::<WireMessage>(payload)? {
        WireMessage::Clear => Ok(Snapshot::Cleared),
        WireMessage::Update { strokes } => {
            let mut seen = HashSet::with_capacity(strokes.len());
            let mut decoded = Vec::with_capacity(strokes.len());
            for wire in strokes {
                if !seen.insert(wire.id) {
                    return Err(ProtocolError::DuplicateId(wire.id));
                }
                decoded.push(Stroke::try_from(wire)?);
            }
            Ok(Snapshot::Strokes(decoded))
        }
    }
}
