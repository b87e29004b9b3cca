//! Hand landmark frames as delivered by the capture side
//!
//! A frame is 21 points in the canonical hand topology: wrist first, then
//! four joints per digit from the knuckle nearest the wrist out to the tip.
//! x and y are normalized to the image (smaller y is higher in the frame),
//! z is relative depth and is optional on the wire.

use serde::Deserialize;

/// Number of points in a classifiable frame
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// A single tracked point
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "RawLandmark")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance; depth is ignored
    pub fn distance(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Wire shapes accepted for one landmark
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLandmark {
    Triple([f64; 3]),
    Pair([f64; 2]),
    Object {
        x: f64,
        y: f64,
        #[serde(default)]
        z: f64,
    },
}

impl From<RawLandmark> for Landmark {
    fn from(raw: RawLandmark) -> Self {
        match raw {
            RawLandmark::Triple([x, y, z]) => Landmark { x, y, z },
            RawLandmark::Pair([x, y]) => Landmark { x, y, z: 0.0 },
            RawLandmark::Object { x, y, z } => Landmark { x, y, z },
        }
    }
}

/// One line of the landmark feed
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FrameRecord {
    Bare(Vec<Landmark>),
    Tagged {
        #[serde(default)]
        landmarks: Option<Vec<Landmark>>,
        #[serde(default)]
        timestamp_ms: Option<u64>,
    },
}

impl FrameRecord {
    /// Parse a single JSON line
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Landmarks for this tick, `None` when no hand was tracked
    pub fn landmarks(&self) -> Option<&[Landmark]> {
        let points = match self {
            FrameRecord::Bare(points) => points.as_slice(),
            FrameRecord::Tagged { landmarks, .. } => landmarks.as_deref()?,
        };
        if points.is_empty() { None } else { Some(points) }
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        match self {
            FrameRecord::Bare(_) => None,
            FrameRecord::Tagged { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}
