//! Feature extraction from a landmark frame
//!
//! Turns the 21 raw points into the finger-state flags and tip distances the
//! rule table is written against. Extension is judged on the vertical axis
//! (tip above its PIP joint), curl against the MCP knuckle. The thumb is
//! judged horizontally and assumes a mirrored right hand; a left hand or an
//! unmirrored feed reads inverted.

use crate::landmarks::*;

/// Thumb tip to fingertip distance below which the two are touching
pub const TOUCH_THRESHOLD: f64 = 0.08;

/// Neighbouring tip distance below which fingers count as held together
pub const TOGETHER_THRESHOLD: f64 = 0.06;

/// Per-frame derived features. Recomputed for every frame, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub thumb_extended: bool,
    pub index_extended: bool,
    pub middle_extended: bool,
    pub ring_extended: bool,
    pub pinky_extended: bool,

    pub index_curled: bool,
    pub middle_curled: bool,
    pub ring_curled: bool,
    pub pinky_curled: bool,

    pub thumb_index_touch: bool,
    pub thumb_middle_touch: bool,
    pub thumb_ring_touch: bool,
    pub thumb_pinky_touch: bool,

    /// Extended fingers, thumb excluded (0-4)
    pub extended_count: u8,
    /// Index tip to pinky tip
    pub finger_spread: f64,
    /// Index tip to middle tip
    pub index_middle_gap: f64,
    pub fingers_together: bool,

    points: [Landmark; LANDMARK_COUNT],
}

impl FeatureSet {
    /// Raw landmark at a canonical index
    pub fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    /// No finger other than the thumb is extended
    pub fn fist(&self) -> bool {
        !self.index_extended && !self.middle_extended && !self.ring_extended && !self.pinky_extended
    }

    /// Index extended, the other three fingers not
    pub fn index_only(&self) -> bool {
        self.index_extended && !self.middle_extended && !self.ring_extended && !self.pinky_extended
    }

    /// Index and middle extended, ring and pinky not
    pub fn two_up(&self) -> bool {
        self.index_extended && self.middle_extended && !self.ring_extended && !self.pinky_extended
    }

    pub fn all_four_curled(&self) -> bool {
        self.index_curled && self.middle_curled && self.ring_curled && self.pinky_curled
    }

    /// Distance between two canonical points
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.points[a].distance(&self.points[b])
    }
}

/// Extract features, or `None` unless the frame holds exactly 21 points
pub fn extract(frame: &[Landmark]) -> Option<FeatureSet> {
    let points: [Landmark; LANDMARK_COUNT] = frame.try_into().ok()?;
    let p = &points;

    let extended = |tip: usize, pip: usize| p[tip].y < p[pip].y;
    let curled = |tip: usize, mcp: usize| p[tip].y > p[mcp].y;
    let touching = |tip: usize| p[THUMB_TIP].distance(&p[tip]) < TOUCH_THRESHOLD;

    let index_extended = extended(INDEX_TIP, INDEX_PIP);
    let middle_extended = extended(MIDDLE_TIP, MIDDLE_PIP);
    let ring_extended = extended(RING_TIP, RING_PIP);
    let pinky_extended = extended(PINKY_TIP, PINKY_PIP);

    let extended_count = [index_extended, middle_extended, ring_extended, pinky_extended]
        .iter()
        .filter(|&&e| e)
        .count() as u8;

    let index_middle_gap = p[INDEX_TIP].distance(&p[MIDDLE_TIP]);
    let fingers_together = index_middle_gap < TOGETHER_THRESHOLD
        && p[MIDDLE_TIP].distance(&p[RING_TIP]) < TOGETHER_THRESHOLD;

    Some(FeatureSet {
        thumb_extended: p[THUMB_TIP].x < p[THUMB_IP].x,
        index_extended,
        middle_extended,
        ring_extended,
        pinky_extended,

        index_curled: curled(INDEX_TIP, INDEX_MCP),
        middle_curled: curled(MIDDLE_TIP, MIDDLE_MCP),
        ring_curled: curled(RING_TIP, RING_MCP),
        pinky_curled: curled(PINKY_TIP, PINKY_MCP),

        thumb_index_touch: touching(INDEX_TIP),
        thumb_middle_touch: touching(MIDDLE_TIP),
        thumb_ring_touch: touching(RING_TIP),
        thumb_pinky_touch: touching(PINKY_TIP),

        extended_count,
        finger_spread: p[INDEX_TIP].distance(&p[PINKY_TIP]),
        index_middle_gap,
        fingers_together,

        points,
    })
}
