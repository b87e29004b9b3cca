//! Rule-based gesture classifier
//!
//! The table below is evaluated top to bottom and the first predicate that
//! holds wins, so the order is part of the behaviour. Confidences are fixed
//! per rule.
//!
//! Known conflicts in the table:
//! - H shadows U and R entirely: a tip gap under 0.05 already puts the tips
//!   within H's 0.08 horizontal bound.
//! - F shadows "Thank You" entirely (identical predicates).
//! - V shadows "2" except on the exact boundary where the tips sit 0.08 apart
//!   horizontally and level, which neither H nor V accepts.
//! - G shadows L when the thumb is raised level with the index tip.

use std::path::{Path, PathBuf};

use crate::features::{self, FeatureSet};
use crate::landmarks::*;

/// A recognised gesture and the fixed confidence of the rule that matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: &'static str,
    pub confidence: f32,
}

/// One entry of the ordered rule table
#[derive(Clone, Copy)]
pub struct Rule {
    pub label: &'static str,
    pub confidence: f32,
    pub predicate: fn(&FeatureSet) -> bool,
}

impl Rule {
    pub fn matches(&self, features: &FeatureSet) -> bool {
        (self.predicate)(features)
    }

    fn classification(&self) -> Classification {
        Classification {
            label: self.label,
            confidence: self.confidence,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("confidence", &self.confidence)
            .finish()
    }
}

// ============================================================================
// Rule table
// ============================================================================

pub static RULES: [Rule; 35] = [
    // Fist, thumb resting beside the index knuckle
    Rule { label: "A", confidence: 0.82, predicate: |f| {
        let thumb = f.point(THUMB_TIP);
        let knuckle = f.point(INDEX_MCP);
        f.fist() && thumb.y < knuckle.y && thumb.x > knuckle.x
    }},
    // Flat hand, fingers together, thumb tucked
    Rule { label: "B", confidence: 0.85, predicate: |f| {
        f.extended_count == 4 && !f.thumb_extended && f.fingers_together
    }},
    // Cupped hand
    Rule { label: "C", confidence: 0.78, predicate: |f| {
        let gap = f.distance(THUMB_TIP, INDEX_TIP);
        f.fist() && f.point(THUMB_TIP).y > f.point(THUMB_MCP).y && gap > 0.1 && gap < 0.25
    }},
    Rule { label: "D", confidence: 0.85, predicate: |f| {
        f.index_only() && f.thumb_middle_touch
    }},
    // Claw with the thumb folded under
    Rule { label: "E", confidence: 0.80, predicate: |f| {
        f.all_four_curled() && f.point(THUMB_TIP).y > f.point(INDEX_PIP).y
    }},
    Rule { label: "F", confidence: 0.85, predicate: |f| {
        f.thumb_index_touch && f.middle_extended && f.ring_extended && f.pinky_extended
    }},
    // Index sideways with the thumb alongside
    Rule { label: "G", confidence: 0.78, predicate: |f| {
        let thumb = f.point(THUMB_TIP);
        f.index_only()
            && (f.point(INDEX_TIP).y - thumb.y).abs() < 0.1
            && thumb.x < f.point(INDEX_MCP).x
    }},
    Rule { label: "H", confidence: 0.80, predicate: |f| {
        f.two_up() && (f.point(INDEX_TIP).x - f.point(MIDDLE_TIP).x).abs() < 0.08
    }},
    Rule { label: "I", confidence: 0.88, predicate: |f| {
        !f.index_extended && !f.middle_extended && !f.ring_extended && f.pinky_extended
            && !f.thumb_extended
    }},
    // Static stand-in for the J motion: pinky up and leaning
    Rule { label: "J", confidence: 0.75, predicate: |f| {
        !f.index_extended && !f.middle_extended && !f.ring_extended && f.pinky_extended
            && f.point(PINKY_TIP).x < f.point(PINKY_MCP).x
    }},
    Rule { label: "K", confidence: 0.82, predicate: |f| {
        f.two_up() && f.point(THUMB_TIP).y < f.point(MIDDLE_MCP).y && f.index_middle_gap > 0.08
    }},
    Rule { label: "L", confidence: 0.88, predicate: |f| {
        f.index_only()
            && f.thumb_extended
            && (f.point(THUMB_TIP).x - f.point(INDEX_MCP).x).abs() > 0.1
    }},
    Rule { label: "M", confidence: 0.75, predicate: |f| {
        let thumb = f.point(THUMB_TIP);
        f.fist() && thumb.y > f.point(RING_MCP).y && f.point(INDEX_TIP).y > thumb.y
    }},
    Rule { label: "N", confidence: 0.75, predicate: |f| {
        let thumb = f.point(THUMB_TIP);
        f.fist()
            && thumb.y > f.point(MIDDLE_MCP).y
            && f.point(INDEX_TIP).y > thumb.y
            && f.point(RING_TIP).y < thumb.y
    }},
    Rule { label: "O", confidence: 0.80, predicate: |f| {
        f.thumb_index_touch && f.thumb_middle_touch && !f.ring_extended && !f.pinky_extended
    }},
    // K pointing down
    Rule { label: "P", confidence: 0.78, predicate: |f| {
        f.two_up()
            && f.point(INDEX_TIP).y > f.point(INDEX_MCP).y
            && f.point(MIDDLE_TIP).y > f.point(MIDDLE_MCP).y
    }},
    // G pointing down
    Rule { label: "Q", confidence: 0.75, predicate: |f| {
        f.index_only() && f.point(INDEX_TIP).y > f.point(WRIST).y && f.thumb_extended
    }},
    Rule { label: "R", confidence: 0.80, predicate: |f| {
        f.two_up() && f.index_middle_gap < 0.04
    }},
    // Fist, thumb across the fingers
    Rule { label: "S", confidence: 0.82, predicate: |f| {
        let thumb = f.point(THUMB_TIP);
        f.fist() && thumb.y > f.point(INDEX_MCP).y && thumb.x < f.point(INDEX_TIP).x
    }},
    // Thumb poking between index and middle
    Rule { label: "T", confidence: 0.78, predicate: |f| {
        let thumb = f.point(THUMB_TIP);
        f.fist() && thumb.x > f.point(INDEX_MCP).x && thumb.x < f.point(MIDDLE_MCP).x
    }},
    Rule { label: "U", confidence: 0.85, predicate: |f| {
        f.two_up() && f.index_middle_gap < 0.05 && !f.thumb_extended
    }},
    Rule { label: "V", confidence: 0.88, predicate: |f| {
        f.two_up() && f.index_middle_gap > 0.08
    }},
    Rule { label: "W", confidence: 0.85, predicate: |f| {
        f.index_extended && f.middle_extended && f.ring_extended && !f.pinky_extended
            && !f.thumb_extended
    }},
    // Hooked index
    Rule { label: "X", confidence: 0.78, predicate: |f| {
        let pip = f.point(INDEX_PIP);
        !f.middle_extended && !f.ring_extended && !f.pinky_extended
            && f.point(INDEX_TIP).y > pip.y
            && pip.y < f.point(INDEX_MCP).y
    }},
    Rule { label: "Y", confidence: 0.88, predicate: |f| {
        f.thumb_extended
            && !f.index_extended && !f.middle_extended && !f.ring_extended
            && f.pinky_extended
    }},
    // Static stand-in for the Z trace: any off-axis index
    Rule { label: "Z", confidence: 0.70, predicate: |f| {
        f.index_only() && f.point(INDEX_TIP).x != f.point(INDEX_MCP).x
    }},
    Rule { label: "1", confidence: 0.85, predicate: |f| {
        f.index_only() && !f.thumb_extended
    }},
    Rule { label: "2", confidence: 0.82, predicate: |f| f.two_up() },
    Rule { label: "3", confidence: 0.80, predicate: |f| {
        f.index_extended && f.middle_extended && f.ring_extended && !f.pinky_extended
            && f.thumb_extended
    }},
    Rule { label: "4", confidence: 0.80, predicate: |f| {
        f.extended_count == 4 && !f.thumb_extended
    }},
    Rule { label: "Hello", confidence: 0.88, predicate: |f| {
        f.thumb_extended && f.extended_count == 4
    }},
    Rule { label: "Yes", confidence: 0.85, predicate: |f| {
        f.thumb_extended && f.extended_count == 0
    }},
    Rule { label: "I Love You", confidence: 0.85, predicate: |f| {
        f.thumb_extended
            && f.index_extended && !f.middle_extended && !f.ring_extended
            && f.pinky_extended
    }},
    Rule { label: "No", confidence: 0.80, predicate: |f| {
        !f.thumb_extended && f.extended_count == 0
    }},
    Rule { label: "Thank You", confidence: 0.82, predicate: |f| {
        f.thumb_index_touch && f.middle_extended && f.ring_extended && f.pinky_extended
    }},
];

/// Classify against the built-in table
pub fn classify(features: &FeatureSet) -> Option<Classification> {
    classify_with(&RULES, features)
}

/// First match over an arbitrary ordered table
pub fn classify_with(rules: &[Rule], features: &FeatureSet) -> Option<Classification> {
    rules
        .iter()
        .find(|rule| rule.matches(features))
        .map(Rule::classification)
}

/// Extract and classify in one step; `None` for malformed frames
pub fn classify_frame(frame: &[Landmark]) -> Option<Classification> {
    features::extract(frame).as_ref().and_then(classify)
}

/// Reference image for a single-letter label, e.g. `signs/v.png`
pub fn sign_image(label: &str, dir: &Path) -> Option<PathBuf> {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => {
            Some(dir.join(format!("{}.png", c.to_ascii_lowercase())))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [(usize, f64); 4] = [
        (INDEX_MCP, 0.40),
        (MIDDLE_MCP, 0.50),
        (RING_MCP, 0.60),
        (PINKY_MCP, 0.70),
    ];

    /// Hand pose builder. Starts as a closed fist with the thumb tucked.
    struct Pose(Vec<Landmark>);

    impl Pose {
        fn fist() -> Self {
            let mut frame = vec![Landmark::new(0.5, 0.9, 0.0); LANDMARK_COUNT];
            for (mcp, x) in COLUMNS {
                for (joint, y) in [0.60, 0.64, 0.70, 0.66].into_iter().enumerate() {
                    frame[mcp + joint] = Landmark::new(x, y, 0.0);
                }
            }
            frame[THUMB_CMC] = Landmark::new(0.35, 0.80, 0.0);
            frame[THUMB_MCP] = Landmark::new(0.30, 0.70, 0.0);
            frame[THUMB_IP] = Landmark::new(0.30, 0.55, 0.0);
            frame[THUMB_TIP] = Landmark::new(0.35, 0.50, 0.0);
            Pose(frame)
        }

        fn extend(mut self, mcp: usize) -> Self {
            let x = self.0[mcp].x;
            for (joint, y) in [0.60, 0.50, 0.42, 0.35].into_iter().enumerate() {
                self.0[mcp + joint] = Landmark::new(x, y, 0.0);
            }
            self
        }

        fn thumb_out(self) -> Self {
            self.at(THUMB_TIP, 0.20, 0.40)
        }

        fn at(mut self, index: usize, x: f64, y: f64) -> Self {
            self.0[index] = Landmark::new(x, y, 0.0);
            self
        }

        fn features(&self) -> FeatureSet {
            features::extract(&self.0).unwrap()
        }

        fn label(&self) -> Option<&'static str> {
            classify_frame(&self.0).map(|c| c.label)
        }
    }

    fn all_four(pose: Pose) -> Pose {
        pose.extend(INDEX_MCP)
            .extend(MIDDLE_MCP)
            .extend(RING_MCP)
            .extend(PINKY_MCP)
    }

    #[test]
    fn test_phrases() {
        assert_eq!(Pose::fist().label(), Some("No"));
        assert_eq!(Pose::fist().thumb_out().label(), Some("Yes"));
        assert_eq!(all_four(Pose::fist()).thumb_out().label(), Some("Hello"));
        assert_eq!(
            Pose::fist()
                .extend(INDEX_MCP)
                .extend(PINKY_MCP)
                .thumb_out()
                .label(),
            Some("I Love You")
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(Pose::fist().extend(INDEX_MCP).label(), Some("1"));
        assert_eq!(all_four(Pose::fist()).label(), Some("4"));
        assert_eq!(
            Pose::fist()
                .extend(INDEX_MCP)
                .extend(MIDDLE_MCP)
                .extend(RING_MCP)
                .thumb_out()
                .label(),
            Some("3")
        );
    }

    #[test]
    fn test_letters() {
        assert_eq!(Pose::fist().at(THUMB_TIP, 0.45, 0.55).label(), Some("A"));
        assert_eq!(
            all_four(Pose::fist())
                .at(INDEX_TIP, 0.46, 0.35)
                .at(RING_TIP, 0.54, 0.35)
                .label(),
            Some("B")
        );
        assert_eq!(Pose::fist().at(THUMB_TIP, 0.33, 0.78).label(), Some("C"));
        assert_eq!(Pose::fist().at(THUMB_TIP, 0.35, 0.68).label(), Some("E"));
        assert_eq!(
            Pose::fist()
                .extend(MIDDLE_MCP)
                .extend(RING_MCP)
                .extend(PINKY_MCP)
                .at(THUMB_TIP, 0.38, 0.62)
                .label(),
            Some("F")
        );
        assert_eq!(Pose::fist().extend(INDEX_MCP).thumb_out().label(), Some("G"));
        assert_eq!(Pose::fist().extend(PINKY_MCP).label(), Some("I"));
        assert_eq!(
            Pose::fist().extend(INDEX_MCP).extend(MIDDLE_MCP).label(),
            Some("K")
        );
        assert_eq!(
            Pose::fist().extend(INDEX_MCP).at(THUMB_TIP, 0.20, 0.55).label(),
            Some("L")
        );
        assert_eq!(Pose::fist().at(THUMB_TIP, 0.35, 0.63).label(), Some("M"));
        assert_eq!(
            Pose::fist()
                .at(INDEX_TIP, 0.44, 0.64)
                .at(MIDDLE_TIP, 0.48, 0.64)
                .at(THUMB_TIP, 0.46, 0.60)
                .label(),
            Some("O")
        );
        assert_eq!(
            Pose::fist()
                .extend(INDEX_MCP)
                .extend(MIDDLE_MCP)
                .extend(RING_MCP)
                .label(),
            Some("W")
        );
        assert_eq!(Pose::fist().extend(PINKY_MCP).thumb_out().label(), Some("Y"));
        assert_eq!(
            Pose::fist().extend(INDEX_MCP).at(INDEX_TIP, 0.43, 0.35).label(),
            Some("Z")
        );
    }

    #[test]
    fn test_more_letters() {
        assert_eq!(
            Pose::fist().extend(INDEX_MCP).at(THUMB_TIP, 0.50, 0.62).label(),
            Some("D")
        );
        assert_eq!(
            Pose::fist()
                .extend(INDEX_MCP)
                .extend(MIDDLE_MCP)
                .at(INDEX_TIP, 0.45, 0.35)
                .label(),
            Some("H")
        );
        // Pinky leaning in with the thumb out, before Y gets a chance
        assert_eq!(
            Pose::fist()
                .extend(PINKY_MCP)
                .at(PINKY_TIP, 0.65, 0.35)
                .thumb_out()
                .label(),
            Some("J")
        );
        // Same thumb as M, but the ring knuckle sits below it
        assert_eq!(
            Pose::fist()
                .at(RING_MCP, 0.60, 0.68)
                .at(RING_PIP, 0.60, 0.60)
                .at(RING_TIP, 0.60, 0.62)
                .at(THUMB_TIP, 0.35, 0.63)
                .label(),
            Some("N")
        );
        assert_eq!(
            Pose::fist()
                .at(INDEX_PIP, 0.40, 0.80)
                .at(INDEX_TIP, 0.40, 0.72)
                .at(MIDDLE_PIP, 0.50, 0.80)
                .at(MIDDLE_TIP, 0.50, 0.72)
                .at(THUMB_TIP, 0.30, 0.65)
                .label(),
            Some("P")
        );
        assert_eq!(
            Pose::fist()
                .at(INDEX_PIP, 0.40, 1.00)
                .at(INDEX_TIP, 0.40, 0.95)
                .at(THUMB_IP, 0.40, 0.55)
                .label(),
            Some("Q")
        );
        assert_eq!(
            Pose::fist()
                .at(INDEX_PIP, 0.40, 0.58)
                .at(INDEX_TIP, 0.40, 0.60)
                .at(THUMB_TIP, 0.35, 0.62)
                .label(),
            Some("S")
        );
        // Thumb level with the knuckles, between index and middle
        assert_eq!(Pose::fist().at(THUMB_TIP, 0.42, 0.60).label(), Some("T"));
        assert_eq!(
            Pose::fist()
                .at(INDEX_PIP, 0.40, 0.55)
                .at(INDEX_TIP, 0.40, 0.58)
                .label(),
            Some("X")
        );
    }

    #[test]
    fn test_close_pair_is_h_not_u_or_r() {
        let u = RULES.iter().find(|r| r.label == "U").unwrap();
        let r = RULES.iter().find(|r| r.label == "R").unwrap();

        for (index_x, middle_x) in [(0.47, 0.50), (0.49, 0.50), (0.50, 0.47)] {
            let features = Pose::fist()
                .extend(INDEX_MCP)
                .extend(MIDDLE_MCP)
                .at(INDEX_TIP, index_x, 0.35)
                .at(MIDDLE_TIP, middle_x, 0.35)
                .features();
            assert!(u.matches(&features));
            assert!(r.matches(&features));
            assert_eq!(classify(&features).unwrap().label, "H");
        }
    }

    #[test]
    fn test_peace_sign_is_v_not_two() {
        let pose = Pose::fist()
            .extend(INDEX_MCP)
            .extend(MIDDLE_MCP)
            .at(THUMB_TIP, 0.35, 0.62);
        let features = pose.features();
        assert!(!features.thumb_extended);
        assert!(features.index_middle_gap > 0.08);

        let result = classify(&features).unwrap();
        assert_eq!(result.label, "V");
        assert_eq!(result.confidence, 0.88);

        // The later "2" rule matches too but is never reached
        let two = RULES.iter().find(|r| r.label == "2").unwrap();
        assert!(two.matches(&features));
    }

    #[test]
    fn test_swapping_overlapping_rules_changes_result() {
        let features = Pose::fist()
            .extend(INDEX_MCP)
            .extend(MIDDLE_MCP)
            .at(THUMB_TIP, 0.35, 0.62)
            .features();

        let v = RULES.iter().position(|r| r.label == "V").unwrap();
        let two = RULES.iter().position(|r| r.label == "2").unwrap();
        let mut swapped = RULES;
        swapped.swap(v, two);

        assert_eq!(classify_with(&swapped, &features).unwrap().label, "2");
    }

    #[test]
    fn test_swapping_disjoint_rules_changes_nothing() {
        let hello = RULES.iter().position(|r| r.label == "Hello").unwrap();
        let no = RULES.iter().position(|r| r.label == "No").unwrap();
        let mut swapped = RULES;
        swapped.swap(hello, no);

        let poses = [
            Pose::fist(),
            Pose::fist().thumb_out(),
            all_four(Pose::fist()).thumb_out(),
            all_four(Pose::fist()),
            Pose::fist().extend(INDEX_MCP),
        ];
        for pose in &poses {
            let features = pose.features();
            assert_eq!(classify_with(&swapped, &features), classify(&features));
        }
    }

    #[test]
    fn test_thank_you_is_shadowed_by_f() {
        let features = Pose::fist()
            .extend(MIDDLE_MCP)
            .extend(RING_MCP)
            .extend(PINKY_MCP)
            .at(THUMB_TIP, 0.38, 0.62)
            .features();
        let thank_you = RULES.iter().find(|r| r.label == "Thank You").unwrap();
        assert!(thank_you.matches(&features));
        assert_eq!(classify(&features).unwrap().label, "F");
    }

    #[test]
    fn test_no_rule_matches() {
        // Ring finger alone matches nothing
        let pose = Pose::fist().extend(RING_MCP);
        assert_eq!(pose.label(), None);
        assert_eq!(classify_with(&[], &pose.features()), None);
    }

    #[test]
    fn test_malformed_frame() {
        assert_eq!(classify_frame(&[Landmark::default(); 20]), None);
    }

    #[test]
    fn test_table_shape() {
        for rule in &RULES {
            assert!(rule.confidence >= 0.60 && rule.confidence <= 0.95, "{:?}", rule);
        }
        let mut labels: Vec<_> = RULES.iter().map(|r| r.label).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), RULES.len());
    }

    #[test]
    fn test_sign_image() {
        let dir = Path::new("signs");
        assert_eq!(sign_image("V", dir), Some(PathBuf::from("signs/v.png")));
        assert_eq!(sign_image("Hello", dir), None);
        assert_eq!(sign_image("2", dir), None);
    }
}
