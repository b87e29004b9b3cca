//! Temporal confirmation and text accumulation
//!
//! A label has to come back for `required_repeats` consecutive ticks before
//! it is accepted. Accepted tokens are appended to the running text unless
//! they repeat the token appended last. The counter restarts after every
//! acceptance, appended or not, so a held sign does not re-fire every tick.
//!
//! The state has no clock of its own: call spacing is up to the caller.

use tracing::debug;

use crate::classifier::Classification;

/// Consecutive sightings needed before a label is accepted
pub const REQUIRED_REPEATS: u32 = 3;

/// A label that reached the repeat threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmed {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct StabilizationState {
    required_repeats: u32,
    last_candidate: String,
    repeat_count: u32,
    text: String,
    last_token: Option<String>,
}

impl Default for StabilizationState {
    fn default() -> Self {
        Self::new(REQUIRED_REPEATS)
    }
}

impl StabilizationState {
    pub fn new(required_repeats: u32) -> Self {
        Self {
            required_repeats: required_repeats.max(1),
            last_candidate: String::new(),
            repeat_count: 0,
            text: String::new(),
            last_token: None,
        }
    }

    /// Count a candidate; returns it once it has repeated often enough
    pub fn register(&mut self, candidate: &Classification) -> Option<Confirmed> {
        if candidate.label == self.last_candidate {
            self.repeat_count += 1;
        } else {
            self.last_candidate.clear();
            self.last_candidate.push_str(candidate.label);
            self.repeat_count = 1;
        }

        if self.repeat_count < self.required_repeats {
            return None;
        }

        Some(Confirmed {
            label: candidate.label.to_string(),
            confidence: candidate.confidence,
        })
    }

    /// Append a confirmed (possibly translated) token.
    ///
    /// Returns the token when it was appended, `None` when it repeated the
    /// previous one.
    pub fn accept(&mut self, token: &str) -> Option<String> {
        self.repeat_count = 0;

        if self.last_token.as_deref() == Some(token) {
            debug!("Skipping repeated token {:?}", token);
            return None;
        }

        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(token);
        self.last_token = Some(token.to_string());
        Some(token.to_string())
    }

    /// Full step without translation. `None` input is a no-op.
    pub fn observe(&mut self, candidate: Option<&Classification>) -> Option<String> {
        let confirmed = self.register(candidate?)?;
        self.accept(&confirmed.label)
    }

    /// Empty the accumulated text; the candidate counter is kept
    pub fn clear_text(&mut self) {
        self.text.clear();
        self.last_token = None;
    }

    /// Discard everything, as on session stop
    pub fn reset(&mut self) {
        self.last_candidate.clear();
        self.repeat_count = 0;
        self.clear_text();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn last_token(&self) -> Option<&str> {
        self.last_token.as_deref()
    }

    pub fn last_candidate(&self) -> Option<&str> {
        if self.last_candidate.is_empty() {
            None
        } else {
            Some(&self.last_candidate)
        }
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn required_repeats(&self) -> u32 {
        self.required_repeats
    }
}
