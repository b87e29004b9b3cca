//! Detection session - classification, stabilization and translation per tick

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::classifier::{self, Classification};
use crate::config::Config;
use crate::landmarks::Landmark;
use crate::stabilizer::StabilizationState;
use crate::state::{SessionControl, SharedControl};
use crate::translate::{Translator, translate_or_passthrough};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Started,
    Stopped,
    /// A label reached the repeat threshold
    Gesture {
        label: String,
        confidence: f32,
        image: Option<PathBuf>,
    },
    /// A token was appended to the running text
    Text { token: String, text: String },
    Cleared,
}

/// Minimum spacing between classification attempts
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True when more than `interval` has passed since the last accepted tick
    pub fn ready(&mut self, now: Instant) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        match self.last {
            Some(last) if now.saturating_duration_since(last) <= self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Cloneable stop switch for a running session
#[derive(Clone, Debug)]
pub struct SessionHandle {
    control: SharedControl,
}

impl SessionHandle {
    /// Stop detection; results still in flight are dropped
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn is_active(&self) -> bool {
        self.control.is_active()
    }
}

pub struct DetectionSession {
    state: StabilizationState,
    translator: Arc<dyn Translator>,
    translate: bool,
    source_language: String,
    language: String,
    translate_timeout: Duration,
    images_dir: PathBuf,
    throttle: Throttle,
    control: SharedControl,
    epoch: u64,
    running: bool,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl DetectionSession {
    pub fn new(
        config: &Config,
        translator: Arc<dyn Translator>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            state: StabilizationState::new(config.stabilization.required_repeats),
            translator,
            translate: config.translation.enabled,
            source_language: config.source_language.clone(),
            language: config.language.clone(),
            translate_timeout: Duration::from_millis(config.translation.timeout_ms),
            images_dir: config.images.dir.clone(),
            throttle: Throttle::new(Duration::from_millis(config.stabilization.detect_interval_ms)),
            control: SessionControl::new(),
            epoch: 0,
            running: false,
            event_tx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn start(&mut self) {
        if self.is_live() {
            return;
        }
        self.state.reset();
        self.throttle.reset();
        self.epoch = self.control.start();
        self.running = true;
        info!("Detection started ({})", self.language);
        let _ = self.event_tx.send(SessionEvent::Started);
    }

    /// Stop and discard all state synchronously
    pub fn stop(&mut self) {
        self.control.stop();
        self.is_live();
    }

    /// Whether the session is running; applies a stop requested through a handle
    pub fn is_live(&mut self) -> bool {
        if self.running && !self.control.is_current(self.epoch) {
            self.running = false;
            self.state.reset();
            self.throttle.reset();
            info!("Detection stopped");
            let _ = self.event_tx.send(SessionEvent::Stopped);
        }
        self.running
    }

    pub fn clear_text(&mut self) {
        self.state.clear_text();
        let _ = self.event_tx.send(SessionEvent::Cleared);
    }

    pub fn set_language(&mut self, code: &str) {
        self.language = code.to_string();
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn text(&self) -> &str {
        self.state.text()
    }

    /// One capture tick with a tracked hand
    pub async fn process_frame(&mut self, frame: &[Landmark], at: Instant) -> Option<String> {
        if !self.is_live() || !self.throttle.ready(at) {
            return None;
        }
        let result = classifier::classify_frame(frame);
        if let Some(c) = &result {
            debug!("Candidate {} ({:.2})", c.label, c.confidence);
        }
        self.observe(result).await
    }

    /// Feed one classification result; returns the token appended, if any
    pub async fn observe(&mut self, candidate: Option<Classification>) -> Option<String> {
        if !self.is_live() {
            return None;
        }
        let confirmed = self.state.register(&candidate?)?;

        let _ = self.event_tx.send(SessionEvent::Gesture {
            label: confirmed.label.clone(),
            confidence: confirmed.confidence,
            image: classifier::sign_image(&confirmed.label, &self.images_dir),
        });

        let token = if self.translate && self.language != self.source_language {
            translate_or_passthrough(
                self.translator.as_ref(),
                &confirmed.label,
                &self.source_language,
                &self.language,
                self.translate_timeout,
            )
            .await
        } else {
            confirmed.label
        };

        if !self.is_live() {
            debug!("Dropping {:?}, session stopped during translation", token);
            return None;
        }

        let token = self.state.accept(&token)?;
        let _ = self.event_tx.send(SessionEvent::Text {
            token: token.clone(),
            text: self.state.text().to_string(),
        });
        Some(token)
    }
}
