//! Hand-gesture recognition: landmark frames in, stabilized (optionally
//! translated) text out.

pub mod classifier;
pub mod config;
pub mod features;
pub mod landmarks;
pub mod language;
pub mod session;
pub mod stabilizer;
pub mod state;
pub mod translate;
