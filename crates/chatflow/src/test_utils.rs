//! Test utilities for chatflow.
//!
//! This module provides fixtures and assertion helpers for writing tests
//! against dialogs and managers.

mod assertions;
mod fixtures;

pub use assertions::TranscriptAssertions;
pub use fixtures::{ProbeBehavior, ResponseProbe, greet_options, instant, survey_options};

pub use crate::event::{RecordedPayload, RecordingTransport};
