//! Render jobs and their results

use crate::protocol::{WorkerMessage, WorkerRequest};
use meshtune_core::{Error, ParameterState};
use meshtune_io::{parameterize, MeshFormat, MeshPayload};
use std::fmt;

/// One render request: serialized source plus requested output format
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub source: String,
    pub format: MeshFormat,
}

impl RenderJob {
    /// Build a job from the current parameters and the base template
    pub fn build(state: &ParameterState, template: &str, format: MeshFormat) -> Self {
        Self {
            source: parameterize(state, template),
            format,
        }
    }

    pub fn to_request(&self) -> WorkerRequest {
        WorkerRequest::Render {
            source_text: self.source.clone(),
            format: self.format,
        }
    }
}

/// Why a render job failed
#[derive(Debug, Clone, PartialEq)]
pub enum RenderFailure {
    /// The engine rejected or failed on the source
    Compile(String),
    /// The background channel terminated or never answered
    Channel(String),
}

impl RenderFailure {
    pub fn message(&self) -> &str {
        match self {
            RenderFailure::Compile(message) | RenderFailure::Channel(message) => message,
        }
    }

    pub fn into_error(self) -> Error {
        match self {
            RenderFailure::Compile(message) => Error::Compile(message),
            RenderFailure::Channel(message) => Error::Channel(message),
        }
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailure::Compile(message) => write!(f, "Render failed: {message}"),
            RenderFailure::Channel(message) => write!(f, "Render worker unavailable: {message}"),
        }
    }
}

/// A message from the compute channel, interpreted for one job
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    Success(MeshPayload),
    Failure(RenderFailure),
    Progress(f32),
}

impl RenderResult {
    /// Interpret a worker message for a job that requested `format`
    pub fn from_message(message: WorkerMessage, format: MeshFormat) -> Self {
        match message {
            WorkerMessage::Progress { progress } => {
                let fraction = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
                RenderResult::Progress(fraction)
            }
            WorkerMessage::Complete { data } => RenderResult::Success(MeshPayload::new(format, data)),
            WorkerMessage::Error { error } => RenderResult::Failure(RenderFailure::Compile(error)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RenderResult::Progress(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_clamped() {
        let result = RenderResult::from_message(WorkerMessage::Progress { progress: 1.7 }, MeshFormat::Stl);
        assert_eq!(result, RenderResult::Progress(1.0));

        let result = RenderResult::from_message(WorkerMessage::Progress { progress: f32::NAN }, MeshFormat::Stl);
        assert_eq!(result, RenderResult::Progress(0.0));
    }

    #[test]
    fn test_error_message_is_compile_failure() {
        let result = RenderResult::from_message(
            WorkerMessage::Error { error: "parse error".into() },
            MeshFormat::Stl,
        );
        assert!(result.is_terminal());
        match result {
            RenderResult::Failure(failure) => {
                assert_eq!(failure.message(), "parse error");
                assert!(matches!(failure.into_error(), Error::Compile(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_failure_display_differs_by_cause() {
        let compile = RenderFailure::Compile("x".into()).to_string();
        let channel = RenderFailure::Channel("x".into()).to_string();
        assert_ne!(compile, channel);
    }
}
