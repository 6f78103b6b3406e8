//! Render orchestration state machine
//!
//! The orchestrator owns the preview state and at most one in-flight job.
//! Parameter mutations mark a finished preview as stale, a trigger builds a
//! [`RenderJob`] and dispatches it, and the messages coming back move the
//! preview to `current` or `error`. A trigger while a job is in flight is
//! refused by [`Orchestrator::can_trigger`], never queued.

use crate::job::{RenderFailure, RenderJob, RenderResult};
use crate::protocol::WorkerMessage;
use crate::worker::ComputeChannel;
use meshtune_core::{Error, ParameterState};
use meshtune_io::{DownloadArtifact, MeshFormat, MeshPayload};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Staleness of the displayed preview relative to the current parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewState {
    /// No render attempted yet
    #[default]
    Idle,
    /// Parameters changed since the last finished render
    Pending,
    /// A job is in flight
    Rendering,
    /// The last job succeeded
    Current,
    /// The last job failed
    Error,
}

impl PreviewState {
    pub fn name(self) -> &'static str {
        match self {
            PreviewState::Idle => "idle",
            PreviewState::Pending => "pending",
            PreviewState::Rendering => "rendering",
            PreviewState::Current => "current",
            PreviewState::Error => "error",
        }
    }
}

impl fmt::Display for PreviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a delivered message did to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Progress(f32),
    Completed(MeshPayload),
    Failed(RenderFailure),
}

impl Update {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Update::Progress(_))
    }
}

pub struct Orchestrator<C> {
    channel: C,
    format: MeshFormat,
    preview: PreviewState,
    progress: f32,
    in_flight: Option<RenderJob>,
    last_mesh: Option<MeshPayload>,
    last_error: Option<RenderFailure>,
    outdated: bool,
    dispatched: usize,
}

impl<C: ComputeChannel> Orchestrator<C> {
    pub fn new(channel: C, format: MeshFormat) -> Self {
        Self {
            channel,
            format,
            preview: PreviewState::Idle,
            progress: 0.0,
            in_flight: None,
            last_mesh: None,
            last_error: None,
            outdated: false,
            dispatched: 0,
        }
    }

    pub fn preview(&self) -> PreviewState {
        self.preview
    }

    pub fn format(&self) -> MeshFormat {
        self.format
    }

    /// Progress of the in-flight job, `0..=1`
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn in_flight(&self) -> Option<&RenderJob> {
        self.in_flight.as_ref()
    }

    pub fn last_mesh(&self) -> Option<&MeshPayload> {
        self.last_mesh.as_ref()
    }

    pub fn last_error(&self) -> Option<&RenderFailure> {
        self.last_error.as_ref()
    }

    /// Number of jobs handed to the compute channel so far
    pub fn dispatched_jobs(&self) -> usize {
        self.dispatched
    }

    /// Whether parameters changed after the job behind the current preview was
    /// triggered
    pub fn is_outdated(&self) -> bool {
        self.outdated
    }

    pub fn can_trigger(&self) -> bool {
        self.preview != PreviewState::Rendering
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// The last successful mesh, offered as `model.<format>`
    pub fn download(&self) -> Option<DownloadArtifact> {
        self.last_mesh.as_ref().map(MeshPayload::artifact)
    }

    /// Record a parameter mutation. Returns whether the preview state changed.
    pub fn parameters_changed(&mut self) -> bool {
        match self.preview {
            PreviewState::Current | PreviewState::Error => {
                self.transition(PreviewState::Pending);
                true
            }
            PreviewState::Rendering => {
                self.outdated = true;
                false
            }
            PreviewState::Idle | PreviewState::Pending => false,
        }
    }

    /// Build a job from `state` and dispatch it.
    ///
    /// Ignored while a job is in flight. Returns whether a job was dispatched;
    /// a channel that refuses the request moves the preview to `error`.
    pub fn trigger(&mut self, state: &ParameterState, template: &str) -> bool {
        if !self.can_trigger() {
            debug!("render trigger ignored while rendering");
            return false;
        }

        let job = RenderJob::build(state, template, self.format);
        if let Err(e) = self.channel.dispatch(job.to_request()) {
            warn!("failed to dispatch render job: {e}");
            self.fail(RenderFailure::Channel(e.to_string()));
            return false;
        }

        info!(bytes = job.source.len(), format = %self.format, "render job dispatched");
        self.dispatched += 1;
        self.progress = 0.0;
        self.outdated = false;
        self.in_flight = Some(job);
        self.transition(PreviewState::Rendering);
        true
    }

    /// Deliver one message from the compute channel.
    ///
    /// Messages arriving while no job is in flight are ignored.
    pub fn handle_message(&mut self, message: WorkerMessage) -> Option<Update> {
        if self.preview != PreviewState::Rendering {
            debug!(state = %self.preview, "ignoring worker message outside rendering");
            return None;
        }

        match RenderResult::from_message(message, self.format) {
            RenderResult::Progress(fraction) => {
                self.progress = fraction;
                Some(Update::Progress(fraction))
            }
            RenderResult::Success(payload) => {
                info!(bytes = payload.len(), "render completed");
                self.in_flight = None;
                self.progress = 1.0;
                self.last_error = None;
                self.last_mesh = Some(payload.clone());
                self.transition(PreviewState::Current);
                Some(Update::Completed(payload))
            }
            RenderResult::Failure(failure) => {
                self.fail(failure.clone());
                Some(Update::Failed(failure))
            }
        }
    }

    /// Record that the compute channel went away while a job was in flight
    pub fn channel_failed(&mut self, error: Error) -> Option<Update> {
        if self.preview != PreviewState::Rendering {
            return None;
        }
        let failure = RenderFailure::Channel(error.to_string());
        self.fail(failure.clone());
        Some(Update::Failed(failure))
    }

    /// Drain every message that is ready without blocking
    pub fn poll(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while self.preview == PreviewState::Rendering {
            match self.channel.try_recv() {
                Ok(Some(message)) => updates.extend(self.handle_message(message)),
                Ok(None) => break,
                Err(e) => {
                    updates.extend(self.channel_failed(e));
                    break;
                }
            }
        }
        updates
    }

    /// Block until the in-flight job resolves, returning every update seen
    pub fn wait(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while self.preview == PreviewState::Rendering {
            match self.channel.recv() {
                Ok(message) => updates.extend(self.handle_message(message)),
                Err(e) => updates.extend(self.channel_failed(e)),
            }
        }
        updates
    }

    /// Status line shown next to the render control
    pub fn status_text(&self) -> String {
        match self.preview {
            PreviewState::Idle => "Ready to render".to_string(),
            PreviewState::Pending => "Parameters changed, render to update the preview".to_string(),
            PreviewState::Rendering => {
                format!("Rendering ({:.0}%)", self.progress * 100.0)
            }
            PreviewState::Current if self.outdated => {
                "Preview rendered, parameters changed since".to_string()
            }
            PreviewState::Current => "Preview up to date".to_string(),
            PreviewState::Error => match &self.last_error {
                Some(failure) => failure.to_string(),
                None => "Render failed".to_string(),
            },
        }
    }

    fn fail(&mut self, failure: RenderFailure) {
        warn!("render failed: {failure}");
        self.in_flight = None;
        self.last_error = Some(failure);
        self.transition(PreviewState::Error);
    }

    fn transition(&mut self, next: PreviewState) {
        debug!(from = %self.preview, to = %next, "preview state");
        self.preview = next;
    }
}
