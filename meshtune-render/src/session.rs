//! A tuning session: schema, parameter state, share link and orchestrator
//!
//! Everything a front-end needs goes in through explicit operations and comes
//! back through [`SessionEvent`]s on channels handed out by
//! [`Session::subscribe`].

use crate::job::RenderFailure;
use crate::orchestrator::{Orchestrator, PreviewState, Update};
use crate::worker::ComputeChannel;
use meshtune_core::{Error, ParamValue, ParameterSchema, ParameterState, Result};
use meshtune_io::{DownloadArtifact, MeshFormat, MeshPayload, ShareSync};
use tracing::debug;

/// Change notification published by a [`Session`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A local edit produced a new share representation
    ParametersChanged { fragment: String },
    PreviewChanged(PreviewState),
    Progress(f32),
    MeshReady(MeshPayload),
    RenderFailed(RenderFailure),
}

pub struct Session<C> {
    schema: ParameterSchema,
    state: ParameterState,
    template: String,
    share: ShareSync,
    orchestrator: Orchestrator<C>,
    subscribers: Vec<flume::Sender<SessionEvent>>,
}

impl<C: ComputeChannel> Session<C> {
    /// Start a session from schema defaults, overlaid with an optional share
    /// link
    pub fn new(
        schema: ParameterSchema,
        template: impl Into<String>,
        channel: C,
        format: MeshFormat,
        fragment: Option<&str>,
    ) -> Self {
        let mut share = ShareSync::new();
        let state = share.load(&schema, fragment);
        Self {
            schema,
            state,
            template: template.into(),
            share,
            orchestrator: Orchestrator::new(channel, format),
            subscribers: Vec::new(),
        }
    }

    /// Receive every event published from now on
    pub fn subscribe(&mut self) -> flume::Receiver<SessionEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn state(&self) -> &ParameterState {
        &self.state
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn preview(&self) -> PreviewState {
        self.orchestrator.preview()
    }

    pub fn orchestrator(&self) -> &Orchestrator<C> {
        &self.orchestrator
    }

    pub fn channel_mut(&mut self) -> &mut C {
        self.orchestrator.channel_mut()
    }

    pub fn status_text(&self) -> String {
        self.orchestrator.status_text()
    }

    /// Current share representation
    pub fn share_link(&self) -> Option<&str> {
        self.share.current()
    }

    pub fn download(&self) -> Option<DownloadArtifact> {
        self.orchestrator.download()
    }

    /// Set a parameter to an already well-typed value
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<()> {
        self.state.set(&self.schema, name, value)?;
        self.mutated();
        Ok(())
    }

    /// Coerce a raw control value the way its control would, then set it
    pub fn edit(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let parameter = self
            .schema
            .get(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))?;
        let value = parameter.coerce(value);
        self.set_parameter(name, value)
    }

    /// Replace every value with its schema default
    pub fn reset(&mut self) {
        self.state = ParameterState::reset(&self.schema);
        self.mutated();
    }

    /// Apply a share representation changed outside the session.
    ///
    /// The decoded values are overlaid on the current state and the
    /// representation is not published back. Returns whether any parameter
    /// changed.
    pub fn observe_share_link(&mut self, representation: &str) -> bool {
        let changed = self
            .share
            .observe(&self.schema, &mut self.state, representation);
        if changed {
            debug!("parameters updated from share link");
            if self.orchestrator.parameters_changed() {
                self.emit(SessionEvent::PreviewChanged(self.orchestrator.preview()));
            }
        }
        changed
    }

    /// Render the current parameters. Returns whether a job was dispatched.
    pub fn trigger(&mut self) -> bool {
        let before = self.orchestrator.preview();
        let dispatched = self.orchestrator.trigger(&self.state, &self.template);
        let after = self.orchestrator.preview();
        if after != before {
            self.emit(SessionEvent::PreviewChanged(after));
        }
        // Not dispatched from an idle channel means the dispatch itself failed.
        if !dispatched && before != PreviewState::Rendering {
            if let Some(failure) = self.orchestrator.last_error().cloned() {
                self.emit(SessionEvent::RenderFailed(failure));
            }
        }
        dispatched
    }

    /// Deliver whatever the compute channel has ready
    pub fn poll(&mut self) -> Vec<Update> {
        let updates = self.orchestrator.poll();
        self.publish_updates(&updates);
        updates
    }

    /// Block until the in-flight job resolves
    pub fn wait(&mut self) -> Vec<Update> {
        let updates = self.orchestrator.wait();
        self.publish_updates(&updates);
        updates
    }

    fn mutated(&mut self) {
        if let Some(fragment) = self.share.publish(&self.state) {
            self.emit(SessionEvent::ParametersChanged { fragment });
        }
        if self.orchestrator.parameters_changed() {
            self.emit(SessionEvent::PreviewChanged(self.orchestrator.preview()));
        }
    }

    fn publish_updates(&mut self, updates: &[Update]) {
        for update in updates {
            match update {
                Update::Progress(fraction) => self.emit(SessionEvent::Progress(*fraction)),
                Update::Completed(payload) => {
                    self.emit(SessionEvent::MeshReady(payload.clone()));
                    self.emit(SessionEvent::PreviewChanged(PreviewState::Current));
                }
                Update::Failed(failure) => {
                    self.emit(SessionEvent::RenderFailed(failure.clone()));
                    self.emit(SessionEvent::PreviewChanged(PreviewState::Error));
                }
            }
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
