//! Render orchestration for meshtune
//!
//! This crate connects parameter state to the geometry engine:
//! - the request/response protocol spoken with the compute channel
//! - a background worker thread hosting an [`Engine`]
//! - an engine driving an external geometry kernel
//! - the preview state machine and a [`Session`] wiring it all together

pub mod engine;
pub mod job;
pub mod orchestrator;
pub mod protocol;
pub mod session;
pub mod worker;

pub use engine::CommandEngine;
pub use job::{RenderFailure, RenderJob, RenderResult};
pub use orchestrator::{Orchestrator, PreviewState, Update};
pub use protocol::{WorkerMessage, WorkerRequest};
pub use session::{Session, SessionEvent};
pub use worker::{ComputeChannel, Engine, Worker};
