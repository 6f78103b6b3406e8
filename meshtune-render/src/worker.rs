//! Background compute channel
//!
//! The geometry engine runs on its own thread and is reachable only through
//! two `flume` channels: requests in, [`WorkerMessage`]s out. Nothing is shared
//! between the threads besides those channels.

use crate::protocol::{WorkerMessage, WorkerRequest};
use meshtune_core::{Error, Result};
use meshtune_io::MeshFormat;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Something that turns model source into mesh bytes
pub trait Engine: Send + 'static {
    /// Render `source` to `format`. `progress` may be called with fractions in
    /// `0..=1` any number of times before returning. An `Err` carries the
    /// engine's diagnostic text.
    fn render(
        &mut self,
        source: &str,
        format: MeshFormat,
        progress: &mut dyn FnMut(f32),
    ) -> std::result::Result<Vec<u8>, String>;
}

impl<F> Engine for F
where
    F: FnMut(&str, MeshFormat, &mut dyn FnMut(f32)) -> std::result::Result<Vec<u8>, String>
        + Send
        + 'static,
{
    fn render(
        &mut self,
        source: &str,
        format: MeshFormat,
        progress: &mut dyn FnMut(f32),
    ) -> std::result::Result<Vec<u8>, String> {
        self(source, format, progress)
    }
}

/// Message-passing boundary to an isolated compute context
pub trait ComputeChannel {
    /// Hand a request over; returns as soon as it is queued
    fn dispatch(&mut self, request: WorkerRequest) -> Result<()>;

    /// Next message if one is ready. Fails with [`Error::Channel`] once the
    /// context has gone away.
    fn try_recv(&mut self) -> Result<Option<WorkerMessage>>;

    /// Block until the next message arrives
    fn recv(&mut self) -> Result<WorkerMessage>;
}

/// A compute context running an [`Engine`] on a dedicated thread
pub struct Worker {
    requests: Option<flume::Sender<WorkerRequest>>,
    messages: flume::Receiver<WorkerMessage>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the worker thread
    pub fn spawn<E: Engine>(mut engine: E) -> Result<Self> {
        let (request_tx, request_rx) = flume::unbounded::<WorkerRequest>();
        let (message_tx, message_rx) = flume::unbounded::<WorkerMessage>();

        let handle = std::thread::Builder::new()
            .name("meshtune-worker".into())
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    let WorkerRequest::Render { source_text, format } = request;
                    debug!(bytes = source_text.len(), %format, "worker received render request");

                    let progress_tx = message_tx.clone();
                    let mut report = move |fraction: f32| {
                        let _ = progress_tx.send(WorkerMessage::Progress { progress: fraction });
                    };
                    let message = match engine.render(&source_text, format, &mut report) {
                        Ok(data) => WorkerMessage::Complete { data },
                        Err(error) => WorkerMessage::Error { error },
                    };
                    if message_tx.send(message).is_err() {
                        break;
                    }
                }
                debug!("worker thread exiting");
            })?;

        info!("render worker started");
        Ok(Self {
            requests: Some(request_tx),
            messages: message_rx,
            handle: Some(handle),
        })
    }
}

impl ComputeChannel for Worker {
    fn dispatch(&mut self, request: WorkerRequest) -> Result<()> {
        let sender = self
            .requests
            .as_ref()
            .ok_or_else(|| Error::Channel("worker has been shut down".into()))?;
        sender
            .send(request)
            .map_err(|_| Error::Channel("worker thread has terminated".into()))
    }

    fn try_recv(&mut self) -> Result<Option<WorkerMessage>> {
        match self.messages.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(flume::TryRecvError::Empty) => Ok(None),
            Err(flume::TryRecvError::Disconnected) => {
                Err(Error::Channel("worker thread has terminated".into()))
            }
        }
    }

    fn recv(&mut self) -> Result<WorkerMessage> {
        self.messages
            .recv()
            .map_err(|_| Error::Channel("worker thread has terminated".into()))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the request channel ends the thread's receive loop.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_engine(
        source: &str,
        _format: MeshFormat,
        progress: &mut dyn FnMut(f32),
    ) -> std::result::Result<Vec<u8>, String> {
        progress(0.5);
        if source.contains("fail") {
            Err("engine rejected source".into())
        } else {
            Ok(source.as_bytes().to_vec())
        }
    }

    fn crashing_engine(
        _source: &str,
        _format: MeshFormat,
        _progress: &mut dyn FnMut(f32),
    ) -> std::result::Result<Vec<u8>, String> {
        panic!("engine crashed")
    }

    fn request(source: &str) -> WorkerRequest {
        WorkerRequest::Render {
            source_text: source.into(),
            format: MeshFormat::Stl,
        }
    }

    #[test]
    fn test_progress_then_complete() {
        let mut worker = Worker::spawn(echo_engine).unwrap();
        worker.dispatch(request("cube();")).unwrap();

        assert_eq!(worker.recv().unwrap(), WorkerMessage::Progress { progress: 0.5 });
        assert_eq!(
            worker.recv().unwrap(),
            WorkerMessage::Complete { data: b"cube();".to_vec() }
        );
    }

    #[test]
    fn test_engine_error_is_error_message() {
        let mut worker = Worker::spawn(echo_engine).unwrap();
        worker.dispatch(request("fail();")).unwrap();

        let _progress = worker.recv().unwrap();
        assert_eq!(
            worker.recv().unwrap(),
            WorkerMessage::Error { error: "engine rejected source".into() }
        );
    }

    #[test]
    fn test_panicking_engine_closes_channel() {
        let mut worker = Worker::spawn(crashing_engine).unwrap();
        worker.dispatch(request("cube();")).unwrap();

        assert!(matches!(worker.recv(), Err(Error::Channel(_))));
        assert!(matches!(worker.try_recv(), Err(Error::Channel(_))));
    }
}
