//! Full session scenarios: edit, trigger, receive, download

use meshtune_core::{Error, ParamValue, ParameterSchema, ParameterState, Point3, Result, TriangleMesh};
use meshtune_io::stl::write_binary_stl;
use meshtune_io::MeshFormat;
use meshtune_render::{
    ComputeChannel, PreviewState, RenderFailure, Session, SessionEvent, Worker, WorkerMessage,
    WorkerRequest,
};
use std::collections::VecDeque;

/// Compute channel whose replies are scripted by the test
#[derive(Default)]
struct MockChannel {
    requests: Vec<WorkerRequest>,
    replies: VecDeque<WorkerMessage>,
}

impl ComputeChannel for MockChannel {
    fn dispatch(&mut self, request: WorkerRequest) -> Result<()> {
        self.requests.push(request);
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<WorkerMessage>> {
        Ok(self.replies.pop_front())
    }

    fn recv(&mut self) -> Result<WorkerMessage> {
        self.replies
            .pop_front()
            .ok_or_else(|| Error::Channel("no scripted reply".into()))
    }
}

fn schema() -> ParameterSchema {
    ParameterSchema::from_json(
        r#"{
            "title": "Box",
            "properties": {
                "width": { "type": "integer", "minimum": 1, "maximum": 100, "default": 50 },
                "enabled": { "type": "boolean", "default": true }
            }
        }"#,
    )
    .unwrap()
}

fn tetrahedron_stl() -> Vec<u8> {
    let mesh = TriangleMesh::from_vertices_and_faces(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    );
    write_binary_stl(&mesh)
}

fn session() -> Session<MockChannel> {
    Session::new(schema(), "cube(1);", MockChannel::default(), MeshFormat::Stl, None)
}

fn script(session: &mut Session<MockChannel>, messages: Vec<WorkerMessage>) {
    session.channel_mut().replies.extend(messages);
}

#[test]
fn render_complete_then_error_keeps_mesh() {
    let mut session = session();
    assert_eq!(session.preview(), PreviewState::Idle);

    assert!(session.trigger());
    assert_eq!(session.preview(), PreviewState::Rendering);
    assert_eq!(
        session.orchestrator().channel().requests,
        vec![WorkerRequest::Render {
            source_text: "width = 50;\nenabled = true;\ncube(1);".into(),
            format: MeshFormat::Stl,
        }]
    );

    let stl = tetrahedron_stl();
    script(
        &mut session,
        vec![
            WorkerMessage::Progress { progress: 0.5 },
            WorkerMessage::Complete { data: stl.clone() },
        ],
    );
    session.poll();
    assert_eq!(session.preview(), PreviewState::Current);

    let artifact = session.download().unwrap();
    assert_eq!(artifact.file_name, "model.stl");
    assert_eq!(artifact.bytes(), stl.as_slice());
    assert_eq!(artifact.payload.parse().unwrap().face_count(), 4);

    session.set_parameter("width", ParamValue::Number(60.0)).unwrap();
    assert_eq!(session.preview(), PreviewState::Pending);
    assert!(session.trigger());
    script(&mut session, vec![WorkerMessage::Error { error: "syntax error".into() }]);
    session.poll();

    assert_eq!(session.preview(), PreviewState::Error);
    assert_eq!(session.download().unwrap().bytes(), stl.as_slice());
    assert_eq!(session.status_text(), "Render failed: syntax error");
}

#[test]
fn trigger_while_rendering_has_no_effect() {
    let mut session = session();
    session.trigger();
    let events = session.subscribe();

    assert!(!session.trigger());
    assert_eq!(session.preview(), PreviewState::Rendering);
    assert_eq!(session.orchestrator().dispatched_jobs(), 1);
    assert!(events.try_recv().is_err());
}

#[test]
fn mutations_from_current_stay_pending() {
    let mut session = session();
    session.trigger();
    script(&mut session, vec![WorkerMessage::Complete { data: tetrahedron_stl() }]);
    session.poll();

    session.edit("width", ParamValue::Number(10.4)).unwrap();
    assert_eq!(session.state().get("width"), Some(&ParamValue::Number(10.0)));
    assert_eq!(session.preview(), PreviewState::Pending);

    session.edit("enabled", ParamValue::Bool(false)).unwrap();
    assert_eq!(session.preview(), PreviewState::Pending);
}

#[test]
fn reset_is_a_mutation() {
    let mut session = session();
    session.set_parameter("width", ParamValue::Number(70.0)).unwrap();
    session.trigger();
    script(&mut session, vec![WorkerMessage::Complete { data: tetrahedron_stl() }]);
    session.poll();

    session.reset();
    assert_eq!(session.preview(), PreviewState::Pending);
    assert_eq!(session.state(), &ParameterState::defaults(session.schema()));
}

#[test]
fn contract_violations_leave_state_untouched() {
    let mut session = session();
    let before = session.state().clone();

    assert!(matches!(
        session.set_parameter("depth", ParamValue::Number(1.0)),
        Err(Error::UnknownParameter(_))
    ));
    assert!(matches!(
        session.set_parameter("enabled", ParamValue::Text("yes".into())),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(session.state(), &before);
}

#[test]
fn events_follow_the_session() {
    let mut session = session();
    let events = session.subscribe();

    session.set_parameter("width", ParamValue::Number(20.0)).unwrap();
    let fragment = session.share_link().unwrap().to_string();
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::ParametersChanged { fragment }
    );

    session.trigger();
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::PreviewChanged(PreviewState::Rendering)
    );

    script(
        &mut session,
        vec![
            WorkerMessage::Progress { progress: 0.3 },
            WorkerMessage::Error { error: "bad".into() },
        ],
    );
    session.poll();
    let rest: Vec<SessionEvent> = events.try_iter().collect();
    assert_eq!(
        rest,
        vec![
            SessionEvent::Progress(0.3),
            SessionEvent::RenderFailed(RenderFailure::Compile("bad".into())),
            SessionEvent::PreviewChanged(PreviewState::Error),
        ]
    );
}

#[test]
fn share_link_round_trips_between_sessions() {
    let mut first = session();
    first.set_parameter("width", ParamValue::Number(33.0)).unwrap();
    first.set_parameter("enabled", ParamValue::Bool(false)).unwrap();
    let link = format!("#{}", first.share_link().unwrap());

    let second = Session::new(schema(), "cube(1);", MockChannel::default(), MeshFormat::Stl, Some(&link));
    assert_eq!(second.state(), first.state());
}

#[test]
fn observed_link_overlays_without_republishing() {
    let mut source = session();
    source.set_parameter("width", ParamValue::Number(5.0)).unwrap();
    let link = source.share_link().unwrap().to_string();

    let mut target = session();
    let events = target.subscribe();
    assert!(target.observe_share_link(&link));
    assert_eq!(target.state().get("width"), Some(&ParamValue::Number(5.0)));
    assert_eq!(target.state().get("enabled"), Some(&ParamValue::Bool(true)));
    assert_eq!(target.share_link(), Some(link.as_str()));
    assert!(events.try_recv().is_err());

    // Observing the same representation again is a no-op.
    assert!(!target.observe_share_link(&link));
}

#[test]
fn malformed_link_degrades_to_defaults() {
    let session = Session::new(
        schema(),
        "cube(1);",
        MockChannel::default(),
        MeshFormat::Stl,
        Some("#%7Bnot-json"),
    );
    assert_eq!(session.state(), &ParameterState::defaults(session.schema()));
}

fn kernel(
    source: &str,
    _format: MeshFormat,
    progress: &mut dyn FnMut(f32),
) -> std::result::Result<Vec<u8>, String> {
    progress(0.5);
    if source.contains("enabled = false;") {
        Err("nothing to render".into())
    } else {
        Ok(tetrahedron_stl())
    }
}

#[test]
fn background_worker_drives_session() {
    let worker = Worker::spawn(kernel).unwrap();
    let mut session = Session::new(schema(), "cube(1);", worker, MeshFormat::Stl, None);
    let events = session.subscribe();

    assert!(session.trigger());
    let updates = session.wait();
    assert!(updates.last().unwrap().is_terminal());
    assert_eq!(session.preview(), PreviewState::Current);
    assert!(events
        .try_iter()
        .any(|event| matches!(event, SessionEvent::MeshReady(_))));

    session.set_parameter("enabled", ParamValue::Bool(false)).unwrap();
    session.trigger();
    session.wait();
    assert_eq!(session.preview(), PreviewState::Error);
    assert_eq!(session.download().unwrap().payload.parse().unwrap().face_count(), 4);
}
