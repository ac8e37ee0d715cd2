//! Engine integration tests
//!
//! Exercise the full submit path (session + controller + surface)
//! against a scripted mock backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use quill_core::{
    ChatBackend, ChatEngine, ChatRequest, ChatSurface, ContentKind, EngineConfig, MessageSlot,
    Session, Speaker, StreamEvent, StreamOutcome, SurfaceContent, Turn,
};

/// Backend that replays a fixed script of events per invocation and
/// records the requests it saw.
struct MockBackend {
    replies: Mutex<Vec<Vec<StreamEvent>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockBackend {
    fn new(replies: Vec<Vec<StreamEvent>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn reply(events: Vec<StreamEvent>) -> Self {
        Self::new(vec![events])
    }

    /// Handle to the recorded requests, kept before the backend moves
    /// into an engine.
    fn requests_handle(&self) -> Arc<Mutex<Vec<ChatRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn send_streaming(
        &self,
        request: &ChatRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        self.requests.lock().unwrap().push(request.clone());

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            anyhow::bail!("no scripted reply left");
        }
        let events = replies.remove(0);

        let (tx, rx) = mpsc::channel(32);
        for event in events {
            tx.try_send(event).unwrap();
        }
        Ok(rx)
    }
}

#[derive(Default)]
struct RecordingSurface {
    messages: Vec<SurfaceContent>,
    loading: bool,
}

impl ChatSurface for RecordingSurface {
    fn add_message(&mut self) {
        self.messages.push(SurfaceContent::markdown(""));
    }

    fn set_message(&mut self, slot: MessageSlot, content: SurfaceContent) {
        let idx = match slot {
            MessageSlot::Last => self.messages.len() - 1,
            MessageSlot::Index(i) => i,
        };
        self.messages[idx] = content;
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

fn token(text: &str) -> StreamEvent {
    StreamEvent::Token(text.to_string())
}

fn complete() -> StreamEvent {
    StreamEvent::Complete {
        message: String::new(),
    }
}

#[tokio::test]
async fn successful_invocation_commits_both_turns() {
    let backend = MockBackend::reply(vec![token("You step "), token("inside."), complete()]);
    let mut engine = ChatEngine::new(backend, EngineConfig::default());
    let mut surface = RecordingSurface::default();

    let outcome = engine.submit("I open the door.", &mut surface).await;

    assert_eq!(
        outcome,
        StreamOutcome::Completed {
            message: "You step inside.".to_string()
        }
    );
    assert_eq!(
        engine.session().turns(),
        &[
            Turn::human("I open the door."),
            Turn::assistant("You step inside."),
        ]
    );
    assert_eq!(
        surface.messages,
        vec![SurfaceContent::markdown("You step inside.")]
    );
}

#[tokio::test]
async fn failed_invocation_rolls_back_the_assistant_turn() {
    let backend = MockBackend::reply(vec![token("partial"), StreamEvent::Error("boom".into())]);
    let mut engine = ChatEngine::new(backend, EngineConfig::default());
    let mut surface = RecordingSurface::default();

    let outcome = engine.submit("hello?", &mut surface).await;

    assert_eq!(
        outcome,
        StreamOutcome::Failed {
            error: "boom".to_string()
        }
    );
    // the human turn stays; the partial assistant turn is gone
    assert_eq!(engine.session().turns(), &[Turn::human("hello?")]);

    // the error landed in a fresh slot, unformatted; the partial
    // content stays rendered in the slot before it
    assert_eq!(surface.messages.len(), 2);
    assert_eq!(surface.messages[0], SurfaceContent::markdown("partial"));
    assert_eq!(surface.messages[1], SurfaceContent::plain("boom"));
}

#[tokio::test]
async fn next_submission_after_failure_is_a_fresh_invocation() {
    let backend = MockBackend::new(vec![
        vec![StreamEvent::Error("boom".into())],
        vec![token("recovered"), complete()],
    ]);
    let mut engine = ChatEngine::new(backend, EngineConfig::default());
    let mut surface = RecordingSurface::default();

    let first = engine.submit("one", &mut surface).await;
    assert!(matches!(first, StreamOutcome::Failed { .. }));

    let second = engine.submit("two", &mut surface).await;
    assert_eq!(
        second,
        StreamOutcome::Completed {
            message: "recovered".to_string()
        }
    );
    assert_eq!(
        engine.session().turns(),
        &[
            Turn::human("one"),
            Turn::human("two"),
            Turn::assistant("recovered"),
        ]
    );
}

#[tokio::test]
async fn history_reaches_the_backend_in_order() {
    let backend = MockBackend::reply(vec![token("next"), complete()]);
    let requests = backend.requests_handle();
    let session = Session::from_transcript("Human\nfirst\n\nAI\nsecond").unwrap();
    let config = EngineConfig::default().with_system_prompt("sys");
    let mut engine = ChatEngine::with_session(backend, config, session);
    let mut surface = RecordingSurface::default();

    engine.submit("third", &mut surface).await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.system.as_deref(), Some("sys"));
    assert_eq!(request.input, "third");
    assert_eq!(
        request.history,
        vec![Turn::human("first"), Turn::assistant("second")]
    );
    assert_eq!(request.history[0].speaker, Speaker::Human);
}

#[tokio::test]
async fn backend_refusal_goes_through_the_error_path() {
    // a backend with no scripted replies refuses to open a stream
    let backend = MockBackend::new(Vec::new());
    let mut engine = ChatEngine::new(backend, EngineConfig::default());
    let mut surface = RecordingSurface::default();

    let outcome = engine.submit("hi", &mut surface).await;

    assert!(matches!(outcome, StreamOutcome::Failed { .. }));
    assert_eq!(engine.session().turns(), &[Turn::human("hi")]);
    // start placeholder plus the error slot
    assert_eq!(surface.messages.len(), 2);
    assert_eq!(surface.messages[1].kind, ContentKind::Plain);
}
