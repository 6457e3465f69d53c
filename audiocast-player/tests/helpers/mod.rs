//! Shared test helpers: scripted transport, recording host resources, and
//! an engine harness with an in-memory resume store.
#![allow(dead_code)]

use audiocast_common::events::{PlaybackState, PlayerEvent};
use audiocast_player::engine::{Engine, EngineDeps, EngineHandle, HostResources};
use audiocast_player::notify::LogPresenter;
use audiocast_player::resume::MemoryResumeStore;
use audiocast_player::state::SharedState;
use audiocast_player::transport::{
    Transport, TransportError, TransportEvent, TransportEventTx, TransportFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Scripted transport
// ============================================================================

#[derive(Default)]
struct MockInner {
    calls: Vec<String>,
    position_ms: u64,
    rendering: bool,
    fail_set_source: bool,
    events: Option<TransportEventTx>,
    sessions_created: usize,
}

/// Test-side handle observing and scripting every transport the engine
/// creates. The engine may create several transports (one per session); the
/// handle always points at the latest.
#[derive(Clone, Default)]
pub struct MockTransportHandle {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransportHandle {
    pub fn factory(&self) -> TransportFactory {
        let handle = self.clone();
        Box::new(move |events| {
            let mut inner = handle.inner.lock().unwrap();
            inner.events = Some(events);
            inner.sessions_created += 1;
            Box::new(MockTransport {
                inner: handle.inner.clone(),
            })
        })
    }

    /// Inject a transport callback as if the decoder delivered it.
    pub fn emit(&self, event: TransportEvent) {
        let events = self
            .inner
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("transport not yet created");
        events.send(event).unwrap();
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn set_position(&self, position_ms: u64) {
        self.inner.lock().unwrap().position_ms = position_ms;
    }

    pub fn set_rendering(&self, rendering: bool) {
        self.inner.lock().unwrap().rendering = rendering;
    }

    pub fn fail_next_set_source(&self, fail: bool) {
        self.inner.lock().unwrap().fail_set_source = fail;
    }

    pub fn sessions_created(&self) -> usize {
        self.inner.lock().unwrap().sessions_created
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.as_str() == name || call.starts_with(&format!("{}:", name)))
            .count()
    }

    /// Wait until the transport has seen `call`, failing the test after a
    /// bounded delay.
    pub async fn wait_for_call(&self, call: &str) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if self.calls().iter().any(|c| c == call) {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("transport never saw call {:?}, got {:?}", call, self.calls());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl Transport for MockTransport {
    fn set_source(&mut self, url: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("set_source:{}", url));
        if inner.fail_set_source {
            return Err(TransportError::SourceUnavailable(url.to_string()));
        }
        Ok(())
    }

    fn prepare_async(&mut self) {
        self.inner.lock().unwrap().calls.push("prepare".to_string());
    }

    fn start(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("start".to_string());
        inner.rendering = true;
    }

    fn pause(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("pause".to_string());
        inner.rendering = false;
    }

    fn stop(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("stop".to_string());
        inner.rendering = false;
    }

    fn seek(&mut self, position_ms: u64) {
        let events = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(format!("seek:{}", position_ms));
            inner.position_ms = position_ms;
            inner.events.clone()
        };
        // Like a real decoder: acknowledge the seek asynchronously.
        if let Some(events) = events {
            let _ = events.send(TransportEvent::SeekComplete { position_ms });
        }
    }

    fn set_volume(&mut self, left: f32, _right: f32) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(format!("set_volume:{}", left));
    }

    fn position_ms(&self) -> u64 {
        self.inner.lock().unwrap().position_ms
    }

    fn is_rendering(&self) -> bool {
        self.inner.lock().unwrap().rendering
    }

    fn reset(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("reset".to_string());
        inner.rendering = false;
    }

    fn release(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("release".to_string());
        inner.rendering = false;
    }
}

// ============================================================================
// Recording host resources
// ============================================================================

#[derive(Clone, Default)]
pub struct HostCounters {
    pub focus_acquired: Arc<AtomicUsize>,
    pub focus_released: Arc<AtomicUsize>,
    pub lock_acquired: Arc<AtomicUsize>,
    pub lock_released: Arc<AtomicUsize>,
}

impl HostCounters {
    pub fn focus_acquires(&self) -> usize {
        self.focus_acquired.load(Ordering::SeqCst)
    }
    pub fn focus_releases(&self) -> usize {
        self.focus_released.load(Ordering::SeqCst)
    }
    pub fn lock_acquires(&self) -> usize {
        self.lock_acquired.load(Ordering::SeqCst)
    }
    pub fn lock_releases(&self) -> usize {
        self.lock_released.load(Ordering::SeqCst)
    }
}

pub struct RecordingHost {
    counters: HostCounters,
}

impl HostResources for RecordingHost {
    fn request_focus(&mut self) -> bool {
        self.counters.focus_acquired.fetch_add(1, Ordering::SeqCst);
        true
    }
    fn abandon_focus(&mut self) {
        self.counters.focus_released.fetch_add(1, Ordering::SeqCst);
    }
    fn acquire_stream_lock(&mut self) {
        self.counters.lock_acquired.fetch_add(1, Ordering::SeqCst);
    }
    fn release_stream_lock(&mut self) {
        self.counters.lock_released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Engine harness
// ============================================================================

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestEngine {
    pub handle: EngineHandle,
    pub transport: MockTransportHandle,
    pub events: broadcast::Receiver<PlayerEvent>,
    pub resume: Arc<MemoryResumeStore>,
    pub host: HostCounters,
    pub shared: Arc<SharedState>,
}

impl TestEngine {
    pub fn start() -> Self {
        Self::with_store(Arc::new(MemoryResumeStore::new()))
    }

    pub fn with_store(resume: Arc<MemoryResumeStore>) -> Self {
        let shared = Arc::new(SharedState::new());
        let transport = MockTransportHandle::default();
        let host = HostCounters::default();

        let handle = Engine::spawn(
            EngineDeps {
                transport_factory: transport.factory(),
                resume: resume.clone(),
                presenter: Box::new(LogPresenter),
                host: Box::new(RecordingHost {
                    counters: host.clone(),
                }),
                position_interval: Duration::from_millis(500),
                watchdog_timeout: Duration::from_secs(60),
            },
            shared.clone(),
        );
        let events = shared.subscribe();

        Self {
            handle,
            transport,
            events,
            resume,
            host,
            shared,
        }
    }

    /// Next event, failing the test if none arrives in time.
    pub async fn next_event(&mut self) -> PlayerEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    /// Skip events until a state change to `want` arrives.
    pub async fn wait_for_state(&mut self, want: PlaybackState) {
        loop {
            if let PlayerEvent::StateChanged { state, .. } = self.next_event().await {
                if state == want {
                    return;
                }
            }
        }
    }

    /// Skip events until one of type `event_type` arrives.
    pub async fn wait_for_event(&mut self, event_type: &str) -> PlayerEvent {
        loop {
            let event = self.next_event().await;
            if event.event_type() == event_type {
                return event;
            }
        }
    }

    /// Drive a play command through prepare to `Started`.
    pub async fn play_until_started(&mut self, url: &str) {
        use audiocast_player::engine::{Command, PlayRequest};
        assert!(self
            .handle
            .command(Command::Play(PlayRequest::for_url(url))));
        self.wait_for_state(PlaybackState::Preparing).await;
        self.transport.emit(TransportEvent::Prepared);
        self.wait_for_state(PlaybackState::Started).await;
    }
}
