//! Simulated media transport
//!
//! Timer-driven stand-in for a real decode/render engine: preparation takes
//! a configurable delay (with buffering progress on the way), position
//! advances with wall-clock time while rendering, and bounded streams report
//! completion. Used by the service binary's default wiring and by tests that
//! want end-to-end behavior without audio hardware.

use super::{Transport, TransportError, TransportEvent, TransportEventTx, TransportFactory};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Poll interval for the completion watcher
const COMPLETION_POLL: Duration = Duration::from_millis(250);

/// Simulated transport for one audio source
pub struct SimTransport {
    events: TransportEventTx,
    /// Bumped on reset/release so in-flight timer tasks drop their sends
    generation: Arc<AtomicU64>,
    prepare_delay: Duration,
    /// None simulates a live stream that never completes
    duration_ms: Option<u64>,
    source: Option<String>,
    base_ms: u64,
    playing_since: Option<Instant>,
    released: bool,
}

impl SimTransport {
    pub fn new(events: TransportEventTx) -> Self {
        Self {
            events,
            generation: Arc::new(AtomicU64::new(0)),
            prepare_delay: Duration::from_millis(300),
            duration_ms: None,
            source: None,
            base_ms: 0,
            playing_since: None,
            released: false,
        }
    }

    pub fn with_prepare_delay(mut self, delay: Duration) -> Self {
        self.prepare_delay = delay;
        self
    }

    /// Bound the stream; it reports completion once position reaches the end.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Factory wiring one `SimTransport` per session.
    pub fn factory(prepare_delay: Duration, duration_ms: Option<u64>) -> TransportFactory {
        Box::new(move |events| {
            let mut transport = SimTransport::new(events).with_prepare_delay(prepare_delay);
            if let Some(ms) = duration_ms {
                transport = transport.with_duration(ms);
            }
            Box::new(transport)
        })
    }

    fn clock_position(&self) -> u64 {
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let position = self.base_ms + elapsed;
        match self.duration_ms {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn invalidate_timers(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn spawn_completion_watcher(&self) {
        let Some(duration) = self.duration_ms else {
            return;
        };
        let events = self.events.clone();
        let generation = self.generation.clone();
        let expected = generation.load(Ordering::SeqCst);
        let start_position = self.base_ms;
        let started = Instant::now();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(COMPLETION_POLL).await;
                if generation.load(Ordering::SeqCst) != expected {
                    return;
                }
                let position = start_position + started.elapsed().as_millis() as u64;
                if position >= duration {
                    let _ = events.send(TransportEvent::Completed);
                    return;
                }
            }
        });
    }
}

impl Transport for SimTransport {
    fn set_source(&mut self, url: &str) -> Result<(), TransportError> {
        if self.released {
            return Err(TransportError::Released);
        }
        if url.is_empty() {
            return Err(TransportError::SourceUnavailable("empty url".to_string()));
        }
        debug!(%url, "sim transport source set");
        self.source = Some(url.to_string());
        self.base_ms = 0;
        Ok(())
    }

    fn prepare_async(&mut self) {
        let events = self.events.clone();
        let generation = self.generation.clone();
        let expected = generation.load(Ordering::SeqCst);
        let delay = self.prepare_delay;
        tokio::spawn(async move {
            let step = delay / 3;
            for percent in [40u8, 80, 100] {
                tokio::time::sleep(step).await;
                if generation.load(Ordering::SeqCst) != expected {
                    return;
                }
                let _ = events.send(TransportEvent::Buffering { percent });
            }
            if generation.load(Ordering::SeqCst) == expected {
                let _ = events.send(TransportEvent::Prepared);
            }
        });
    }

    fn start(&mut self) {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
            self.spawn_completion_watcher();
        }
    }

    fn pause(&mut self) {
        self.base_ms = self.clock_position();
        self.playing_since = None;
        self.invalidate_timers();
    }

    fn stop(&mut self) {
        self.base_ms = self.clock_position();
        self.playing_since = None;
        self.invalidate_timers();
    }

    fn seek(&mut self, position_ms: u64) {
        let target = match self.duration_ms {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        };
        self.base_ms = target;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
            self.invalidate_timers();
            self.spawn_completion_watcher();
        }
        let _ = self.events.send(TransportEvent::SeekComplete {
            position_ms: target,
        });
    }

    fn set_volume(&mut self, _left: f32, _right: f32) {}

    fn position_ms(&self) -> u64 {
        self.clock_position()
    }

    fn is_rendering(&self) -> bool {
        self.playing_since.is_some()
    }

    fn reset(&mut self) {
        self.invalidate_timers();
        self.source = None;
        self.base_ms = 0;
        self.playing_since = None;
    }

    fn release(&mut self) {
        self.invalidate_timers();
        self.released = true;
        self.source = None;
        self.playing_since = None;
    }
}
