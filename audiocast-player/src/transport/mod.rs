//! Media transport boundary
//!
//! The transport is the black-box decode/render engine for one audio source.
//! The playback engine drives it strictly through this trait and receives
//! its asynchronous callbacks as [`TransportEvent`]s on a channel, which the
//! engine marshals onto its own serial queue before touching any state.

pub mod sim;

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors a transport can report synchronously
#[derive(Debug, Error)]
pub enum TransportError {
    /// The source URL could not be opened
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The transport has been released and cannot be used again
    #[error("transport released")]
    Released,
}

/// Asynchronous callbacks from the transport.
///
/// Delivered on the callback channel handed to the transport at
/// construction. After `reset()` or `release()` a transport must not deliver
/// callbacks for work started before the reset.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Asynchronous prepare finished; the source is ready to start
    Prepared,
    /// Playback ran to the end of the stream
    Completed,
    /// A previously issued seek has been applied
    SeekComplete { position_ms: u64 },
    /// Unrecoverable decode/render failure; the transport has self-reset
    Error { reason: String },
    /// Buffering progress for the current source
    Buffering { percent: u8 },
}

/// Sender half of a transport's callback channel
pub type TransportEventTx = mpsc::UnboundedSender<TransportEvent>;

/// Receiver half of a transport's callback channel
pub type TransportEventRx = mpsc::UnboundedReceiver<TransportEvent>;

/// Black-box media decoder/renderer for one audio source.
///
/// Every method is synchronous from the engine's point of view except
/// `prepare_async`, whose completion arrives later as
/// [`TransportEvent::Prepared`] or [`TransportEvent::Error`]. Between those
/// two points only `stop` and `release` may be issued. Callers are expected
/// to respect the transport lifecycle; the engine's state machine is the
/// guard that makes that safe.
pub trait Transport: Send {
    /// Load a source URL. Legal only on a fresh or reset transport.
    fn set_source(&mut self, url: &str) -> Result<(), TransportError>;

    /// Begin asynchronous preparation of the loaded source.
    fn prepare_async(&mut self);

    /// Start or resume rendering.
    fn start(&mut self);

    /// Pause rendering, retaining position.
    fn pause(&mut self);

    /// Stop rendering; the source must be prepared again before starting.
    fn stop(&mut self);

    /// Seek to an absolute position in milliseconds.
    fn seek(&mut self, position_ms: u64);

    /// Set channel volumes (0.0-1.0).
    fn set_volume(&mut self, left: f32, right: f32);

    /// Current playback position in milliseconds.
    fn position_ms(&self) -> u64;

    /// True while the transport is actually rendering audio.
    fn is_rendering(&self) -> bool;

    /// Discard the loaded source and pending callbacks; back to fresh state.
    fn reset(&mut self);

    /// Release all transport resources. The instance is dead afterwards.
    fn release(&mut self);
}

/// Factory producing one transport per playback session.
///
/// The engine hands each new transport its own callback channel; callbacks
/// from a released session are discarded by session identity.
pub type TransportFactory = Box<dyn Fn(TransportEventTx) -> Box<dyn Transport> + Send + Sync>;
