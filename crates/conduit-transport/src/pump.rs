//! The transport pump: one state machine per physical connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use metrics::counter;
use tracing::{debug, info, trace, warn};

use conduit_core::cursor::Cursor;
use conduit_core::errors::TransportError;
use conduit_core::receive::ReceivingConnection;
use conduit_core::serialize::FrameSerializer;

use crate::channel::SocketChannel;
use crate::completion::{CompletionSignal, PumpOutcome};
use crate::events::ConnectionEvents;
use crate::interleave::interleave;

/// Pump lifecycle state.
///
/// `Running` is re-entered after every successful send; `Disconnected` and
/// `Faulted` are terminal — once entered, no further sends or receives are
/// issued.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpState {
    /// Constructed, socket not yet open.
    AwaitingOpen = 0,
    /// Receive/send loop active.
    Running = 1,
    /// Socket closed cleanly.
    Disconnected = 2,
    /// Transport or loop fault.
    Faulted = 3,
}

impl PumpState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::AwaitingOpen,
            1 => Self::Running,
            2 => Self::Disconnected,
            _ => Self::Faulted,
        }
    }

    /// Whether the pump will issue no further sends or receives.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Faulted)
    }
}

/// Drives `AwaitingOpen → Running → {Disconnected|Faulted}` for exactly one
/// physical connection.
///
/// The pump exclusively owns its state and cursor across loop iterations; the
/// socket channel and serializer arrive by constructor parameter. Entry points
/// (`on_open`, `on_close`, `on_error`, `on_message`) are called by whatever
/// task owns the physical socket, in any interleaving — terminal events
/// arriving while a receive or send is outstanding are observed at the next
/// state check, and the stale batch is discarded rather than sent.
pub struct TransportPump<R, C> {
    connection: Arc<R>,
    channel: Arc<C>,
    serializer: Arc<dyn FrameSerializer>,
    events: Arc<dyn ConnectionEvents>,
    state: AtomicU8,
    /// Exactly-once guards for the disconnect/error callbacks; independent of
    /// `state` because close and error are distinct event occurrences.
    close_seen: AtomicBool,
    error_seen: AtomicBool,
    completion: CompletionSignal,
    initial_cursor: Option<Cursor>,
}

impl<R, C> TransportPump<R, C>
where
    R: ReceivingConnection + 'static,
    C: SocketChannel + 'static,
{
    /// Build a pump for one physical connection.
    ///
    /// `initial_cursor` is `None` on fresh connects (future messages only) and
    /// the client's last observed cursor on resume.
    pub fn new(
        connection: Arc<R>,
        channel: Arc<C>,
        serializer: Arc<dyn FrameSerializer>,
        events: Arc<dyn ConnectionEvents>,
        initial_cursor: Option<Cursor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection,
            channel,
            serializer,
            events,
            state: AtomicU8::new(PumpState::AwaitingOpen as u8),
            close_seen: AtomicBool::new(false),
            error_seen: AtomicBool::new(false),
            completion: CompletionSignal::new(),
            initial_cursor,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PumpState {
        PumpState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Handle onto the lifecycle completion signal.
    pub fn completion(&self) -> CompletionSignal {
        self.completion.clone()
    }

    /// Socket open: start the `connected` callback interleaved with the
    /// receive/send loop.
    ///
    /// The first receive is issued immediately, not after the callback — a
    /// slow `connected` handler must not delay first-message latency. A
    /// second `on_open`, or one arriving after a terminal event, is ignored.
    pub fn on_open(self: &Arc<Self>) {
        if self
            .state
            .compare_exchange(
                PumpState::AwaitingOpen as u8,
                PumpState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!(connection_id = %self.connection.identity(), state = ?self.state(), "ignoring open event");
            return;
        }
        trace!(connection_id = %self.connection.identity(), "pump running");

        let pump = Arc::clone(self);
        let _ = tokio::spawn(async move {
            let connected = {
                let events = Arc::clone(&pump.events);
                async move {
                    events
                        .connected()
                        .await
                        .map_err(|err| TransportError::Callback(err.to_string()))
                }
            };
            let outbound = {
                let pump = Arc::clone(&pump);
                async move { pump.run_loop().await }
            };

            match interleave(connected, outbound).await {
                Ok(((), ())) => {
                    let _ = pump.completion.resolve_clean();
                }
                Err(err) => pump.fault(Arc::new(err)),
            }
        });
    }

    /// Socket closed: resolve the completion cleanly and fire the
    /// `disconnected` callback, exactly once, independent of loop position.
    pub fn on_close(&self) {
        if self.close_seen.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.transition_terminal(PumpState::Disconnected);
        // Resolve now rather than waiting for an in-flight receive to come
        // back; the loop's own later attempt is the defensive no-op.
        let _ = self.completion.resolve_clean();
        info!(connection_id = %self.connection.identity(), "socket closed");

        let events = Arc::clone(&self.events);
        let _ = tokio::spawn(async move {
            if let Err(error) = events.disconnected().await {
                warn!(error = %error, "disconnected callback failed");
            }
        });
    }

    /// Transport-level error: fault the completion and fire the `error`
    /// callback, exactly once.
    pub fn on_error(&self, reason: impl Into<String>) {
        if self.error_seen.swap(true, Ordering::AcqRel) {
            return;
        }
        let fault = Arc::new(TransportError::Channel(reason.into()));
        warn!(connection_id = %self.connection.identity(), error = %fault, "channel fault");
        if self.transition_terminal(PumpState::Faulted) {
            counter!("pump_faults_total").increment(1);
        }
        let _ = self.completion.resolve_fault(Arc::clone(&fault));

        let events = Arc::clone(&self.events);
        let _ = tokio::spawn(async move {
            if let Err(error) = events.error(fault).await {
                warn!(error = %error, "error callback failed");
            }
        });
    }

    /// Inbound frame: hand to the `received` callback, decoupled from the
    /// outbound loop (no head-of-line blocking between directions).
    pub fn on_message(&self, payload: String) {
        if self.state().is_terminal() {
            trace!(connection_id = %self.connection.identity(), "dropping inbound frame after terminal state");
            return;
        }
        let events = Arc::clone(&self.events);
        let _ = tokio::spawn(async move {
            if let Err(error) = events.received(payload).await {
                warn!(error = %error, "received callback failed");
            }
        });
    }

    /// The outbound loop: receive past the cursor, serialize, send, advance.
    ///
    /// `Ok(())` is a clean stop (disconnect observed, or the message source
    /// cancelled); `Err` is a fault the caller turns into the completion
    /// outcome. Sends are strictly serialized — the next receive is not
    /// issued until the previous send resolved. The receive races the
    /// completion signal so a terminal event ends the loop's task promptly
    /// instead of leaving it parked on a source that may never produce again.
    async fn run_loop(&self) -> Result<(), TransportError> {
        let mut cursor = self.initial_cursor;
        loop {
            if self.state() != PumpState::Running {
                return Ok(());
            }

            let received = tokio::select! {
                _ = self.completion.wait() => {
                    debug!(connection_id = %self.connection.identity(), "loop ending; completion resolved");
                    return Ok(());
                }
                result = self.connection.receive_after(cursor) => result,
            };
            let batch = match received {
                Ok(batch) => batch,
                Err(err) if err.is_cancellation() => {
                    debug!(connection_id = %self.connection.identity(), "message source closed");
                    let _ = self.transition_terminal(PumpState::Disconnected);
                    return Ok(());
                }
                Err(err) => return Err(TransportError::Receive(err)),
            };

            if self.state() != PumpState::Running {
                // The socket left Running while this receive was in flight;
                // the batch is stale and must not be sent.
                debug!(
                    connection_id = %self.connection.identity(),
                    discarded = batch.len(),
                    "discarding batch received after terminal state"
                );
                return Ok(());
            }

            let frame = self.serializer.serialize(&batch)?;
            self.channel.send(frame).await?;
            counter!("pump_frames_sent_total").increment(1);
            trace!(
                connection_id = %self.connection.identity(),
                messages = batch.len(),
                cursor = %batch.next_cursor,
                "frame sent"
            );
            cursor = Some(batch.next_cursor);
        }
    }

    fn fault(&self, error: Arc<TransportError>) {
        if self.transition_terminal(PumpState::Faulted) {
            counter!("pump_faults_total").increment(1);
            warn!(connection_id = %self.connection.identity(), error = %error, "pump faulted");
        }
        let _ = self.completion.resolve_fault(error);
    }

    /// Move to a terminal state unless one was already reached. Returns
    /// whether this call performed the transition.
    fn transition_terminal(&self, target: PumpState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if PumpState::from_u8(current).is_terminal() {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }
}
