//! Streaming Response Controller
//!
//! Drives exactly one model invocation and reflects it into a
//! [`ChatSurface`]. The controller owns three things: the running text
//! buffer for the turn being rendered, a one-shot stall deadline that
//! shows a "taking a long time" notice if no token arrives in time, and
//! the loading indicator derived from that deadline.
//!
//! Per invocation:
//!
//! 1. **Start**: arm the stall deadline, reset the buffer, and append
//!    the empty message slot that will receive this turn's content.
//! 2. **Token**: disarm the deadline, clear the loading indicator if the
//!    stall had fired, append to the buffer, and re-render the whole
//!    buffer through the markdown step. Empty tokens change nothing else.
//! 3. **Stall fired**: show the notice in the current slot and turn the
//!    loading indicator on. Cosmetic only; the request keeps running.
//! 4. **Error**: disarm the deadline and write the raw error text into a
//!    fresh slot, bypassing markdown. Terminal.
//! 5. **End**: disarm the deadline. Terminal.
//!
//! There are no retries and no cancellation. Recovery is a brand-new
//! invocation (and a brand-new controller) on the next submission.
//!
//! The controller is consumed either by the async [`drive`] reactor
//! (headless paths, tests) or by the poll pair [`on_event`] +
//! [`poll_stall`] from a UI tick loop.
//!
//! [`drive`]: StreamController::drive
//! [`on_event`]: StreamController::on_event
//! [`poll_stall`]: StreamController::poll_stall

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::backend::StreamEvent;
use crate::surface::{ChatSurface, MessageSlot, SurfaceContent};

/// Notice shown when the model has produced nothing for the stall delay.
pub const STALL_NOTICE: &str = "### Sorry, the AI is taking a long time to respond.";

/// Default stall delay.
pub const DEFAULT_STALL_DELAY: Duration = Duration::from_millis(3000);

/// The stall watchdog's state.
///
/// The deadline is armed exactly once, at construction, so a double-arm
/// cannot be expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StallState {
    /// Counting down; fires at `deadline` unless a token arrives first.
    Armed {
        /// When the notice fires.
        deadline: Instant,
    },
    /// The notice fired. Nothing further to time.
    Fired,
    /// A token or terminal event arrived first.
    Disarmed,
}

/// How an invocation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The stream completed; `message` is the full response text.
    Completed {
        /// The complete response.
        message: String,
    },
    /// The stream failed; the error was already shown on the surface.
    Failed {
        /// The raw error text.
        error: String,
    },
}

/// State of one in-flight model invocation.
///
/// Created fresh per invocation via [`StreamController::begin`]; never
/// reused after a terminal event.
#[derive(Debug)]
pub struct StreamController {
    /// Accumulated token text for the turn being rendered.
    buffer: String,
    /// The stall watchdog.
    stall: StallState,
    /// True only while the stall has fired and no token has since
    /// arrived.
    loading: bool,
}

impl StreamController {
    /// Begin an invocation: arm the stall deadline and create the
    /// message slot that will receive this turn's content.
    pub fn begin(stall_delay: Duration, surface: &mut dyn ChatSurface) -> Self {
        surface.add_message();
        surface.set_message(MessageSlot::Last, SurfaceContent::markdown(""));
        Self {
            buffer: String::new(),
            stall: StallState::Armed {
                deadline: Instant::now() + stall_delay,
            },
            loading: false,
        }
    }

    /// The accumulated response text so far.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Fire the stall notice if the deadline has passed. Call this from
    /// a tick loop; [`drive`](Self::drive) does it internally.
    pub fn poll_stall(&mut self, surface: &mut dyn ChatSurface) {
        if let StallState::Armed { deadline } = self.stall {
            if Instant::now() >= deadline {
                self.fire_stall(surface);
            }
        }
    }

    fn fire_stall(&mut self, surface: &mut dyn ChatSurface) {
        self.stall = StallState::Fired;
        self.loading = true;
        surface.set_message(MessageSlot::Last, SurfaceContent::markdown(STALL_NOTICE));
        surface.set_loading(true);
    }

    fn disarm(&mut self) {
        if matches!(self.stall, StallState::Armed { .. }) {
            self.stall = StallState::Disarmed;
        }
    }

    /// Feed one stream event through the state machine.
    ///
    /// Returns the outcome once a terminal event arrives; the controller
    /// must not be fed further after that.
    pub fn on_event(
        &mut self,
        event: StreamEvent,
        surface: &mut dyn ChatSurface,
    ) -> Option<StreamOutcome> {
        match event {
            StreamEvent::Token(token) => {
                self.disarm();
                if self.loading {
                    self.loading = false;
                    surface.set_loading(false);
                }
                if token.is_empty() {
                    return None;
                }
                self.buffer.push_str(&token);
                surface.set_message(
                    MessageSlot::Last,
                    SurfaceContent::markdown(self.buffer.clone()),
                );
                None
            }
            StreamEvent::Complete { message } => {
                self.disarm();
                tracing::debug!("stream complete");
                let message = if message.is_empty() {
                    self.buffer.clone()
                } else {
                    message
                };
                Some(StreamOutcome::Completed { message })
            }
            StreamEvent::Error(error) => {
                self.disarm();
                tracing::warn!(error = %error, "stream error");
                // Errors get a fresh slot and skip markdown formatting
                surface.add_message();
                surface.set_message(MessageSlot::Last, SurfaceContent::plain(error.clone()));
                Some(StreamOutcome::Failed { error })
            }
        }
    }

    /// Consume the event channel to its terminal event, firing the stall
    /// notice from the same task if the deadline passes first.
    ///
    /// A channel that closes without a terminal event is treated as an
    /// error; either way exactly one outcome is produced.
    pub async fn drive(
        mut self,
        mut rx: mpsc::Receiver<StreamEvent>,
        surface: &mut dyn ChatSurface,
    ) -> StreamOutcome {
        loop {
            let event = match self.stall {
                StallState::Armed { deadline } => {
                    tokio::select! {
                        event = rx.recv() => event,
                        () = tokio::time::sleep_until(deadline) => {
                            self.fire_stall(surface);
                            continue;
                        }
                    }
                }
                _ => rx.recv().await,
            };

            let event = event.unwrap_or_else(|| {
                StreamEvent::Error("response stream closed unexpectedly".to_string())
            });

            if let Some(outcome) = self.on_event(event, surface) {
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ContentKind;
    use pretty_assertions::assert_eq;

    /// Surface that records every call for inspection.
    #[derive(Default)]
    struct RecordingSurface {
        messages: Vec<SurfaceContent>,
        set_message_calls: usize,
        loading_calls: Vec<bool>,
    }

    impl ChatSurface for RecordingSurface {
        fn add_message(&mut self) {
            self.messages.push(SurfaceContent::markdown(""));
        }

        fn set_message(&mut self, slot: MessageSlot, content: SurfaceContent) {
            self.set_message_calls += 1;
            let idx = match slot {
                MessageSlot::Last => self.messages.len() - 1,
                MessageSlot::Index(i) => i,
            };
            self.messages[idx] = content;
        }

        fn set_loading(&mut self, loading: bool) {
            self.loading_calls.push(loading);
        }
    }

    async fn run_events(events: Vec<StreamEvent>) -> (RecordingSurface, StreamOutcome) {
        let mut surface = RecordingSurface::default();
        let (tx, rx) = mpsc::channel(16);
        for event in events {
            tx.try_send(event).unwrap();
        }
        drop(tx);
        let controller = StreamController::begin(DEFAULT_STALL_DELAY, &mut surface);
        let outcome = controller.drive(rx, &mut surface).await;
        (surface, outcome)
    }

    #[tokio::test]
    async fn test_tokens_accumulate_into_rendered_buffer() {
        let (surface, outcome) = run_events(vec![
            StreamEvent::Token("Hel".to_string()),
            StreamEvent::Token("lo".to_string()),
            StreamEvent::Token(", ".to_string()),
            StreamEvent::Token("world".to_string()),
            StreamEvent::Complete {
                message: String::new(),
            },
        ])
        .await;

        assert_eq!(
            outcome,
            StreamOutcome::Completed {
                message: "Hello, world".to_string()
            }
        );
        assert_eq!(surface.messages.len(), 1);
        assert_eq!(
            *surface.messages.last().unwrap(),
            SurfaceContent::markdown("Hello, world")
        );
        // one placeholder write at start plus one write per non-empty token
        assert_eq!(surface.set_message_calls, 5);
    }

    #[tokio::test]
    async fn test_empty_tokens_are_ignored() {
        let (surface, _) = run_events(vec![
            StreamEvent::Token(String::new()),
            StreamEvent::Token("hi".to_string()),
            StreamEvent::Token(String::new()),
            StreamEvent::Complete {
                message: String::new(),
            },
        ])
        .await;

        assert_eq!(surface.set_message_calls, 2);
        assert_eq!(
            *surface.messages.last().unwrap(),
            SurfaceContent::markdown("hi")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_notice_fires_once_then_first_token_clears_loading() {
        let mut surface = RecordingSurface::default();
        let (tx, rx) = mpsc::channel(16);
        let controller = StreamController::begin(DEFAULT_STALL_DELAY, &mut surface);

        let driver = tokio::spawn(async move {
            let mut surface = surface;
            let outcome = controller.drive(rx, &mut surface).await;
            (surface, outcome)
        });

        // Let the stall deadline pass with no tokens
        tokio::time::sleep(DEFAULT_STALL_DELAY + Duration::from_millis(100)).await;

        tx.send(StreamEvent::Token("late".to_string())).await.unwrap();
        tx.send(StreamEvent::Complete {
            message: String::new(),
        })
        .await
        .unwrap();
        drop(tx);

        let (surface, outcome) = driver.await.unwrap();
        assert_eq!(
            outcome,
            StreamOutcome::Completed {
                message: "late".to_string()
            }
        );
        // exactly one loading-on before any token, one loading-off after
        assert_eq!(surface.loading_calls, vec![true, false]);
        assert_eq!(
            *surface.messages.last().unwrap(),
            SurfaceContent::markdown("late")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_stall_notice_when_token_arrives_in_time() {
        let (surface, _) = run_events(vec![
            StreamEvent::Token("fast".to_string()),
            StreamEvent::Complete {
                message: String::new(),
            },
        ])
        .await;

        assert!(surface.loading_calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_gets_fresh_plain_slot_and_clears_timer() {
        let mut surface = RecordingSurface::default();
        let (tx, rx) = mpsc::channel(16);
        let controller = StreamController::begin(DEFAULT_STALL_DELAY, &mut surface);

        tx.try_send(StreamEvent::Error("boom".to_string())).unwrap();
        drop(tx);
        let outcome = controller.drive(rx, &mut surface).await;

        assert_eq!(
            outcome,
            StreamOutcome::Failed {
                error: "boom".to_string()
            }
        );
        // placeholder slot plus the error slot
        assert_eq!(surface.messages.len(), 2);
        let error_slot = surface.messages.last().unwrap();
        assert_eq!(error_slot.kind, ContentKind::Plain);
        assert_eq!(error_slot.text, "boom");

        // no stall notice after the terminal event
        tokio::time::sleep(DEFAULT_STALL_DELAY * 2).await;
        assert!(surface.loading_calls.is_empty());
        assert_eq!(surface.messages[0], SurfaceContent::markdown(""));
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_error() {
        let (surface, outcome) = run_events(vec![StreamEvent::Token("partial".to_string())]).await;

        let StreamOutcome::Failed { error } = outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("closed"));
        // the partial buffer stays rendered; it just stops updating
        assert_eq!(
            surface.messages[0],
            SurfaceContent::markdown("partial")
        );
        assert_eq!(surface.messages[1].kind, ContentKind::Plain);
    }

    #[tokio::test]
    async fn test_complete_message_overrides_buffer_when_present() {
        let (_, outcome) = run_events(vec![
            StreamEvent::Token("raw".to_string()),
            StreamEvent::Complete {
                message: "cleaned".to_string(),
            },
        ])
        .await;

        assert_eq!(
            outcome,
            StreamOutcome::Completed {
                message: "cleaned".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_poll_stall_is_a_no_op_before_deadline() {
        let mut surface = RecordingSurface::default();
        let mut controller = StreamController::begin(DEFAULT_STALL_DELAY, &mut surface);
        controller.poll_stall(&mut surface);
        assert!(surface.loading_calls.is_empty());
        assert!(matches!(controller.stall, StallState::Armed { .. }));
    }
}
