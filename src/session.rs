//! The session client.
//!
//! ## Design
//! - `Session` owns the transcript, the countdown, the screen and the latest
//!   stats. There is no ambient state.
//! - The handlers (`handle_frame`, `submit`, `on_tick`) are synchronous and
//!   return the outbound frame to send, if any. `run` is the only place that
//!   touches the socket.
//! - `run` multiplexes the socket stream, the countdown and the input channel
//!   in one `tokio::select!` loop, so handlers never overlap.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info, warn};

use crate::countdown::{Countdown, Tick};
use crate::error::SessionError;
use crate::protocol::{parse_frame, Outbound, StatsView, Tagged, EXPIRY_ANSWER};
use crate::screen::Screen;
use crate::transcript::{Line, Transcript};

/// What a finished session leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub lines: usize,
    pub answers_sent: usize,
    pub dropped_frames: usize,
    pub stats: Option<StatsView>,
}

pub struct Session<S: Screen> {
    id: String,
    screen: S,
    transcript: Transcript,
    countdown: Countdown,
    stats: Option<StatsView>,
    answers_sent: usize,
    dropped_frames: usize,
}

impl<S: Screen> Session<S> {
    pub fn new(screen: S) -> Self {
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            screen,
            transcript: Transcript::new(),
            countdown: Countdown::new(),
            stats: None,
            answers_sent: 0,
            dropped_frames: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn stats(&self) -> Option<&StatsView> {
        self.stats.as_ref()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            lines: self.transcript.len(),
            answers_sent: self.answers_sent,
            dropped_frames: self.dropped_frames,
            stats: self.stats.clone(),
        }
    }

    fn append(&mut self, line: Line) {
        let line = self.transcript.push(line);
        self.screen.append(line);
    }

    fn notice(&mut self, text: impl Into<String>) {
        self.append(Line::notice(text));
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    /// Apply one inbound text frame.
    ///
    /// A malformed frame changes nothing on screen except a notice line; the
    /// error is returned for logging and the session carries on.
    pub fn handle_frame(&mut self, text: &str) -> Result<(), SessionError> {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(err) => {
                self.dropped_frames += 1;
                self.notice(format!("(ignored a malformed message from the server: {err})"));
                return Err(err);
            }
        };

        match &frame.tagged {
            Tagged::Question(q) => {
                self.append(Line::question(q));
                self.countdown.start(q.time);
                self.screen.set_timer(q.time);
                debug!(seconds = q.time, "countdown started");
            }
            Tagged::Feedback(fb) => self.append(Line::feedback(fb)),
            Tagged::Other => {}
        }

        if let Some(stats) = &frame.stats {
            let view = StatsView::from(stats);
            self.screen.set_stats(&view);
            self.stats = Some(view);
        }

        Ok(())
    }

    /// Submit what the user typed.
    ///
    /// Whitespace-only input is left in place and nothing is sent. Otherwise
    /// the untrimmed text is echoed, `input` is cleared, the countdown is
    /// canceled and the trimmed answer is returned for sending.
    pub fn submit(&mut self, input: &mut String) -> Option<Outbound> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let out = Outbound::answer(trimmed);
        self.append(Line::you(input));
        input.clear();
        // The server starts the next countdown with its next question.
        self.countdown.cancel();
        self.answers_sent += 1;
        Some(out)
    }

    /// Apply one elapsed countdown second. Expiry yields the placeholder answer.
    pub fn on_tick(&mut self, tick: Tick) -> Option<Outbound> {
        match tick {
            Tick::Running(remaining) => {
                self.screen.set_timer(remaining);
                None
            }
            Tick::Expired(remaining) => {
                self.screen.set_timer(remaining);
                self.countdown.cancel();
                self.answers_sent += 1;
                info!("countdown expired, sending placeholder answer");
                Some(Outbound::answer(EXPIRY_ANSWER))
            }
        }
    }

    fn connection_lost(&mut self, reason: &str) {
        self.countdown.cancel();
        self.notice(format!("(connection closed: {reason})"));
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Drive the session until the server goes away or input ends.
    ///
    /// `input` carries submitted lines; when it closes the session sends a
    /// close frame and returns.
    pub async fn run<St, Si>(
        mut self,
        mut stream: St,
        mut sink: Si,
        mut input: mpsc::Receiver<String>,
    ) -> Result<(Self, SessionSummary), SessionError>
    where
        St: Stream<Item = Result<WsMessage, WsError>> + Unpin,
        Si: Sink<WsMessage, Error = WsError> + Unpin,
    {
        info!(session_id = %self.id, "session started");

        loop {
            tokio::select! {
                frame = stream.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            if let Err(err) = self.handle_frame(&text) {
                                warn!(error = %err, "dropping inbound frame");
                            }
                        }
                        Some(Ok(WsMessage::Close(close))) => {
                            let reason = close
                                .map(|c| c.reason.to_string())
                                .filter(|r| !r.is_empty())
                                .unwrap_or_else(|| "server closed the session".to_string());
                            self.connection_lost(&reason);
                            break;
                        }
                        Some(Ok(_)) => {} // binary / ping / pong
                        Some(Err(err)) => {
                            warn!(error = %err, "socket error");
                            self.connection_lost(&err.to_string());
                            break;
                        }
                        None => {
                            self.connection_lost("stream ended");
                            break;
                        }
                    }
                }

                tick = self.countdown.tick() => {
                    if let Some(out) = self.on_tick(tick) {
                        self.send(&mut sink, out).await?;
                    }
                }

                line = input.recv() => {
                    match line {
                        Some(mut line) => {
                            if let Some(out) = self.submit(&mut line) {
                                self.send(&mut sink, out).await?;
                            }
                        }
                        None => {
                            debug!("input closed, ending session");
                            self.countdown.cancel();
                            let _ = sink.send(WsMessage::Close(None)).await;
                            break;
                        }
                    }
                }
            }
        }

        let summary = self.summary();
        info!(
            session_id = %summary.session_id,
            answers = summary.answers_sent,
            dropped = summary.dropped_frames,
            "session ended"
        );
        Ok((self, summary))
    }

    async fn send<Si>(&mut self, sink: &mut Si, out: Outbound) -> Result<(), SessionError>
    where
        Si: Sink<WsMessage, Error = WsError> + Unpin,
    {
        let json = out.to_json();
        debug!(frame = %json, "sending");
        if let Err(err) = sink.send(WsMessage::Text(json)).await {
            self.connection_lost(&err.to_string());
            return Err(SessionError::Send(err.to_string()));
        }
        Ok(())
    }
}
