pub mod cli;
pub mod config;
pub mod countdown;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod screen;
pub mod session;
pub mod transcript;

use std::future::Future;
use std::io::{BufRead, Write};

use colored::*;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, info_span, warn, Instrument};

pub use config::SessionConfig;
pub use error::SessionError;
pub use screen::{BufferScreen, Screen, TerminalScreen};
pub use session::{Session, SessionSummary};

/// Lines typed ahead of the session loop are buffered up to this many.
const INPUT_BUFFER: usize = 32;

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Open the session channel for `origin`.
pub async fn connect(origin: &str) -> Result<(String, Socket), SessionError> {
    let url = endpoint::socket_url(origin)?;
    info!(url = %url, secure = endpoint::is_secure(&url), "connecting");
    let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|source| SessionError::Connect {
            url: url.clone(),
            source,
        })?;
    Ok((url, socket))
}

/// Forward stdin lines into a channel. The channel closes at end of input.
///
/// A plain thread is used so a pending read never holds up process exit.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    std::thread::spawn(move || forward_lines(std::io::stdin().lock(), &tx));
    rx
}

/// Send each line of `reader` to `tx` until end of input, a read error, or
/// the receiver going away. Invalid UTF-8 is replaced, not treated as EOF.
pub fn forward_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "stdin read failed, ending input");
                break;
            }
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.blocking_send(line).is_err() {
            break;
        }
    }
}

/// Relay `input` until it ends or `shutdown` completes, whichever is first.
/// Either way the returned channel closes, which ends the session the same
/// way end of input does.
pub fn close_on<F>(mut input: mpsc::Receiver<String>, shutdown: F) -> mpsc::Receiver<String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    tokio::spawn(async move {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                line = input.recv() => match line {
                    Some(line) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = &mut shutdown => {
                    debug!("shutdown requested, closing input");
                    break;
                }
            }
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Connect, then run an interactive terminal session until it ends.
pub async fn run(config: &SessionConfig) -> Result<SessionSummary, SessionError> {
    let (url, socket) = connect(&config.origin).await?;
    print_header(&url);

    let (sink, stream) = socket.split();
    let input = close_on(spawn_stdin_reader(), async {
        let _ = tokio::signal::ctrl_c().await;
    });
    let session = Session::new(TerminalScreen::stdout());
    let span = info_span!("session", id = %session.id());
    let result = session.run(stream, sink, input).instrument(span).await;
    TerminalScreen::reset_title();
    let (_, summary) = result?;
    Ok(summary)
}

pub fn print_header(url: &str) {
    println!("{}", "━".repeat(60).bright_blue());
    println!("{} {}", "connected:".bright_cyan(), url);
    println!(
        "{}",
        "type an answer and press Enter · Ctrl-D or Ctrl-C to leave".dimmed()
    );
    println!("{}", "━".repeat(60).bright_blue());
}

pub fn print_summary(summary: &SessionSummary) {
    let mut out = std::io::stdout();
    let _ = write_summary(&mut out, summary);
    let _ = out.flush();
}

pub fn write_summary<W: Write>(out: &mut W, summary: &SessionSummary) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "━".repeat(60).bright_blue())?;
    writeln!(out, "{} {}", "session:".bright_cyan(), summary.session_id)?;
    writeln!(out, "{} {}", "transcript lines:".bright_cyan(), summary.lines)?;
    writeln!(out, "{} {}", "answers sent:".bright_cyan(), summary.answers_sent)?;
    if let Some(stats) = &summary.stats {
        writeln!(
            out,
            "{} {}  {} {}  {} {}",
            "level:".bright_cyan(),
            stats.level,
            "answered:".bright_cyan(),
            stats.answered,
            "average:".bright_cyan(),
            stats.average
        )?;
    }
    if summary.dropped_frames > 0 {
        writeln!(
            out,
            "{} {}",
            "malformed messages ignored:".yellow(),
            summary.dropped_frames
        )?;
    }
    writeln!(out, "{}", "━".repeat(60).bright_blue())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::StatsView;
    use std::io::Cursor;

    fn collect(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_forward_lines_splits_and_strips_newlines() {
        let (tx, mut rx) = mpsc::channel(8);
        forward_lines(Cursor::new(b"Paris   \r\nLondon\nlast".to_vec()), &tx);
        assert_eq!(collect(&mut rx), vec!["Paris   ", "London", "last"]);
    }

    #[test]
    fn test_forward_lines_survives_invalid_utf8() {
        let (tx, mut rx) = mpsc::channel(8);
        forward_lines(Cursor::new(b"ok\n\xff\xfe\nnext\n".to_vec()), &tx);
        let lines = collect(&mut rx);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "\u{FFFD}\u{FFFD}");
        assert_eq!(lines[2], "next");
    }

    #[test]
    fn test_forward_lines_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        // Returns instead of looping forever.
        forward_lines(Cursor::new(b"a\nb\n".to_vec()), &tx);
    }

    #[tokio::test]
    async fn test_close_on_relays_until_shutdown() {
        let (input_tx, input_rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let mut relayed = close_on(input_rx, async {
            let _ = stop_rx.await;
        });

        input_tx.send("first".to_string()).await.unwrap();
        assert_eq!(relayed.recv().await.as_deref(), Some("first"));

        stop_tx.send(()).unwrap();
        // Closed even though the original sender is still alive.
        assert_eq!(relayed.recv().await, None);
        drop(input_tx);
    }

    #[tokio::test]
    async fn test_close_on_closes_at_end_of_input() {
        let (input_tx, input_rx) = mpsc::channel::<String>(8);
        let mut relayed = close_on(input_rx, std::future::pending());
        drop(input_tx);
        assert_eq!(relayed.recv().await, None);
    }

    #[test]
    fn test_write_summary_reports_all_fields() {
        colored::control::set_override(false);
        let summary = SessionSummary {
            session_id: "3f2b8c1e-0000-4000-8000-000000000000".to_string(),
            lines: 7,
            answers_sent: 3,
            dropped_frames: 1,
            stats: Some(StatsView {
                level: "medium".to_string(),
                answered: "3".to_string(),
                average: "2.33".to_string(),
            }),
        };
        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("session: 3f2b8c1e-0000-4000-8000-000000000000"));
        assert!(text.contains("transcript lines: 7"));
        assert!(text.contains("answers sent: 3"));
        assert!(text.contains("average: 2.33"));
        assert!(text.contains("malformed messages ignored: 1"));
    }
}
