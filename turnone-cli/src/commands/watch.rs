//! Watch Command
//!
//! Follows the live feed, printing state changes and a session summary, and
//! reads broadcast-delay changes from stdin.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use turnone_core::{FeedConfig, LiveFeedClient, SnapshotView};

use crate::bell::TerminalBell;
use crate::display;

const RACE_CONTROL_LINES: usize = 5;

/// A line typed on stdin.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Delay(u64),
    Status,
    Quit,
    Help,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Input::Empty);
    };
    let input = match command {
        "delay" | "d" => {
            let value = words.next().ok_or("usage: delay <ms>")?;
            let ms = value
                .parse()
                .map_err(|_| format!("not a delay in milliseconds: {}", value))?;
            Input::Delay(ms)
        }
        "status" | "s" => Input::Status,
        "quit" | "q" | "exit" => Input::Quit,
        "help" | "?" => Input::Help,
        other => return Err(format!("unknown command: {}", other)),
    };
    if words.next().is_some() {
        return Err(format!("too many arguments for {}", command));
    }
    Ok(input)
}

/// Summary line to print for `view`, or `None` if nothing should be shown.
///
/// The store is not shown while a resync counts down, nor while it holds the
/// empty snapshot a resync leaves behind. Unchanged lines are not repeated.
fn next_summary(
    view: &SnapshotView,
    syncing: bool,
    now: DateTime<Utc>,
    delay: Duration,
    last: Option<&str>,
) -> Option<String> {
    if syncing || view.snapshot().is_some_and(|s| s.is_empty()) {
        return None;
    }
    let summary = display::summary(view, now, delay)?;
    (last != Some(summary.as_str())).then_some(summary)
}

fn print_help() {
    display::info("Commands: delay <ms>, status, quit");
}

/// Runs the client until `quit`, end of input or Ctrl-C.
pub async fn run(config: FeedConfig, alerts: bool) -> Result<()> {
    let builder = LiveFeedClient::builder(config.clone());
    let client = if alerts {
        builder.notification_sink(TerminalBell::new()).start()?
    } else {
        builder.start()?
    };

    display::info(&format!("Watching {} ({})", config.origin, config.feed_url()?));
    print_help();

    let mut delay = Duration::from_millis(config.initial_delay_ms);
    let mut signals = client.signals();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_summary = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("end of input");
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Delay(ms)) => {
                        client.set_delay(ms)?;
                        delay = Duration::from_millis(ms);
                        last_summary = None;
                    }
                    Ok(Input::Status) => {
                        display::connection(client.connection_state());
                        display::info(&format!("Broadcast delay {} ms", delay.as_millis()));
                        let view = client.snapshot();
                        match view.snapshot() {
                            Some(snapshot) => display::race_control(snapshot, RACE_CONTROL_LINES),
                            None => display::info("No data yet"),
                        }
                    }
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => print_help(),
                    Ok(Input::Empty) => {}
                    Err(message) => display::error(&message),
                }
            }
            changed = signals.connection_state.changed() => {
                if changed.is_err() {
                    break;
                }
                display::connection(*signals.connection_state.borrow_and_update());
            }
            changed = signals.sync_countdown_ms.changed() => {
                if changed.is_err() {
                    break;
                }
                let countdown = *signals.sync_countdown_ms.borrow_and_update();
                display::countdown(countdown);
                if countdown.is_none() {
                    let view = signals.snapshot.borrow().clone();
                    if let Some(line) = next_summary(&view, false, Utc::now(), delay, last_summary.as_deref()) {
                        display::summary_line(&line, view.updated_at());
                        last_summary = Some(line);
                    }
                }
            }
            changed = signals.snapshot.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = signals.snapshot.borrow_and_update().clone();
                let syncing = signals.sync_countdown_ms.borrow().is_some();
                if let Some(line) = next_summary(&view, syncing, Utc::now(), delay, last_summary.as_deref()) {
                    display::summary_line(&line, view.updated_at());
                    last_summary = Some(line);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.teardown().await?;
    display::success("Stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use turnone_core::Snapshot;

    fn ready(raw: &[u8]) -> SnapshotView {
        SnapshotView::Ready {
            snapshot: Arc::new(Snapshot::decode(raw).unwrap()),
            updated_at: Utc::now(),
        }
    }

    const LIVE: &[u8] = br#"{"Heartbeat":{},"SessionInfo":{"Name":"Race","Meeting":{"Circuit":{"ShortName":"Spa"}}}}"#;

    #[test]
    fn test_no_summary_while_syncing() {
        let view = ready(LIVE);
        assert_eq!(
            next_summary(&view, true, Utc::now(), Duration::from_secs(5), None),
            None
        );
    }

    #[test]
    fn test_no_summary_for_store_cleared_by_resync() {
        let view = ready(b"{}");
        assert_eq!(
            next_summary(&view, false, Utc::now(), Duration::from_secs(5), None),
            None
        );
    }

    #[test]
    fn test_summary_after_resync_completes() {
        let view = ready(LIVE);
        let line = next_summary(&view, false, Utc::now(), Duration::ZERO, None);
        assert_eq!(line.as_deref(), Some("Spa: Race | 2 sections"));
    }

    #[test]
    fn test_unchanged_summary_is_not_repeated() {
        let view = ready(LIVE);
        let last = Some("Spa: Race | 2 sections");
        assert_eq!(next_summary(&view, false, Utc::now(), Duration::ZERO, last), None);
    }

    #[test]
    fn test_no_summary_before_data() {
        assert_eq!(
            next_summary(&SnapshotView::NoDataYet, false, Utc::now(), Duration::ZERO, None),
            None
        );
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_input("delay 5000"), Ok(Input::Delay(5000)));
        assert_eq!(parse_input("  d 0 "), Ok(Input::Delay(0)));
    }

    #[test]
    fn test_parse_rejects_bad_delay() {
        assert!(parse_input("delay").is_err());
        assert!(parse_input("delay -1").is_err());
        assert!(parse_input("delay 5s").is_err());
        assert!(parse_input("delay 1 2").is_err());
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(parse_input("status"), Ok(Input::Status));
        assert_eq!(parse_input("quit"), Ok(Input::Quit));
        assert_eq!(parse_input("?"), Ok(Input::Help));
        assert_eq!(parse_input(""), Ok(Input::Empty));
        assert!(parse_input("rewind").is_err());
    }
}
