//! Shared child-process supervision helpers used by both the egress and
//! ingest supervisors (§4.4, §4.5).
//!
//! Both components spawn an external encoder/ingest binary and watch its
//! stderr for a small vocabulary of tokens rather than parsing full output:
//! `size=`/`time=` count as progress, `Error`/`error`/`failed` count as a
//! fatal signal. This lives in `roombus-common` so the two supervisors don't
//! duplicate the watcher loop.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// A line of child stderr classified into the vocabulary the supervisors
/// care about (§4.4 "Encoder child-process contract").
#[derive(Debug, Clone)]
pub enum ProcessSignal {
    /// Saw a `size=` or `time=` token — resets idle watchdogs.
    Progress,
    /// Saw an `Error`/`error`/`failed` token.
    ErrorToken(String),
    /// The child exited.
    Exited(std::process::ExitStatus),
}

/// Spawns a task that tails `child`'s stderr, classifies each line, and
/// forwards [`ProcessSignal`]s until the child exits.
pub fn watch_child(mut child: Child) -> mpsc::Receiver<ProcessSignal> {
    let (tx, rx) = mpsc::channel(64);
    let stderr = child.stderr.take();

    tokio::spawn(async move {
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(signal) = classify_line(&line) {
                    if tx.send(signal).await.is_err() {
                        break;
                    }
                }
            }
        }

        if let Ok(status) = child.wait().await {
            let _ = tx.send(ProcessSignal::Exited(status)).await;
        }
    });

    rx
}

/// Like [`watch_child`], but does not take ownership of `child` — forwards
/// only [`ProcessSignal::Progress`]/[`ProcessSignal::ErrorToken`] and leaves
/// exit detection (and thus killing) to the caller. Use this when the
/// supervisor needs to retain the `Child` handle to terminate it (§4.4
/// `stopEncoder`, §4.5 watchdog kill).
pub fn tail_stderr(child: &mut Child) -> mpsc::Receiver<ProcessSignal> {
    let (tx, rx) = mpsc::channel(64);
    let Some(stderr) = child.stderr.take() else {
        return rx;
    };

    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(signal) = classify_line(&line) {
                if tx.send(signal).await.is_err() {
                    break;
                }
            }
        }
    });

    rx
}

pub fn classify_line(line: &str) -> Option<ProcessSignal> {
    if line.contains("Error") || line.contains("error") || line.contains("failed") {
        return Some(ProcessSignal::ErrorToken(line.to_string()));
    }
    if line.contains("size=") || line.contains("time=") {
        return Some(ProcessSignal::Progress);
    }
    None
}

/// `RETRY_DELAYS[min(retry_count, len-1)]` from §4.4/§8.
pub fn retry_delay(retry_count: usize, delays: &[u64]) -> std::time::Duration {
    let idx = retry_count.min(delays.len().saturating_sub(1));
    std::time::Duration::from_secs(delays.get(idx).copied().unwrap_or(30))
}

/// Graceful-then-kill shutdown shared by the egress and ingest supervisors
/// (§4.4 `stopEncoder`, §4.5 watchdog cancellation): send `SIGTERM`, give the
/// child `grace` to exit on its own, then `SIGKILL`.
pub async fn terminate_gracefully(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if let Some(pid) = child.id() {
        // SAFETY: `pid` is this child's own process id for as long as we hold
        // the `Child` handle; sending SIGTERM to it has no effect on other
        // processes.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(_) => Ok(()),
        Err(_) => {
            child.start_kill()?;
            child.wait().await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_clamps_to_last_entry() {
        let delays = [5, 15, 30];
        assert_eq!(retry_delay(0, &delays).as_secs(), 5);
        assert_eq!(retry_delay(2, &delays).as_secs(), 30);
        assert_eq!(retry_delay(10, &delays).as_secs(), 30);
    }

    #[test]
    fn classify_progress_and_error_tokens() {
        assert!(matches!(
            classify_line("frame=100 size=512kB time=00:00:05"),
            Some(ProcessSignal::Progress)
        ));
        assert!(matches!(
            classify_line("Error: connection refused"),
            Some(ProcessSignal::ErrorToken(_))
        ));
        assert!(classify_line("ffmpeg version 6.0").is_none());
    }
}
