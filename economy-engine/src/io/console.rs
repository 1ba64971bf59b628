//! Line protocol of the command layer: one JSON [`Command`] in, one JSON
//! [`Outcome`] out.

use crate::models::{Command, Outcome};
use log::error;
use serde_json::json;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Parses one input line. Blank lines and `#` comments yield `None`.
/// Malformed JSON yields the rejection to print back.
pub fn parse_line(line: &str) -> Option<Result<Command, Outcome>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(
        serde_json::from_str::<Command>(line).map_err(|e| Outcome::Rejected {
            reason: format!("Invalid command: {}", e),
        }),
    )
}

pub fn render(outcome: &Outcome) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|e| {
        json!({"status": "failed", "reason": format!("Unrenderable outcome: {}", e), "fatal": false})
            .to_string()
    })
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.flush().await
}

/// Writes rendered outcomes, one per line.
///
/// The first write failure is kept and every later write is skipped. Callers
/// keep running their shutdown path and collect the failure at the end.
pub struct OutcomeWriter<W> {
    out: W,
    failure: Option<std::io::Error>,
}

impl<W: AsyncWrite + Unpin> OutcomeWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, failure: None }
    }

    pub fn is_broken(&self) -> bool {
        self.failure.is_some()
    }

    /// Returns false if the outcome was not written.
    pub async fn write(&mut self, outcome: &Outcome) -> bool {
        if self.failure.is_some() {
            return false;
        }
        let mut line = render(outcome);
        line.push('\n');
        match write_line(&mut self.out, &line).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write outcome, output closed: {}", e);
                self.failure = Some(e);
                false
            }
        }
    }

    pub fn into_failure(self) -> Option<std::io::Error> {
        self.failure
    }
}
