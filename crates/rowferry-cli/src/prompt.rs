use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use rowferry_transfer::OverwritePolicy;

/// Whether an answer counts as an explicit yes.
fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Ask a yes/no question on the controlling terminal.
///
/// Anything other than an explicit affirmative, including EOF or a failed
/// read, declines.
pub async fn confirm(question: String) -> bool {
    tokio::task::spawn_blocking(move || {
        let mut stdout = io::stdout();
        if write!(stdout, "{question}")
            .and_then(|_| stdout.flush())
            .is_err()
        {
            return false;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        is_affirmative(&line)
    })
    .await
    .unwrap_or(false)
}

/// Interactive overwrite decision for tables whose target already has rows.
pub struct StdinPrompt;

#[async_trait]
impl OverwritePolicy for StdinPrompt {
    async fn confirm_overwrite(&self, table: &str, existing_rows: u64) -> bool {
        confirm(format!(
            "table {table} already has {existing_rows} rows in the target. continue? [y/N] "
        ))
        .await
    }
}
