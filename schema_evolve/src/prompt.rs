//! User confirmation
//!
//! The migration pipeline asks before it changes anything on disk. Answers
//! come from a [`Prompt`] so the pipeline can run unattended.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Asks the user a yes/no question
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Always gives the same answer
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Prompt for AutoConfirm {
    async fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        tracing::debug!(answer = self.0, "{}", message);
        Ok(self.0)
    }
}

/// Asks on the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

#[async_trait]
impl Prompt for StdinPrompt {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let question = format!("{} {} ", message, hint);

        tokio::task::spawn_blocking(move || -> Result<bool> {
            loop {
                print!("{}", question);
                io::stdout().flush()?;

                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Ok(default);
                }

                match parse_answer(&line) {
                    Some(answer) => return Ok(answer.unwrap_or(default)),
                    None => println!("Please answer yes or no."),
                }
            }
        })
        .await
        .map_err(|e| Error::IoError(io::Error::new(io::ErrorKind::Other, e)))?
    }
}

/// `Some(None)` for an empty answer, `None` when the answer is not understood
fn parse_answer(line: &str) -> Option<Option<bool>> {
    match line.trim().to_lowercase().as_str() {
        "" => Some(None),
        "y" | "yes" | "s" | "sim" => Some(Some(true)),
        "n" | "no" | "não" | "nao" => Some(Some(false)),
        _ => None,
    }
}
