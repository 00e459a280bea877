//! Operator confirmation prompts.

use crate::error::Result;
use dialoguer::console::Term;
use dialoguer::Input;
use std::fmt;
use std::future::Future;
use tracing::debug;

/// Operator's answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Answered `y` or `Y`.
    Confirmed,
    /// Anything else, including no answer at all.
    Declined,
}

impl Confirmation {
    /// Interpret a line typed by the operator.
    ///
    /// Only a single `y` or `Y` (surrounding whitespace ignored) confirms.
    #[must_use]
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim() {
            "y" | "Y" => Self::Confirmed,
            _ => Self::Declined,
        }
    }

    /// Interpret the outcome of reading an answer. A failed read, such as
    /// EOF or stdin not being a terminal, declines.
    #[must_use]
    pub fn from_outcome<E: fmt::Display>(outcome: std::result::Result<String, E>) -> Self {
        match outcome {
            Ok(answer) => Self::from_answer(&answer),
            Err(e) => {
                debug!("No answer read ({e}); treating as no");
                Self::Declined
            }
        }
    }

    /// Whether the operator agreed.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Asks the operator questions.
pub trait Prompter: Sync {
    /// Show informational text before a question.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn show(&self, text: &str) -> Result<()>;

    /// Ask a yes/no question.
    fn confirm(&self, question: &str) -> impl Future<Output = Result<Confirmation>> + Send;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioPrompter;

impl Prompter for StdioPrompter {
    fn show(&self, text: &str) -> Result<()> {
        Term::stdout().write_line(text)?;
        Ok(())
    }

    async fn confirm(&self, question: &str) -> Result<Confirmation> {
        let prompt = format!("{question} [y/N]");
        // Reading the terminal blocks; keep it off the runtime workers.
        let outcome = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|read| read.map_err(|e| e.to_string()));

        Ok(Confirmation::from_outcome(outcome))
    }
}
