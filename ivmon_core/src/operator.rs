//! Prompt providers for the calibration engine.
//!
//! The engine only ever calls `ask` and `tell`, so the same state machine
//! runs against a terminal or a scripted list of answers.
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crossbeam_channel as xch;
use ivmon_traits::CancelToken;

use crate::error::PromptError;

pub trait Operator {
    /// Show `prompt` and wait for one line of input (without the newline).
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Show an informational line.
    fn tell(&mut self, line: &str);
}

/// `true` only for an explicit "yes" (case-insensitive).
pub fn confirm(op: &mut dyn Operator, prompt: &str) -> Result<bool, PromptError> {
    Ok(op.ask(prompt)?.trim().eq_ignore_ascii_case("yes"))
}

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Terminal operator.
///
/// Stdin is read on a helper thread so that a pending prompt can be abandoned
/// when the cancel token fires. The helper is spawned on the first `ask`.
pub struct ConsoleOperator {
    cancel: CancelToken,
    lines: Option<xch::Receiver<String>>,
}

impl ConsoleOperator {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel, lines: None }
    }

    fn lines(&mut self) -> &xch::Receiver<String> {
        self.lines.get_or_insert_with(|| {
            let (tx, rx) = xch::unbounded();
            std::thread::spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                tracing::trace!("stdin reader exiting");
            });
            rx
        })
    }
}

impl Operator for ConsoleOperator {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        print!("{prompt}");
        let _ = io::stdout().flush();
        let cancel = self.cancel.clone();
        let rx = self.lines();
        loop {
            if cancel.is_cancelled() {
                return Err(PromptError::Interrupted);
            }
            match rx.recv_timeout(INPUT_POLL) {
                Ok(line) => return Ok(line.trim_end_matches('\r').to_string()),
                Err(xch::RecvTimeoutError::Timeout) => continue,
                Err(xch::RecvTimeoutError::Disconnected) => return Err(PromptError::Closed),
            }
        }
    }

    fn tell(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Answers from a fixed script; records every prompt and message.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Whether any recorded line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.transcript.iter().any(|l| l.contains(needle))
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.transcript.push(prompt.to_string());
        self.answers.pop_front().ok_or(PromptError::Closed)
    }

    fn tell(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_in_order_then_closes() {
        let mut op = ScriptedOperator::new(["1", "yes"]);
        assert_eq!(op.ask("a?").unwrap(), "1");
        assert!(confirm(&mut op, "b?").unwrap());
        assert_eq!(op.ask("c?"), Err(PromptError::Closed));
        assert_eq!(op.transcript(), &["a?", "b?", "c?"]);
    }

    #[test]
    fn confirm_requires_explicit_yes() {
        let mut op = ScriptedOperator::new([" YES ", "y", "no", ""]);
        assert!(confirm(&mut op, "?").unwrap());
        assert!(!confirm(&mut op, "?").unwrap());
        assert!(!confirm(&mut op, "?").unwrap());
        assert!(!confirm(&mut op, "?").unwrap());
    }

    #[test]
    fn console_prompt_observes_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let mut op = ConsoleOperator::new(token);
        assert_eq!(op.ask(""), Err(PromptError::Interrupted));
    }
}
