//! Interactive chat session.
//!
//! The phase is an explicit value owned by the loop and advanced only through
//! [`ChatPhase::next`]; nothing about the session lives in globals.

use std::io::{BufRead, Write};

use sbot_ai::pipeline::AnswerPipeline;
use sbot_core::domain::{Answer, Query, ResponseMode};
use sbot_core::email::{compose_answer_email, Mailer};
use sbot_core::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    AwaitingQuery,
    Answered,
    AwaitingRecipient,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEvent {
    AnswerReady,
    AnswerFailed,
    EmailRequested,
    EmailHandled,
    NextQuery,
    Quit,
}

impl ChatPhase {
    pub fn next(self, event: ChatEvent) -> ChatPhase {
        use ChatEvent::*;
        use ChatPhase::*;
        match (self, event) {
            (Finished, _) | (_, Quit) => Finished,
            (AwaitingQuery, AnswerReady) => Answered,
            (AwaitingQuery, AnswerFailed) => AwaitingQuery,
            (Answered, EmailRequested) => AwaitingRecipient,
            (Answered, NextQuery) => AwaitingQuery,
            (AwaitingRecipient, EmailHandled) => AwaitingQuery,
            (phase, _) => phase,
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            ChatPhase::AwaitingQuery => "\nAsk a sustainability question (or 'quit'): ",
            ChatPhase::Answered => "\nEmail this answer? [y/N] (or ask another question) ",
            ChatPhase::AwaitingRecipient => "Recipient email (blank to skip): ",
            ChatPhase::Finished => "",
        }
    }
}

fn is_quit(line: &str) -> bool {
    matches!(line.to_ascii_lowercase().as_str(), "quit" | "exit" | ":q")
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::new("CLI_IO_FAILED", "Failed to read or write the terminal").with_details(e.to_string())
}

/// Drive a chat session until `quit` or end of input.
///
/// Pipeline failures are reported and the session continues; only terminal I/O errors end it.
pub fn run_chat<R, W>(
    pipeline: &AnswerPipeline<'_>,
    mailer: Option<&dyn Mailer>,
    mode: ResponseMode,
    input: R,
    mut out: W,
) -> Result<ChatPhase, AppError>
where
    R: BufRead,
    W: Write,
{
    let mut phase = ChatPhase::AwaitingQuery;
    let mut last: Option<(String, Answer)> = None;
    // A question typed at the email prompt is answered without prompting again.
    let mut pending: Option<String> = None;
    let mut lines = input.lines();

    while phase != ChatPhase::Finished {
        let raw = match pending.take() {
            Some(query) => query,
            None => {
                write!(out, "{}", phase.prompt()).map_err(io_error)?;
                out.flush().map_err(io_error)?;

                let Some(line) = lines.next() else {
                    phase = phase.next(ChatEvent::Quit);
                    break;
                };
                line.map_err(io_error)?
            }
        };
        let line = raw.trim();
        if is_quit(line) {
            phase = phase.next(ChatEvent::Quit);
            continue;
        }

        let event = match phase {
            ChatPhase::AwaitingQuery => {
                if line.is_empty() {
                    continue;
                }
                match pipeline.answer(&Query::new(line, mode)) {
                    Ok(answer) => {
                        writeln!(out, "\n{}", answer.text).map_err(io_error)?;
                        last = Some((line.to_string(), answer));
                        ChatEvent::AnswerReady
                    }
                    Err(e) if e.is_no_answer() => {
                        writeln!(out, "\nNo relevant information found.").map_err(io_error)?;
                        ChatEvent::AnswerFailed
                    }
                    Err(e) => {
                        writeln!(out, "\nerror: {e}").map_err(io_error)?;
                        ChatEvent::AnswerFailed
                    }
                }
            }
            ChatPhase::Answered => match line.to_ascii_lowercase().as_str() {
                "y" | "yes" => ChatEvent::EmailRequested,
                "" | "n" | "no" => ChatEvent::NextQuery,
                _ => {
                    pending = Some(line.to_string());
                    ChatEvent::NextQuery
                }
            },
            ChatPhase::AwaitingRecipient => {
                match (line.is_empty(), mailer, last.as_ref()) {
                    (true, _, _) => writeln!(out, "Email skipped.").map_err(io_error)?,
                    (false, None, _) => {
                        writeln!(out, "Email is not configured; set SMTP_EMAIL and SMTP_PASSWORD.")
                            .map_err(io_error)?
                    }
                    (false, Some(m), Some((query, answer))) => {
                        let message = compose_answer_email(line, query, &answer.text);
                        let written = match m.send(&message) {
                            Ok(()) => writeln!(out, "Email sent to {}.", message.recipient),
                            Err(e) => writeln!(out, "error: {e}"),
                        };
                        written.map_err(io_error)?
                    }
                    (false, Some(_), None) => {}
                }
                ChatEvent::EmailHandled
            }
            ChatPhase::Finished => ChatEvent::Quit,
        };
        phase = phase.next(event);
    }
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_with_email() {
        let p = ChatPhase::AwaitingQuery
            .next(ChatEvent::AnswerReady)
            .next(ChatEvent::EmailRequested);
        assert_eq!(p, ChatPhase::AwaitingRecipient);
        assert_eq!(p.next(ChatEvent::EmailHandled), ChatPhase::AwaitingQuery);
    }

    #[test]
    fn failed_answer_keeps_waiting_for_a_query() {
        assert_eq!(
            ChatPhase::AwaitingQuery.next(ChatEvent::AnswerFailed),
            ChatPhase::AwaitingQuery
        );
    }

    #[test]
    fn declining_email_returns_to_query() {
        assert_eq!(ChatPhase::Answered.next(ChatEvent::NextQuery), ChatPhase::AwaitingQuery);
    }

    #[test]
    fn quit_is_terminal_from_any_phase() {
        for p in [
            ChatPhase::AwaitingQuery,
            ChatPhase::Answered,
            ChatPhase::AwaitingRecipient,
        ] {
            assert_eq!(p.next(ChatEvent::Quit), ChatPhase::Finished);
        }
        assert_eq!(ChatPhase::Finished.next(ChatEvent::AnswerReady), ChatPhase::Finished);
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        assert_eq!(
            ChatPhase::AwaitingQuery.next(ChatEvent::EmailRequested),
            ChatPhase::AwaitingQuery
        );
        assert_eq!(ChatPhase::Answered.next(ChatEvent::EmailHandled), ChatPhase::Answered);
    }
}
