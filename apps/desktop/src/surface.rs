//! Terminal rendering of the presentation view and parsing of input lines.

use client_core::{Display, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Submit(String),
    Retry,
    Refresh,
    Dismiss,
    Help,
    Quit,
}

pub const HELP: &str = "type a message and press enter to submit; \
:retry resends the last draft, :refresh reloads, :dismiss clears an error, :quit exits";

/// Anything that is not a `:` command is a submission, including an empty
/// line.
pub fn parse_input(line: &str) -> InputAction {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.trim() {
        ":retry" => InputAction::Retry,
        ":refresh" | ":r" => InputAction::Refresh,
        ":dismiss" | ":d" => InputAction::Dismiss,
        ":help" | ":h" => InputAction::Help,
        ":quit" | ":q" => InputAction::Quit,
        _ => InputAction::Submit(line.to_string()),
    }
}

/// The text box. Holds what was last submitted until the write lands.
#[derive(Debug, Default)]
pub struct InputBuffer {
    draft: Option<String>,
}

impl InputBuffer {
    pub fn record(&mut self, text: &str) {
        self.draft = (!text.is_empty()).then(|| text.to_string());
    }

    pub fn clear(&mut self) {
        self.draft = None;
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }
}

pub fn draw(view: &View, draft: Option<&str>) -> String {
    let display = match &view.display {
        Display::Value(value) => format!("message: {value}"),
        Display::Error(message) => format!("error: {message}"),
        Display::Placeholder(text) => format!("... {text}"),
    };
    let button = if view.button_enabled {
        format!("[ {} ]", view.button_label)
    } else {
        format!("[ {} ] (disabled)", view.button_label)
    };
    match draft {
        Some(draft) => format!("{display}\n{button}  draft: {draft}"),
        None => format!("{display}\n{button}"),
    }
}

#[cfg(test)]
mod tests {
    use client_core::{presentation::LABEL_SENDING, render, InteractionState};
    use shared::error::LedgerError;

    use super::*;

    #[test]
    fn commands_and_submissions_are_distinguished() {
        assert_eq!(parse_input(":quit\n"), InputAction::Quit);
        assert_eq!(parse_input(" :refresh "), InputAction::Refresh);
        assert_eq!(parse_input(":retry"), InputAction::Retry);
        assert_eq!(
            parse_input("  hello world \r\n"),
            InputAction::Submit("  hello world ".to_string())
        );
        assert_eq!(parse_input("\n"), InputAction::Submit(String::new()));
    }

    #[test]
    fn empty_submissions_leave_no_draft() {
        let mut buffer = InputBuffer::default();
        buffer.record("gm");
        assert_eq!(buffer.draft(), Some("gm"));
        buffer.record("");
        assert_eq!(buffer.draft(), None);
        buffer.record("again");
        buffer.clear();
        assert_eq!(buffer.draft(), None);
    }

    #[test]
    fn error_lines_never_look_like_messages() {
        let failed = draw(
            &render(&InteractionState::Failed(LedgerError::SigningRejected)),
            Some("x"),
        );
        assert!(failed.starts_with("error: "));
        assert!(failed.ends_with("[ Update message ]  draft: x"));

        let ready = draw(&render(&InteractionState::Ready("hi".into())), None);
        assert_eq!(ready, "message: hi\n[ Update message ]");

        let sending = draw(&render(&InteractionState::Submitting), None);
        assert!(sending.contains(&format!("[ {LABEL_SENDING} ] (disabled)")));
    }
}
