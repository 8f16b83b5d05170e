//! Classified progress messages for a run.
//!
//! Every message is recorded with its class so the whole transcript can be inspected after
//! the run; unless quiet, it is also printed with the matching color.

use colored::Colorize;
use serde::Serialize;

/// Status icons for the message classes
pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const WARNING: &str = "⚠";
    pub const ERROR: &str = "✗";
    pub const ARROW: &str = "→";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressMessage {
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct ProgressReporter {
    quiet: bool,
    transcript: Vec<ProgressMessage>,
}

impl ProgressReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            transcript: Vec::new(),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.emit(MessageKind::Info, text.into());
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.emit(MessageKind::Success, text.into());
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.emit(MessageKind::Warning, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.emit(MessageKind::Error, text.into());
    }

    pub fn transcript(&self) -> &[ProgressMessage] {
        &self.transcript
    }

    pub fn into_transcript(self) -> Vec<ProgressMessage> {
        self.transcript
    }

    fn emit(&mut self, kind: MessageKind, text: String) {
        if !self.quiet {
            println!("{}", format_message(kind, &text));
        }
        self.transcript.push(ProgressMessage { kind, text });
    }
}

/// Format a message for the terminal based on its class
pub fn format_message(kind: MessageKind, text: &str) -> String {
    match kind {
        MessageKind::Info => format!("{} {}", icons::ARROW.cyan(), text),
        MessageKind::Success => format!("{} {}", icons::SUCCESS.green(), text.green()),
        MessageKind::Warning => format!("{} {}", icons::WARNING.yellow(), text.yellow()),
        MessageKind::Error => format!("{} {}", icons::ERROR.red(), text.red()),
    }
}

/// Render a list of names the way messages show them: `[a, b]`.
pub fn format_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    format!("[{}]", joined.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_records_classes() {
        let mut reporter = ProgressReporter::new(true);
        reporter.success("Running best tools...");
        reporter.warning("Nothing found");
        reporter.error("Blind spot");
        let kinds: Vec<_> = reporter.transcript().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MessageKind::Success, MessageKind::Warning, MessageKind::Error]
        );
        assert_eq!(reporter.into_transcript()[1].text, "Nothing found");
    }

    #[test]
    fn test_format_list() {
        assert_eq!(format_list(["slither", "mythril"]), "[slither, mythril]");
        assert_eq!(format_list(Vec::<String>::new()), "[]");
    }
}
