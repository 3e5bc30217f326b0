//! Line-oriented command parsing.

use crate::domain::wizard::StepKind;

/// One line of user input, classified without regard to the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    SaveKey(String),
    ClearKey,
    Reset,
    /// A bare Enter.
    Confirm,
    /// A 1-based number.
    Pick(usize),
    FollowUp(String),
    View(usize),
    Delete(usize),
    Import(String),
    Letter(char),
    /// Anything else, trimmed.
    Text(String),
}

impl Command {
    /// Parses a line typed on the `step` screen.
    ///
    /// On problem entry everything except `:`-prefixed commands is problem
    /// text, so a sentence that happens to start with `i ` or `?` is never
    /// taken for a command.
    pub fn parse_for(step: StepKind, line: &str) -> Command {
        let trimmed = line.trim();
        if step != StepKind::AskingProblem || trimmed.starts_with(':') {
            return Command::parse(line);
        }
        if trimmed.is_empty() {
            Command::Confirm
        } else {
            Command::Text(trimmed.to_string())
        }
    }

    /// Parses a line without regard to the current screen.
    pub fn parse(line: &str) -> Command {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix(':') {
            let (name, arg) = split_word(rest);
            match name {
                "q" | "quit" => return Command::Quit,
                "key" => return Command::SaveKey(arg.to_string()),
                "clearkey" => return Command::ClearKey,
                "reset" => return Command::Reset,
                _ => {}
            }
            let mut chars = rest.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Command::Letter(c.to_ascii_lowercase());
            }
        }

        if line.is_empty() {
            return Command::Confirm;
        }
        if let Ok(n) = line.parse::<usize>() {
            if n > 0 {
                return Command::Pick(n);
            }
        }
        if let Some(query) = line.strip_prefix('?') {
            return Command::FollowUp(query.trim().to_string());
        }

        let (head, arg) = split_word(line);
        match (head, arg.parse::<usize>()) {
            ("v", Ok(n)) if n > 0 => return Command::View(n),
            ("d", Ok(n)) if n > 0 => return Command::Delete(n),
            _ => {}
        }
        if head == "i" && !arg.is_empty() {
            return Command::Import(arg.to_string());
        }

        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Command::Letter(c.to_ascii_lowercase()),
            _ => Command::Text(line.to_string()),
        }
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (s, ""),
    }
}
