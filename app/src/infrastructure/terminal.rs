use std::sync::{Mutex, PoisonError};

use colored::{ColoredString, Colorize};
use domain::{
    model::vo::StatusView,
    service::{LogSink, StatusSink},
};

/// Prints status changes on stdout.
pub struct TerminalStatusSink;

impl StatusSink for TerminalStatusSink {
    fn render_status(&self, view: &StatusView) {
        if view.label.is_empty() {
            println!("{}", "no job selected".dimmed());
            return;
        }
        let hint = if view.kill_enabled { " (type `kill` to cancel)" } else { "" };
        println!("{} {}{}", "status:".bold(), paint(view.label), hint.dimmed());
    }

    fn set_kill_enabled(&self, enabled: bool) {
        if !enabled {
            println!("{}", "kill unavailable".dimmed());
        }
    }
}

fn paint(label: &str) -> ColoredString {
    match label {
        "COMPLETED (SUCCESS)" => label.green(),
        "COMPLETED (FAILURE)" => label.red(),
        "QUEUED" | "RUNNING" => label.yellow(),
        _ => label.normal(),
    }
}

/// Prints a tailed log on stdout, only the appended part when the log grew.
pub struct TerminalLogSink {
    name: String,
    printed: Mutex<String>,
}

impl TerminalLogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            printed: Mutex::default(),
        }
    }
}

impl LogSink for TerminalLogSink {
    fn render_log(&self, text: &str, scroll_to_end: bool) {
        let mut printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
        match appended(&printed, text, scroll_to_end) {
            Some(suffix) => print!("{suffix}"),
            None => {
                println!("{}", format!("==> {} <==", self.name).cyan());
                print!("{text}");
                if !text.ends_with('\n') {
                    println!();
                }
            }
        }
        text.clone_into(&mut printed);
    }
}

/// The new tail of `text` if it only extends what is already on screen.
fn appended<'a>(printed: &str, text: &'a str, scroll_to_end: bool) -> Option<&'a str> {
    if !scroll_to_end || printed.is_empty() || !printed.ends_with('\n') {
        return None;
    }
    text.strip_prefix(printed)
}
