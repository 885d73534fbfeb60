//! The short "ping" that accompanies the first celebration.
//!
//! Terminal bell plus an optional desktop notification through notify-rust
//! (Notification Center on macOS, D-Bus on Linux, toasts on Windows). Both are
//! best effort and never report failure.

use notify_rust::Notification;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct PingPrefs {
    pub bell: bool,
    pub desktop: bool,
}

pub fn ping(prefs: PingPrefs, record_count: usize) {
    if prefs.bell {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
    if prefs.desktop {
        let _ = Notification::new()
            .summary("PR Party 🎉")
            .body(&party_message(record_count))
            .icon("emblem-default")
            .timeout(3500)
            .show();
    }
}

fn party_message(count: usize) -> String {
    if count == 1 {
        "1 pull request is in the house".to_string()
    } else {
        format!("{count} pull requests are in the house")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_pluralizes() {
        assert_eq!(party_message(1), "1 pull request is in the house");
        assert_eq!(party_message(7), "7 pull requests are in the house");
    }
}
