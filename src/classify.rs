use regex::Regex;
use std::sync::OnceLock;

/// Bracketed tag written by current servers and the raw TNFS open-file command code
/// written by older ones. Both mean a client opened an image.
const OPEN_MARKERS: &str = r"(?i)\[OPEN\]|\b0x29\b";

/// Placeholder the server logs when no real file was involved.
const PHANTOM_PATTERN: &str = r"(?i)phantom";

fn open_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(OPEN_MARKERS).expect("open marker pattern is valid"))
}

fn phantom() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHANTOM_PATTERN).expect("phantom pattern is valid"))
}

/// One parsed line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Kept exactly as logged.
    pub timestamp: String,
    pub client_address: String,
    pub command: String,
    /// Empty when no file was referenced or the server logged a phantom name.
    pub filename: String,
}

impl LogRecord {
    pub fn new(timestamp: &str, client_address: &str, message: &str) -> Self {
        let (command, filename) = classify_message(message);
        Self {
            timestamp: timestamp.to_string(),
            client_address: client_address.to_string(),
            command,
            filename,
        }
    }

    /// A mount event is an open command that names a real file.
    pub fn is_mount(&self) -> bool {
        is_open_command(&self.command) && !self.filename.is_empty()
    }
}

/// Splits a message on its first whitespace run into `(command, filename)`.
pub fn classify_message(message: &str) -> (String, String) {
    let message = message.trim();
    let (command, rest) = match message.find(char::is_whitespace) {
        Some(idx) => (&message[..idx], message[idx..].trim_start()),
        None => (message, ""),
    };

    let filename = if phantom().is_match(rest) { "" } else { rest };
    (command.to_string(), filename.to_string())
}

pub fn is_open_command(command: &str) -> bool {
    open_markers().is_match(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_and_filename() {
        assert_eq!(
            classify_message("[OPEN] game1.atr"),
            ("[OPEN]".to_string(), "game1.atr".to_string())
        );
    }

    #[test]
    fn splits_on_first_whitespace_run_only() {
        assert_eq!(
            classify_message("0x29 \t  Games/Star Raiders.atr"),
            ("0x29".to_string(), "Games/Star Raiders.atr".to_string())
        );
    }

    #[test]
    fn message_without_whitespace_is_all_command() {
        assert_eq!(
            classify_message("[MOUNT]"),
            ("[MOUNT]".to_string(), String::new())
        );
    }

    #[test]
    fn phantom_filenames_are_dropped() {
        for name in ["phantom.atr", "PHANTOM", "dir/Phantom_disk.xex", "aphantomb"] {
            let (_, filename) = classify_message(&format!("[OPEN] {}", name));
            assert_eq!(filename, "", "{} should be treated as no file", name);
        }
    }

    #[test]
    fn recognizes_both_open_markers() {
        assert!(is_open_command("[OPEN]"));
        assert!(is_open_command("[open]"));
        assert!(is_open_command("0x29"));
        assert!(is_open_command("CMD:0x29"));
        assert!(!is_open_command("[CLOSE]"));
        assert!(!is_open_command("0x290"));
        assert!(!is_open_command("0x23"));
    }

    #[test]
    fn mount_requires_a_real_file() {
        assert!(LogRecord::new("t", "8.8.8.8", "[OPEN] game1.atr").is_mount());
        assert!(!LogRecord::new("t", "8.8.8.8", "[OPEN] phantom.atr").is_mount());
        assert!(!LogRecord::new("t", "8.8.8.8", "[OPEN]").is_mount());
        assert!(!LogRecord::new("t", "8.8.8.8", "[MOUNT] /").is_mount());
    }
}
