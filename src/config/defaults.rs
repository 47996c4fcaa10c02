//! Default value functions for configuration.

use chatmux_proto::MAX_IRC_LINE_LEN;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

pub fn default_port() -> u16 {
    6667
}

pub fn default_encoding() -> String {
    "utf-8".to_string()
}

pub fn default_retry_delay_ms() -> u64 {
    2000
}

pub fn default_max_line_length() -> usize {
    MAX_IRC_LINE_LEN
}
