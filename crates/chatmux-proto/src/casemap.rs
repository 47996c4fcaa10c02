//! Nickname case-folding.
//!
//! Nicknames and channel names are compared case-insensitively. Folding is
//! used for equality and map keys only; the original spelling is what gets
//! stored and displayed.

/// Fold a single character.
///
/// ASCII letters are lowercased, then:
/// - `[` → `{`
/// - `]` → `}`
/// - `|` → `\`
/// - `^` → `~`
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '|' => '\\',
        '^' => '~',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Fold a whole string. See [`irc_lower_char`].
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Compare two strings after folding.
pub fn irc_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.chars()
        .zip(b.chars())
        .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}
