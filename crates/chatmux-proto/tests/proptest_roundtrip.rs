//! Property-based tests for the wire layer.
//!
//! 1. Serialized lines parse back into the same command and parameters.
//! 2. The last parameter is `:`-escaped exactly when it has to be.
//! 3. Framing does not depend on how the byte stream is chunked.

use proptest::prelude::*;
use chatmux_proto::{serialize, FrameSplitter, Message};

fn command_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "PRIVMSG", "NOTICE", "JOIN", "PART", "KICK", "MODE", "TOPIC", "USER", "NICK", "PONG",
    ])
}

/// A parameter that may appear anywhere: no whitespace, no leading colon.
fn middle_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9#&!@.\\-_\\[\\]{}|^~*][a-zA-Z0-9#&!@.:\\-_\\[\\]{}|^~*]{0,20}")
        .expect("valid regex")
}

/// Anything except CR, LF and NUL.
fn trailing_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[^\r\n\0]{0,200}").expect("valid regex"),
        Just(String::new()),
        Just(":".to_string()),
        Just(" ".to_string()),
        Just(":leading".to_string()),
        Just("multiple   spaces   here".to_string()),
    ]
}

fn params_strategy() -> impl Strategy<Value = Vec<String>> {
    (
        prop::collection::vec(middle_strategy(), 0..6),
        prop::option::of(trailing_strategy()),
    )
        .prop_map(|(mut params, trailing)| {
            params.extend(trailing);
            params
        })
}

proptest! {
    #[test]
    fn serialize_then_parse_preserves_params(command in command_strategy(), params in params_strategy()) {
        let line = serialize(command, &params).unwrap();
        prop_assert!(line.ends_with("\r\n"));

        let msg: Message = line.parse().unwrap();
        prop_assert_eq!(msg.command.as_str(), command);
        prop_assert_eq!(msg.params, params);
    }

    #[test]
    fn trailing_escape_law(last in trailing_strategy()) {
        let line = serialize("PRIVMSG", &["#chan".to_string(), last.clone()]).unwrap();
        let needs_colon = last.is_empty()
            || last.starts_with(':')
            || last.contains(char::is_whitespace);
        if needs_colon {
            prop_assert_eq!(line, format!("PRIVMSG #chan :{}\r\n", last));
        } else {
            prop_assert_eq!(line, format!("PRIVMSG #chan {}\r\n", last));
        }
    }

    #[test]
    fn parse_never_panics(input in "[^\0]{0,300}") {
        let _ = input.parse::<Message>();
    }

    #[test]
    fn framing_is_chunking_independent(
        lines in prop::collection::vec("[a-zA-Z0-9 :#]{1,40}", 1..10),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let stream: Vec<u8> = lines.iter().flat_map(|l| format!("{}\r\n", l).into_bytes()).collect();

        let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(stream.len())).collect();
        offsets.sort_unstable();
        offsets.dedup();

        let mut splitter = FrameSplitter::new("utf-8").unwrap();
        let mut seen = Vec::new();
        let mut start = 0;
        for end in offsets.into_iter().chain(std::iter::once(stream.len())) {
            seen.extend(splitter.feed(&stream[start..end]).unwrap());
            start = end;
        }

        prop_assert_eq!(seen, lines);
        prop_assert_eq!(splitter.pending_len(), 0);
    }
}
