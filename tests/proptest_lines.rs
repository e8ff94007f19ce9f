//! Property-based tests for line reassembly and parsing.
//!
//! Verifies that:
//! 1. Any chunking of a byte stream yields the same lines, in order
//! 2. Parsing never panics and always keeps the command verb
//! 3. Serializing a parsed line and parsing it again is stable

use bytes::BytesMut;
use proptest::prelude::*;
use tmi_notify::line::{drain_lines, pending_len};
use tmi_notify::{LineCodec, Message};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Line body without terminators; may contain multi-byte characters.
fn line_body_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n]{0,80}").expect("valid regex")
}

fn login_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{2,24}").expect("valid regex")
}

fn channel_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9_]{1,25}").expect("valid regex")
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[!-~][ -~]{0,120}[!-~]").expect("valid regex")
}

fn tag_strategy() -> impl Strategy<Value = (String, String)> {
    (
        prop::string::string_regex("[a-z][a-z0-9\\-]{0,15}").expect("valid regex"),
        prop::string::string_regex("[a-zA-Z0-9#/,:\\-]{0,20}").expect("valid regex"),
    )
}

/// Split `bytes` at the given (unsorted, possibly duplicate) cut points.
fn chunk(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.push(0);
    points.push(bytes.len());
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| bytes[w[0]..w[1]].to_vec()).collect()
}

// =============================================================================
// REASSEMBLY
// =============================================================================

proptest! {
    #[test]
    fn test_reassembly_is_chunking_independent(
        lines in prop::collection::vec(line_body_strategy(), 1..12),
        cuts in prop::collection::vec(any::<usize>(), 0..20),
        crlf in any::<bool>(),
    ) {
        let terminator = if crlf { "\r\n" } else { "\n" };
        let stream: String = lines.iter().map(|l| format!("{}{}", l, terminator)).collect();

        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();
        for piece in chunk(stream.as_bytes(), &cuts) {
            buf.extend_from_slice(&piece);
            decoded.extend(drain_lines(&mut codec, &mut buf).unwrap());
        }

        prop_assert_eq!(decoded, lines);
        prop_assert_eq!(pending_len(&buf), 0);
    }

    #[test]
    fn test_partial_tail_is_retained(
        head in line_body_strategy(),
        tail in "[a-z]{1,30}",
    ) {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(format!("{}\r\n{}", head, tail).as_str());

        let decoded = drain_lines(&mut codec, &mut buf).unwrap();
        prop_assert_eq!(decoded, vec![head]);
        prop_assert_eq!(pending_len(&buf), tail.len());
    }
}

// =============================================================================
// PARSING
// =============================================================================

proptest! {
    #[test]
    fn test_parse_never_panics(line in "\\PC{0,200}") {
        let _ = Message::parse(&line);
    }

    #[test]
    fn test_privmsg_fields_extracted(
        login in login_strategy(),
        channel in channel_strategy(),
        text in text_strategy(),
    ) {
        let line = format!(
            ":{login}!{login}@{login}.tmi.twitch.tv PRIVMSG #{channel} :{text}",
        );
        let msg = Message::parse(&line).unwrap();

        prop_assert_eq!(msg.command.as_str(), "PRIVMSG");
        prop_assert_eq!(msg.login(), Some(login.as_str()));
        prop_assert_eq!(msg.channel.as_deref(), Some(channel.as_str()));
        prop_assert_eq!(msg.text(), text.as_str());
        prop_assert!(msg.unparsed.is_none());
    }

    #[test]
    fn test_reparse_is_stable(
        tags in prop::collection::vec(tag_strategy(), 0..6),
        login in login_strategy(),
        channel in channel_strategy(),
        text in text_strategy(),
    ) {
        let block: Vec<String> = tags.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        let prefix = if block.is_empty() {
            String::new()
        } else {
            format!("@{} ", block.join(";"))
        };
        let line = format!(
            "{prefix}:{login}!{login}@{login}.tmi.twitch.tv USERNOTICE #{channel} :{text}",
        );

        let first = Message::parse(&line).unwrap();
        let second = Message::parse(&first.to_string()).unwrap();
        prop_assert_eq!(first, second);
    }
}
