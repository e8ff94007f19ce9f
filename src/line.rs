//! Line reassembly codec for tokio.
//!
//! [`LineCodec`] turns an arbitrarily chunked byte stream into complete,
//! terminator-stripped lines, and appends `\r\n` to outbound lines.
//!
//! Bytes after the last `\n` in the buffer are kept and prefixed onto the
//! next read, so partial lines are never dropped or reordered. Decoding
//! works on bytes, so a UTF-8 sequence split across reads is reassembled
//! before it is decoded.
//!
//! # Memory exposure
//!
//! By default the partial-line buffer is unbounded: a hostile server that
//! never sends `\n` can grow it without limit. Use
//! [`LineCodec::with_max_len`] to cap it when talking to untrusted peers.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;

/// Newline-delimited line codec.
#[derive(Debug, Default, Clone)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: Option<usize>,
}

impl LineCodec {
    /// Create an unbounded codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec that rejects lines (and partial lines) longer than `max_len` bytes.
    #[must_use]
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len: Some(max_len),
        }
    }

    fn check_len(&self, actual: usize) -> Result<(), ProtocolError> {
        match self.max_len {
            Some(limit) if actual > limit => Err(ProtocolError::MessageTooLong { actual, limit }),
            _ => Ok(()),
        }
    }
}

/// Strip one trailing `\n` or `\r\n` and decode, replacing invalid UTF-8.
fn decode_line(mut line: BytesMut) -> String {
    if line.ends_with(b"\n") {
        line.truncate(line.len() - 1);
        if line.ends_with(b"\r") {
            line.truncate(line.len() - 1);
        }
    }
    String::from_utf8_lossy(&line).into_owned()
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;
            self.check_len(line.len())?;
            Ok(Some(decode_line(line)))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();
            self.check_len(src.len())?;
            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                // Unterminated tail at end of stream
                self.next_index = 0;
                let tail = src.split_to(src.len());
                Ok(Some(decode_line(tail)))
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

/// Drain every complete line currently buffered, leaving any partial tail in `src`.
pub fn drain_lines(codec: &mut LineCodec, src: &mut BytesMut) -> Result<Vec<String>, ProtocolError> {
    let mut lines = Vec::new();
    while let Some(line) = codec.decode(src)? {
        lines.push(line);
    }
    Ok(lines)
}

/// Number of bytes currently held as an unterminated partial line.
#[must_use]
pub fn pending_len(src: &BytesMut) -> usize {
    src.remaining()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :tmi.twitch.tv\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :tmi.twitch.tv".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_line_is_retained() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :tmi");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(pending_len(&buf), 9);

        buf.extend_from_slice(b".twitch.tv\r\nJOIN #a\r\nPAR");
        let lines = drain_lines(&mut codec, &mut buf).unwrap();
        assert_eq!(lines, vec!["PING :tmi.twitch.tv", "JOIN #a"]);
        assert_eq!(&buf[..], b"PAR");
    }

    #[test]
    fn test_decode_bare_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("a\nb\n");
        let lines = drain_lines(&mut codec, &mut buf).unwrap();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_keeps_empty_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("\r\nx\r\n");
        let lines = drain_lines(&mut codec, &mut buf).unwrap();
        assert_eq!(lines, vec!["", "x"]);
    }

    #[test]
    fn test_decode_split_utf8() {
        let mut codec = LineCodec::new();
        let bytes = "PRIVMSG #a :héllo\r\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xc3).unwrap() + 1;

        let mut buf = BytesMut::from(&bytes[..split]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&bytes[split..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PRIVMSG #a :héllo".to_string())
        );
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this is way too long\n");

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::MessageTooLong { .. })));
    }

    #[test]
    fn test_decode_eof_flushes_tail() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("a\r\nb");
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("a".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("b".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PONG :tmi.twitch.tv".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :tmi.twitch.tv\r\n");
    }
}
