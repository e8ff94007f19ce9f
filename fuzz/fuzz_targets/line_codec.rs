//! Fuzz target for line reassembly
//!
//! The first byte picks a chunk size; the rest is split into chunks of that
//! size. Lines decoded from the chunks must match lines decoded from the
//! whole buffer at once.

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tmi_notify::line::drain_lines;
use tmi_notify::LineCodec;

fuzz_target!(|data: &[u8]| {
    let Some((&size, body)) = data.split_first() else {
        return;
    };
    let size = usize::from(size.max(1));

    let mut codec = LineCodec::new();
    let mut whole = BytesMut::from(body);
    let expected = drain_lines(&mut codec, &mut whole).unwrap_or_default();

    let mut codec = LineCodec::new();
    let mut buf = BytesMut::new();
    let mut lines = Vec::new();
    for chunk in body.chunks(size) {
        buf.extend_from_slice(chunk);
        lines.extend(drain_lines(&mut codec, &mut buf).unwrap_or_default());
    }

    assert_eq!(lines, expected);
    assert_eq!(buf, whole);
});
