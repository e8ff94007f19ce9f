//! Fuzz target for chat line parsing
//!
//! Feeds arbitrary text to the parser and the session state machine. Neither
//! may panic, and anything that parses must survive a second parse of its
//! own serialization.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

use tmi_notify::state::Session;
use tmi_notify::{ClientConfig, Message};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = str::from_utf8(data) else {
        return;
    };
    if input.is_empty() || input.len() > 4096 {
        return;
    }

    if let Ok(msg) = input.parse::<Message>() {
        let _ = Message::parse(&msg.to_string());
    }

    let config = ClientConfig::new().with_greeting(["GLHF"]);
    let mut session = Session::new(&config, "justinfan1");
    session.begin_connect();
    session.on_connected(None);
    session.on_line(":tmi.twitch.tv 001 justinfan1 :Welcome, GLHF!");
    for line in input.lines() {
        let _ = session.on_line(line);
    }
});
