//! Parser behavior on real chat traffic.
//!
//! Each case is a line as the chat server sends it, minus the terminator.

use tmi_notify::{Message, MessageParseError, Origin};

// =============================================================================
// STRUCTURE
// =============================================================================

#[test]
fn test_privmsg_with_tags() {
    let msg = Message::parse(
        "@badge-info=;badges=broadcaster/1;color=#0D4200;display-name=Dallas;emotes=25:0-4;\
         id=b34ccfc7-4977-403a-8a94-33c6bac34fb8;mod=0;room-id=1337;subscriber=0;\
         tmi-sent-ts=1507246572675;turbo=1;user-id=1337;user-type=global_mod \
         :dallas!dallas@dallas.tmi.twitch.tv PRIVMSG #dallas :Kappa Keepo Kappa",
    )
    .unwrap();

    assert_eq!(msg.command, "PRIVMSG");
    assert_eq!(msg.channel.as_deref(), Some("dallas"));
    assert_eq!(msg.login(), Some("dallas"));
    assert_eq!(msg.text(), "Kappa Keepo Kappa");
    assert_eq!(msg.tags.get("display-name"), Some("Dallas"));
    assert_eq!(msg.tags.get("emotes"), Some("25:0-4"));
    assert_eq!(msg.tags.entry("badge-info"), Some(Some("")));
    assert_eq!(msg.tags.parse_value::<u64>("tmi-sent-ts"), Some(1507246572675));
    assert!(msg.unparsed.is_none());
}

#[test]
fn test_server_numeric() {
    let msg = Message::parse(":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!").unwrap();
    assert_eq!(msg.numeric(), Some(1));
    assert_eq!(msg.params.as_deref(), Some("justinfan123"));
    assert!(msg.channel.is_none());
    assert_eq!(msg.text(), "Welcome, GLHF!");

    let origin = msg.origin.as_deref().map(Origin::parse);
    assert_eq!(origin, Some(Origin::Server("tmi.twitch.tv")));
}

#[test]
fn test_names_reply_channel_not_first_param() {
    let msg = Message::parse(
        ":justinfan1.tmi.twitch.tv 353 justinfan1 = #dallas :ronni fred wilma",
    )
    .unwrap();
    assert_eq!(msg.channel.as_deref(), Some("dallas"));
    assert_eq!(msg.param(1), Some("="));
    assert_eq!(msg.text(), "ronni fred wilma");
}

#[test]
fn test_join_without_trailing() {
    let msg = Message::parse(":ronni!ronni@ronni.tmi.twitch.tv JOIN #dallas").unwrap();
    assert_eq!(msg.command, "JOIN");
    assert_eq!(msg.channel.as_deref(), Some("dallas"));
    assert!(msg.trailing.is_none());
    assert_eq!(msg.text(), "");
}

#[test]
fn test_roomstate_tags_only() {
    let msg = Message::parse(
        "@emote-only=0;followers-only=-1;r9k=0;room-id=12345678;slow=0;subs-only=0 \
         :tmi.twitch.tv ROOMSTATE #bar",
    )
    .unwrap();
    assert_eq!(msg.command, "ROOMSTATE");
    assert_eq!(msg.channel.as_deref(), Some("bar"));
    assert_eq!(msg.tags.len(), 6);
    assert_eq!(msg.tags.parse_value::<i32>("followers-only"), Some(-1));
    assert_eq!(msg.tags.flag("subs-only"), Some(false));
}

#[test]
fn test_colon_after_command_means_no_params() {
    let msg = Message::parse("PING :tmi.twitch.tv").unwrap();
    assert_eq!(msg.command, "PING");
    assert!(msg.params.is_none());
    assert_eq!(msg.trailing.as_deref(), Some("tmi.twitch.tv"));
}

#[test]
fn test_trailing_keeps_inner_colons() {
    let msg = Message::parse(":a!a@a PRIVMSG #c :see :this: here").unwrap();
    assert_eq!(msg.text(), "see :this: here");
}

#[test]
fn test_trailing_is_trimmed() {
    let msg = Message::parse(":a!a@a PRIVMSG #c :  padded  ").unwrap();
    assert_eq!(msg.text(), "padded");
}

#[test]
fn test_escaped_tag_values() {
    let msg = Message::parse(
        "@msg-id=sub;system-msg=ronni\\shas\\ssubscribed\\sfor\\s6\\smonths! \
         :tmi.twitch.tv USERNOTICE #dallas :Great stream",
    )
    .unwrap();
    assert_eq!(
        msg.tags.get("system-msg"),
        Some("ronni has subscribed for 6 months!")
    );
    assert_eq!(msg.text(), "Great stream");
}

#[test]
fn test_valueless_tag() {
    let msg = Message::parse("@flag;key=v :tmi.twitch.tv USERSTATE #dallas").unwrap();
    assert!(msg.tags.contains("flag"));
    assert_eq!(msg.tags.entry("flag"), Some(None));
    assert_eq!(msg.tags.get("key"), Some("v"));
}

// =============================================================================
// FAILURES AND ANOMALIES
// =============================================================================

#[test]
fn test_empty_line_fails() {
    assert_eq!(Message::parse(""), Err(MessageParseError::EmptyMessage));
}

#[test]
fn test_origin_only_fails() {
    assert!(matches!(
        Message::parse(":tmi.twitch.tv"),
        Err(MessageParseError::MissingCommand { .. })
    ));
}

#[test]
fn test_tags_only_fails() {
    assert!(matches!(
        Message::parse("@a=b"),
        Err(MessageParseError::MissingCommand { .. })
    ));
}

#[test]
fn test_embedded_cr_is_reported_not_dropped() {
    let msg = Message::parse(":a!a@a PRIVMSG #c :first\rsecond").unwrap();
    assert_eq!(msg.text(), "first");
    assert_eq!(msg.unparsed.as_deref(), Some("\rsecond"));
}

#[test]
fn test_unknown_command_still_parses() {
    let msg = Message::parse(":tmi.twitch.tv SOMETHINGNEW #dallas :payload").unwrap();
    assert_eq!(msg.command, "SOMETHINGNEW");
    assert_eq!(msg.channel.as_deref(), Some("dallas"));
    assert_eq!(msg.text(), "payload");
}

// =============================================================================
// SERIALIZATION
// =============================================================================

#[test]
fn test_display_reproduces_line() {
    for line in [
        ":ronni!ronni@ronni.tmi.twitch.tv JOIN #dallas",
        ":tmi.twitch.tv CLEARCHAT #dallas :ronni",
        "@room-id=1;slow=10 :tmi.twitch.tv ROOMSTATE #dallas",
        "PING :tmi.twitch.tv",
    ] {
        let msg = Message::parse(line).unwrap();
        assert_eq!(msg.to_string(), line);
    }
}
