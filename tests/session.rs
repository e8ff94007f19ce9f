//! Scripted conversations against the sans-IO session.

use std::time::Duration;

use tmi_notify::state::{Action, ConnectionState, Session};
use tmi_notify::{ClientConfig, Event, EventKind};

const GREETING: [&str; 3] = [
    ":tmi.twitch.tv 001 justinfan7 :Welcome, GLHF!",
    ":tmi.twitch.tv 003 justinfan7 :You are in a maze of twisty passages, all alike.",
    ":tmi.twitch.tv 376 justinfan7 :>",
];

fn ready(config: &ClientConfig) -> Session {
    let mut session = Session::new(config, "justinfan7");
    session.begin_connect();
    session.on_connected(None);
    for line in GREETING {
        session.on_line(line);
    }
    assert_eq!(session.state(), ConnectionState::Ready);
    session
}

fn typed(actions: Vec<Action>) -> Vec<Event> {
    actions
        .into_iter()
        .filter_map(|a| match a {
            Action::Emit(event) if event.kind() != EventKind::Raw => Some(event),
            _ => None,
        })
        .collect()
}

#[test]
fn test_chat_traffic_maps_to_events() {
    let mut session = ready(&ClientConfig::new());

    let events = typed(session.on_line(
        "@color=#1E90FF;display-name=Ronni :ronni!ronni@ronni.tmi.twitch.tv PRIVMSG #dallas :hello world",
    ));
    match events.as_slice() {
        [Event::Message { channel, login, text, tags }] => {
            assert_eq!(channel, "dallas");
            assert_eq!(login, "ronni");
            assert_eq!(text, "hello world");
            assert_eq!(tags.get("display-name"), Some("Ronni"));
        }
        other => panic!("Expected Message, got {:?}", other),
    }

    let events = typed(session.on_line("@slow=10 :tmi.twitch.tv ROOMSTATE #dallas"));
    assert!(matches!(
        events.as_slice(),
        [Event::RoomState { channel, tags }] if channel == "dallas" && tags.get("slow") == Some("10")
    ));

    let events = typed(session.on_line(
        "@msg-id=slow_off :tmi.twitch.tv NOTICE #dallas :This room is no longer in slow mode.",
    ));
    assert!(matches!(
        events.as_slice(),
        [Event::Notice { channel: Some(c), text, .. }] if c == "dallas" && text.starts_with("This room")
    ));

    let events = typed(session.on_line(":tmi.twitch.tv NOTICE * :Improperly formatted auth"));
    assert!(matches!(events.as_slice(), [Event::Notice { channel: None, .. }]));

    let events = typed(session.on_line(
        "@login=ronni;target-msg-id=abc-123 :tmi.twitch.tv CLEARMSG #dallas :bad word",
    ));
    assert!(matches!(
        events.as_slice(),
        [Event::ClearMsg { channel, tags }] if channel == "dallas" && tags.get("target-msg-id") == Some("abc-123")
    ));

    let events = typed(session.on_line("@color=#0D4200;user-id=1 :tmi.twitch.tv GLOBALUSERSTATE"));
    assert!(matches!(events.as_slice(), [Event::GlobalUserState { .. }]));

    let events = typed(session.on_line("@mod=1 :tmi.twitch.tv USERSTATE #dallas"));
    assert!(matches!(
        events.as_slice(),
        [Event::UserState { channel, .. }] if channel == "dallas"
    ));
}

#[test]
fn test_every_ready_line_is_raw_first() {
    let mut session = ready(&ClientConfig::new());
    let actions = session.on_line(":ronni!ronni@ronni.tmi.twitch.tv JOIN #dallas");
    match actions.as_slice() {
        [Action::Emit(Event::Raw { line, message }), Action::Emit(Event::OtherJoin { login, .. })] => {
            assert_eq!(line, ":ronni!ronni@ronni.tmi.twitch.tv JOIN #dallas");
            assert_eq!(message.command, "JOIN");
            assert_eq!(login, "ronni");
        }
        other => panic!("Unexpected actions {:?}", other),
    }
}

#[test]
fn test_channel_command_without_channel_is_raw_only() {
    let mut session = ready(&ClientConfig::new());
    let actions = session.on_line(":ronni!ronni@ronni.tmi.twitch.tv PRIVMSG dallas :no sigil");
    assert_eq!(actions.len(), 1);
    assert!(matches!(&actions[0], Action::Emit(Event::Raw { .. })));
}

#[test]
fn test_unknown_command_is_raw_only() {
    let mut session = ready(&ClientConfig::new());
    let actions = session.on_line(":tmi.twitch.tv 366 justinfan7 #dallas :End of /NAMES list");
    assert_eq!(actions.len(), 1);
}

#[test]
fn test_anomaly_reported_before_raw() {
    let mut session = ready(&ClientConfig::new());
    let actions = session.on_line(":a!a@a PRIVMSG #dallas :one\rtwo");
    assert!(matches!(
        &actions[0],
        Action::Emit(Event::ParseAnomaly { unparsed, .. }) if unparsed == "\rtwo"
    ));
    assert!(matches!(&actions[1], Action::Emit(Event::Raw { .. })));
    assert!(matches!(&actions[2], Action::Emit(Event::Message { text, .. }) if text == "one"));
}

#[test]
fn test_lines_before_login_are_not_dispatched() {
    let mut session = Session::new(&ClientConfig::new(), "justinfan7");
    session.begin_connect();
    session.on_connected(None);
    let actions = session.on_line(":ronni!ronni@ronni.tmi.twitch.tv PRIVMSG #dallas :early");
    assert!(actions.is_empty());
}

#[test]
fn test_custom_greeting() {
    let config = ClientConfig::new().with_greeting(["hello", "ready"]);
    let mut session = Session::new(&config, "justinfan7");
    session.begin_connect();
    session.on_connected(None);

    assert!(session.on_line(":srv 001 justinfan7 :hello there").is_empty());
    let actions = session.on_line(":srv 002 justinfan7 :now ready");
    assert!(matches!(actions.last(), Some(Action::Emit(Event::Ready))));
}

#[test]
fn test_reconnect_policy() {
    let config = ClientConfig::new().with_reconnect_delay(Duration::from_secs(2));
    let mut session = ready(&config);
    let actions = session.on_disconnected();
    assert!(matches!(
        actions.as_slice(),
        [
            Action::Emit(Event::Disconnected { reconnect_in: Some(d) }),
            Action::ScheduleReconnect(delay),
        ] if *d == Duration::from_secs(2) && *delay == Duration::from_secs(2)
    ));

    let config = ClientConfig::new().with_auto_reconnect(false);
    let mut session = ready(&config);
    let actions = session.on_disconnected();
    assert!(matches!(
        actions.as_slice(),
        [Action::Emit(Event::Disconnected { reconnect_in: None })]
    ));
}

#[test]
fn test_connect_after_close_reenables_reconnect() {
    let mut session = ready(&ClientConfig::new());
    session.close();
    session.on_disconnected();
    assert!(session.is_user_closed());

    session.begin_connect();
    assert!(!session.is_user_closed());
    session.on_connected(None);
    let actions = session.on_disconnected();
    assert!(matches!(actions.last(), Some(Action::ScheduleReconnect(_))));
}

#[test]
fn test_server_reconnect_during_login() {
    let mut session = Session::new(&ClientConfig::new(), "justinfan7");
    session.begin_connect();
    session.on_connected(None);
    let actions = session.on_line(":tmi.twitch.tv RECONNECT");
    assert!(matches!(
        actions.as_slice(),
        [
            Action::Emit(Event::Disconnected { reconnect_in: Some(Duration::ZERO) }),
            Action::Reconnect,
        ]
    ));
}
