//! Watch a channel anonymously and print chat, room changes and
//! subscription notifications.
//!
//! ```text
//! RUST_LOG=tmi_notify=debug cargo run --example watch_channel -- dallas
//! ```
//!
//! Set `TMI_LOGIN` and `TMI_TOKEN` to log in instead of watching anonymously.

use tmi_notify::notifications::{Notification, Notifications};
use tmi_notify::{Client, ClientConfig, Event, RoomEvent, RoomTracker};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let channel = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dallas".to_string());

    let mut config = ClientConfig::new();
    if let (Ok(login), Ok(token)) = (std::env::var("TMI_LOGIN"), std::env::var("TMI_TOKEN")) {
        config = config.with_login(login).with_token(token);
    }

    let client = Client::new(config).spawn()?;
    let notifications = Notifications::attach(&client);
    let rooms = RoomTracker::attach(&client);

    let mut chat = client.subscribe_filtered(|e| {
        matches!(e, Event::Message { .. } | Event::Error(_) | Event::Ready)
    });
    let mut alerts = notifications.subscribe_any();
    let mut room_changes = rooms.subscribe();

    client.join(&channel)?;
    info!(login = client.login(), %channel, "watching");

    loop {
        tokio::select! {
            Some(event) = chat.recv() => match event {
                Event::Message { channel, login, text, .. } => println!("[#{}] {}: {}", channel, login, text),
                Event::Error(err) => eprintln!("error: {}", err),
                Event::Ready => info!("logged in"),
                _ => {}
            },
            Some(alert) = alerts.recv() => match &alert.notification {
                Notification::MassGiftSub(mass) => println!(
                    "[#{}] {} gifted {} subs to {}",
                    alert.channel,
                    mass.meta.display_name,
                    mass.mass_count,
                    mass.recipients.iter().map(|r| r.display_name.as_str()).collect::<Vec<_>>().join(", "),
                ),
                other => println!("[#{}] {}: {:?}", alert.channel, other.kind(), other),
            },
            Some(change) = room_changes.recv() => {
                if let RoomEvent::StateChanged { channel, state } = change {
                    println!("[#{}] room settings: slow={:?} subs_only={:?}", channel, state.slow, state.subs_only);
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.close();
    Ok(())
}
