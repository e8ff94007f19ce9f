//! Benchmarks for chat line parsing, reassembly and gift correlation.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::time::Instant;
use tmi_notify::line::drain_lines;
use tmi_notify::notifications::Aggregator;
use tmi_notify::{Event, LineCodec, Message, NotificationTiming, Tags};

/// Keepalive from the server
const PING: &str = "PING :tmi.twitch.tv";

/// Plain chat message without tags
const PRIVMSG: &str = ":ronni!ronni@ronni.tmi.twitch.tv PRIVMSG #dallas :Kappa Keepo Kappa";

/// Chat message as sent with the tags capability
const TAGGED_PRIVMSG: &str = "@badge-info=;badges=broadcaster/1;color=#0D4200;display-name=Dallas;emotes=25:0-4,12-16/1902:6-10;id=b34ccfc7-4977-403a-8a94-33c6bac34fb8;mod=0;room-id=1337;subscriber=0;tmi-sent-ts=1507246572675;turbo=1;user-id=1337;user-type=global_mod :dallas!dallas@dallas.tmi.twitch.tv PRIVMSG #dallas :Kappa Keepo Kappa";

/// Gift notice with escaped system message
const SUBGIFT: &str = "@badge-info=;badges=staff/1,premium/1;color=#0000FF;display-name=TWW2;emotes=;id=e9176cd8-5e22-4684-ad40-ce53c2561c5e;login=tww2;mod=0;msg-id=subgift;msg-param-months=1;msg-param-recipient-display-name=Mr_Woodchuck;msg-param-recipient-id=55554444;msg-param-recipient-user-name=mr_woodchuck;msg-param-sender-count=0;msg-param-sub-plan-name=House\\sof\\sNyoro~n;msg-param-sub-plan=1000;room-id=19571752;subscriber=0;system-msg=TWW2\\sgifted\\sa\\sTier\\s1\\ssub\\sto\\sMr_Woodchuck!;tmi-sent-ts=1521159445153;turbo=0;user-id=87654321;user-type=staff :tmi.twitch.tv USERNOTICE #forstycup";

/// Numeric greeting line
const NUMERIC: &str = ":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    for (name, line) in [
        ("ping", PING),
        ("privmsg", PRIVMSG),
        ("tagged_privmsg", TAGGED_PRIVMSG),
        ("subgift", SUBGIFT),
        ("numeric", NUMERIC),
    ] {
        group.bench_with_input(BenchmarkId::new("parse", name), line, |b, s| {
            b.iter(|| {
                let msg: Message = black_box(s).parse().unwrap();
                black_box(msg)
            })
        });
    }

    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Serialization");

    let tagged: Message = TAGGED_PRIVMSG.parse().unwrap();
    let subgift: Message = SUBGIFT.parse().unwrap();

    group.bench_function("tagged_privmsg", |b| {
        b.iter(|| black_box(black_box(&tagged).to_string()))
    });

    group.bench_function("subgift", |b| {
        b.iter(|| black_box(black_box(&subgift).to_string()))
    });

    group.finish();
}

fn benchmark_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Reassembly");

    let stream: String = [PING, PRIVMSG, TAGGED_PRIVMSG, SUBGIFT, NUMERIC]
        .iter()
        .cycle()
        .take(100)
        .map(|l| format!("{}\r\n", l))
        .collect();
    let bytes = stream.as_bytes();

    for chunk in [64usize, 512, 4096] {
        group.bench_with_input(BenchmarkId::new("chunked", chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut codec = LineCodec::new();
                let mut buf = BytesMut::with_capacity(chunk * 2);
                let mut count = 0;
                for piece in bytes.chunks(chunk) {
                    buf.extend_from_slice(piece);
                    count += drain_lines(&mut codec, &mut buf).unwrap().len();
                }
                black_box(count)
            })
        });
    }

    group.finish();
}

fn benchmark_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Gift Correlation");

    let gift = |i: usize| {
        let tags = Tags::parse(&format!(
            "login=gifter;msg-id=subgift;msg-param-sub-plan=1000;msg-param-recipient-user-name=user{}",
            i
        ));
        Event::UserNotice {
            channel: "dallas".to_string(),
            login: Some("gifter".to_string()),
            text: String::new(),
            tags,
        }
    };
    let gifts: Vec<Event> = (0..100).map(gift).collect();
    let mass = Event::UserNotice {
        channel: "dallas".to_string(),
        login: Some("gifter".to_string()),
        text: String::new(),
        tags: Tags::parse("login=gifter;msg-id=submysterygift;msg-param-sub-plan=1000;msg-param-mass-gift-count=100"),
    };

    group.bench_function("mass_gift_100", |b| {
        b.iter(|| {
            let mut agg = Aggregator::new(NotificationTiming::default());
            let now = Instant::now();
            let mut out = agg.on_event(&mass, now);
            for event in &gifts {
                out.extend(agg.on_event(event, now));
            }
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_serialization,
    benchmark_reassembly,
    benchmark_correlation,
);

criterion_main!(benches);
