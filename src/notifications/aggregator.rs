//! Sans-IO gift correlation.
//!
//! The server announces a mass gift once (`submysterygift`) and then sends
//! one `subgift` per recipient, but does not promise the announcement comes
//! first. [`Aggregator`] holds single gifts briefly in case an announcement
//! for the same gifter, channel and tier shows up, and holds announcements
//! until all of their gifts have arrived or the window closes.
//!
//! Timing is driven by the caller: pass the current instant into every call
//! and call [`Aggregator::poll_expired`] at [`Aggregator::next_deadline`].

use tokio::time::Instant;
use tracing::{debug, trace};

use super::timer::CorrelationTimer;
use super::types::{
    BitsNotice, GiftSubNotice, MassGiftSubNotice, NoticeMeta, Notification, NotificationEvent,
    Recipient, ResubNotice, SubNotice, SubPlan,
};
use crate::config::NotificationTiming;
use crate::event::Event;
use crate::message::Tags;

/// Correlation key: gifter, channel and tier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GiftKey {
    gifter: String,
    channel: String,
    tier: SubPlan,
}

impl GiftKey {
    fn new(gifter: &str, channel: &str, tier: &SubPlan) -> Self {
        Self {
            gifter: gifter.to_string(),
            channel: channel.to_string(),
            tier: tier.clone(),
        }
    }
}

/// A single gift waiting to see whether it belongs to a mass gift.
#[derive(Debug)]
struct PendingGift {
    key: GiftKey,
    notice: GiftSubNotice,
    tags: Tags,
    timer: CorrelationTimer,
}

/// A mass-gift announcement collecting its recipients.
#[derive(Debug)]
struct PendingMassGift {
    key: GiftKey,
    notice: MassGiftSubNotice,
    tags: Tags,
    timer: CorrelationTimer,
}

impl PendingMassGift {
    fn has_capacity(&self) -> bool {
        self.notice.recipients.len() < self.notice.mass_count as usize
    }
}

/// Gift correlation state for every channel the client sees.
#[derive(Debug, Default)]
pub struct Aggregator {
    timing: NotificationTiming,
    gifts: Vec<PendingGift>,
    mass_gifts: Vec<PendingMassGift>,
}

impl Aggregator {
    /// Create an aggregator with the given windows.
    #[must_use]
    pub fn new(timing: NotificationTiming) -> Self {
        Self {
            timing,
            gifts: Vec::new(),
            mass_gifts: Vec::new(),
        }
    }

    /// Number of single gifts and mass gifts still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.gifts.len() + self.mass_gifts.len()
    }

    /// The earliest armed deadline, if anything is pending.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.gifts
            .iter()
            .map(|g| g.timer.deadline())
            .chain(self.mass_gifts.iter().map(|m| m.timer.deadline()))
            .flatten()
            .min()
    }

    /// Feed one connection event. Returns notifications finalized by it.
    pub fn on_event(&mut self, event: &Event, now: Instant) -> Vec<NotificationEvent> {
        match event {
            Event::UserNotice {
                channel,
                login,
                text,
                tags,
            } => {
                let login = login.as_deref().unwrap_or_default();
                self.on_user_notice(channel, login, text, tags, now)
            }
            Event::Message {
                channel,
                login,
                text,
                tags,
            } => bits(channel, login, text, tags).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn on_user_notice(
        &mut self,
        channel: &str,
        login: &str,
        text: &str,
        tags: &Tags,
        now: Instant,
    ) -> Vec<NotificationEvent> {
        let meta = NoticeMeta::from_tags(login, tags);
        let system_msg = tags.get("system-msg").unwrap_or_default().to_string();
        let tier = SubPlan::from_tags(tags);
        let message = Some(text.to_string()).filter(|t| !t.is_empty());

        match tags.get("msg-id").unwrap_or_default() {
            "sub" => vec![finalized(
                channel,
                Notification::Sub(SubNotice {
                    meta,
                    system_msg,
                    tier,
                }),
                tags,
            )],
            "resub" => vec![finalized(
                channel,
                Notification::Resub(ResubNotice {
                    meta,
                    system_msg,
                    tier,
                    months: months(tags, "msg-param-cumulative-months"),
                    message,
                }),
                tags,
            )],
            "subgift" | "anonsubgift" => {
                let notice = GiftSubNotice {
                    meta,
                    system_msg,
                    tier,
                    sender_count: tags.parse_value("msg-param-sender-count").unwrap_or(0),
                    recipient: Recipient {
                        login: tags
                            .get("msg-param-recipient-user-name")
                            .unwrap_or_default()
                            .to_string(),
                        display_name: tags
                            .get("msg-param-recipient-display-name")
                            .unwrap_or_default()
                            .to_string(),
                    },
                    months: months(tags, "msg-param-months"),
                    message,
                };
                self.on_gift(channel, notice, tags, now)
            }
            "submysterygift" | "anonsubmysterygift" => {
                let notice = MassGiftSubNotice {
                    meta,
                    system_msg,
                    tier,
                    sender_count: tags.parse_value("msg-param-sender-count").unwrap_or(0),
                    mass_count: tags.parse_value("msg-param-mass-gift-count").unwrap_or(0),
                    recipients: Vec::new(),
                };
                self.on_mass_gift(channel, notice, tags, now)
            }
            other => {
                trace!(msg_id = other, "usernotice needs no notification");
                Vec::new()
            }
        }
    }

    fn on_gift(
        &mut self,
        channel: &str,
        notice: GiftSubNotice,
        tags: &Tags,
        now: Instant,
    ) -> Vec<NotificationEvent> {
        let key = GiftKey::new(&notice.meta.login, channel, &notice.tier);

        if let Some(idx) = self
            .mass_gifts
            .iter()
            .position(|m| m.key == key && m.has_capacity())
        {
            let mass = &mut self.mass_gifts[idx];
            mass.notice.recipients.push(notice.recipient);
            trace!(
                gifter = %key.gifter,
                collected = mass.notice.recipients.len(),
                expected = mass.notice.mass_count,
                "gift absorbed into mass gift"
            );
            if mass.has_capacity() {
                mass.timer.rearm(now + self.timing.gift_delay);
                return Vec::new();
            }
            let mut mass = self.mass_gifts.remove(idx);
            mass.timer.cancel();
            return vec![finish_mass_gift(mass)];
        }

        self.gifts.push(PendingGift {
            key,
            notice,
            tags: tags.clone(),
            timer: CorrelationTimer::armed(now + self.timing.gift_delay),
        });
        Vec::new()
    }

    fn on_mass_gift(
        &mut self,
        channel: &str,
        mut notice: MassGiftSubNotice,
        tags: &Tags,
        now: Instant,
    ) -> Vec<NotificationEvent> {
        let key = GiftKey::new(&notice.meta.login, channel, &notice.tier);
        let capacity = notice.mass_count as usize;

        let mut idx = 0;
        while idx < self.gifts.len() && notice.recipients.len() < capacity {
            if self.gifts[idx].key == key {
                let mut gift = self.gifts.remove(idx);
                gift.timer.cancel();
                notice.recipients.push(gift.notice.recipient);
            } else {
                idx += 1;
            }
        }

        let mass = PendingMassGift {
            key,
            notice,
            tags: tags.clone(),
            timer: CorrelationTimer::armed(now + self.timing.mass_gift_delay),
        };
        if mass.has_capacity() {
            self.mass_gifts.push(mass);
            Vec::new()
        } else {
            let mut mass = mass;
            mass.timer.cancel();
            vec![finish_mass_gift(mass)]
        }
    }

    /// Finalize every entry whose timer is due, earliest deadline first.
    pub fn poll_expired(&mut self, now: Instant) -> Vec<NotificationEvent> {
        let mut out = Vec::new();
        loop {
            let gift = self
                .gifts
                .iter()
                .enumerate()
                .filter(|(_, g)| g.timer.is_due(now))
                .filter_map(|(i, g)| g.timer.deadline().map(|d| (d, i)))
                .min();
            let mass = self
                .mass_gifts
                .iter()
                .enumerate()
                .filter(|(_, m)| m.timer.is_due(now))
                .filter_map(|(i, m)| m.timer.deadline().map(|d| (d, i)))
                .min();

            match (gift, mass) {
                (Some((gd, gi)), Some((md, _))) if gd <= md => {
                    out.push(self.fire_gift(gi, now));
                }
                (_, Some((_, mi))) => {
                    let mut mass = self.mass_gifts.remove(mi);
                    mass.timer.fire(now);
                    out.push(finish_mass_gift(mass));
                }
                (Some((_, gi)), None) => {
                    out.push(self.fire_gift(gi, now));
                }
                (None, None) => break,
            }
        }
        out
    }

    fn fire_gift(&mut self, idx: usize, now: Instant) -> NotificationEvent {
        let mut gift = self.gifts.remove(idx);
        gift.timer.fire(now);
        debug!(
            gifter = %gift.key.gifter,
            channel = %gift.key.channel,
            "gift sub finalized"
        );
        finalized(
            &gift.key.channel,
            Notification::GiftSub(gift.notice),
            &gift.tags,
        )
    }

    /// Finalize everything still pending, regardless of deadlines.
    pub fn flush(&mut self) -> Vec<NotificationEvent> {
        let mut out: Vec<NotificationEvent> = Vec::with_capacity(self.pending());
        for mut gift in self.gifts.drain(..) {
            gift.timer.cancel();
            out.push(finalized(
                &gift.key.channel,
                Notification::GiftSub(gift.notice),
                &gift.tags,
            ));
        }
        for mut mass in self.mass_gifts.drain(..) {
            mass.timer.cancel();
            out.push(finish_mass_gift(mass));
        }
        out
    }
}

fn finish_mass_gift(mass: PendingMassGift) -> NotificationEvent {
    debug!(
        gifter = %mass.key.gifter,
        channel = %mass.key.channel,
        recipients = mass.notice.recipients.len(),
        expected = mass.notice.mass_count,
        "mass gift finalized"
    );
    finalized(
        &mass.key.channel,
        Notification::MassGiftSub(mass.notice),
        &mass.tags,
    )
}

fn finalized(channel: &str, notification: Notification, tags: &Tags) -> NotificationEvent {
    NotificationEvent {
        channel: channel.to_string(),
        notification,
        tags: Some(tags.clone()),
    }
}

fn months(tags: &Tags, key: &str) -> u32 {
    tags.parse_value(key).unwrap_or(1).max(1)
}

fn bits(channel: &str, login: &str, text: &str, tags: &Tags) -> Option<NotificationEvent> {
    let bits = tags.parse_value::<u32>("bits").filter(|b| *b > 0)?;
    Some(finalized(
        channel,
        Notification::Bits(BitsNotice {
            meta: NoticeMeta::from_tags(login, tags),
            bits,
            message: text.to_string(),
        }),
        tags,
    ))
}
