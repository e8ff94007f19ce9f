//! Random, plausible notifications for testing overlays and consumers.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use super::types::{
    BitsNotice, GiftSubNotice, MassGiftSubNotice, NoticeMeta, Notification, NotificationKind,
    Recipient, ResubNotice, SubNotice, SubPlan,
};
use crate::util::random_digits;

/// Channel used when none is given.
pub const DUMMY_CHANNEL: &str = "DummyChannel";

const PAID_TIERS: [SubPlan; 3] = [SubPlan::Tier1, SubPlan::Tier2, SubPlan::Tier3];
const ALL_TIERS: [SubPlan; 4] = [SubPlan::Prime, SubPlan::Tier1, SubPlan::Tier2, SubPlan::Tier3];

/// Build a random notification of `kind`, or of a random kind when `None`.
#[must_use]
pub fn dummy_notification(kind: Option<NotificationKind>, channel: &str) -> Notification {
    let mut rng = rand::thread_rng();
    let kind = kind.unwrap_or_else(|| {
        *NotificationKind::ALL
            .choose(&mut rng)
            .unwrap_or(&NotificationKind::Sub)
    });

    let affix = random_digits(5);
    let meta = NoticeMeta {
        login: format!("dummyfan{}", affix),
        display_name: format!("DummyFan{}", affix),
        id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
    };

    match kind {
        NotificationKind::Sub => {
            let tier = pick(&ALL_TIERS, &mut rng);
            Notification::Sub(SubNotice {
                system_msg: format!("{} subscribed with {}.", meta.display_name, tier.label()),
                meta,
                tier,
            })
        }
        NotificationKind::Resub => {
            let tier = pick(&ALL_TIERS, &mut rng);
            let months = rng.gen_range(1..=23);
            let message = (rng.gen_range(0..3) != 1)
                .then(|| format!("Dummy message {}", random_digits(5)));
            Notification::Resub(ResubNotice {
                system_msg: format!(
                    "{} subscribed with {}. They've subscribed for {} months!",
                    meta.display_name,
                    tier.label(),
                    months
                ),
                meta,
                tier,
                months,
                message,
            })
        }
        NotificationKind::GiftSub => {
            let tier = pick(&PAID_TIERS, &mut rng);
            let recipient = dummy_recipient();
            let sender_count = rng.gen_range(0..500u32).saturating_sub(200);
            let mut system_msg = format!(
                "{} gifted a {} sub to {}!",
                meta.display_name,
                tier.label(),
                recipient.display_name
            );
            if sender_count > 1 {
                system_msg.push_str(&format!(
                    " They have given {} Gift Subs in the channel!",
                    sender_count
                ));
            }
            Notification::GiftSub(GiftSubNotice {
                meta,
                system_msg,
                tier,
                sender_count,
                recipient,
                months: rng.gen_range(1..=12),
                message: None,
            })
        }
        NotificationKind::MassGiftSub => {
            let tier = pick(&PAID_TIERS, &mut rng);
            let mass_count = *[5u32, 5, 5, 10, 10, 100].choose(&mut rng).unwrap_or(&5);
            let sender_count = rng.gen_range(0..500u32).saturating_sub(200) + mass_count;
            Notification::MassGiftSub(MassGiftSubNotice {
                system_msg: format!(
                    "{} is gifting {} {} Subs to {}'s community! They've gifted a total of {} in the channel!",
                    meta.display_name,
                    mass_count,
                    tier.label(),
                    channel,
                    sender_count
                ),
                meta,
                tier,
                sender_count,
                mass_count,
                recipients: (0..mass_count).map(|_| dummy_recipient()).collect(),
            })
        }
        NotificationKind::Bits => {
            let bits = *[1u32, 100, 1000, 10000].choose(&mut rng).unwrap_or(&1);
            Notification::Bits(BitsNotice {
                meta,
                bits,
                message: format!("Dummy message {} cheer{}", random_digits(5), bits),
            })
        }
    }
}

fn pick<R: Rng>(tiers: &[SubPlan], rng: &mut R) -> SubPlan {
    tiers.choose(rng).cloned().unwrap_or(SubPlan::Tier1)
}

fn dummy_recipient() -> Recipient {
    let affix = random_digits(5);
    Recipient {
        login: format!("dummytarget{}", affix),
        display_name: format!("DummyTarget{}", affix),
    }
}
