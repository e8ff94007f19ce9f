//! Notification payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

use crate::message::Tags;

/// Subscription tier, as sent in `msg-param-sub-plan`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubPlan {
    /// Prime Gaming subscription.
    Prime,
    /// Tier 1 (`1000`).
    Tier1,
    /// Tier 2 (`2000`).
    Tier2,
    /// Tier 3 (`3000`).
    Tier3,
    /// A plan this crate does not know.
    Other(String),
}

impl SubPlan {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SubPlan::Prime => "Prime",
            SubPlan::Tier1 => "1000",
            SubPlan::Tier2 => "2000",
            SubPlan::Tier3 => "3000",
            SubPlan::Other(plan) => plan,
        }
    }

    /// Human-readable name used in system messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            SubPlan::Prime => "Prime Gaming".to_string(),
            SubPlan::Tier1 => "Tier 1".to_string(),
            SubPlan::Tier2 => "Tier 2".to_string(),
            SubPlan::Tier3 => "Tier 3".to_string(),
            SubPlan::Other(plan) => plan.clone(),
        }
    }

    /// Read the plan from notice tags, defaulting to tier 1.
    #[must_use]
    pub fn from_tags(tags: &Tags) -> Self {
        tags.get("msg-param-sub-plan")
            .map_or(SubPlan::Tier1, |plan| plan.parse().unwrap_or(SubPlan::Tier1))
    }
}

impl FromStr for SubPlan {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Prime" => SubPlan::Prime,
            "1000" => SubPlan::Tier1,
            "2000" => SubPlan::Tier2,
            "3000" => SubPlan::Tier3,
            other => SubPlan::Other(other.to_string()),
        })
    }
}

impl fmt::Display for SubPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recipient of a gifted subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Recipient {
    /// Recipient login.
    pub login: String,
    /// Recipient display name.
    pub display_name: String,
}

/// Fields shared by every notification.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoticeMeta {
    /// Login of the user who triggered it.
    pub login: String,
    /// Display name of that user.
    pub display_name: String,
    /// Server-assigned message id.
    pub id: String,
    /// When the server sent it.
    pub timestamp: DateTime<Utc>,
}

impl NoticeMeta {
    /// Build from the user login and message tags.
    ///
    /// `display-name` falls back to the login and `tmi-sent-ts` to now.
    #[must_use]
    pub fn from_tags(login: &str, tags: &Tags) -> Self {
        let login = tags.get("login").filter(|l| !l.is_empty()).unwrap_or(login);
        Self {
            login: login.to_string(),
            display_name: tags
                .get("display-name")
                .filter(|n| !n.is_empty())
                .unwrap_or(login)
                .to_string(),
            id: tags.get("id").unwrap_or_default().to_string(),
            timestamp: tags
                .parse_value::<i64>("tmi-sent-ts")
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .unwrap_or_else(Utc::now),
        }
    }
}

/// A new subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubNotice {
    /// Who subscribed.
    pub meta: NoticeMeta,
    /// Server-formatted announcement.
    pub system_msg: String,
    /// Tier.
    pub tier: SubPlan,
}

/// A shared resubscription.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResubNotice {
    /// Who resubscribed.
    pub meta: NoticeMeta,
    /// Server-formatted announcement.
    pub system_msg: String,
    /// Tier.
    pub tier: SubPlan,
    /// Cumulative months, at least 1.
    pub months: u32,
    /// Message attached by the subscriber.
    pub message: Option<String>,
}

/// One gifted subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GiftSubNotice {
    /// The gifter.
    pub meta: NoticeMeta,
    /// Server-formatted announcement.
    pub system_msg: String,
    /// Tier.
    pub tier: SubPlan,
    /// Total gifts by this gifter in the channel.
    pub sender_count: u32,
    /// Who received it.
    pub recipient: Recipient,
    /// Recipient's subscription months, at least 1.
    pub months: u32,
    /// Message attached by the gifter.
    pub message: Option<String>,
}

/// A batch of gifted subscriptions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MassGiftSubNotice {
    /// The gifter.
    pub meta: NoticeMeta,
    /// Server-formatted announcement.
    pub system_msg: String,
    /// Tier.
    pub tier: SubPlan,
    /// Total gifts by this gifter in the channel.
    pub sender_count: u32,
    /// Announced batch size.
    pub mass_count: u32,
    /// Recipients collected, in arrival order; at most `mass_count`.
    pub recipients: Vec<Recipient>,
}

/// A chat message carrying bits.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitsNotice {
    /// Who cheered.
    pub meta: NoticeMeta,
    /// Amount cheered.
    pub bits: u32,
    /// The chat message.
    pub message: String,
}

/// Kind of notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NotificationKind {
    /// New subscription.
    Sub,
    /// Resubscription.
    Resub,
    /// One gifted subscription.
    GiftSub,
    /// A batch of gifted subscriptions.
    MassGiftSub,
    /// Bits cheer.
    Bits,
}

impl NotificationKind {
    /// Every kind.
    pub const ALL: [NotificationKind; 5] = [
        Self::Sub,
        Self::Resub,
        Self::GiftSub,
        Self::MassGiftSub,
        Self::Bits,
    ];

    /// Short lowercase name, e.g. `massgiftsub`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Resub => "resub",
            Self::GiftSub => "giftsub",
            Self::MassGiftSub => "massgiftsub",
            Self::Bits => "bits",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized notification.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notification {
    /// See [`SubNotice`].
    Sub(SubNotice),
    /// See [`ResubNotice`].
    Resub(ResubNotice),
    /// A gift that no mass gift absorbed.
    GiftSub(GiftSubNotice),
    /// A mass gift with the recipients collected for it.
    MassGiftSub(MassGiftSubNotice),
    /// See [`BitsNotice`].
    Bits(BitsNotice),
}

impl Notification {
    /// Which kind this is.
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Sub(_) => NotificationKind::Sub,
            Notification::Resub(_) => NotificationKind::Resub,
            Notification::GiftSub(_) => NotificationKind::GiftSub,
            Notification::MassGiftSub(_) => NotificationKind::MassGiftSub,
            Notification::Bits(_) => NotificationKind::Bits,
        }
    }

    /// The shared fields.
    #[must_use]
    pub fn meta(&self) -> &NoticeMeta {
        match self {
            Notification::Sub(n) => &n.meta,
            Notification::Resub(n) => &n.meta,
            Notification::GiftSub(n) => &n.meta,
            Notification::MassGiftSub(n) => &n.meta,
            Notification::Bits(n) => &n.meta,
        }
    }
}

/// A notification delivered to listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NotificationEvent {
    /// Channel name without `#`.
    pub channel: String,
    /// The payload.
    pub notification: Notification,
    /// Tags of the line that finalized it; `None` for dummies.
    pub tags: Option<Tags>,
}

impl NotificationEvent {
    /// Which kind this is.
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        self.notification.kind()
    }
}
