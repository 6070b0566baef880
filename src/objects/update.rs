//! Inbound update envelope and kind classification.
//!
//! Every inbound payload (webhook push or `getUpdates` element) wraps one
//! [`ResponseObject`] whose top-level keys identify exactly one of eleven
//! mutually exclusive update kinds. Classification is lazy and memoized:
//! the first call to [`Update::detect_kind`] fixes the outcome, including
//! the indeterminate one.

use std::sync::OnceLock;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::objects::object::{Relation, RelationTable, ResponseObject, ResponseValue};
use crate::objects::types::{
    CallbackQuery, Chat, ChosenInlineResult, InlineQuery, Message, Poll, PollAnswer,
    PreCheckoutQuery, ShippingQuery,
};

/// Event name prefix used as the dispatch key for handler registration.
const EVENT_PREFIX: &str = "update";

// =============================================================================
// UpdateKind
// =============================================================================

/// The closed set of recognized update kinds, in canonical declaration
/// order. Multi-kind payloads (which the upstream wire contract does not
/// produce) resolve to the first matching kind in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
}

impl UpdateKind {
    /// All kinds in declaration order.
    pub const ALL: [UpdateKind; 11] = [
        Self::Message,
        Self::EditedMessage,
        Self::ChannelPost,
        Self::EditedChannelPost,
        Self::InlineQuery,
        Self::ChosenInlineResult,
        Self::CallbackQuery,
        Self::ShippingQuery,
        Self::PreCheckoutQuery,
        Self::Poll,
        Self::PollAnswer,
    ];

    /// The payload key this kind is detected by.
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::ShippingQuery => "shipping_query",
            Self::PreCheckoutQuery => "pre_checkout_query",
            Self::Poll => "poll",
            Self::PollAnswer => "poll_answer",
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

// =============================================================================
// Update
// =============================================================================

/// Relation table attached to every update payload: each kind key hydrates
/// into its typed nested shape on first read.
fn update_relations() -> RelationTable {
    static TABLE: &[Relation] = &[
        Relation {
            field: "message",
            nested: Message::relations,
        },
        Relation {
            field: "edited_message",
            nested: Message::relations,
        },
        Relation {
            field: "channel_post",
            nested: Message::relations,
        },
        Relation {
            field: "edited_channel_post",
            nested: Message::relations,
        },
        Relation {
            field: "inline_query",
            nested: InlineQuery::relations,
        },
        Relation {
            field: "chosen_inline_result",
            nested: ChosenInlineResult::relations,
        },
        Relation {
            field: "callback_query",
            nested: CallbackQuery::relations,
        },
        Relation {
            field: "shipping_query",
            nested: ShippingQuery::relations,
        },
        Relation {
            field: "pre_checkout_query",
            nested: PreCheckoutQuery::relations,
        },
        Relation {
            field: "poll",
            nested: Poll::relations,
        },
        Relation {
            field: "poll_answer",
            nested: PollAnswer::relations,
        },
    ];
    TABLE
}

/// One inbound update, wrapping its payload object.
///
/// Constructed once per received update; classification state is terminal
/// after the first [`detect_kind`](Update::detect_kind) call.
#[derive(Debug, Clone)]
pub struct Update {
    object: ResponseObject,
    kind: OnceLock<Option<UpdateKind>>,
}

impl Update {
    /// Wraps a decoded payload mapping.
    pub fn new(raw: Map<String, Value>) -> Self {
        Self {
            object: ResponseObject::with_relations(raw, update_relations()),
            kind: OnceLock::new(),
        }
    }

    /// Decodes a JSON value; fails with a decode error when the payload is
    /// not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: Map<String, Value> = serde_json::from_value(value)?;
        Ok(Self::new(raw))
    }

    /// The update's unique identifier, when present.
    pub fn update_id(&self) -> Option<i64> {
        self.object.get_i64("update_id")
    }

    /// Borrows the full payload object.
    pub fn object(&self) -> &ResponseObject {
        &self.object
    }

    /// Classifies the payload against the recognized kind set.
    ///
    /// Fails with [`Error::IndeterminateUpdate`] when no recognized key is
    /// present. A payload carrying more than one recognized key resolves to
    /// the first kind in declaration order; that case is logged because the
    /// upstream contract promises single-kind payloads.
    pub fn detect_kind(&self) -> Result<UpdateKind> {
        let kind = self.kind.get_or_init(|| {
            let matched: Vec<UpdateKind> = UpdateKind::ALL
                .into_iter()
                .filter(|kind| self.object.has(kind.as_key()))
                .collect();
            if matched.len() > 1 {
                warn!(
                    update_id = self.update_id(),
                    kinds = ?matched,
                    "update payload carries multiple recognized kinds, using the first"
                );
            }
            matched.first().copied()
        });
        kind.ok_or(Error::IndeterminateUpdate)
    }

    /// Whether the update is of the given kind.
    pub fn is_kind(&self, kind: UpdateKind) -> bool {
        self.object.has(kind.as_key()) || self.detect_kind().is_ok_and(|k| k == kind)
    }

    /// Dispatch key for handler registration, e.g. `"update.message"`.
    pub fn event_name(&self) -> Result<String> {
        Ok(format!("{}.{}", EVENT_PREFIX, self.detect_kind()?))
    }

    /// The nested payload object for the classified kind.
    pub fn payload(&self) -> Result<ResponseObject> {
        let kind = self.detect_kind()?;
        self.object.get_object(kind.as_key()).ok_or_else(|| {
            Error::Decode(format!("update kind '{kind}' carries a non-object payload"))
        })
    }

    /// The chat the classified payload belongs to, when it has one. Kinds
    /// without a chat (polls, inline queries, ...) read as `None`.
    pub fn chat(&self) -> Option<Chat> {
        let payload = self.payload().ok()?;
        payload.get_object("chat").map(Chat::from_object)
    }

    /// Whether the classified payload's entities contain a bot command.
    pub fn has_command(&self) -> bool {
        let Ok(payload) = self.payload() else {
            return false;
        };
        match payload.get("entities") {
            ResponseValue::Array(entities) => entities.iter().any(|entity| {
                entity
                    .as_object()
                    .and_then(|e| e.get_str("type"))
                    .is_some_and(|t| t == "bot_command")
            }),
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
