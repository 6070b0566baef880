//! Typed views over [`ResponseObject`] payloads.
//!
//! Each Telegram object type is a thin newtype over a [`ResponseObject`]
//! carrying that type's relation table, so nested fields hydrate into the
//! right shape on first read. Accessors stay tolerant: optional payload
//! fields read as `None` rather than failing.

use serde_json::{Map, Value};

use crate::objects::object::{Relation, RelationTable, ResponseObject, ResponseValue};

/// Defines a typed payload view: a newtype over [`ResponseObject`] plus its
/// static relation table.
macro_rules! telegram_object {
    (
        $(#[$meta:meta])*
        $name:ident { $( $field:literal => $target:ident ),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(ResponseObject);

        impl $name {
            /// Relation table declaring which fields cast into nested
            /// objects on first read.
            pub fn relations() -> RelationTable {
                static TABLE: &[Relation] = &[
                    $( Relation { field: $field, nested: $target::relations } ),*
                ];
                TABLE
            }

            /// Wraps an already-hydrated payload object.
            pub fn from_object(object: ResponseObject) -> Self {
                Self(object)
            }

            /// Builds from a raw JSON mapping, attaching this type's
            /// relations.
            pub fn from_map(map: Map<String, Value>) -> Self {
                Self(ResponseObject::with_relations(map, Self::relations()))
            }

            /// Borrows the underlying dynamic object.
            pub fn object(&self) -> &ResponseObject {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = ResponseObject;

            fn deref(&self) -> &ResponseObject {
                &self.0
            }
        }

        impl From<$name> for ResponseObject {
            fn from(typed: $name) -> ResponseObject {
                typed.0
            }
        }
    };
}

telegram_object! {
    /// A Telegram user or bot.
    User {}
}

impl User {
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    pub fn is_bot(&self) -> bool {
        self.get_bool("is_bot").unwrap_or(false)
    }

    pub fn first_name(&self) -> Option<String> {
        self.get_str("first_name")
    }

    pub fn username(&self) -> Option<String> {
        self.get_str("username")
    }
}

telegram_object! {
    /// A chat: private conversation, group, supergroup or channel.
    Chat {
        "pinned_message" => Message,
    }
}

impl Chat {
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    /// Chat type: "private", "group", "supergroup" or "channel".
    pub fn kind(&self) -> Option<String> {
        self.get_str("type")
    }

    pub fn title(&self) -> Option<String> {
        self.get_str("title")
    }

    pub fn username(&self) -> Option<String> {
        self.get_str("username")
    }
}

telegram_object! {
    /// One special entity in a message text (mention, hashtag, command, ...).
    MessageEntity {
        "user" => User,
    }
}

impl MessageEntity {
    /// Entity type, e.g. `"bot_command"` or `"mention"`.
    pub fn kind(&self) -> Option<String> {
        self.get_str("type")
    }

    pub fn offset(&self) -> Option<i64> {
        self.get_i64("offset")
    }

    pub fn length(&self) -> Option<i64> {
        self.get_i64("length")
    }
}

telegram_object! {
    /// One size variant of a photo or thumbnail.
    PhotoSize {}
}

impl PhotoSize {
    pub fn file_id(&self) -> Option<String> {
        self.get_str("file_id")
    }
}

telegram_object! {
    /// A general file sent as a document.
    Document {
        "thumb" => PhotoSize,
    }
}

impl Document {
    pub fn file_id(&self) -> Option<String> {
        self.get_str("file_id")
    }

    pub fn file_name(&self) -> Option<String> {
        self.get_str("file_name")
    }
}

telegram_object! {
    /// An animated emoji with a random value.
    Dice {}
}

telegram_object! {
    /// One answer option in a poll.
    PollOption {}
}

telegram_object! {
    /// A native poll.
    Poll {
        "options" => PollOption,
    }
}

impl Poll {
    pub fn id(&self) -> Option<String> {
        self.get_str("id")
    }

    pub fn question(&self) -> Option<String> {
        self.get_str("question")
    }
}

telegram_object! {
    /// A user's changed answer in a non-anonymous poll.
    PollAnswer {
        "user" => User,
    }
}

impl PollAnswer {
    pub fn poll_id(&self) -> Option<String> {
        self.get_str("poll_id")
    }

    pub fn user(&self) -> Option<User> {
        self.get_object("user").map(User::from_object)
    }
}

telegram_object! {
    /// A message of any kind.
    Message {
        "from" => User,
        "chat" => Chat,
        "forward_from" => User,
        "reply_to_message" => Message,
        "entities" => MessageEntity,
        "caption_entities" => MessageEntity,
        "new_chat_members" => User,
        "left_chat_member" => User,
        "pinned_message" => Message,
        "photo" => PhotoSize,
        "document" => Document,
        "poll" => Poll,
        "dice" => Dice,
    }
}

impl Message {
    pub fn message_id(&self) -> Option<i64> {
        self.get_i64("message_id")
    }

    pub fn text(&self) -> Option<String> {
        self.get_str("text")
    }

    pub fn from(&self) -> Option<User> {
        self.get_object("from").map(User::from_object)
    }

    pub fn chat(&self) -> Option<Chat> {
        self.get_object("chat").map(Chat::from_object)
    }

    pub fn reply_to_message(&self) -> Option<Message> {
        self.get_object("reply_to_message").map(Message::from_object)
    }

    /// Entities attached to the message text.
    pub fn entities(&self) -> Vec<MessageEntity> {
        match self.get("entities") {
            ResponseValue::Array(items) => items
                .into_iter()
                .filter_map(ResponseValue::into_object)
                .map(MessageEntity::from_object)
                .collect(),
            _ => Vec::new(),
        }
    }
}

telegram_object! {
    /// An incoming inline query.
    InlineQuery {
        "from" => User,
    }
}

impl InlineQuery {
    pub fn id(&self) -> Option<String> {
        self.get_str("id")
    }

    pub fn query(&self) -> Option<String> {
        self.get_str("query")
    }
}

telegram_object! {
    /// An inline query result chosen by a user.
    ChosenInlineResult {
        "from" => User,
    }
}

telegram_object! {
    /// An incoming callback query from an inline keyboard.
    CallbackQuery {
        "from" => User,
        "message" => Message,
    }
}

impl CallbackQuery {
    pub fn id(&self) -> Option<String> {
        self.get_str("id")
    }

    pub fn data(&self) -> Option<String> {
        self.get_str("data")
    }

    pub fn message(&self) -> Option<Message> {
        self.get_object("message").map(Message::from_object)
    }
}

telegram_object! {
    /// An incoming shipping query (invoices with flexible price).
    ShippingQuery {
        "from" => User,
    }
}

telegram_object! {
    /// An incoming pre-checkout query.
    PreCheckoutQuery {
        "from" => User,
    }
}

telegram_object! {
    /// A file descriptor as returned by `getFile`, ready for download.
    File {}
}

impl File {
    pub fn file_id(&self) -> Option<String> {
        self.get_str("file_id")
    }

    /// Remote path usable with the file download endpoint. Valid for at
    /// least one hour after the `getFile` call.
    pub fn file_path(&self) -> Option<String> {
        self.get_str("file_path")
    }

    pub fn file_size(&self) -> Option<i64> {
        self.get_i64("file_size")
    }
}

// =============================================================================
// Tests
// =============================================================================
