//! Dynamic mapping-backed value layer underlying requests and responses.
//!
//! Telegram payload shapes vary by method and update kind, so the decoded
//! body is held as a generic [`ResponseObject`]: a string-keyed mapping whose
//! values form a closed union ([`ResponseValue`]). Fields declared in a
//! type's relation table hydrate into nested objects on first read; the
//! hydrated instance is cached, so repeated reads are idempotent and never
//! re-parse the raw payload.
//!
//! Reads are tolerant: a missing key yields [`ResponseValue::Null`], never an
//! error, because upstream payloads routinely omit optional fields.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

// =============================================================================
// Relations
// =============================================================================

/// A declared cast from a field name to the relation table its hydrated
/// object should carry.
///
/// Relation tables are static per type: there is no runtime introspection.
/// If the raw value under `field` is a JSON object, one nested object is
/// constructed; if it is an array, one nested object is constructed per
/// element. Anything else passes through raw.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    /// Field name this relation applies to.
    pub field: &'static str,
    /// Relation table of the target type, resolved lazily so tables may
    /// reference each other (and themselves) freely.
    pub nested: fn() -> RelationTable,
}

/// A type's full set of declared relations.
pub type RelationTable = &'static [Relation];

/// The empty relation table, used for objects with no declared casts.
pub const NO_RELATIONS: RelationTable = &[];

// =============================================================================
// ResponseValue
// =============================================================================

/// Closed union of values a [`ResponseObject`] field can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    /// Absent or JSON null.
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A nested mapping, hydrated with its relation table when one was
    /// declared for the originating field.
    Object(ResponseObject),
    /// An ordered sequence.
    Array(Vec<ResponseValue>),
}

impl ResponseValue {
    /// Returns `true` for [`ResponseValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrows the string content, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean content, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the nested object, if any.
    pub fn as_object(&self) -> Option<&ResponseObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Consumes the value, returning the nested object if any.
    pub fn into_object(self) -> Option<ResponseObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrows the sequence content, if any.
    pub fn as_array(&self) -> Option<&[ResponseValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes the value, returning the sequence if any.
    pub fn into_array(self) -> Option<Vec<ResponseValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    fn from_raw(value: &Value, relations: RelationTable) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Object(map) => {
                Self::Object(ResponseObject::with_relations(map.clone(), relations))
            }
            Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(|item| Self::from_raw(item, relations))
                    .collect(),
            ),
        }
    }
}

// =============================================================================
// ResponseObject
// =============================================================================

struct ObjectInner {
    raw: Map<String, Value>,
    relations: RelationTable,
    /// First-read hydration cache. Once a relation-declared field has been
    /// read, the constructed value lives here and the raw value is never
    /// consulted again for that key.
    hydrated: Mutex<HashMap<String, ResponseValue>>,
}

/// A mapping-backed dynamic object with lazy relation hydration.
///
/// Cloning is cheap (shared inner); the hydration cache is shared between
/// clones and guarded for concurrent access.
#[derive(Clone)]
pub struct ResponseObject {
    inner: Arc<ObjectInner>,
}

impl ResponseObject {
    /// Creates an object with no declared relations.
    pub fn new(raw: Map<String, Value>) -> Self {
        Self::with_relations(raw, NO_RELATIONS)
    }

    /// Creates an object carrying the given relation table.
    pub fn with_relations(raw: Map<String, Value>, relations: RelationTable) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                raw,
                relations,
                hydrated: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Decodes a JSON string into an object with the given relations.
    pub fn from_json(body: &str, relations: RelationTable) -> serde_json::Result<Self> {
        let raw: Map<String, Value> = serde_json::from_str(body)?;
        Ok(Self::with_relations(raw, relations))
    }

    /// Returns the value stored under `key`.
    ///
    /// If a relation is declared for `key` and this is the first read, the
    /// target object (or one object per array element) is constructed and
    /// cached; later reads return the cached instance. Missing keys read as
    /// [`ResponseValue::Null`].
    pub fn get(&self, key: &str) -> ResponseValue {
        let relation = self.inner.relations.iter().find(|r| r.field == key);

        if let Some(relation) = relation {
            let mut cache = self.inner.hydrated.lock();
            if let Some(value) = cache.get(key) {
                return value.clone();
            }
            let Some(raw) = self.inner.raw.get(key) else {
                return ResponseValue::Null;
            };
            let value = ResponseValue::from_raw(raw, (relation.nested)());
            cache.insert(key.to_string(), value.clone());
            return value;
        }

        match self.inner.raw.get(key) {
            Some(raw) => ResponseValue::from_raw(raw, NO_RELATIONS),
            None => ResponseValue::Null,
        }
    }

    /// Returns `true` iff `key` exists in the mapping, independent of
    /// hydration state.
    pub fn has(&self, key: &str) -> bool {
        self.inner.raw.contains_key(key)
    }

    /// Returns the top-level keys in payload order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.raw.keys().map(String::as_str)
    }

    /// Borrows the raw underlying mapping.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.inner.raw
    }

    /// String accessor shorthand.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            ResponseValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer accessor shorthand.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).as_i64()
    }

    /// Boolean accessor shorthand.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).as_bool()
    }

    /// Nested-object accessor shorthand.
    pub fn get_object(&self, key: &str) -> Option<ResponseObject> {
        self.get(key).into_object()
    }

    /// Whether `other` shares this object's storage (same hydration cache).
    pub fn same_instance(&self, other: &ResponseObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ResponseObject {
    fn eq(&self, other: &Self) -> bool {
        self.inner.raw == other.inner.raw
    }
}

impl std::fmt::Debug for ResponseObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseObject")
            .field("raw", &self.inner.raw)
            .finish()
    }
}

impl From<Map<String, Value>> for ResponseObject {
    fn from(raw: Map<String, Value>) -> Self {
        Self::new(raw)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_relations() -> RelationTable {
        NO_RELATIONS
    }

    fn message_relations() -> RelationTable {
        static TABLE: &[Relation] = &[
            Relation {
                field: "from",
                nested: user_relations,
            },
            Relation {
                field: "reply_to_message",
                nested: message_relations,
            },
        ];
        TABLE
    }

    fn object(value: Value) -> ResponseObject {
        let map = value.as_object().cloned().expect("test value is an object");
        ResponseObject::with_relations(map, message_relations())
    }

    #[test]
    fn missing_key_reads_as_null() {
        let obj = object(json!({"text": "hi"}));
        assert!(obj.get("chat").is_null());
        assert!(!obj.has("chat"));
    }

    #[test]
    fn has_is_independent_of_hydration() {
        let obj = object(json!({"from": {"id": 7}}));
        assert!(obj.has("from"));
        let _ = obj.get("from");
        assert!(obj.has("from"));
    }

    #[test]
    fn scalar_fields_pass_through() {
        let obj = object(json!({"text": "hi", "message_id": 42, "pinned": true}));
        assert_eq!(obj.get_str("text").as_deref(), Some("hi"));
        assert_eq!(obj.get_i64("message_id"), Some(42));
        assert_eq!(obj.get_bool("pinned"), Some(true));
    }

    #[test]
    fn relation_field_hydrates_into_object() {
        let obj = object(json!({"from": {"id": 7, "first_name": "Ada"}}));
        let from = obj.get("from").into_object().expect("hydrated object");
        assert_eq!(from.get_i64("id"), Some(7));
    }

    #[test]
    fn hydration_is_idempotent_and_cached() {
        let obj = object(json!({"from": {"id": 7}}));
        let first = obj.get("from").into_object().unwrap();
        let second = obj.get("from").into_object().unwrap();
        assert_eq!(first, second);
        // The second read must come from the cache, not a re-parse.
        assert!(first.same_instance(&second));
    }

    #[test]
    fn relation_over_array_hydrates_each_element() {
        let obj = ResponseObject::with_relations(
            json!({"photo": [{"file_id": "a"}, {"file_id": "b"}]})
                .as_object()
                .cloned()
                .unwrap(),
            {
                static TABLE: &[Relation] = &[Relation {
                    field: "photo",
                    nested: || NO_RELATIONS,
                }];
                TABLE
            },
        );
        let photos = obj.get("photo").into_array().unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(
            photos[1].as_object().unwrap().get_str("file_id").as_deref(),
            Some("b")
        );
    }

    #[test]
    fn undeclared_mapping_passes_through_as_object() {
        let obj = object(json!({"chat": {"id": 1}}));
        // "chat" has no relation in the test table but still reads as a
        // plain object.
        let chat = obj.get("chat").into_object().unwrap();
        assert_eq!(chat.get_i64("id"), Some(1));
    }

    #[test]
    fn nested_relation_tables_cascade() {
        let obj = object(json!({
            "reply_to_message": {"from": {"id": 9}}
        }));
        let reply = obj.get("reply_to_message").into_object().unwrap();
        let from = reply.get("from").into_object().unwrap();
        assert_eq!(from.get_i64("id"), Some(9));
    }
}
