use serde::{Deserialize, Serialize};

///
/// Cursor
/// Opaque continuation token round-tripped between `list` calls.
///
/// The payload belongs to the backend that produced it and is never
/// inspected generically; each backend decodes its own payload and
/// rejects a foreign shape. An absent payload means "start of scan" on
/// the way in and "end of stream" on the way out.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "_type")]
pub struct Cursor {
    value: Option<serde_json::Value>,
}

impl Cursor {
    /// Cursor for the beginning of a scan.
    #[must_use]
    pub const fn start() -> Self {
        Self { value: None }
    }

    /// Wrap a backend continuation payload; `None` marks a finished scan.
    #[must_use]
    pub const fn from_payload(value: Option<serde_json::Value>) -> Self {
        Self { value }
    }

    /// True when the producing backend reported no further results.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.value.is_none()
    }

    #[must_use]
    pub const fn payload(&self) -> Option<&serde_json::Value> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn into_payload(self) -> Option<serde_json::Value> {
        self.value
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_cursor_is_also_end_of_stream() {
        assert!(Cursor::start().is_end());
        assert!(Cursor::start().payload().is_none());
    }

    #[test]
    fn payload_round_trips() {
        let cursor = Cursor::from_payload(Some(json!({"k": "v"})));
        assert!(!cursor.is_end());
        assert_eq!(cursor.into_payload(), Some(json!({"k": "v"})));
    }

    #[test]
    fn wire_form_is_tagged() {
        let cursor = Cursor::from_payload(Some(json!("abc")));
        let wire = serde_json::to_value(&cursor).expect("serializes");
        assert_eq!(wire, json!({"_type": "Cursor", "value": "abc"}));

        let back: Cursor = serde_json::from_value(wire).expect("deserializes");
        assert_eq!(back, cursor);
    }
}
