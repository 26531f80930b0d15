// Shallow flattening of event payloads into key/value entries

use crate::entities::{EventDataEntry, EventPayload};

/// One entry per top-level key, in payload order. Nested values are not
/// descended into.
pub fn flatten(payload: Option<&EventPayload>) -> Vec<EventDataEntry> {
    let Some(payload) = payload else {
        return Vec::new();
    };
    payload
        .iter()
        .map(|(key, value)| EventDataEntry::new(key, value.to_flat_string()))
        .collect()
}
