//! Purpose: Shared JSON serializers for bus events and errors printed by the CLI.
//! Exports: `event_json`, `error_json`.
//! Role: Keep the stdout/stderr envelope shape stable across subcommands.
//! Invariants: Key names are additive-only; `kind` is always present.

use busobject::api::{BusEvent, Error};
use serde_json::{Map, Value, json};

pub(crate) fn event_json(seq: usize, event: &BusEvent, time: Option<&str>) -> Value {
    let mut inner = Map::new();
    inner.insert("seq".to_string(), json!(seq));
    inner.insert("kind".to_string(), json!(event.kind_str()));
    inner.insert("path".to_string(), json!(event.path().as_str()));
    match event {
        BusEvent::Registered { id, interface, .. } | BusEvent::Unregistered { id, interface, .. } => {
            inner.insert("id".to_string(), json!(id.0));
            inner.insert("interface".to_string(), json!(interface));
        }
        BusEvent::InterfacesAdded { interfaces, .. } => {
            inner.insert("interfaces".to_string(), json!(interfaces));
        }
        BusEvent::ObjectAdded { .. } | BusEvent::ObjectRemoved { .. } => {}
    }
    if let Some(time) = time {
        inner.insert("time".to_string(), json!(time));
    }

    let mut outer = Map::new();
    outer.insert("event".to_string(), Value::Object(inner));
    Value::Object(outer)
}

pub(crate) fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(err.to_string()));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path));
    }
    if let Some(interface) = err.interface() {
        inner.insert("interface".to_string(), json!(interface));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

#[cfg(test)]
mod tests {
    use super::{error_json, event_json};
    use busobject::api::{BusEvent, Error, ErrorKind, ObjectPath, RegistrationId};

    #[test]
    fn registered_event_has_interface_and_id() {
        let event = BusEvent::Registered {
            id: RegistrationId(3),
            path: ObjectPath::parse("/org/example/x").expect("path"),
            interface: "org.example.X".to_string(),
        };
        let value = event_json(0, &event, Some("2026-02-01T00:00:00Z"));
        let obj = value
            .get("event")
            .and_then(|v| v.as_object())
            .expect("event object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("registered"));
        assert_eq!(obj.get("path").and_then(|v| v.as_str()), Some("/org/example/x"));
        assert_eq!(obj.get("interface").and_then(|v| v.as_str()), Some("org.example.X"));
        assert_eq!(obj.get("id").and_then(|v| v.as_u64()), Some(3));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
    }

    #[test]
    fn object_added_event_omits_interface_fields() {
        let event = BusEvent::ObjectAdded {
            path: ObjectPath::root(),
        };
        let value = event_json(4, &event, None);
        let obj = value.get("event").and_then(|v| v.as_object()).expect("event");
        assert_eq!(obj.get("seq").and_then(|v| v.as_u64()), Some(4));
        assert!(obj.get("interface").is_none());
        assert!(obj.get("time").is_none());
    }

    #[test]
    fn error_json_carries_context() {
        let err = Error::new(ErrorKind::Registration)
            .with_message("injected registration failure")
            .with_path("/org/example/x")
            .with_interface("org.example.X");
        let value = error_json(&err);
        let obj = value.get("error").and_then(|v| v.as_object()).expect("error");
        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("Registration"));
        assert_eq!(obj.get("interface").and_then(|v| v.as_str()), Some("org.example.X"));
    }
}
