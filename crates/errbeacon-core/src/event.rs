//! Host activity events
//!
//! The host surfaces user activity as named events carrying component and
//! location identifiers. Forwarded captures record the triggering event as
//! a breadcrumb so the trail shows what the user was doing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A host activity event observed at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HostEvent {
    pub name: Option<String>,
    pub component: Option<String>,
    pub course_id: Option<i64>,
    pub context_id: Option<i64>,
}

impl HostEvent {
    pub fn named(name: impl Into<String>) -> Self {
        HostEvent {
            name: Some(name.into()),
            ..HostEvent::default()
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_course_id(mut self, course_id: i64) -> Self {
        self.course_id = Some(course_id);
        self
    }

    pub fn with_context_id(mut self, context_id: i64) -> Self {
        self.context_id = Some(context_id);
        self
    }

    /// Breadcrumb payload for this event. All four keys are always present;
    /// unknown fields serialize as null so trail entries stay uniform.
    pub fn breadcrumb_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("eventname".into(), opt_str(&self.name));
        data.insert("component".into(), opt_str(&self.component));
        data.insert("courseid".into(), opt_int(self.course_id));
        data.insert("contextid".into(), opt_int(self.context_id));
        data
    }
}

fn opt_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

fn opt_int(value: Option<i64>) -> Value {
    match value {
        Some(n) => Value::from(n),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_breadcrumb_data_carries_all_fields() {
        let event = HostEvent::named("course_viewed")
            .with_component("core")
            .with_course_id(12)
            .with_context_id(34);

        let data = event.breadcrumb_data();
        assert_eq!(data.get("eventname"), Some(&json!("course_viewed")));
        assert_eq!(data.get("component"), Some(&json!("core")));
        assert_eq!(data.get("courseid"), Some(&json!(12)));
        assert_eq!(data.get("contextid"), Some(&json!(34)));
    }

    #[test]
    fn test_missing_fields_serialize_as_null() {
        let data = HostEvent::default().breadcrumb_data();
        assert_eq!(data.len(), 4);
        assert!(data.values().all(Value::is_null));
    }
}
