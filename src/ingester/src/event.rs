use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default)]
    pub user_id: String,
    pub event: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Track(Track),
    Identify(Identify),
    Group(Map<String, Value>),
    Page(Map<String, Value>),
    Screen(Map<String, Value>),
    Alias(Map<String, Value>),
    Delete(Map<String, Value>),
}

impl Event {
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Track(_) => "track",
            Event::Identify(_) => "identify",
            Event::Group(_) => "group",
            Event::Page(_) => "page",
            Event::Screen(_) => "screen",
            Event::Alias(_) => "alias",
            Event::Delete(_) => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Event;

    const TRACK_PAYLOAD: &str = r#"
    {
      "type": "track",
      "userId": "cust-1",
      "event": "Page Viewed",
      "sentAt": "2015-12-12T19:11:01.169Z",
      "properties": {
        "plan_status": "active",
        "brand": "Channel Yoga"
      }
    }"#;

    const IDENTIFY_PAYLOAD: &str = r#"
    {
      "type": "identify",
      "userId": "cust-1",
      "traits": {
        "email": "jane@example.com",
        "first_name": "Jane",
        "created_at": "2015-12-12T19:11:01.169Z"
      }
    }"#;

    #[test]
    fn parses_track() {
        let event: Event = serde_json::from_str(TRACK_PAYLOAD).unwrap();
        let Event::Track(track) = event else {
            panic!("expected track");
        };
        assert_eq!(track.user_id, "cust-1");
        assert_eq!(track.event, "Page Viewed");
        assert_eq!(track.properties["plan_status"], "active");
    }

    #[test]
    fn parses_identify() {
        let event: Event = serde_json::from_str(IDENTIFY_PAYLOAD).unwrap();
        let Event::Identify(identify) = event else {
            panic!("expected identify");
        };
        assert_eq!(identify.user_id, "cust-1");
        assert_eq!(
            identify.traits.unwrap()["email"],
            "jane@example.com"
        );
    }

    #[test]
    fn missing_user_id_parses_as_empty() {
        let event: Event =
            serde_json::from_str(r#"{"type": "track", "event": "Page Viewed"}"#).unwrap();
        let Event::Track(track) = event else {
            panic!("expected track");
        };
        assert!(track.user_id.is_empty());
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<Event>(r#"{"type": "gift", "userId": "x"}"#).is_err());
    }

    #[test]
    fn round_trips_with_tag() {
        let event: Event = serde_json::from_str(TRACK_PAYLOAD).unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "track");
        assert_eq!(serde_json::from_value::<Event>(value).unwrap(), event);
    }
}
