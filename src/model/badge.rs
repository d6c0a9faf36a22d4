use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payload encoded into an employee badge QR code. Rendering the QR image and
/// decoding a scan are the client scanner's job; this is only the JSON
/// contract, and a decoded payload is interpreted as "identify employee by
/// id"; `name` and `dept` are display hints, never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BadgePayload {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "Ahmed Al-Qahtani")]
    pub name: String,
    #[schema(example = "Maintenance", nullable = true)]
    pub dept: Option<String>,
}

impl BadgePayload {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_documented_shape() {
        let payload = BadgePayload {
            id: 42,
            name: "Ahmed".into(),
            dept: Some("Maintenance".into()),
        };
        let raw = payload.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["id"], 42);
        assert_eq!(value["name"], "Ahmed");
        assert_eq!(value["dept"], "Maintenance");
    }

    #[test]
    fn parses_a_scanned_payload() {
        let parsed = BadgePayload::parse(r#"{"id":7,"name":"Sara","dept":null}"#).unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.dept, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(BadgePayload::parse("not-a-badge").is_err());
    }
}
