use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Check-in or check-out. Round-trips through VARCHAR columns as `IN`/`OUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    In,
    Out,
}

/// Outcome of the geofence evaluation at capture time. `Late` and `Absent`
/// are part of the stored vocabulary but no code path produces them; the
/// rules behind them are unspecified product decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    OutOfBounds,
    Late,
    Absent,
}

/// One attendance event. Created once by the capture flow (or the submit
/// endpoint acting for it), never mutated, never deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceLog {
    /// Client-generated UUID; retries reuse it so the store stays idempotent.
    #[schema(example = "7b6a1f2e-8f33-4af0-9b6e-2f1d8c1a9b10")]
    pub id: String,

    #[schema(example = 42)]
    pub employee_id: u64,

    /// Display-name snapshot taken at capture time.
    #[schema(example = "Ahmed Al-Qahtani")]
    pub employee_name: String,

    #[schema(example = "2026-08-30T07:58:12Z", value_type = String, format = "date-time")]
    pub recorded_at: DateTime<Utc>,

    pub direction: Direction,

    /// JPEG bytes, base64 in JSON bodies, BLOB in MySQL.
    #[serde(with = "photo_b64")]
    #[schema(value_type = String, format = "byte")]
    pub photo: Vec<u8>,

    #[schema(example = 24.7136)]
    pub latitude: f64,
    #[schema(example = 46.6753)]
    pub longitude: f64,
    #[schema(example = "King Fahd Rd, Riyadh", nullable = true)]
    pub address: Option<String>,

    pub status: AttendanceStatus,

    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
}

/// Raw MySQL row; enums live in VARCHAR columns and are parsed on the way out.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceLogRow {
    pub id: String,
    pub employee_id: u64,
    pub employee_name: String,
    pub recorded_at: DateTime<Utc>,
    pub direction: String,
    pub photo: Vec<u8>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub status: String,
    pub department_id: Option<u64>,
}

impl TryFrom<AttendanceLogRow> for AttendanceLog {
    type Error = strum::ParseError;

    fn try_from(row: AttendanceLogRow) -> Result<Self, Self::Error> {
        Ok(AttendanceLog {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            recorded_at: row.recorded_at,
            direction: row.direction.parse()?,
            photo: row.photo,
            latitude: row.latitude,
            longitude: row.longitude,
            address: row.address,
            status: row.status.parse()?,
            department_id: row.department_id,
        })
    }
}

/// Serde adapter: JPEG bytes as standard base64 strings in JSON.
pub mod photo_b64 {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_varchar() {
        assert_eq!(Direction::In.as_ref(), "IN");
        assert_eq!("OUT".parse::<Direction>().unwrap(), Direction::Out);
    }

    #[test]
    fn status_round_trips_through_varchar() {
        assert_eq!(AttendanceStatus::OutOfBounds.as_ref(), "OUT_OF_BOUNDS");
        assert_eq!(
            "PRESENT".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            "LATE".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn photo_serializes_as_base64() {
        let log = AttendanceLog {
            id: "a".into(),
            employee_id: 1,
            employee_name: "n".into(),
            recorded_at: Utc::now(),
            direction: Direction::In,
            photo: vec![0xff, 0xd8, 0xff],
            latitude: 0.0,
            longitude: 0.0,
            address: None,
            status: AttendanceStatus::Present,
            department_id: None,
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["photo"], "/9j/");
        assert_eq!(json["direction"], "IN");
        assert_eq!(json["status"], "PRESENT");

        let back: AttendanceLog = serde_json::from_value(json).unwrap();
        assert_eq!(back.photo, log.photo);
    }
}
