use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Worker,
    Supervisor,
    DeptHead,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "name": "Ahmed Al-Qahtani",
        "phone": "+966501234567",
        "job_title": "Field Technician",
        "role": "WORKER",
        "registered": true,
        "department_id": 3,
        "site_latitude": 24.7136,
        "site_longitude": 46.6753,
        "site_address": "King Fahd Rd, Riyadh",
        "shift_start": "08:00:00",
        "shift_end": "17:00:00"
    })
)]
pub struct Employee {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = "Ahmed Al-Qahtani")]
    pub name: String,

    /// Unique login key.
    #[schema(example = "+966501234567")]
    pub phone: String,

    #[schema(example = "Field Technician", nullable = true)]
    pub job_title: Option<String>,

    #[schema(value_type = String, example = "WORKER")]
    #[sqlx(try_from = "String")]
    pub role: RoleColumn,

    /// Flipped once by activation, never reset.
    #[schema(example = true)]
    pub registered: bool,

    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,

    /// Assigned worksite, flattened per the storage contract. All three
    /// columns NULL when the employee has no fixed site.
    #[schema(example = 24.7136, nullable = true)]
    pub site_latitude: Option<f64>,
    #[schema(example = 46.6753, nullable = true)]
    pub site_longitude: Option<f64>,
    #[schema(example = "King Fahd Rd, Riyadh", nullable = true)]
    pub site_address: Option<String>,

    /// Informational shift window; nothing evaluates lateness from it.
    #[schema(example = "08:00:00", value_type = String, format = "time", nullable = true)]
    pub shift_start: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = String, format = "time", nullable = true)]
    pub shift_end: Option<NaiveTime>,
}

impl Employee {
    /// Unflattens the assigned worksite, if one is set. Validation happens in
    /// the geofence evaluator, not here.
    pub fn site(&self) -> Option<Coordinate> {
        match (self.site_latitude, self.site_longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
                address: self.site_address.clone(),
            }),
            _ => None,
        }
    }
}

/// Newtype so sqlx can decode the VARCHAR role column through `TryFrom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleColumn(pub Role);

impl TryFrom<String> for RoleColumn {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map(RoleColumn)
    }
}

impl From<Role> for RoleColumn {
    fn from(role: Role) -> Self {
        RoleColumn(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_varchar() {
        assert_eq!(Role::DeptHead.as_ref(), "DEPT_HEAD");
        assert_eq!("SUPERVISOR".parse::<Role>().unwrap(), Role::Supervisor);
    }

    #[test]
    fn site_requires_both_scalars() {
        let mut employee = Employee {
            id: 1,
            name: "n".into(),
            phone: "+966500000000".into(),
            job_title: None,
            role: Role::Worker.into(),
            registered: false,
            department_id: None,
            site_latitude: Some(24.7136),
            site_longitude: None,
            site_address: None,
            shift_start: None,
            shift_end: None,
        };
        assert!(employee.site().is_none());

        employee.site_longitude = Some(46.6753);
        let site = employee.site().unwrap();
        assert_eq!(site.latitude, 24.7136);
        assert_eq!(site.longitude, 46.6753);
    }
}
