use crate::utils::time::iso;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, utoipa::ToSchema)]
pub enum FoodPreference {
    Veg,
    #[serde(rename = "Non-Veg")]
    NonVeg,
    #[serde(rename = "Not Required")]
    NotRequired,
}

impl FoodPreference {
    pub const ALL: [FoodPreference; 3] = [Self::Veg, Self::NonVeg, Self::NotRequired];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veg => "Veg",
            Self::NonVeg => "Non-Veg",
            Self::NotRequired => "Not Required",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for FoodPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored RSVP form, one per invitee
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub response_id: String,
    pub employee_id: String,
    pub mobile_number: String,
    pub requires_accommodation: bool,
    #[serde(default)]
    pub arrival_date: Option<String>,
    #[serde(default)]
    pub departure_date: Option<String>,
    pub food_preference: FoodPreference,
    #[serde(default)]
    pub departure_time_preference: Option<String>,
    #[serde(default)]
    pub arrival_time_preference: Option<String>,
    #[serde(default)]
    pub special_flight_requirements: Option<String>,
    pub submission_timestamp: BsonDateTime,
}

/// Incoming RSVP body. `foodPreference` is kept as a string so an unknown
/// value produces our own 400 instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub employee_id: String,
    pub mobile_number: String,
    pub requires_accommodation: bool,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub food_preference: String,
    pub departure_time_preference: Option<String>,
    pub arrival_time_preference: Option<String>,
    pub special_flight_requirements: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub response_id: String,
    pub employee_id: String,
    pub mobile_number: String,
    pub requires_accommodation: bool,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub food_preference: FoodPreference,
    pub departure_time_preference: Option<String>,
    pub arrival_time_preference: Option<String>,
    pub special_flight_requirements: Option<String>,
    pub submission_timestamp: String,
}

impl From<RsvpResponse> for ResponseView {
    fn from(r: RsvpResponse) -> Self {
        Self {
            response_id: r.response_id,
            employee_id: r.employee_id,
            mobile_number: r.mobile_number,
            requires_accommodation: r.requires_accommodation,
            arrival_date: r.arrival_date,
            departure_date: r.departure_date,
            food_preference: r.food_preference,
            departure_time_preference: r.departure_time_preference,
            arrival_time_preference: r.arrival_time_preference,
            special_flight_requirements: r.special_flight_requirements,
            submission_timestamp: iso(r.submission_timestamp),
        }
    }
}

/// Response joined with the invitee's roster details
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseWithInvitee {
    #[serde(flatten)]
    pub response: ResponseView,
    pub employee_name: Option<String>,
    pub cadre: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub food_preference: Option<String>,
    pub requires_accommodation: Option<bool>,
}

/// A selectable flight window shown on the RSVP form
#[derive(Debug, Clone, Serialize)]
pub struct FlightTimeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub time_range: &'static str,
}

pub const FLIGHT_TIME_OPTIONS: [FlightTimeOption; 6] = [
    FlightTimeOption { value: "Early Morning", label: "Early Morning", time_range: "5:00 AM - 8:00 AM" },
    FlightTimeOption { value: "Morning", label: "Morning", time_range: "8:00 AM - 12:00 PM" },
    FlightTimeOption { value: "Afternoon", label: "Afternoon", time_range: "12:00 PM - 5:00 PM" },
    FlightTimeOption { value: "Evening", label: "Evening", time_range: "5:00 PM - 9:00 PM" },
    FlightTimeOption { value: "Night", label: "Night", time_range: "9:00 PM - 5:00 AM" },
    FlightTimeOption { value: "No Preference", label: "No Preference", time_range: "Any time" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_preference_wire_names() {
        assert_eq!(serde_json::to_string(&FoodPreference::NonVeg).unwrap(), "\"Non-Veg\"");
        assert_eq!(FoodPreference::parse("Not Required"), Some(FoodPreference::NotRequired));
        assert_eq!(FoodPreference::parse("Vegan"), None);
    }
}
