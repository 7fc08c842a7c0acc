//! Department Model

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Default triage priority for a new department
pub const DEFAULT_PRIORITY: i32 = 3;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Department entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Department {
    pub id: i64,
    pub name: String,
    /// Uppercase short code, unique
    pub code: String,
    pub description: Option<String>,
    /// Lowercased, unique
    pub contact_email: String,
    pub contact_phone: Option<String>,
    /// JSON array of category tags, order preserved
    #[cfg_attr(feature = "db", sqlx(json))]
    pub categories: Vec<String>,
    /// 1 (highest) .. 5
    pub priority: i32,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub response_time: ResponseTime,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub working_hours: WorkingHours,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub location: Location,
    /// Department-role account acting for this department
    pub account_id: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Response-time targets, in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ResponseTime {
    #[validate(range(min = 1, max = 8760, message = "acknowledge_hours must be between 1 and 8760"))]
    pub acknowledge_hours: u32,
    #[validate(range(min = 1, max = 8760, message = "resolve_hours must be between 1 and 8760"))]
    pub resolve_hours: u32,
}

impl Default for ResponseTime {
    fn default() -> Self {
        Self {
            acknowledge_hours: 24,
            resolve_hours: 168,
        }
    }
}

/// Weekly opening hours (`HH:MM`, 24h clock)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WorkingHours {
    #[validate(custom(function = "validate_weekdays"))]
    pub days: Vec<String>,
    #[validate(custom(function = "validate_clock_time"))]
    pub start: String,
    #[validate(custom(function = "validate_clock_time"))]
    pub end: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            days: WEEKDAYS[..5].iter().map(|d| d.to_string()).collect(),
            start: "09:00".to_string(),
            end: "17:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Location {
    #[validate(length(max = 500, message = "address must be at most 500 characters"))]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinates {
    #[validate(range(min = -90.0, max = 90.0, message = "lat must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "lng must be between -180 and 180"))]
    pub lng: f64,
}

/// Create department payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DepartmentCreate {
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 20, message = "code must be between 2 and 20 characters"))]
    pub code: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(email(message = "contact_email must be a valid email address"))]
    pub contact_email: String,
    #[serde(default)]
    #[validate(length(max = 30, message = "contact_phone must be at most 30 characters"))]
    pub contact_phone: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_categories"))]
    pub categories: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 5, message = "priority must be between 1 and 5"))]
    pub priority: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub response_time: Option<ResponseTime>,
    #[serde(default)]
    #[validate(nested)]
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    #[validate(nested)]
    pub location: Option<Location>,
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "account_id must be between 1 and 64 characters"))]
    pub account_id: Option<String>,
}

impl DepartmentCreate {
    /// Trim text, uppercase the code, lowercase the email
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.code = self.code.trim().to_uppercase();
        self.contact_email = self.contact_email.trim().to_lowercase();
        self.description = trim_opt(self.description);
        self.contact_phone = trim_opt(self.contact_phone);
        self.categories = trim_all(self.categories);
        self.account_id = trim_opt(self.account_id);
        if let Some(hours) = self.working_hours.as_mut() {
            hours.normalize();
        }
        self
    }
}

/// Update department payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DepartmentUpdate {
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 20, message = "code must be between 2 and 20 characters"))]
    pub code: Option<String>,
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(email(message = "contact_email must be a valid email address"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 30, message = "contact_phone must be at most 30 characters"))]
    pub contact_phone: Option<String>,
    #[validate(custom(function = "validate_categories"))]
    pub categories: Option<Vec<String>>,
    #[validate(range(min = 1, max = 5, message = "priority must be between 1 and 5"))]
    pub priority: Option<i32>,
    #[validate(nested)]
    pub response_time: Option<ResponseTime>,
    #[validate(nested)]
    pub working_hours: Option<WorkingHours>,
    #[validate(nested)]
    pub location: Option<Location>,
    #[validate(length(min = 1, max = 64, message = "account_id must be between 1 and 64 characters"))]
    pub account_id: Option<String>,
    pub is_active: Option<bool>,
}

impl DepartmentUpdate {
    pub fn normalize(mut self) -> Self {
        self.name = self.name.map(|s| s.trim().to_string());
        self.code = self.code.map(|s| s.trim().to_uppercase());
        self.contact_email = self.contact_email.map(|s| s.trim().to_lowercase());
        // Blank optional text leaves the stored value unchanged
        self.description = trim_opt(self.description);
        self.contact_phone = trim_opt(self.contact_phone);
        self.categories = self.categories.map(trim_all);
        self.account_id = self.account_id.map(|s| s.trim().to_string());
        if let Some(hours) = self.working_hours.as_mut() {
            hours.normalize();
        }
        self
    }

    /// True when the payload carries no field at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.description.is_none()
            && self.contact_email.is_none()
            && self.contact_phone.is_none()
            && self.categories.is_none()
            && self.priority.is_none()
            && self.response_time.is_none()
            && self.working_hours.is_none()
            && self.location.is_none()
            && self.account_id.is_none()
            && self.is_active.is_none()
    }
}

impl WorkingHours {
    fn normalize(&mut self) {
        self.days = self.days.iter().map(|d| d.trim().to_lowercase()).collect();
        self.start = self.start.trim().to_string();
        self.end = self.end.trim().to_string();
    }
}

fn trim_opt(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn trim_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|s| s.trim().to_string()).collect()
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_categories(categories: &Vec<String>) -> Result<(), ValidationError> {
    if categories.iter().any(|c| c.trim().is_empty()) {
        return Err(invalid("categories", "categories must not contain empty values"));
    }
    if categories.iter().any(|c| c.chars().count() > 50) {
        return Err(invalid("categories", "each category must be at most 50 characters"));
    }
    Ok(())
}

fn validate_weekdays(days: &Vec<String>) -> Result<(), ValidationError> {
    if days.is_empty() {
        return Err(invalid("days", "days must contain at least one weekday"));
    }
    if days.iter().any(|d| !WEEKDAYS.contains(&d.as_str())) {
        return Err(invalid("days", "days must be weekday names such as \"monday\""));
    }
    Ok(())
}

fn validate_clock_time(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .split_once(':')
        .filter(|(h, m)| h.len() == 2 && m.len() == 2)
        .and_then(|(h, m)| Some((h.parse::<u8>().ok()?, m.parse::<u8>().ok()?)))
        .is_some_and(|(h, m)| h < 24 && m < 60);
    if valid {
        Ok(())
    } else {
        Err(invalid("time", "time must use the HH:MM 24-hour format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_payload() -> DepartmentCreate {
        serde_json::from_value(serde_json::json!({
            "name": "  Roads and Streets ",
            "code": " roads ",
            "contact_email": " Roads@City.GOV ",
            "categories": [" roads ", "lighting"]
        }))
        .unwrap()
    }

    #[test]
    fn test_create_normalize() {
        let input = create_payload().normalize();
        assert_eq!(input.name, "Roads and Streets");
        assert_eq!(input.code, "ROADS");
        assert_eq!(input.contact_email, "roads@city.gov");
        assert_eq!(input.categories, vec!["roads", "lighting"]);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_rejects_bad_fields() {
        let mut input = create_payload().normalize();
        input.code = "R".into();
        input.priority = Some(9);
        input.categories.push("  ".into());
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("code"));
        assert!(fields.contains_key("priority"));
        assert!(fields.contains_key("categories"));
    }

    #[test]
    fn test_nested_coordinates_are_validated() {
        let input: DepartmentUpdate = serde_json::from_value(serde_json::json!({
            "location": { "address": "1 Main St", "coordinates": { "lat": 95.0, "lng": 10.0 } }
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_working_hours_rules() {
        let mut hours = WorkingHours::default();
        assert!(hours.validate().is_ok());

        hours.start = "25:00".into();
        assert!(hours.validate().is_err());

        let mut hours = WorkingHours {
            days: vec!["Monday ".into()],
            ..WorkingHours::default()
        };
        hours.normalize();
        assert!(hours.validate().is_ok());
        hours.days = vec!["funday".into()];
        assert!(hours.validate().is_err());
    }

    #[test]
    fn test_update_is_empty() {
        assert!(DepartmentUpdate::default().is_empty());
        let update = DepartmentUpdate {
            is_active: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_blank_optional_text_is_dropped() {
        let update = DepartmentUpdate {
            description: Some("   ".into()),
            contact_phone: Some(" 555-0100 ".into()),
            ..Default::default()
        }
        .normalize();
        assert_eq!(update.description, None);
        assert_eq!(update.contact_phone.as_deref(), Some("555-0100"));
    }
}
