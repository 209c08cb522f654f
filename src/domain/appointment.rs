use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AppointmentId = Uuid;

/// Who confirms outcomes from the owner dashboard.
pub const OWNER: &str = "owner";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Confirmed => "confirmed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "booked" => Some(BookingStatus::Booked),
            "confirmed" => Some(BookingStatus::Confirmed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the client actually showed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Attended,
    NoShow,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Attended => "attended",
            Outcome::NoShow => "no_show",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "attended" => Some(Outcome::Attended),
            "no_show" => Some(Outcome::NoShow),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub service: String,
    /// Requested employee; `None` means anyone
    pub employee_name: Option<String>,
    pub status: BookingStatus,
    pub outcome: Option<Outcome>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
}

impl Appointment {
    pub fn new(
        date: NaiveDate,
        starts_at: NaiveTime,
        ends_at: NaiveTime,
        client_name: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            starts_at,
            ends_at,
            client_name: client_name.into(),
            client_phone: None,
            service: service.into(),
            employee_name: None,
            status: BookingStatus::Booked,
            outcome: None,
            confirmed_at: None,
            confirmed_by: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.client_phone = Some(phone.into());
        self
    }

    pub fn with_employee(mut self, name: impl Into<String>) -> Self {
        self.employee_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_valid_slot(&self) -> bool {
        self.ends_at > self.starts_at
    }

    pub fn employee_label(&self) -> &str {
        self.employee_name.as_deref().unwrap_or("any")
    }

    /// Record the owner's confirmation of what happened.
    pub fn confirm(&mut self, outcome: Outcome, at: DateTime<Utc>) {
        self.outcome = Some(outcome);
        self.confirmed_at = Some(at);
        self.confirmed_by = Some(OWNER.to_string());
    }
}
