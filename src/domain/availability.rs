use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::EmployeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    AtLunch,
    Unavailable,
}

impl AvailabilityStatus {
    pub const ALL: [AvailabilityStatus; 3] = [
        AvailabilityStatus::Available,
        AvailabilityStatus::AtLunch,
        AvailabilityStatus::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::AtLunch => "at_lunch",
            AvailabilityStatus::Unavailable => "unavailable",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "Available",
            AvailabilityStatus::AtLunch => "At lunch",
            AvailabilityStatus::Unavailable => "Unavailable",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "available" => Ok(AvailabilityStatus::Available),
            "at_lunch" | "lunch" => Ok(AvailabilityStatus::AtLunch),
            "unavailable" => Ok(AvailabilityStatus::Unavailable),
            _ => Err(AvailabilityError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunchBreak {
    pub leaves_at: NaiveTime,
    pub back_at: NaiveTime,
}

/// Current availability of an employee. Each status only carries the times
/// that make sense for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    /// `lunch: None` means available all day
    Available { lunch: Option<LunchBreak> },
    AtLunch { back_at: NaiveTime },
    /// `back_at: None` means not coming back today
    Unavailable { back_at: Option<NaiveTime> },
}

impl Availability {
    pub fn status(&self) -> AvailabilityStatus {
        match self {
            Availability::Available { .. } => AvailabilityStatus::Available,
            Availability::AtLunch { .. } => AvailabilityStatus::AtLunch,
            Availability::Unavailable { .. } => AvailabilityStatus::Unavailable,
        }
    }

    pub fn lunch_at(&self) -> Option<NaiveTime> {
        match self {
            Availability::Available { lunch: Some(lunch) } => Some(lunch.leaves_at),
            _ => None,
        }
    }

    pub fn back_at(&self) -> Option<NaiveTime> {
        match self {
            Availability::Available { lunch } => lunch.map(|l| l.back_at),
            Availability::AtLunch { back_at } => Some(*back_at),
            Availability::Unavailable { back_at } => *back_at,
        }
    }

    /// Rebuild from stored columns.
    pub fn from_parts(
        status: AvailabilityStatus,
        lunch_at: Option<NaiveTime>,
        back_at: Option<NaiveTime>,
    ) -> Result<Self, AvailabilityError> {
        match status {
            AvailabilityStatus::Available => match (lunch_at, back_at) {
                (Some(leaves_at), Some(back_at)) => Ok(Availability::Available {
                    lunch: Some(LunchBreak { leaves_at, back_at }),
                }),
                (None, None) => Ok(Availability::Available { lunch: None }),
                _ => Err(AvailabilityError::MissingLunchTimes),
            },
            AvailabilityStatus::AtLunch => back_at
                .map(|back_at| Availability::AtLunch { back_at })
                .ok_or(AvailabilityError::MissingReturnTime),
            AvailabilityStatus::Unavailable => Ok(Availability::Unavailable { back_at }),
        }
    }

    /// One-line description shown next to the employee.
    pub fn summary(&self) -> String {
        match self {
            Availability::Unavailable { back_at: Some(t) } => format!("Back at {}.", hhmm(*t)),
            Availability::Unavailable { back_at: None } => "Not back today.".to_string(),
            Availability::AtLunch { back_at } => format!("Back at {}.", hhmm(*back_at)),
            Availability::Available { lunch: Some(l) } => {
                format!("Lunch at {}.", hhmm(l.leaves_at))
            }
            Availability::Available { lunch: None } => "Available all day.".to_string(),
        }
    }
}

pub fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// A status change as entered by the owner, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub status: AvailabilityStatus,
    /// "All day" for available, "not back today" for unavailable. Ignored
    /// while at lunch. Unstated means true for unavailable, false otherwise.
    pub all_day: Option<bool>,
    pub lunch_at: Option<NaiveTime>,
    pub back_at: Option<NaiveTime>,
}

impl AvailabilityRequest {
    pub fn new(status: AvailabilityStatus) -> Self {
        Self {
            status,
            all_day: None,
            lunch_at: None,
            back_at: None,
        }
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    pub fn lunch_at(mut self, time: NaiveTime) -> Self {
        self.lunch_at = Some(time);
        self
    }

    pub fn back_at(mut self, time: NaiveTime) -> Self {
        self.back_at = Some(time);
        self
    }

    fn effective_all_day(&self) -> bool {
        match self.status {
            AvailabilityStatus::AtLunch => false,
            AvailabilityStatus::Available => self.all_day.unwrap_or(false),
            AvailabilityStatus::Unavailable => self.all_day.unwrap_or(self.back_at.is_none()),
        }
    }

    /// Validate into an [`Availability`]. Times that do not apply to the
    /// chosen status are dropped.
    pub fn validate(&self) -> Result<Availability, AvailabilityError> {
        let all_day = self.effective_all_day();

        match self.status {
            AvailabilityStatus::Available if all_day => Ok(Availability::Available { lunch: None }),
            AvailabilityStatus::Available => match (self.lunch_at, self.back_at) {
                (Some(leaves_at), Some(back_at)) => {
                    if back_at <= leaves_at {
                        return Err(AvailabilityError::ReturnBeforeLunch);
                    }
                    Ok(Availability::Available {
                        lunch: Some(LunchBreak { leaves_at, back_at }),
                    })
                }
                _ => Err(AvailabilityError::MissingLunchTimes),
            },
            AvailabilityStatus::AtLunch => self
                .back_at
                .map(|back_at| Availability::AtLunch { back_at })
                .ok_or(AvailabilityError::MissingReturnTime),
            AvailabilityStatus::Unavailable if all_day => {
                Ok(Availability::Unavailable { back_at: None })
            }
            AvailabilityStatus::Unavailable => self
                .back_at
                .map(|t| Availability::Unavailable { back_at: Some(t) })
                .ok_or(AvailabilityError::MissingReturnTime),
        }
    }
}

/// An employee's stored availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub employee_id: EmployeeId,
    pub availability: Availability,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    UnknownStatus(String),
    MissingLunchTimes,
    MissingReturnTime,
    ReturnBeforeLunch,
}

impl std::fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityError::UnknownStatus(s) => write!(
                f,
                "unknown status '{}' (expected available, at_lunch or unavailable)",
                s
            ),
            AvailabilityError::MissingLunchTimes => write!(
                f,
                "lunch time and return time are required unless available all day"
            ),
            AvailabilityError::MissingReturnTime => write!(f, "return time is required"),
            AvailabilityError::ReturnBeforeLunch => {
                write!(f, "return time must be after lunch time")
            }
        }
    }
}

impl std::error::Error for AvailabilityError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_available_requires_both_times_unless_all_day() {
        let partial = AvailabilityRequest::new(AvailabilityStatus::Available).lunch_at(t("13:00"));
        assert_eq!(partial.validate(), Err(AvailabilityError::MissingLunchTimes));

        let all_day = AvailabilityRequest::new(AvailabilityStatus::Available)
            .all_day(true)
            .lunch_at(t("13:00"));
        assert_eq!(all_day.validate(), Ok(Availability::Available { lunch: None }));

        let full = AvailabilityRequest::new(AvailabilityStatus::Available)
            .lunch_at(t("13:00"))
            .back_at(t("14:00"));
        let availability = full.validate().unwrap();
        assert_eq!(availability.lunch_at(), Some(t("13:00")));
        assert_eq!(availability.back_at(), Some(t("14:00")));
    }

    #[test]
    fn test_available_lunch_must_end_after_it_starts() {
        let request = AvailabilityRequest::new(AvailabilityStatus::Available)
            .lunch_at(t("14:00"))
            .back_at(t("13:00"));
        assert_eq!(request.validate(), Err(AvailabilityError::ReturnBeforeLunch));
    }

    #[test]
    fn test_at_lunch_ignores_all_day() {
        let request = AvailabilityRequest::new(AvailabilityStatus::AtLunch).all_day(true);
        assert_eq!(request.validate(), Err(AvailabilityError::MissingReturnTime));

        let request = request.back_at(t("15:30"));
        assert_eq!(
            request.validate(),
            Ok(Availability::AtLunch { back_at: t("15:30") })
        );
    }

    #[test]
    fn test_unavailable_defaults_to_not_back_today() {
        let request = AvailabilityRequest::new(AvailabilityStatus::Unavailable);
        assert_eq!(
            request.validate(),
            Ok(Availability::Unavailable { back_at: None })
        );
    }

    #[test]
    fn test_unavailable_with_return_time() {
        let request = AvailabilityRequest::new(AvailabilityStatus::Unavailable).back_at(t("17:00"));
        assert_eq!(
            request.validate(),
            Ok(Availability::Unavailable {
                back_at: Some(t("17:00"))
            })
        );

        let explicit = AvailabilityRequest::new(AvailabilityStatus::Unavailable).all_day(false);
        assert_eq!(explicit.validate(), Err(AvailabilityError::MissingReturnTime));
    }

    #[test]
    fn test_unavailable_all_day_drops_return_time() {
        let request = AvailabilityRequest::new(AvailabilityStatus::Unavailable)
            .all_day(true)
            .back_at(t("17:00"));
        assert_eq!(request.validate().unwrap().back_at(), None);
    }

    #[test]
    fn test_summaries() {
        let lunch = Availability::Available {
            lunch: Some(LunchBreak {
                leaves_at: t("13:00"),
                back_at: t("14:00"),
            }),
        };
        assert_eq!(lunch.summary(), "Lunch at 13:00.");
        assert_eq!(
            Availability::Available { lunch: None }.summary(),
            "Available all day."
        );
        assert_eq!(
            Availability::AtLunch { back_at: t("14:30") }.summary(),
            "Back at 14:30."
        );
        assert_eq!(
            Availability::Unavailable { back_at: None }.summary(),
            "Not back today."
        );
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_rows() {
        assert!(
            Availability::from_parts(AvailabilityStatus::Available, Some(t("13:00")), None)
                .is_err()
        );
        assert!(Availability::from_parts(AvailabilityStatus::AtLunch, None, None).is_err());
        assert_eq!(
            Availability::from_parts(AvailabilityStatus::Unavailable, None, None),
            Ok(Availability::Unavailable { back_at: None })
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("at-lunch".parse::<AvailabilityStatus>(), Ok(AvailabilityStatus::AtLunch));
        assert_eq!("AVAILABLE".parse::<AvailabilityStatus>(), Ok(AvailabilityStatus::Available));
        assert!("busy".parse::<AvailabilityStatus>().is_err());
    }
}
