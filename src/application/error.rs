use thiserror::Error;

use crate::domain::{Amount, AvailabilityError, PeriodError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("Invalid employee name: {0:?}")]
    InvalidEmployeeName(String),

    #[error("Employee already exists: {0}")]
    EmployeeAlreadyExists(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Employee amount {employee_amount} exceeds price {price}")]
    EmployeeAmountExceedsPrice {
        price: Amount,
        employee_amount: Amount,
    },

    #[error("Invalid availability: {0}")]
    InvalidAvailability(#[from] AvailabilityError),

    #[error("Invalid appointment: {0}")]
    InvalidAppointment(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] PeriodError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
