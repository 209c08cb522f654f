mod changes;
mod repository;

pub use changes::*;
pub use repository::*;

/// SQL migration for employees and the two sale partitions
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for staff availability
pub const MIGRATION_002_AVAILABILITY: &str = include_str!("migrations/002_availability.sql");

/// SQL migration for the appointment board
pub const MIGRATION_003_APPOINTMENTS: &str = include_str!("migrations/003_appointments.sql");
