mod accounting;
mod appointment;
mod availability;
mod employee;
mod money;
mod period;
mod sale;

pub use accounting::*;
pub use appointment::*;
pub use availability::*;
pub use employee::*;
pub use money::*;
pub use period::*;
pub use sale::*;
