// Application layer: use cases and orchestration over the record store.

pub mod accounting;
pub mod error;
pub mod reporting;
pub mod service;

pub use accounting::*;
pub use error::*;
pub use reporting::*;
pub use service::*;
