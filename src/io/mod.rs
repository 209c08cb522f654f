// Serialization of reports for output outside the terminal table.

pub mod export;

pub use export::*;
