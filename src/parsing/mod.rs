pub mod dates;
pub mod schedule;
