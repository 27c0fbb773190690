pub mod business;
pub mod hours;

pub use business::Business;
pub use hours::{DayHours, WeeklyHours};
