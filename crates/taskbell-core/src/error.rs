use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("invalid date format: {0}")]
    InvalidFormat(String),

    #[error("local time does not exist in {zone}: {input}")]
    NonexistentLocalTime { input: String, zone: String },

    #[error("unknown time zone: {0}")]
    UnknownZone(String),

    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}
