use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatError {
    /// Malformed event-construction input. Always a caller bug.
    InvalidArgument { message: String },
    /// Seat or piece id outside the domain bounds.
    OutOfRange { what: &'static str, value: i64 },
    /// The tracker was asked to remove an instance it does not hold.
    NotFound { message: String },
    /// Probe frame misuse, or bookkeeping that contradicts itself.
    InvalidState { message: String },
    /// JSON encode/decode failure for events or reactions.
    Serialization { message: String },
    /// Failure raised by an oracle implementation at the integration layer.
    Oracle { message: String },
}

impl SeatError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SeatError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SeatError::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        SeatError::InvalidState {
            message: message.into(),
        }
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        SeatError::Oracle {
            message: message.into(),
        }
    }
}

impl fmt::Display for SeatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatError::InvalidArgument { message } => {
                write!(f, "Invalid argument: {}", message)
            }
            SeatError::OutOfRange { what, value } => {
                write!(f, "{} out of range: {}", what, value)
            }
            SeatError::NotFound { message } => {
                write!(f, "Not found: {}", message)
            }
            SeatError::InvalidState { message } => {
                write!(f, "Invalid state: {}", message)
            }
            SeatError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
            SeatError::Oracle { message } => {
                write!(f, "Oracle error: {}", message)
            }
        }
    }
}

impl std::error::Error for SeatError {}

impl From<serde_json::Error> for SeatError {
    fn from(err: serde_json::Error) -> Self {
        SeatError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type SeatResult<T> = Result<T, SeatError>;
