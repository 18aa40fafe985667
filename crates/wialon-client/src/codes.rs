//! Wialon Remote API error codes

use std::fmt;

/// Error codes reported in the `error` field of a Remote API response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    InvalidSession,
    InvalidServiceName,
    InvalidResult,
    InvalidInput,
    RequestFailed,
    UnknownError,
    AccessDenied,
    InvalidCredentials,
    AuthServerUnavailable,
    ConcurrentRequestLimit,
    PasswordResetError,
    BillingError,

    // Service specific codes
    NoMessagesForInterval,
    ItemAlreadyExists,
    OneRequestAtATime,
    MessageLimitExceeded,
    ExecutionTimeExceeded,
    TwoFactorAttemptsExceeded,
    IpChangedOrSessionExpired,
    UserIsObjectCreator,
    SensorDeleteForbidden,

    /// Code not present in the catalogue
    Unknown(i64),
}

impl From<i64> for ErrorCode {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::InvalidSession,
            2 => Self::InvalidServiceName,
            3 => Self::InvalidResult,
            4 => Self::InvalidInput,
            5 => Self::RequestFailed,
            6 => Self::UnknownError,
            7 => Self::AccessDenied,
            8 => Self::InvalidCredentials,
            9 => Self::AuthServerUnavailable,
            10 => Self::ConcurrentRequestLimit,
            11 => Self::PasswordResetError,
            14 => Self::BillingError,
            1001 => Self::NoMessagesForInterval,
            1002 => Self::ItemAlreadyExists,
            1003 => Self::OneRequestAtATime,
            1004 => Self::MessageLimitExceeded,
            1005 => Self::ExecutionTimeExceeded,
            1006 => Self::TwoFactorAttemptsExceeded,
            1011 => Self::IpChangedOrSessionExpired,
            2014 => Self::UserIsObjectCreator,
            2015 => Self::SensorDeleteForbidden,
            other => Self::Unknown(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Success => 0,
            ErrorCode::InvalidSession => 1,
            ErrorCode::InvalidServiceName => 2,
            ErrorCode::InvalidResult => 3,
            ErrorCode::InvalidInput => 4,
            ErrorCode::RequestFailed => 5,
            ErrorCode::UnknownError => 6,
            ErrorCode::AccessDenied => 7,
            ErrorCode::InvalidCredentials => 8,
            ErrorCode::AuthServerUnavailable => 9,
            ErrorCode::ConcurrentRequestLimit => 10,
            ErrorCode::PasswordResetError => 11,
            ErrorCode::BillingError => 14,
            ErrorCode::NoMessagesForInterval => 1001,
            ErrorCode::ItemAlreadyExists => 1002,
            ErrorCode::OneRequestAtATime => 1003,
            ErrorCode::MessageLimitExceeded => 1004,
            ErrorCode::ExecutionTimeExceeded => 1005,
            ErrorCode::TwoFactorAttemptsExceeded => 1006,
            ErrorCode::IpChangedOrSessionExpired => 1011,
            ErrorCode::UserIsObjectCreator => 2014,
            ErrorCode::SensorDeleteForbidden => 2015,
            ErrorCode::Unknown(v) => v,
        }
    }
}

impl ErrorCode {
    /// Human-readable description, "Unknown error" for uncatalogued codes
    pub fn description(&self) -> &'static str {
        match self {
            Self::Success => "Successful operation",
            Self::InvalidSession => "Invalid session",
            Self::InvalidServiceName => "Invalid service name",
            Self::InvalidResult => "Invalid result",
            Self::InvalidInput => "Invalid input",
            Self::RequestFailed => "Error performing request",
            Self::UnknownError => "Unknown error",
            Self::AccessDenied => "Access denied",
            Self::InvalidCredentials => "Invalid user name or password",
            Self::AuthServerUnavailable => "Authorization server is unavailable",
            Self::ConcurrentRequestLimit => "Reached limit of concurrent requests",
            Self::PasswordResetError => "Password reset error",
            Self::BillingError => "Billing error",
            Self::NoMessagesForInterval => "No messages for selected interval",
            Self::ItemAlreadyExists => {
                "Item with such unique property already exists or it cannot be created \
                 according to billing restrictions"
            }
            Self::OneRequestAtATime => "Only one request is allowed at the moment",
            Self::MessageLimitExceeded => "Limit of messages has been exceeded",
            Self::ExecutionTimeExceeded => "Execution time has exceeded the limit",
            Self::TwoFactorAttemptsExceeded => {
                "Exceeding the limit of attempts to enter a two-factor authorization code"
            }
            Self::IpChangedOrSessionExpired => "Your IP has changed or session has expired",
            Self::UserIsObjectCreator => {
                "Selected user is a creator for some system objects, thus this user cannot \
                 be bound to a new account"
            }
            Self::SensorDeleteForbidden => {
                "Sensor deleting is forbidden because of using in another sensor or advanced \
                 properties of the unit"
            }
            Self::Unknown(_) => "Unknown error",
        }
    }

    /// Error category the code belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied | Self::InvalidCredentials | Self::AuthServerUnavailable => {
                ErrorKind::Authentication
            }
            Self::InvalidInput => ErrorKind::InvalidInput,
            _ => ErrorKind::Generic,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), i64::from(*self))
    }
}

/// Category of a server-reported error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Access denied, bad credentials or authorization server unavailable
    Authentication,
    /// The service rejected its parameters
    InvalidInput,
    /// Any other non-zero code
    Generic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication error"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Generic => write!(f, "API error"),
        }
    }
}
