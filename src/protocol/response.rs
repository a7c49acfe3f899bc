//! Response definitions
//!
//! Represents responses to clients.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    Failure = 1,
    NotFound = 2,
    InvalidParams = 3,
}

impl Status {
    /// Map a wire code to a status; unrecognized codes become `Failure`
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Success,
            2 => Self::NotFound,
            3 => Self::InvalidParams,
            _ => Self::Failure,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidParams => "INVALID_PARAMS",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub client_id: u32,
    pub request_id: u32,
    pub status: Status,

    /// Human-readable outcome
    pub message: String,

    /// Machine-readable payload (e.g. `id=3`, `count=2;locations=...`)
    pub data: String,
}

impl Response {
    pub fn new(client_id: u32, request_id: u32, status: Status, message: impl Into<String>) -> Self {
        Self {
            client_id,
            request_id,
            status,
            message: message.into(),
            data: String::new(),
        }
    }

    /// Create a SUCCESS response with a payload
    pub fn success(
        client_id: u32,
        request_id: u32,
        message: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            ..Self::new(client_id, request_id, Status::Success, message)
        }
    }

    /// Create a FAILURE response
    pub fn failure(client_id: u32, request_id: u32, message: impl Into<String>) -> Self {
        Self::new(client_id, request_id, Status::Failure, message)
    }

    /// Create a NOT_FOUND response
    pub fn not_found(client_id: u32, request_id: u32, message: impl Into<String>) -> Self {
        Self::new(client_id, request_id, Status::NotFound, message)
    }

    /// Create an INVALID_PARAMS response
    pub fn invalid_params(client_id: u32, request_id: u32, message: impl Into<String>) -> Self {
        Self::new(client_id, request_id, Status::InvalidParams, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
