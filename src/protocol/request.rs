//! Request definitions
//!
//! Represents requests from clients.

use std::collections::BTreeMap;

/// Request types, with their wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestType {
    AddLocation = 0,
    AddRoad = 1,
    FindPath = 2,
    GetLocations = 3,
    GetRoads = 4,
    GetLocation = 5,
    InitSample = 6,
    SaveData = 7,
    Shutdown = 8,
    Unknown = 9,
}

impl RequestType {
    /// Map a wire code to a type; unrecognized codes become `Unknown`
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::AddLocation,
            1 => Self::AddRoad,
            2 => Self::FindPath,
            3 => Self::GetLocations,
            4 => Self::GetRoads,
            5 => Self::GetLocation,
            6 => Self::InitSample,
            7 => Self::SaveData,
            8 => Self::Shutdown,
            _ => Self::Unknown,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddLocation => "ADD_LOCATION",
            Self::AddRoad => "ADD_ROAD",
            Self::FindPath => "FIND_PATH",
            Self::GetLocations => "GET_LOCATIONS",
            Self::GetRoads => "GET_ROADS",
            Self::GetLocation => "GET_LOCATION",
            Self::InitSample => "INIT_SAMPLE",
            Self::SaveData => "SAVE_DATA",
            Self::Shutdown => "SHUTDOWN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Assigned by the server per connection
    pub client_id: u32,

    /// Assigned by the server, increasing per connection
    pub request_id: u32,

    pub kind: RequestType,

    /// Named parameters; keys are unique, order is irrelevant
    pub params: BTreeMap<String, String>,
}

impl Request {
    pub fn new(kind: RequestType) -> Self {
        Self {
            client_id: 0,
            request_id: 0,
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl ToString) {
        self.params.insert(key.into(), value.to_string());
    }

    /// Raw parameter value (`None` when absent or empty)
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Parameter parsed as an unsigned integer
    ///
    /// `None` when absent; `Some(Err(raw))` when present but unparsable.
    pub fn param_u64(&self, key: &str) -> Option<Result<u64, String>> {
        self.param(key)
            .map(|raw| raw.trim().parse().map_err(|_| raw.to_string()))
    }

    /// Parameter parsed as a float; same shape as [`Request::param_u64`]
    pub fn param_f64(&self, key: &str) -> Option<Result<f64, String>> {
        self.param(key).map(|raw| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| raw.to_string())
        })
    }

    /// Boolean parameter: `1`, `true` and `yes` are true, anything else false
    pub fn param_bool(&self, key: &str, default: bool) -> bool {
        match self.param(key) {
            Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            None => default,
        }
    }
}
