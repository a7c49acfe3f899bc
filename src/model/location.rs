//! Location record

use std::fmt;

use crate::error::{NavError, Result};
use crate::protocol::{escape_field, unescape_field};

use super::split_fields;

/// A named point on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Free-form category such as "station" or "park"
    pub kind: String,
}

impl Location {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            kind: kind.into(),
        }
    }

    /// Check the record before it is stored
    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(NavError::Validation("location id must be positive".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(NavError::Validation("location name must not be empty".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(NavError::Validation(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(NavError::Validation(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Value stored in the location index: `name|latitude|longitude|kind`
    pub fn encode(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            escape_field(&self.name),
            self.latitude,
            self.longitude,
            escape_field(&self.kind)
        )
    }

    pub fn decode(id: u64, value: &str) -> Result<Self> {
        let fields = split_fields(value);
        if fields.len() != 4 {
            return Err(NavError::Snapshot(format!(
                "location {}: expected 4 fields, found {}",
                id,
                fields.len()
            )));
        }

        let coordinate = |raw: &str, what: &str| {
            raw.parse::<f64>().map_err(|_| {
                NavError::Snapshot(format!("location {}: invalid {} '{}'", id, what, raw))
            })
        };

        Ok(Self {
            id,
            name: unescape_field(fields[0]),
            latitude: coordinate(fields[1], "latitude")?,
            longitude: coordinate(fields[2], "longitude")?,
            kind: unescape_field(fields[3]),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Lat: {}, Lon: {}, Type: {}",
            self.id, self.name, self.latitude, self.longitude, self.kind
        )
    }
}
