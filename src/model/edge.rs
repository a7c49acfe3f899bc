//! Road record

use std::fmt;

use crate::error::{NavError, Result};
use crate::protocol::{escape_field, unescape_field};

use super::split_fields;

/// A road between two locations
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: u64,
    pub source_id: u64,
    pub destination_id: u64,
    /// Kilometres
    pub distance: f64,
    pub road_name: String,
    pub bidirectional: bool,
}

impl Edge {
    pub fn new(
        id: u64,
        source_id: u64,
        destination_id: u64,
        distance: f64,
        road_name: impl Into<String>,
        bidirectional: bool,
    ) -> Self {
        Self {
            id,
            source_id,
            destination_id,
            distance,
            road_name: road_name.into(),
            bidirectional,
        }
    }

    /// Check the record's own fields (endpoint existence is checked by the
    /// database)
    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(NavError::Validation("road id must be positive".to_string()));
        }
        if self.source_id == 0 || self.destination_id == 0 {
            return Err(NavError::Validation(
                "Invalid source or destination ID".to_string(),
            ));
        }
        if self.source_id == self.destination_id {
            return Err(NavError::Validation(format!(
                "road cannot connect location {} to itself",
                self.source_id
            )));
        }
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err(NavError::Validation(format!(
                "distance must be positive, got {}",
                self.distance
            )));
        }
        Ok(())
    }

    /// Value stored in the road index: `source|destination|distance|name|1|0`
    pub fn encode(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.source_id,
            self.destination_id,
            self.distance,
            escape_field(&self.road_name),
            if self.bidirectional { "1" } else { "0" }
        )
    }

    pub fn decode(id: u64, value: &str) -> Result<Self> {
        let fields = split_fields(value);
        if fields.len() != 5 {
            return Err(NavError::Snapshot(format!(
                "road {}: expected 5 fields, found {}",
                id,
                fields.len()
            )));
        }

        let invalid = |what: &str, raw: &str| {
            NavError::Snapshot(format!("road {}: invalid {} '{}'", id, what, raw))
        };

        Ok(Self {
            id,
            source_id: fields[0].parse().map_err(|_| invalid("source", fields[0]))?,
            destination_id: fields[1].parse().map_err(|_| invalid("destination", fields[1]))?,
            distance: fields[2].parse().map_err(|_| invalid("distance", fields[2]))?,
            road_name: unescape_field(fields[3]),
            bidirectional: fields[4] == "1",
        })
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EdgeID: {}, {} -> {}, Distance: {} km, Road: {}, {}",
            self.id,
            self.source_id,
            self.destination_id,
            self.distance,
            self.road_name,
            if self.bidirectional { "Bidirectional" } else { "One-way" }
        )
    }
}
