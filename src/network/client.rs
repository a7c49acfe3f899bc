//! Blocking client
//!
//! One request in flight at a time; used by the CLI and the end-to-end tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{NavError, Result};
use crate::protocol::{read_response, write_request, Request, RequestType, Response};

/// Client connection to a navdb server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    client_id: u32,
    next_request_id: u32,
}

impl Client {
    /// Connect and consume the welcome response
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| NavError::Network(format!("connect failed: {}", e)))?;
        stream.set_nodelay(true)?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let welcome = read_response(&mut reader)?;
        if !welcome.is_success() {
            return Err(NavError::Network(welcome.message));
        }
        tracing::debug!("Connected as client {}", welcome.client_id);

        Ok(Self {
            reader,
            writer: BufWriter::new(stream),
            client_id: welcome.client_id,
            next_request_id: 1,
        })
    }

    /// Id the server assigned to this connection
    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Send a request and wait for its response
    ///
    /// The server numbers accepted requests per connection starting at 1, in
    /// step with this client's counter.
    ///
    /// Parameter values travel unescaped, so a value holding `;`, `=` or a
    /// line break is refused before anything is written.
    pub fn send(&mut self, mut request: Request) -> Result<Response> {
        check_params(&request)?;

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        request.client_id = self.client_id;
        request.request_id = request_id;
        write_request(&mut self.writer, &request)?;

        loop {
            let response = read_response(&mut self.reader)?;
            if response.request_id == request_id {
                return Ok(response);
            }
            tracing::debug!(
                "Skipping response to request {} while waiting for {}",
                response.request_id,
                request_id
            );
        }
    }

    // ========================================================================
    // Typed helpers
    // ========================================================================

    pub fn add_location(
        &mut self,
        name: &str,
        latitude: f64,
        longitude: f64,
        kind: &str,
    ) -> Result<Response> {
        self.send(
            Request::new(RequestType::AddLocation)
                .with_param("name", name)
                .with_param("latitude", latitude)
                .with_param("longitude", longitude)
                .with_param("type", kind),
        )
    }

    pub fn add_road(
        &mut self,
        source_id: u64,
        dest_id: u64,
        distance: Option<f64>,
        road_name: &str,
        bidirectional: bool,
    ) -> Result<Response> {
        let mut request = Request::new(RequestType::AddRoad)
            .with_param("sourceId", source_id)
            .with_param("destId", dest_id)
            .with_param("roadName", road_name)
            .with_param("bidirectional", if bidirectional { "1" } else { "0" });
        if let Some(distance) = distance {
            request.set_param("distance", distance);
        }
        self.send(request)
    }

    pub fn find_path(&mut self, source_id: u64, dest_id: u64) -> Result<Response> {
        self.send(
            Request::new(RequestType::FindPath)
                .with_param("sourceId", source_id)
                .with_param("destId", dest_id),
        )
    }

    /// Like [`find_path`](Self::find_path), with turn-by-turn directions
    /// appended as a `directions` data field (one step per line)
    pub fn find_path_with_directions(&mut self, source_id: u64, dest_id: u64) -> Result<Response> {
        self.send(
            Request::new(RequestType::FindPath)
                .with_param("sourceId", source_id)
                .with_param("destId", dest_id)
                .with_param("directions", 1),
        )
    }

    pub fn get_locations(&mut self) -> Result<Response> {
        self.send(Request::new(RequestType::GetLocations))
    }

    pub fn get_roads(&mut self) -> Result<Response> {
        self.send(Request::new(RequestType::GetRoads))
    }

    pub fn get_location(&mut self, id: u64) -> Result<Response> {
        self.send(Request::new(RequestType::GetLocation).with_param("id", id))
    }

    pub fn init_sample(&mut self) -> Result<Response> {
        self.send(Request::new(RequestType::InitSample))
    }

    pub fn save_data(&mut self) -> Result<Response> {
        self.send(Request::new(RequestType::SaveData))
    }

    pub fn shutdown(&mut self) -> Result<Response> {
        self.send(Request::new(RequestType::Shutdown))
    }
}

fn check_params(request: &Request) -> Result<()> {
    for (key, value) in &request.params {
        if let Some(bad) = value.chars().find(|c| matches!(c, ';' | '=' | '\n' | '\r')) {
            return Err(NavError::Validation(format!(
                "Parameter '{}' may not contain {:?}",
                key, bad
            )));
        }
    }
    Ok(())
}
