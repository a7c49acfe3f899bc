//! Engine Module
//!
//! Request router sitting between the worker pool and the database.
//!
//! ## Responsibilities
//! - Own the database behind the single store lock
//! - Validate request parameters and run the matching handler
//! - Map handler errors onto response statuses
//! - Track the shutdown flag raised by a SHUTDOWN request

use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::Config;
use crate::database::Database;
use crate::error::{NavError, Result};
use crate::graph::{dijkstra, directions, NavigationError};
use crate::protocol::{Request, RequestType, Response, Status};

/// Payload of a successful handler: `(message, data)`
type Outcome = (String, String);

/// The request engine
///
/// ## Concurrency Model
///
/// Every request runs with the store lock held for the whole handler, so
/// handlers observe and leave the database in a consistent state. The lock is
/// never held while touching the request queue.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Store lock
    database: Mutex<Database>,

    /// Raised by SHUTDOWN, polled by the accept loop
    shutdown: AtomicBool,
}

impl Engine {
    /// Open or create an engine with the given config
    pub fn open(config: Config) -> Result<Self> {
        let database = Database::open(&config.data_dir)?;

        Ok(Self {
            config,
            database: Mutex::new(database),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Execute a request and build its response
    ///
    /// Never fails: every error becomes a non-SUCCESS response.
    pub fn execute(&self, request: &Request) -> Response {
        let (client_id, request_id) = (request.client_id, request.request_id);
        tracing::debug!(
            "Executing {} for client {} (request {})",
            request.kind,
            client_id,
            request_id
        );

        let result = {
            let mut db = self.database.lock();
            self.dispatch(&mut db, request)
        };

        match result {
            Ok((message, data)) => Response::success(client_id, request_id, message, data),
            Err(e) => {
                let (status, message) = classify(e);
                tracing::debug!(
                    "Request {} from client {} failed: {} {}",
                    request_id,
                    client_id,
                    status,
                    message
                );
                Response::new(client_id, request_id, status, message)
            }
        }
    }

    fn dispatch(&self, db: &mut Database, request: &Request) -> Result<Outcome> {
        match request.kind {
            RequestType::AddLocation => add_location(db, request),
            RequestType::AddRoad => add_road(db, request),
            RequestType::FindPath => find_path(db, request),
            RequestType::GetLocations => get_locations(db),
            RequestType::GetRoads => get_roads(db),
            RequestType::GetLocation => get_location(db, request),
            RequestType::InitSample => {
                db.initialize_sample_data()?;
                db.save()?;
                Ok((
                    "Sample data initialized".to_string(),
                    format!(
                        "locations={};roads={}",
                        db.location_count(),
                        db.edge_count()
                    ),
                ))
            }
            RequestType::SaveData => {
                db.save()?;
                Ok(("Data saved successfully".to_string(), String::new()))
            }
            RequestType::Shutdown => {
                self.request_shutdown();
                Ok(("Server shutting down".to_string(), String::new()))
            }
            RequestType::Unknown => Err(NavError::Protocol("Unknown request type".to_string())),
        }
    }

    /// Run a closure with the store lock held
    pub fn with_database<T>(&self, f: impl FnOnce(&mut Database) -> T) -> T {
        let mut db = self.database.lock();
        f(&mut *db)
    }

    /// Write both snapshots
    pub fn save(&self) -> Result<()> {
        self.database.lock().save()
    }

    /// Persist pending changes before the process exits
    pub fn close(&self) -> Result<()> {
        let mut db = self.database.lock();
        if db.is_dirty() {
            db.save()?;
        }
        tracing::info!("Engine closed");
        Ok(())
    }

    pub fn request_shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            tracing::info!("Shutdown requested");
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn add_location(db: &mut Database, request: &Request) -> Result<Outcome> {
    let name = request
        .param("name")
        .ok_or_else(|| NavError::Validation("Missing location name".to_string()))?;
    let latitude = required_f64(request, "latitude")?;
    let longitude = required_f64(request, "longitude")?;
    let kind = request.param("type").unwrap_or("");

    let id = db.add_location(name, latitude, longitude, kind)?;
    Ok(("Location added successfully".to_string(), format!("id={}", id)))
}

fn add_road(db: &mut Database, request: &Request) -> Result<Outcome> {
    let (source_id, dest_id) = endpoints(request)?;
    let distance = match request.param_f64("distance") {
        None => None,
        Some(Ok(d)) => Some(d),
        Some(Err(raw)) => {
            return Err(NavError::Validation(format!("Invalid distance '{}'", raw)));
        }
    };
    let road_name = request.param("roadName").unwrap_or("");
    let bidirectional = request.param_bool("bidirectional", true);

    let id = db.add_edge(source_id, dest_id, distance, road_name, bidirectional)?;
    Ok(("Road added successfully".to_string(), format!("id={}", id)))
}

fn find_path(db: &mut Database, request: &Request) -> Result<Outcome> {
    let (source_id, dest_id) = endpoints(request)?;
    let route = dijkstra(db.graph(), source_id, dest_id)?;

    let mut data = String::from("path=");
    for (i, id) in route.path.iter().enumerate() {
        if i > 0 {
            data.push_str("->");
        }
        let name = db.graph().node(*id).map_or("", |l| l.name.as_str());
        let _ = write!(data, "{}({})", name, id);
    }
    let _ = write!(data, ";distance={:.2}", route.total_distance);

    if request.param_bool("directions", false) {
        data.push_str(";directions=");
        data.push_str(&directions(db.graph(), &route).join("\n"));
    }

    Ok(("Path found".to_string(), data))
}

fn get_locations(db: &mut Database) -> Result<Outcome> {
    let locations = db.locations();
    let listing: Vec<String> = locations
        .iter()
        .map(|l| format!("{}:{}", l.id, l.name))
        .collect();

    Ok((
        format!("Retrieved {} locations", locations.len()),
        format!("count={};locations={}", locations.len(), listing.join(",")),
    ))
}

fn get_roads(db: &mut Database) -> Result<Outcome> {
    let edges = db.edges();
    let listing: Vec<String> = edges
        .iter()
        .map(|e| {
            format!(
                "{}:{}->{}({}km)",
                e.id, e.source_id, e.destination_id, e.distance
            )
        })
        .collect();

    Ok((
        format!("Retrieved {} roads", edges.len()),
        format!("count={};roads={}", edges.len(), listing.join(",")),
    ))
}

fn get_location(db: &mut Database, request: &Request) -> Result<Outcome> {
    let id = required_id(request, "id")?;
    let location = db.location(id).map_err(|e| match e {
        NavError::NotFound(_) => NavError::NotFound("Location not found".to_string()),
        other => other,
    })?;
    Ok(("Location found".to_string(), location.to_string()))
}

// ============================================================================
// Parameter helpers
// ============================================================================

fn required_f64(request: &Request, key: &str) -> Result<f64> {
    match request.param_f64(key) {
        Some(Ok(v)) => Ok(v),
        Some(Err(raw)) => Err(NavError::Validation(format!("Invalid {} '{}'", key, raw))),
        None => Err(NavError::Validation(format!("Missing {}", key))),
    }
}

fn required_id(request: &Request, key: &str) -> Result<u64> {
    match request.param_u64(key) {
        Some(Ok(id)) if id > 0 => Ok(id),
        Some(Ok(_)) | Some(Err(_)) => {
            Err(NavError::Validation(format!("Invalid {}", key)))
        }
        None => Err(NavError::Validation(format!("Missing {}", key))),
    }
}

/// `sourceId` and `destId`, both positive
fn endpoints(request: &Request) -> Result<(u64, u64)> {
    let invalid = || NavError::Validation("Invalid source or destination ID".to_string());
    let source = required_id(request, "sourceId").map_err(|_| invalid())?;
    let dest = required_id(request, "destId").map_err(|_| invalid())?;
    Ok((source, dest))
}

/// Map an error onto the response status and client-facing message
fn classify(error: NavError) -> (Status, String) {
    match error {
        NavError::Validation(msg) => (Status::InvalidParams, msg),
        NavError::NotFound(msg) => (Status::NotFound, msg),
        NavError::Navigation(e @ NavigationError::EmptyGraph) => (Status::Failure, e.to_string()),
        NavError::Navigation(e) => (Status::NotFound, e.to_string()),
        NavError::Protocol(msg) => (Status::Failure, msg),
        other => {
            tracing::warn!("Request failed with internal error: {}", other);
            (Status::Failure, other.to_string())
        }
    }
}
