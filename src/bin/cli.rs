//! navdb CLI Client
//!
//! Command-line interface for interacting with a navdb server.

use clap::{Parser, Subcommand};
use navdb::network::Client;
use navdb::Response;

/// navdb CLI
#[derive(Parser, Debug)]
#[command(name = "navdb-cli")]
#[command(about = "CLI for the navdb navigation server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a location
    AddLocation {
        name: String,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        /// Category, e.g. "park"
        #[arg(short = 't', long = "type", default_value = "")]
        kind: String,
    },

    /// Add a road between two locations
    AddRoad {
        source_id: u64,
        dest_id: u64,
        /// Road name
        name: String,
        /// Distance in km (defaults to the straight-line distance)
        #[arg(short, long)]
        distance: Option<f64>,
        /// Only allow travel from source to destination
        #[arg(long)]
        one_way: bool,
    },

    /// Find the shortest path between two locations
    FindPath {
        source_id: u64,
        dest_id: u64,
        /// Also print turn-by-turn directions
        #[arg(long)]
        directions: bool,
    },

    /// List all locations
    Locations,

    /// List all roads
    Roads,

    /// Show one location
    Location { id: u64 },

    /// Replace the data with the sample map
    InitSample,

    /// Write both indexes to disk
    Save,

    /// Stop the server
    Shutdown,
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::AddLocation {
            name,
            latitude,
            longitude,
            kind,
        } => client.add_location(&name, latitude, longitude, &kind),
        Commands::AddRoad {
            source_id,
            dest_id,
            name,
            distance,
            one_way,
        } => client.add_road(source_id, dest_id, distance, &name, !one_way),
        Commands::FindPath {
            source_id,
            dest_id,
            directions: true,
        } => client.find_path_with_directions(source_id, dest_id),
        Commands::FindPath {
            source_id, dest_id, ..
        } => client.find_path(source_id, dest_id),
        Commands::Locations => client.get_locations(),
        Commands::Roads => client.get_roads(),
        Commands::Location { id } => client.get_location(id),
        Commands::InitSample => client.init_sample(),
        Commands::Save => client.save_data(),
        Commands::Shutdown => client.shutdown(),
    };

    match result {
        Ok(response) => {
            print_response(&response);
            if !response.is_success() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_response(response: &Response) {
    println!("[{}] {}", response.status, response.message);
    if response.data.is_empty() {
        return;
    }

    // `key=value;key=value` payloads are printed one field per line
    for field in response.data.split(';') {
        match field.split_once('=') {
            Some((key, value)) if value.contains('\n') => {
                println!("  {}:", key);
                for line in value.lines() {
                    println!("    {}", line);
                }
            }
            Some((key, value)) => println!("  {}: {}", key, value),
            None => println!("  {}", field),
        }
    }
}
