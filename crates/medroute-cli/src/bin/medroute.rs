//! Plan medical drone deliveries from a JSON request snapshot.
//!
//! Example:
//!   medroute plan request.json --pretty
//!   medroute next-position -3.1869 55.9445 67.5

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medroute_cli::{init_tracing, read_polygon, read_request, render};
use medroute_core::{
    distance, is_close, is_in_region, next_position, DeliveryPlan, LngLat, PlannerConfig,
    PlannerError, PlanningContext, SingleFlightPolicy,
};

/// Medical delivery drone planner
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Single-flight mode picks the cheapest feasible drone instead of the first
    #[arg(long, global = true)]
    cheapest: bool,

    /// Exit non-zero when allocation fails instead of printing an empty plan
    #[arg(long, global = true)]
    strict: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate all orders across the fleet and print the delivery plan
    Plan { request: PathBuf },

    /// Print one flight carrying every order as a LineString
    Path { request: PathBuf },

    /// Euclidean distance between two positions, in degrees
    Distance {
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
    },

    /// Whether two positions are within one step of each other
    IsClose {
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
    },

    /// Position one step from a start along a compass angle (multiple of 22.5)
    NextPosition {
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        angle: f64,
    },

    /// Whether a position lies inside (or on) a polygon read from a JSON file
    InRegion {
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        polygon: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.json_logs);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "medroute failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut config = PlannerConfig::from_env();
    if args.cheapest {
        config.selection = SingleFlightPolicy::Cheapest;
    }

    let output = match &args.command {
        Command::Plan { request } => {
            let request = read_request(request)?;
            let ctx = PlanningContext::from_request(&request, config)?;
            let plan = match ctx.try_calc_delivery_plan(&request.orders) {
                Ok(plan) => plan,
                Err(e @ PlannerError::AllocationFailed { .. }) => {
                    if args.strict {
                        eprintln!("error: {}", e);
                        return Ok(ExitCode::from(2));
                    }
                    tracing::error!(error = %e, "allocation failed, printing empty plan");
                    DeliveryPlan::empty()
                }
                Err(e) => return Err(e.into()),
            };
            render(&plan, args.pretty)?
        }
        Command::Path { request } => {
            let request = read_request(request)?;
            let ctx = PlanningContext::from_request(&request, config)?;
            let line = ctx.try_calc_delivery_path(&request.orders)?;
            if args.strict && line.coordinates.is_empty() {
                eprintln!("error: no drone can fly every order");
                return Ok(ExitCode::from(2));
            }
            render(&line, args.pretty)?
        }
        Command::Distance {
            lng1,
            lat1,
            lng2,
            lat2,
        } => {
            let d = distance(LngLat::new(*lng1, *lat1)?, LngLat::new(*lng2, *lat2)?);
            render(&d, args.pretty)?
        }
        Command::IsClose {
            lng1,
            lat1,
            lng2,
            lat2,
        } => {
            let close = is_close(LngLat::new(*lng1, *lat1)?, LngLat::new(*lng2, *lat2)?);
            render(&close, args.pretty)?
        }
        Command::NextPosition { lng, lat, angle } => {
            let next = next_position(LngLat::new(*lng, *lat)?, *angle)?;
            render(&next, args.pretty)?
        }
        Command::InRegion { lng, lat, polygon } => {
            let vertices = read_polygon(polygon)?;
            let inside = is_in_region(LngLat::new(*lng, *lat)?, &vertices)?;
            render(&inside, args.pretty)?
        }
    };

    println!("{}", output);
    Ok(ExitCode::SUCCESS)
}
