//! Operator CLI for the route optimization engine
//!
//! Reads an optimization request (JSON), runs one session, prints the
//! operator text report, and optionally writes the wire response for the
//! API layer.
//!
//! ```text
//! route-optimizer --request request.json --output response.json
//! ```

use clap::Parser;
use route_optimizer_core_rs::api::{run_optimization_with_report, OptimizationRequest};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "route-optimizer",
    about = "Propose and simulate transit service changes from a demand forecast"
)]
struct Args {
    /// Optimization request JSON file
    #[arg(long)]
    request: PathBuf,

    /// Write the response JSON here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the response JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let payload = fs::read_to_string(&args.request)?;
    let request: OptimizationRequest = serde_json::from_str(&payload)?;

    log::info!(
        "running optimization: {} demand rows, {} routes",
        request.forecasted_demand.len(),
        request.current_route_topology.routes.len()
    );

    let (response, report) = run_optimization_with_report(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", report.render_text());
    }

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&response)?)?;
        log::info!("response written to {}", path.display());
    }

    Ok(())
}
