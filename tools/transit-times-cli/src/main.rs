use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{filter::FilterFn, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt};
use transit_times::{estimate_with_profile, EngineConfig, PredecessorPolicy, TransitTimeQuery};

mod output;
mod snapshot;

use output::{table_to_json, write_json};
use snapshot::read_snapshot;

#[derive(Parser, Debug)]
#[command(
    name = "transit-times-cli",
    author,
    version,
    about = "Estimate bus running times between two stops from GPS pings",
    long_about = "Reads a JSON snapshot of a route's stops and its vehicles' GPS pings, \
                  estimates when each vehicle passed each stop by interpolating along \
                  its trajectory, and reports the mean travel time between two stops \
                  per weekday at the requested hour.\n\n\
                  Durations of zero or less, and durations at or above --max-duration \
                  minutes, are discarded as GPS artefacts."
)]
struct Args {
    /// Input snapshot JSON file (`stops` and `positions` arrays)
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Route identifier, e.g. 8000-10
    #[arg(short, long)]
    route: String,

    /// Stop the trip leaves from
    #[arg(long)]
    first_stop: String,

    /// Stop the trip arrives at
    #[arg(long)]
    second_stop: String,

    /// Hour of day, written HH:00
    #[arg(long)]
    hour: String,

    /// IANA zone used for hour and weekday bucketing
    #[arg(long, default_value = "America/Sao_Paulo")]
    time_zone: String,

    /// Durations at or above this many minutes are discarded
    #[arg(long, default_value_t = 10.0)]
    max_duration: f64,

    /// Pair each stop with the previous selected stop instead of the
    /// stop immediately before it on the route
    #[arg(long)]
    non_adjacent: bool,

    /// Also output the mean duration for every hour of the day
    #[arg(long)]
    profile: bool,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let max_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = FilterFn::new(move |meta| {
        *meta.level() <= max_level && meta.target().starts_with("transit_times")
    });
    let layer = tracing_subscriber::fmt::layer()
        .event_format(Format::default().with_target(false).without_time())
        .with_writer(std::io::stderr);
    tracing_subscriber::registry().with(layer).with(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    tracing::info!("Input: {}", args.input.display());
    if !args.input.exists() {
        bail!("Input file does not exist: {}", args.input.display());
    }
    if !(args.max_duration > 0.0) {
        bail!("--max-duration must be a positive number of minutes, got {}", args.max_duration);
    }

    let predecessor = if args.non_adjacent {
        PredecessorPolicy::PreviousSelected
    } else {
        PredecessorPolicy::Adjacent
    };
    let config = EngineConfig::with_time_zone_name(&args.time_zone)
        .context("Invalid --time-zone")?
        .with_max_duration(args.max_duration)
        .with_predecessor(predecessor);
    let query = TransitTimeQuery::new(
        args.route.as_str(),
        args.first_stop.as_str(),
        args.second_stop.as_str(),
        &args.hour,
    )
    .context("Invalid --hour")?;

    let source = read_snapshot(&args.input)?
        .into_source()
        .context("Failed to load snapshot")?;
    tracing::info!(
        "Loaded {} routes, {} pings",
        source.route_count(),
        source.ping_count()
    );

    let (table, profile) = estimate_with_profile(&source, &query, &config)?;
    let profile = args.profile.then_some(profile);

    if table.is_empty() {
        tracing::warn!("No samples for {} at {}", table.title(), table.hour);
    }
    for row in &table.rows {
        tracing::info!(
            "  {:<9} {:>6.2} min ({} samples)",
            row.weekday.to_string(),
            row.mean_duration_minutes,
            row.samples
        );
    }

    let document = table_to_json(&table, profile.as_deref())?;
    write_json(&document, args.output.as_deref())?;
    if let Some(path) = &args.output {
        tracing::info!("Wrote {}", path.display());
    }

    Ok(())
}
