//! CLI argument definitions for freightline.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rate` | Rate a canonical request with one carrier |
//! | `aggregate` | Rate an aggregate request with every enabled carrier |
//! | `carriers` | List supported carriers, or the carriers enabled for a company |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | `$FREIGHTLINE_CONFIG` | JSON configuration file |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-json` | `false` | Emit logs to stderr as JSON lines |
//!
//! # Examples
//!
//! ```bash
//! freightline --config rating.json rate --carrier canpar --request quote.json
//! cat shipment.json | freightline aggregate --request - --pretty
//! RUST_LOG=freightline_core=debug freightline carriers --company acme
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use freightline_core::CarrierId;

/// Multi-carrier freight rating CLI
#[derive(Debug, Parser)]
#[command(
    name = "freightline",
    author,
    version,
    about = "Multi-carrier freight rating CLI",
    long_about = "freightline quotes shipments against Canpar, eShipPlus and Polaris \
Transportation, either one carrier at a time or fanned out to every carrier enabled \
for a company.\n\
\n\
Output is always a JSON envelope on stdout; logs go to stderr (filter with RUST_LOG)."
)]
pub struct Cli {
    /// Configuration file. Falls back to FREIGHTLINE_CONFIG, then to an empty config.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rate a canonical request with a single carrier.
    Rate(RateArgs),
    /// Rate an aggregate request with every carrier enabled for its company.
    Aggregate(AggregateArgs),
    /// List carriers.
    Carriers(CarriersArgs),
}

#[derive(Debug, Args)]
pub struct RateArgs {
    /// Carrier to quote (canpar, eshipplus, polaris).
    #[arg(long, value_parser = parse_carrier)]
    pub carrier: CarrierId,

    /// Request document path, or `-` for stdin.
    #[arg(long)]
    pub request: PathBuf,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Request document path, or `-` for stdin.
    #[arg(long)]
    pub request: PathBuf,
}

#[derive(Debug, Args)]
pub struct CarriersArgs {
    /// Show the carriers enabled for this company instead of the allow-list.
    #[arg(long)]
    pub company: Option<String>,
}

fn parse_carrier(raw: &str) -> Result<CarrierId, String> {
    raw.parse::<CarrierId>().map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_accepts_short_carrier_names() {
        let cli = Cli::try_parse_from([
            "freightline",
            "rate",
            "--carrier",
            "polaris",
            "--request",
            "-",
        ])
        .expect("parse");

        match cli.command {
            Command::Rate(args) => {
                assert_eq!(args.carrier, CarrierId::Polaristransportation);
                assert_eq!(args.request, PathBuf::from("-"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_carrier_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "freightline",
            "rate",
            "--carrier",
            "fedex",
            "--request",
            "q.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["freightline", "carriers", "--pretty", "--config", "r.json"])
            .expect("parse");
        assert!(cli.pretty);
        assert_eq!(cli.config, Some(PathBuf::from("r.json")));
    }
}
