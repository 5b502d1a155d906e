use freightline_core::{RatingConfig, RatingService};

use crate::cli::RateArgs;
use crate::error::CliError;

use super::{read_request, CommandOutcome};

pub async fn run(args: &RateArgs, config: RatingConfig) -> Result<CommandOutcome, CliError> {
    let payload = read_request(&args.request)?;
    let service = RatingService::from_config(config);

    let response = service.get_carrier_rates(args.carrier, payload).await?;
    Ok(CommandOutcome::ok(serde_json::to_value(response)?))
}
