use freightline_core::{RatingConfig, RatingService};
use tracing::warn;

use crate::cli::AggregateArgs;
use crate::error::CliError;

use super::{read_request, CommandOutcome};

pub async fn run(args: &AggregateArgs, config: RatingConfig) -> Result<CommandOutcome, CliError> {
    let payload = read_request(&args.request)?;
    let service = RatingService::from_config(config);

    let response = service.get_universal_rates(payload).await?;
    let results = &response.data.carrier_results;
    for failure in &results.errors {
        warn!(carrier = %failure.carrier, error = %failure.error, "carrier excluded from aggregate");
    }

    let partial = results.failed > 0;
    Ok(CommandOutcome::ok(serde_json::to_value(&response)?).with_partial_failure(partial))
}
