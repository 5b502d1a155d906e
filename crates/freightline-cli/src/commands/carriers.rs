use freightline_core::{ApiOperation, ApiResponse, CarrierId, RatingConfig};
use serde::Serialize;

use crate::cli::CarriersArgs;
use crate::error::CliError;

use super::CommandOutcome;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CarrierSummary {
    key: &'static str,
    name: &'static str,
    default_currency: &'static str,
    configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnabledSummary {
    id: String,
    carrier_key: String,
    name: String,
    supported: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompanyCarriers {
    company_id: String,
    carriers: Vec<EnabledSummary>,
}

pub fn run(args: &CarriersArgs, config: &RatingConfig) -> Result<CommandOutcome, CliError> {
    let body = match &args.company {
        Some(company_id) => serde_json::to_value(ApiResponse::ok(company_carriers(config, company_id)))?,
        None => serde_json::to_value(ApiResponse::ok(supported_carriers(config)))?,
    };
    Ok(CommandOutcome::ok(body))
}

fn supported_carriers(config: &RatingConfig) -> Vec<CarrierSummary> {
    CarrierId::ALL
        .into_iter()
        .map(|carrier| CarrierSummary {
            key: carrier.as_str(),
            name: carrier.display_name(),
            default_currency: carrier.default_currency(),
            configured: config
                .api_config(carrier, ApiOperation::Rate)
                .is_some_and(|api| !api.api_url.trim().is_empty()),
        })
        .collect()
}

fn company_carriers(config: &RatingConfig, company_id: &str) -> CompanyCarriers {
    let carriers = config
        .resolve_enabled(company_id)
        .into_iter()
        .map(|record| EnabledSummary {
            supported: record.carrier_key.parse::<CarrierId>().is_ok(),
            id: record.id,
            carrier_key: record.carrier_key,
            name: record.name,
        })
        .collect();

    CompanyCarriers {
        company_id: company_id.to_owned(),
        carriers,
    }
}
