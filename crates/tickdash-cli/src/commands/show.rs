use tickdash_core::DashboardController;
use tracing::debug;

use crate::cli::{Cli, DashboardArgs};
use crate::error::CliError;

use super::{defaults, ensure_displayed, load_config, print_state};

pub async fn run(cli: &Cli, args: &DashboardArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let inputs = args.to_inputs(defaults(&config))?;
    debug!(symbol = %inputs.symbol, offline = config.offline, "show");

    let mut controller = DashboardController::new(config.fetcher());
    let state = controller.submit(inputs).await?;

    print_state(cli, state)?;
    ensure_displayed(state)
}
