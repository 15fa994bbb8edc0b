use tickdash_core::DashboardController;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cli::{Cli, OutputFormat, WatchArgs};
use crate::error::CliError;

use super::{defaults, ensure_displayed, load_config, print_state};

pub async fn run(cli: &Cli, args: &WatchArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if let Some(secs) = args.interval_secs {
        config = config.with_refresh_secs(secs)?;
    }
    let inputs = args.dashboard.to_inputs(defaults(&config))?;

    let mut controller = DashboardController::new(config.fetcher()).with_auto_refresh(true);
    print_state(cli, controller.submit(inputs).await?)?;

    let mut ticker = tokio::time::interval(config.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut refreshes = 0_u32;
    while args.count.map_or(true, |limit| refreshes < limit) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!(refreshes, "interrupted");
                break;
            }
        }
        refreshes += 1;

        let Some(result) = controller.refresh().await else {
            break;
        };
        let state = result?;
        if cli.format == OutputFormat::Table {
            println!();
        }
        print_state(cli, state)?;
    }

    ensure_displayed(controller.state())
}
