mod presets;
mod show;
mod watch;

use std::io::{self, Write};

use tickdash_core::{DashboardConfig, DashboardState};

use crate::cli::{Cli, Command, InputDefaults};
use crate::error::CliError;
use crate::output;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Show(args) => show::run(cli, args).await,
        Command::Watch(args) => watch::run(cli, args).await,
        Command::Presets => presets::run(cli),
    }
}

/// Environment first, then global flags.
fn load_config(cli: &Cli) -> Result<DashboardConfig, CliError> {
    let mut config = DashboardConfig::from_env()?;
    if cli.offline {
        config = config.with_offline(true);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    Ok(config)
}

fn defaults(config: &DashboardConfig) -> InputDefaults<'_> {
    InputDefaults {
        symbol: &config.default_symbol,
        period: config.default_period,
        style: config.default_style,
    }
}

fn print_state(cli: &Cli, state: &DashboardState) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::render_state(&mut out, state, cli.format, cli.pretty)?;
    out.flush()?;
    Ok(())
}

/// Map a failed dashboard onto the process exit code.
fn ensure_displayed(state: &DashboardState) -> Result<(), CliError> {
    match state.failure() {
        Some(failure) => Err(CliError::Dashboard {
            code: failure.code.clone(),
            message: failure.message.clone(),
        }),
        None => Ok(()),
    }
}
