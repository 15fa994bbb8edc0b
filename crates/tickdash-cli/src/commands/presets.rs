use std::io;

use serde::Serialize;
use tickdash_core::{ChartStyle, Period, SyntheticSource, PRESET_SYMBOLS};

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Choice {
    value: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct PresetsData {
    symbols: Vec<&'static str>,
    periods: Vec<Choice>,
    styles: Vec<Choice>,
    offline_symbols: Vec<&'static str>,
}

fn presets() -> PresetsData {
    PresetsData {
        symbols: PRESET_SYMBOLS.to_vec(),
        periods: Period::ALL
            .into_iter()
            .map(|period| Choice {
                value: period.as_str(),
                label: period.label(),
            })
            .collect(),
        styles: ChartStyle::ALL
            .into_iter()
            .map(|style| Choice {
                value: style.as_str(),
                label: style.label(),
            })
            .collect(),
        offline_symbols: SyntheticSource::known_symbols().collect(),
    }
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    let data = presets();
    match cli.format {
        OutputFormat::Json => output::render_json(&mut io::stdout().lock(), &data, cli.pretty),
        OutputFormat::Table => {
            println!("Symbols : {}", data.symbols.join(", "));
            println!("Periods :");
            for choice in &data.periods {
                println!("  {:<4} {}", choice.value, choice.label);
            }
            println!("Styles  :");
            for choice in &data.styles {
                println!("  {:<12} {}", choice.value, choice.label);
            }
            println!("Offline : {}", data.offline_symbols.join(", "));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_symbol_is_served_offline() {
        let data = presets();
        assert_eq!(data.symbols.len(), 8);
        assert!(data
            .symbols
            .iter()
            .all(|symbol| data.offline_symbols.contains(symbol)));
        assert_eq!(data.periods.len(), 7);
        assert_eq!(data.styles[0].value, "candlestick");
    }
}
