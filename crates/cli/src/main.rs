mod argparse;

use std::fs::read_to_string;

use anyhow::{anyhow, Result};
use argparse::{
    BinariseCli, Cli, Command, ComplexityCli, NormalizeCli, RunningCli, SimulateCli,
};
use clap::Parser;
use itertools::Itertools;
use log::{info, warn};
use lz78c::{
    binarise::{binarise, Threshold},
    capacity, complexity_with_config, lz78_complexity,
    normalization::{alphabet_size, RandomComplexityTable},
    running_lz78_complexity,
    storage::ToFromBytes,
    ComplexityConfig, OverflowPolicy, ReservedSymbolPolicy,
};
use ndarray::Array1;

fn complexity_cmd(cli: ComplexityCli) -> Result<()> {
    let input = cli.input.read()?;
    let config = ComplexityConfig::new(
        if cli.strict {
            OverflowPolicy::Fail
        } else {
            OverflowPolicy::Truncate
        },
        if cli.stop_at_nul {
            ReservedSymbolPolicy::StopAtSeparator
        } else {
            ReservedSymbolPolicy::Reject
        },
    );

    let mut dict = vec![0; cli.capacity.unwrap_or_else(|| capacity(input.len()))];
    let result = complexity_with_config(&input, &mut dict, &config)?;

    println!("{}", result.count);
    if cli.dict {
        let end = dict.iter().position(|&b| b == 0).unwrap_or(dict.len());
        println!("{}", String::from_utf8_lossy(&dict[..end]));
    }
    Ok(())
}

fn running_cmd(cli: RunningCli) -> Result<()> {
    let input = cli.input.read()?;
    let running = running_lz78_complexity(&input)?;
    println!("{}", running.iter().join("\n"));

    if let Some(path) = cli.save_path {
        running.save_to_file(&path)?;
        info!("Saved running complexity of {} symbols to {path}", running.len());
    }
    Ok(())
}

fn binarise_cmd(cli: BinariseCli) -> Result<()> {
    let values = read_to_string(&cli.file)?
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|e| anyhow!("Could not parse \"{v}\" as a number: {e}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let threshold = if cli.mean {
        Threshold::Mean
    } else {
        Threshold::Median
    };

    let bits = binarise(Array1::from_vec(values).view(), threshold)?;
    println!("{}", String::from_utf8_lossy(&bits));
    Ok(())
}

fn simulate_cmd(cli: SimulateCli) -> Result<()> {
    info!(
        "Simulating {} random sequences of length {} over {} symbols",
        cli.samples, cli.n_max, cli.alphabet_size
    );
    let table =
        RandomComplexityTable::simulate(cli.n_max, cli.alphabet_size, cli.samples, cli.seed)?;
    if let Some(mean) = table.mean(cli.n_max) {
        println!("Mean complexity at length {}: {mean:.3}", cli.n_max);
    }
    if let Some(max) = table.max_observed() {
        println!("Largest complexity observed: {max}");
    }

    table.save_to_file(&cli.save_path)?;
    info!("Saved table to {}", cli.save_path);
    Ok(())
}

fn normalize_cmd(cli: NormalizeCli) -> Result<()> {
    let input = cli.input.read()?;
    let c = lz78_complexity(&input)?;

    let table = match &cli.table {
        Some(path) => RandomComplexityTable::from_file(path)?,
        None => {
            let alphabet = cli.alphabet_size.unwrap_or(alphabet_size(&input).max(2));
            info!(
                "Simulating {} random sequences over {alphabet} symbols",
                cli.samples
            );
            RandomComplexityTable::simulate(input.len().max(1), alphabet, cli.samples, cli.seed)?
        }
    };
    if let Some(alphabet) = cli.alphabet_size {
        if alphabet != table.alphabet_size() {
            warn!(
                "Table was built for {} symbols, not {alphabet}",
                table.alphabet_size()
            );
        }
    }

    let normalized = table.normalize(c, input.len()).ok_or_else(|| {
        anyhow!(
            "Input length {} is outside the table (lengths 1 to {})",
            input.len(),
            table.n_max()
        )
    })?;
    println!("{c}\t{normalized:.4}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .module("lz78c")
        .quiet(cli.quiet)
        .verbosity(match cli.verbose {
            0 => log::Level::Info,
            1 => log::Level::Debug,
            _ => log::Level::Trace,
        })
        .init()?;

    match cli.command {
        Command::Complexity(cli) => complexity_cmd(cli),
        Command::Running(cli) => running_cmd(cli),
        Command::Binarise(cli) => binarise_cmd(cli),
        Command::Simulate(cli) => simulate_cmd(cli),
        Command::Normalize(cli) => normalize_cmd(cli),
    }
}
