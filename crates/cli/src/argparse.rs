use std::{fs::File, io::Read};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

/// Compute LZ78 complexity of symbol sequences
#[derive(Parser)]
#[command(name = "lz78c", version)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the LZ78 complexity of a sequence
    Complexity(ComplexityCli),
    /// Print the LZ78 complexity of every prefix of a sequence
    Running(RunningCli),
    /// Threshold whitespace-separated numbers into a binary string
    Binarise(BinariseCli),
    /// Estimate the complexity of random sequences and save the table
    Simulate(SimulateCli),
    /// Print the complexity of a sequence relative to random sequences
    Normalize(NormalizeCli),
}

#[derive(Args)]
pub struct InputArgs {
    /// Sequence given directly on the command line
    #[arg(long, short, conflicts_with = "file")]
    pub input: Option<String>,

    /// File containing the sequence. Trailing whitespace is ignored.
    #[arg(long, short)]
    pub file: Option<String>,
}

impl InputArgs {
    pub fn read(&self) -> Result<Vec<u8>> {
        match (&self.input, &self.file) {
            (Some(input), _) => Ok(input.as_bytes().to_vec()),
            (None, Some(path)) => {
                let mut bytes = Vec::new();
                File::open(path)?.read_to_end(&mut bytes)?;
                let end = bytes
                    .iter()
                    .rposition(|b| !b.is_ascii_whitespace())
                    .map_or(0, |i| i + 1);
                bytes.truncate(end);
                Ok(bytes)
            }
            (None, None) => bail!("Either --input or --file must be given"),
        }
    }
}

#[derive(Args)]
pub struct ComplexityCli {
    #[command(flatten)]
    pub input: InputArgs,

    /// Also print the phrase dictionary
    #[arg(long, default_value_t = false)]
    pub dict: bool,

    /// Size of the dictionary buffer. Defaults to the size needed for the
    /// whole input; smaller buffers truncate the parse.
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Fail instead of truncating when the buffer is too small
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Treat the input as ending at its first NUL byte instead of rejecting it
    #[arg(long, default_value_t = false)]
    pub stop_at_nul: bool,
}

#[derive(Args)]
pub struct RunningCli {
    #[command(flatten)]
    pub input: InputArgs,

    /// Save the running complexity to this path in binary form
    #[arg(long, short)]
    pub save_path: Option<String>,
}

#[derive(Args)]
pub struct BinariseCli {
    /// File of whitespace-separated numbers
    #[arg(long, short)]
    pub file: String,

    /// Threshold at the mean instead of the median
    #[arg(long, default_value_t = false)]
    pub mean: bool,
}

#[derive(Args)]
pub struct SimulateCli {
    /// Longest sequence length in the table
    #[arg(long, short)]
    pub n_max: usize,

    #[arg(long, short, default_value_t = 2)]
    pub alphabet_size: u32,

    /// Number of random sequences to simulate
    #[arg(long, default_value_t = 1000)]
    pub samples: u64,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Path to save the table
    #[arg(long, short)]
    pub save_path: String,
}

#[derive(Args)]
pub struct NormalizeCli {
    #[command(flatten)]
    pub input: InputArgs,

    /// Table saved by the `simulate` subcommand. If not given, a table is
    /// simulated for the input's length and alphabet.
    #[arg(long, short)]
    pub table: Option<String>,

    /// Number of random sequences to simulate when no table is given
    #[arg(long, default_value_t = 1000)]
    pub samples: u64,

    /// Alphabet size to normalize against. Defaults to the number of distinct
    /// symbols in the input (at least 2).
    #[arg(long, short)]
    pub alphabet_size: Option<u32>,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complexity_args() {
        let cli = Cli::try_parse_from(["lz78c", "complexity", "-i", "0101", "--dict", "--strict"])
            .unwrap();
        let Command::Complexity(args) = cli.command else {
            panic!("expected the complexity subcommand");
        };
        assert!(args.dict && args.strict && !args.stop_at_nul);
        assert_eq!(args.input.read().unwrap(), b"0101");
    }

    #[test]
    fn test_input_and_file_conflict() {
        assert!(Cli::try_parse_from(["lz78c", "running", "-i", "01", "-f", "x.txt"]).is_err());
    }

    #[test]
    fn test_missing_input() {
        let cli = Cli::try_parse_from(["lz78c", "running"]).unwrap();
        let Command::Running(args) = cli.command else {
            panic!("expected the running subcommand");
        };
        assert!(args.input.read().is_err());
    }
}
