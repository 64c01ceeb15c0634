/// Chain Walker — streams words from a compiled chain until stopped.
///
/// Usage: chain_walker <chain.bin> [--layout <chain.ron>] [--seed <n>] [--limit <n>]
///        chain_walker <chain.bin> --keys-offset <n> --options-offset <n> --max-word-length <n>
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use env_logger::Env;
use log::{info, warn};

use markov_tables::core::reader::TableReader;
use markov_tables::core::walker::{ChainWalker, WalkError};
use markov_tables::schema::layout::TableLayout;

#[derive(Parser, Debug)]
#[command(author, version, about = "Walk a compiled Markov chain", long_about = None)]
struct Cli {
    /// Compiled chain blob
    chain: PathBuf,

    /// Layout sidecar (defaults to the .ron file next to the chain)
    #[arg(long, value_name = "PATH", conflicts_with_all = ["keys_offset", "options_offset"])]
    layout: Option<PathBuf>,

    /// KEYS_OFFSET constant, instead of a sidecar
    #[arg(long, value_name = "BYTES", requires_all = ["options_offset", "max_word_length"])]
    keys_offset: Option<u64>,

    /// OPTIONS_OFFSET constant, instead of a sidecar
    #[arg(long, value_name = "BYTES", requires_all = ["keys_offset", "max_word_length"])]
    options_offset: Option<u64>,

    /// MAX_WORD_LENGTH constant, instead of a sidecar
    #[arg(long, value_name = "BYTES", requires_all = ["keys_offset", "options_offset"])]
    max_word_length: Option<usize>,

    /// RNG seed (random when absent)
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Stop after this many words (runs forever when absent)
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// What to do when the chain reaches a key with no options
    #[arg(long, value_enum, default_value_t = OnExhausted::Restart)]
    on_exhausted: OnExhausted,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    quiet: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnExhausted {
    /// End the stream
    Stop,
    /// Go back to the start key
    Restart,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let file = File::open(&cli.chain)
        .with_context(|| format!("failed to open {}", cli.chain.display()))?;
    let store = BufReader::new(file);

    let reader = match (cli.keys_offset, cli.options_offset, cli.max_word_length) {
        (Some(keys), Some(options), Some(width)) => {
            TableReader::from_offsets(store, keys, options, width)
        }
        _ => {
            let path = cli
                .layout
                .clone()
                .unwrap_or_else(|| TableLayout::sidecar_path(&cli.chain));
            let layout = TableLayout::load_ron(&path)
                .with_context(|| format!("failed to load layout {}", path.display()))?;
            TableReader::new(store, layout)
        }
    }
    .context("chain does not match its layout")?;

    let layout = *reader.layout();
    info!(
        "walking {}: {} words, {} keys, {} options",
        cli.chain.display(),
        layout.word_count,
        layout.key_count,
        layout.option_count
    );

    let mut walker = match cli.seed {
        Some(seed) => ChainWalker::new(reader, seed),
        None => ChainWalker::from_entropy(reader),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut emitted = 0u64;
    let mut since_restart = 0u64;

    while cli.limit.map_or(true, |limit| emitted < limit) {
        match walker.step() {
            Ok(word) => {
                if let Err(e) = write!(out, "{} ", word) {
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        return Ok(());
                    }
                    return Err(e.into());
                }
                emitted += 1;
                since_restart += 1;
            }
            Err(WalkError::Exhausted { key }) => match cli.on_exhausted {
                OnExhausted::Stop => {
                    info!("chain exhausted at {} after {} words", key, emitted);
                    break;
                }
                OnExhausted::Restart if since_restart == 0 => {
                    bail!("chain exhausted at {} without emitting a word", key);
                }
                OnExhausted::Restart => {
                    warn!("chain exhausted at {}, restarting", key);
                    walker.reset();
                    since_restart = 0;
                }
            },
            Err(e) => return Err(e).context("chain is corrupt"),
        }
    }

    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = match (quiet, verbose) {
        (0, 0) => LevelFilter::Info,
        (0, 1) => LevelFilter::Debug,
        (0, _) => LevelFilter::Trace,
        (1, _) => LevelFilter::Warn,
        _ => LevelFilter::Error,
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn offsets_come_as_a_set() {
        assert!(Cli::try_parse_from(["chain_walker", "chain.bin", "--max-word-length", "5"]).is_err());
        assert!(Cli::try_parse_from(["chain_walker", "chain.bin", "--keys-offset", "8"]).is_err());

        let cli = Cli::try_parse_from([
            "chain_walker",
            "chain.bin",
            "--keys-offset",
            "8",
            "--options-offset",
            "12",
            "--max-word-length",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.keys_offset, Some(8));
        assert_eq!(cli.options_offset, Some(12));
        assert_eq!(cli.max_word_length, Some(4));
    }
}
