/// Chain Compiler — compiles a text corpus into Markov chain tables.
///
/// Usage: chain_compiler [INPUT] --output <chain.bin> [--config <build.ron>]
///
/// Writes the blob, a `.ron` layout sidecar next to it, and prints statistics
/// and C/PHP constants to stderr.
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::info;

use markov_tables::core::builder::{BuildConfig, GraphBuilder};
use markov_tables::core::grouper::OptionOrder;
use markov_tables::schema::layout::TableLayout;

const DEFAULT_OUTPUT: &str = "markovchain.bin";

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile text into fixed-width Markov chain tables", long_about = None)]
struct Cli {
    /// Text file to read (stdin when absent)
    input: Option<PathBuf>,

    /// Output path for the chain blob
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Build config in RON
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the longest accepted word, in bytes
    #[arg(long, value_name = "BYTES")]
    max_word_length: Option<usize>,

    /// Option run order: ascending or descending key ID
    #[arg(long, value_name = "ORDER")]
    order: Option<OptionOrder>,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    quiet: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => BuildConfig::load_from_ron(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(max) = cli.max_word_length {
        config.max_word_length = max;
    }
    if let Some(order) = cli.order {
        config.option_order = order;
    }

    let mut builder = GraphBuilder::new(config);
    info!(
        "building with max word length {} and {} option order",
        builder.config().max_word_length,
        builder.config().option_order
    );
    let consumed = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            builder.consume_reader(BufReader::new(file))
        }
        None => builder.consume_reader(io::stdin().lock()),
    }
    .context("failed to build chain")?;
    info!("consumed {} words", consumed);

    let graph = builder.finish().context("failed to group options")?;
    let chain = graph.encode().context("failed to encode tables")?;
    chain
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    let stats = graph.stats()?;
    for line in stats.to_string().lines() {
        info!("{}", line);
    }
    info!(
        "wrote {} ({} bytes) and {}",
        cli.output.display(),
        chain.bytes.len(),
        TableLayout::sidecar_path(&cli.output).display()
    );

    eprintln!("Constants for C/C++:\n{}", chain.layout.c_defines());
    eprintln!("Constants for PHP:\n{}", chain.layout.php_defines());
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
