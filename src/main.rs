use clap::Parser;
use env_logger::Env;
use log::{error, info};
use rna_tree_distance::io::{open_input, open_output, read_structures};
use rna_tree_distance::{index_structures, Mode, Orchestrator, TedError};
use std::path::PathBuf;
use std::time::Instant;

/// Compute tree edit distances between RNA secondary structures given in
/// dot-bracket notation, one per line.
#[derive(Parser, Debug)]
#[command(
    name = "rna-tree-distance",
    version,
    about = "Tree edit distances between RNA secondary structures",
    long_about = "Reads RNA secondary structures in dot-bracket notation, one per line, \
                  until the first empty line, and writes either the full distance matrix, \
                  the matrix row by row, or the distances of the first structure to all \
                  others, based on tree edit distance."
)]
struct Args {
    /// Input file with one structure per line (`-` for stdin, `.gz` supported)
    #[arg(short = 'i', long = "input", default_value = "-")]
    input: PathBuf,

    /// Output path (`-` for stdout, `.gz` is compressed)
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: PathBuf,

    /// Number of worker threads (default: available parallelism)
    #[arg(short = 't', long = "threads", value_parser = clap::value_parser!(u16).range(1..))]
    threads: Option<u16>,

    /// Output the distance matrix row by row as rows finish (rows may come out of order)
    #[arg(short = 'r', long = "row-wise", default_value_t = false, conflicts_with = "first_only")]
    row_wise: bool,

    /// Compute distances only for the first structure against all others
    #[arg(short = 'f', long = "first-only", default_value_t = false)]
    first_only: bool,

    /// Quiet mode: suppresses progress and timing messages on stderr
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.first_only {
            Mode::FirstOnly
        } else if self.row_wise {
            Mode::RowWise
        } else {
            Mode::Full
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn run(args: &Args) -> Result<(), TedError> {
    let t0 = Instant::now();
    let structures = read_structures(open_input(&args.input)?)?;
    info!("Read {} structures in {:.3}s", structures.len(), t0.elapsed().as_secs_f64());

    let t1 = Instant::now();
    let trees = index_structures(&structures)?;
    info!("Indexing structure trees {:.3}s", t1.elapsed().as_secs_f64());

    let orchestrator = Orchestrator::new(args.threads.map(usize::from))?.with_progress(!args.quiet);
    let mode = args.mode();
    info!(
        "Computing {mode:?} distances for {} structures on {} threads",
        trees.len(),
        orchestrator.num_threads()
    );

    let t2 = Instant::now();
    let out = open_output(&args.output)?;
    orchestrator.run(mode, &trees, out)?.finish()?;
    info!("Computing and writing distances {:.3}s", t2.elapsed().as_secs_f64());

    Ok(())
}
