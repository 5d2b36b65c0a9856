use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use f1stats::config::Config;
use f1stats::data;
use f1stats::features::FeatureAccumulator;
use f1stats::print;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file or directory to source the results from
    input: Option<PathBuf>,

    /// where to write the CSV to
    out: Option<PathBuf>,

    /// JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        self.input
            .as_ref()
            .ok_or(anyhow!("results file or directory must be specified"))?;
        self.out
            .as_ref()
            .ok_or(anyhow!("output file must be specified"))?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = Config::load(args.config.as_deref())?;
    let accumulator = FeatureAccumulator::try_from(config)?;

    let start_time = Instant::now();
    let rows = data::load(args.input.unwrap())?;
    info!("loaded {} results", rows.len());
    let table = accumulator.compute(rows)?;
    info!("gap fills:\n{}", Console::default().render(&print::tabulate_fills(table.fills())));

    let out = args.out.unwrap();
    table.write_csv(&out)?;
    let elapsed_time = start_time.elapsed();
    info!(
        "wrote {} feature rows to {} in {:.3}s",
        table.len(),
        out.display(),
        elapsed_time.as_millis() as f64 / 1_000.
    );
    Ok(())
}
