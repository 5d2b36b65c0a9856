use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use f1stats::config::Config;
use f1stats::data;
use f1stats::features::FeatureAccumulator;
use f1stats::print;
use f1stats::scorer::LinearScorer;
use f1stats::train::{self, Dataset};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file or directory to source the results from
    input: Option<PathBuf>,

    /// where to write the fitted model to
    out: Option<PathBuf>,

    /// JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// only use results up to and including this season
    #[clap(short = 's', long)]
    season: Option<u32>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        self.input
            .as_ref()
            .ok_or(anyhow!("results file or directory must be specified"))?;
        self.out
            .as_ref()
            .ok_or(anyhow!("model file must be specified"))?;
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
    let cv_options = config.cross_validation.clone();
    let accumulator = FeatureAccumulator::try_from(config)?;

    let start_time = Instant::now();
    let mut rows = data::load(args.input.unwrap())?;
    if let Some(season) = args.season {
        rows.retain(|row| row.season <= season);
    }
    let table = accumulator.compute(rows)?;
    let dataset = Dataset::from_features(&table)?;
    info!(
        "training on {} rows across {} races",
        dataset.len(),
        dataset.distinct_groups()
    );

    match train::cross_validate::<LinearScorer>(&dataset, &cv_options)? {
        None => warn!("too few races to cross-validate"),
        Some(cv) => info!(
            "cross-validation:\n{}",
            Console::default().render(&print::tabulate_cross_validation(&cv))
        ),
    }

    let model = LinearScorer::regress(dataset.rows())?;
    info!(
        "fitted on all rows: R²={:.6}, adjusted R²={:.6}\n{}",
        model.r_squared,
        model.r_squared_adj,
        Console::default().render(&model.tabulate())
    );
    let out = args.out.unwrap();
    LinearScorer::from(model).write_json(&out)?;
    let elapsed_time = start_time.elapsed();
    info!(
        "wrote model to {} in {:.3}s",
        out.display(),
        elapsed_time.as_millis() as f64 / 1_000.
    );
    Ok(())
}
