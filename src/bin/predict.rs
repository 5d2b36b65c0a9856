use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use f1stats::config::Config;
use f1stats::data::{self, RaceKey};
use f1stats::features::FeatureAccumulator;
use f1stats::scorer::LinearScorer;
use f1stats::{placeholder, print, score, stub};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file or directory to source the results from
    input: Option<PathBuf>,

    /// season of the race to predict
    #[clap(short = 's', long)]
    season: Option<u32>,

    /// round of the race to predict
    #[clap(short = 'r', long)]
    round: Option<u32>,

    /// fitted model file
    #[clap(short = 'm', long)]
    model: Option<PathBuf>,

    /// derive win probabilities from the grid alone
    #[clap(short = 'p', long)]
    placeholder: bool,

    /// JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        self.input
            .as_ref()
            .ok_or(anyhow!("results file or directory must be specified"))?;
        self.season.ok_or(anyhow!("season must be specified"))?;
        self.round.ok_or(anyhow!("round must be specified"))?;
        if !self.placeholder {
            self.model
                .as_ref()
                .ok_or(anyhow!("model file must be specified unless using the placeholder"))?;
        }
        Ok(())
    }

    fn race(&self) -> RaceKey {
        RaceKey::new(self.season.unwrap(), self.round.unwrap())
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
    let top_n = config.top_n;
    let race = args.race();
    let mut rows = data::load(args.input.as_ref().unwrap())?;
    rows.retain(|row| row.season <= race.season);

    if args.placeholder {
        let grid = placeholder::grid_for_race(&rows, race);
        let probs = placeholder::predict_win_probs(&grid)?;
        info!(
            "placeholder win probabilities for {race}:\n{}",
            Console::default().render(&print::tabulate_win_probs(&probs))
        );
        return Ok(());
    }

    let stubs = stub::stub_race(&mut rows, race);
    if stubs > 0 {
        info!("{race} has no results yet; stubbed {stubs} entries");
    }
    let accumulator = FeatureAccumulator::try_from(config)?;
    let table = accumulator.compute(rows)?;
    let scorer = LinearScorer::read_json(args.model.unwrap())?;
    let mut predictions = score::score_race(&table, race, &scorer)?;
    predictions.truncate(top_n);
    info!(
        "podium predictions for {race}:\n{}",
        Console::default().render(&print::tabulate_predictions(&predictions))
    );
    Ok(())
}
