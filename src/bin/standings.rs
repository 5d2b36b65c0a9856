use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use f1stats::data;
use f1stats::print;
use f1stats::standings::Standings;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file or directory to source the results from
    input: Option<PathBuf>,

    /// season to report on
    #[clap(short = 's', long, default_value_t = 2024)]
    season: u32,

    /// driver code to summarise, e.g. VER
    #[clap(short = 'd', long)]
    driver: Option<String>,

    /// maximum number of drivers listed
    #[clap(long, default_value_t = 20)]
    drivers: usize,

    /// maximum number of constructors listed
    #[clap(long, default_value_t = 10)]
    constructors: usize,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        self.input
            .as_ref()
            .ok_or(anyhow!("results file or directory must be specified"))?;
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

    let rows = data::load(args.input.as_ref().unwrap())?;
    let standings = Standings::new(&rows);

    match &args.driver {
        Some(driver) => {
            let summary = standings.summary(driver, args.season)?;
            let wins = standings.wins_races(driver, args.season)?;
            info!(
                "{} {}: {} wins, {} podiums, {} points",
                summary.driver, summary.season, summary.wins, summary.podiums, summary.points
            );
            if !wins.is_empty() {
                info!("wins:\n{}", Console::default().render(&print::tabulate_wins(&wins)));
            }
        }
        None => {
            let drivers = standings.drivers_leaderboard(args.season, args.drivers)?;
            info!(
                "{} drivers:\n{}",
                args.season,
                Console::default().render(&print::tabulate_drivers(&drivers))
            );
            let constructors = standings.constructors_leaderboard(args.season, args.constructors)?;
            info!(
                "{} constructors:\n{}",
                args.season,
                Console::default().render(&print::tabulate_constructors(&constructors))
            );
        }
    }
    Ok(())
}
