//! Trains and evaluates the online recommender on rating files.
#![forbid(unsafe_code)]

use std::process::exit;

use anyhow::Error;
use env_logger::Env;
use log::{error, info};
use structopt::StructOpt;

use crate::{exit_code::FATAL_ERROR, experiment::ExperimentCmd, split::SplitCmd};

mod data;
mod exit_code;
mod experiment;
mod split;
mod utils;

/// Experiments with the online recommender.
#[derive(StructOpt, Debug)]
#[structopt(name = "dev-tool")]
enum RecommenderCmd {
    Experiment(ExperimentCmd),
    Split(SplitCmd),
}

impl RecommenderCmd {
    fn name(&self) -> &'static str {
        match self {
            RecommenderCmd::Experiment(_) => "experiment",
            RecommenderCmd::Split(_) => "split",
        }
    }

    /// Runs the subcommand and returns its exit code.
    fn run(self) -> Result<i32, Error> {
        match self {
            RecommenderCmd::Experiment(cmd) => cmd.run(),
            RecommenderCmd::Split(cmd) => cmd.run(),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cmd = RecommenderCmd::from_args();
    let name = cmd.name();
    let exit_code = cmd.run().unwrap_or_else(|error| {
        error!("{} failed: {:?}", name, error);
        FATAL_ERROR
    });
    info!("{} finished with exit code {}", name, exit_code);

    exit(exit_code);
}
