use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Error};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use structopt::StructOpt;

use crate::{exit_code::NO_ERROR, utils::file_spinner};

/// Splits the lines of a ratings file randomly into training, test and validation files.
#[derive(StructOpt, Debug)]
pub struct SplitCmd {
    /// The file to split.
    #[structopt(short, long)]
    input: PathBuf,

    #[structopt(long)]
    train: PathBuf,

    #[structopt(long)]
    test: PathBuf,

    #[structopt(long)]
    validation: PathBuf,

    /// The expected share of the lines which end up in the test file.
    #[structopt(long, default_value = "0.15")]
    test_fraction: f64,

    /// The expected share of the lines which end up in the validation file.
    #[structopt(long, default_value = "0.10")]
    validation_fraction: f64,

    /// Makes the split reproducible.
    #[structopt(long)]
    seed: Option<u64>,
}

/// The file a line ends up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Part {
    Train,
    Test,
    Validation,
}

impl Part {
    /// Assigns a uniform draw from `[0, 1)` to a part.
    fn assign(draw: f64, test_fraction: f64, validation_fraction: f64) -> Self {
        if draw <= validation_fraction {
            Part::Validation
        } else if draw <= validation_fraction + test_fraction {
            Part::Test
        } else {
            Part::Train
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, Error> {
    File::create(path)
        .map(BufWriter::new)
        .with_context(|| format!("Creating {} failed.", path.display()))
}

impl SplitCmd {
    pub fn run(self) -> Result<i32, Error> {
        let SplitCmd {
            input,
            train,
            test,
            validation,
            test_fraction,
            validation_fraction,
            seed,
        } = self;

        let valid = |fraction: f64| (0. ..=1.).contains(&fraction);
        if !valid(test_fraction)
            || !valid(validation_fraction)
            || test_fraction + validation_fraction > 1.
        {
            bail!(
                "Invalid fractions {} and {}, they must be within [0, 1] and sum up to at most 1",
                test_fraction,
                validation_fraction,
            );
        }

        let reader = File::open(&input)
            .map(BufReader::new)
            .with_context(|| format!("Opening {} failed.", input.display()))?;
        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let mut outputs = [create(&train)?, create(&test)?, create(&validation)?];

        let splitting = file_spinner("Splitting lines");
        let counts = split_lines(
            reader,
            &mut rng,
            test_fraction,
            validation_fraction,
            &mut outputs,
        )?;
        splitting.finish_and_clear();
        for output in &mut outputs {
            output.flush()?;
        }
        info!(
            "split into {} training, {} test and {} validation lines",
            counts[0], counts[1], counts[2],
        );

        Ok(NO_ERROR)
    }
}

/// Writes every line to the training, test or validation output and counts the lines per
/// output.
fn split_lines<R, W>(
    reader: R,
    rng: &mut impl Rng,
    test_fraction: f64,
    validation_fraction: f64,
    outputs: &mut [W; 3],
) -> Result<[usize; 3], Error>
where
    R: BufRead,
    W: Write,
{
    let mut counts = [0; 3];
    for line in reader.lines() {
        let line = line.context("Reading a line failed.")?;
        let index = match Part::assign(rng.gen::<f64>(), test_fraction, validation_fraction) {
            Part::Train => 0,
            Part::Test => 1,
            Part::Validation => 2,
        };
        writeln!(outputs[index], "{}", line)?;
        counts[index] += 1;
    }
    Ok(counts)
}
