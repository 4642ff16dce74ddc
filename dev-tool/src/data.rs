//! Reading of rating and side information files.

use std::{io::Read, path::Path};

use anyhow::{Context, Error};
use csv::{ReaderBuilder, StringRecord};
use displaydoc::Display;
use feature_vector::FeatureVector;
use online_recommender::{ItemId, Ratings, UserId};
use serde::Deserialize;
use thiserror::Error;

/// A single rating of a user for an item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Observation {
    pub(crate) user: UserId,
    pub(crate) item: ItemId,
    pub(crate) rating: f32,
}

/// The leading fields of a rating line, further fields are ignored.
#[derive(Deserialize)]
struct RatingRecord {
    user: u64,
    item: u64,
    rating: f32,
}

/// Potential errors of a side information line.
#[derive(Debug, Display, Error, PartialEq)]
pub(crate) enum SideInfoError {
    /// Missing features after the id
    MissingFeatures,
    /// Invalid id {0}
    Id(String),
    /// Invalid feature {0}, expected index:value
    Feature(String),
}

/// Checks that the separator is a single byte, as the csv reader expects it.
pub(crate) fn separator_byte(separator: &str) -> Result<u8, Error> {
    match separator.as_bytes() {
        [byte] => Ok(*byte),
        _ => anyhow::bail!("The separator {:?} must be a single byte", separator),
    }
}

fn reader<R: Read>(source: R, separator: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// Reads `user<sep>item<sep>rating[<sep>...]` lines.
///
/// The offset is added to every rating, e.g. `-1` maps ratings `1..=5` to the classes `0..=4`.
pub(crate) fn read_observations<R: Read>(
    source: R,
    separator: u8,
    offset: f32,
) -> Result<Vec<Observation>, Error> {
    let mut observations = Vec::new();
    for (line, record) in reader(source, separator).records().enumerate() {
        let record = record.with_context(|| format!("Reading line {} failed.", line + 1))?;
        let leading = record.iter().take(3).collect::<StringRecord>();
        let RatingRecord { user, item, rating } = leading
            .deserialize(None)
            .with_context(|| format!("Parsing line {} failed.", line + 1))?;
        observations.push(Observation {
            user: UserId(user),
            item: ItemId(item),
            rating: rating + offset,
        });
    }
    Ok(observations)
}

pub(crate) fn load_observations(
    path: &Path,
    separator: u8,
    offset: f32,
) -> Result<Vec<Observation>, Error> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Opening {} failed.", path.display()))?;
    read_observations(file, separator, offset)
        .with_context(|| format!("Loading ratings from {} failed.", path.display()))
}

/// Groups the observations by user, later ratings of a pair replace earlier ones.
pub(crate) fn ratings_by_user(observations: &[Observation]) -> Ratings {
    let mut ratings = Ratings::new();
    for observation in observations {
        ratings
            .entry(observation.user)
            .or_default()
            .insert(observation.item, observation.rating);
    }
    ratings
}

/// Parses the sparse features of a side information line, e.g. `0:1 5:0.5`.
fn parse_features(features: &str) -> Result<FeatureVector, SideInfoError> {
    features
        .split_whitespace()
        .map(|feature| {
            let invalid = || SideInfoError::Feature(feature.to_string());
            let (index, value) = feature.split_once(':').ok_or_else(invalid)?;
            let index = index.parse::<usize>().map_err(|_| invalid())?;
            let value = value.parse::<f32>().map_err(|_| invalid())?;
            Ok((index, value))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(FeatureVector::sparse)
}

fn parse_side_info(record: &StringRecord) -> Result<(u64, FeatureVector), SideInfoError> {
    let id = record.get(0).unwrap_or_default();
    let id = id
        .parse::<u64>()
        .map_err(|_| SideInfoError::Id(id.to_string()))?;
    let features = record.get(1).ok_or(SideInfoError::MissingFeatures)?;
    Ok((id, parse_features(features)?))
}

/// Reads `id<sep>index:value index:value ...` lines.
pub(crate) fn read_side_info<R: Read>(
    source: R,
    separator: u8,
) -> Result<Vec<(u64, FeatureVector)>, Error> {
    reader(source, separator)
        .records()
        .enumerate()
        .map(|(line, record)| {
            let record = record.with_context(|| format!("Reading line {} failed.", line + 1))?;
            parse_side_info(&record).with_context(|| format!("Parsing line {} failed.", line + 1))
        })
        .collect()
}

pub(crate) fn load_side_info(
    path: &Path,
    separator: u8,
) -> Result<Vec<(u64, FeatureVector)>, Error> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Opening {} failed.", path.display()))?;
    read_side_info(file, separator)
        .with_context(|| format!("Loading side information from {} failed.", path.display()))
}
