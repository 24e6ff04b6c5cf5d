//! Train/test split, fitting and evaluation.

use crate::artifact::ModelArtifact;
use crate::error::{ModelError, Result};
use crate::regressor::LinearRegressor;
use data_loader::Table;
use data_loader::types::columns;
use pipeline::aggregate::score_map;
use pipeline::{Artifact, ArtifactStore, FeatureSpace, FeatureVector, PipelineConfig, ScoreMap, TrainingSet};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Held-out metrics of a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub r2: f64,
    pub mae: f64,
    pub rows: usize,
}

/// Shuffle `0..rows` with `seed` and split off `test_fraction` of it.
///
/// Returns `(train, test)`. The same seed always gives the same split.
pub fn train_test_split(rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_rows = ((rows as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let test = indices.split_off(rows - test_rows.min(rows));
    (indices, test)
}

/// R² and mean absolute error of `model` on the given rows
pub fn evaluate(model: &LinearRegressor, features: &[FeatureVector], targets: &[f64]) -> Option<Evaluation> {
    if targets.is_empty() {
        return None;
    }
    let n = targets.len() as f64;
    let mean = targets.iter().sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    let mut abs_err = 0.0;
    for (v, y) in features.iter().zip(targets) {
        let residual = y - model.predict(v);
        ss_res += residual * residual;
        ss_tot += (y - mean) * (y - mean);
        abs_err += residual.abs();
    }

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    Some(Evaluation {
        r2,
        mae: abs_err / n,
        rows: targets.len(),
    })
}

fn pick<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

/// Fit on the training part of `set` and evaluate on the rest
pub fn fit_and_evaluate(set: &TrainingSet, test_fraction: f64, seed: u64) -> Result<(LinearRegressor, Option<Evaluation>)> {
    let (train, test) = train_test_split(set.len(), test_fraction, seed);
    let model = LinearRegressor::fit(&pick(&set.features, &train), &pick(&set.targets, &train))?;

    let evaluation = evaluate(&model, &pick(&set.features, &test), &pick(&set.targets, &test));
    match &evaluation {
        Some(e) => info!(
            "Trained on {} rows, tested on {}: R² {:.4}, MAE {:.4}",
            train.len(),
            e.rows,
            e.r2,
            e.mae
        ),
        None => warn!("Trained on {} rows with no held-out rows; skipping evaluation", train.len()),
    }
    Ok((model, evaluation))
}

/// Build the complete model artifact from a prepared movie table
pub fn train_model(
    movies: &Table,
    director_scores: &ScoreMap,
    actor_scores: &ScoreMap,
    config: &PipelineConfig,
) -> Result<ModelArtifact> {
    let space = FeatureSpace::fit(movies, director_scores, actor_scores, config.impute)?;
    let set = space.training_set(movies)?;
    if set.is_empty() {
        return Err(ModelError::InsufficientData { rows: 0, needed: 1 });
    }
    info!(
        "Training set: {} rows ({} skipped), {} genres, {} languages",
        set.len(),
        set.skipped,
        space.genre.len(),
        space.language.len()
    );

    let (regressor, evaluation) = fit_and_evaluate(&set, config.test_fraction, config.seed)?;
    Ok(ModelArtifact::new(regressor, space, evaluation, set.len()))
}

/// Tables training reads, all written by the same preparation run
pub const TRAINING_INPUTS: [Artifact; 3] = [
    Artifact::MoviesWithDirectorActorScores,
    Artifact::DirectorScores,
    Artifact::ActorScores,
];

/// Train on the fully scored movie table of a preparation run
pub fn train_from_store(store: &mut ArtifactStore, config: &PipelineConfig) -> Result<ModelArtifact> {
    if let Some(missing) = TRAINING_INPUTS.iter().find(|a| !store.available(**a)) {
        return Err(ModelError::MissingInput {
            artifact: missing.to_string(),
        });
    }
    let directors = score_map(store.get(Artifact::DirectorScores)?, columns::PRIMARY_NAME, columns::DIRECTOR_SCORE)?;
    let actors = score_map(store.get(Artifact::ActorScores)?, columns::PRIMARY_NAME, columns::ACTOR_SCORE)?;
    let movies = store.get(Artifact::MoviesWithDirectorActorScores)?;
    info!("Training on {} ({} movies)", Artifact::MoviesWithDirectorActorScores, movies.len());
    train_model(movies, &directors, &actors, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_and_determinism() {
        let (train, test) = train_test_split(10, 0.2, 42);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let (train_again, test_again) = train_test_split(10, 0.2, 42);
        assert_eq!(train, train_again);
        assert_eq!(test, test_again);

        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, test) = train_test_split(5, 0.0, 1);
        assert_eq!(train.len(), 5);
        assert!(test.is_empty());
    }

    #[test]
    fn test_evaluate_perfect_and_constant() {
        let model = LinearRegressor {
            coefficients: vec![0.0; pipeline::FEATURE_COUNT],
            intercept: 6.0,
        };
        let v = FeatureVector {
            start_year: 2000,
            runtime_minutes: 100,
            genre_code: 0,
            lang_code: 0,
            num_votes: 0,
            director_score: 0.0,
            actor_score: 0.0,
        };
        let e = evaluate(&model, &[v, v], &[6.0, 6.0]).unwrap();
        assert_eq!(e.r2, 1.0);
        assert_eq!(e.mae, 0.0);

        let e = evaluate(&model, &[v, v], &[5.0, 7.0]).unwrap();
        assert_eq!(e.mae, 1.0);
        assert_eq!(e.r2, 0.0);
        assert!(evaluate(&model, &[], &[]).is_none());
    }
}
