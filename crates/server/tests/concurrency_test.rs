//! Concurrent use of one prediction service.
//!
//! The service is loaded from an output directory exactly as the CLI does,
//! then hammered from many blocking tasks at once.

use model::{LinearRegressor, MODEL_FILE, ModelArtifact};
use pipeline::{FeatureSpace, PipelineConfig, UNKNOWN_CATEGORY, Vocabulary};
use server::{Notice, PredictionRequest, PredictionService};
use std::path::Path;

fn write_artifacts(dir: &Path) {
    ModelArtifact::new(
        LinearRegressor {
            coefficients: vec![0.002, -0.001, 0.05, 0.1, 0.0001, 0.5, 0.3],
            intercept: -3.0,
        },
        FeatureSpace {
            genre: Vocabulary::fit(["Action", "Action,Drama", "Drama", UNKNOWN_CATEGORY]),
            language: Vocabulary::fit(["hi", "ta", "te", "ml"]),
            director_fallback: 6.2,
            actor_fallback: 5.8,
        },
        None,
        1000,
    )
    .save(&dir.join(MODEL_FILE))
    .unwrap();
    std::fs::write(
        dir.join("director_scores.csv"),
        "primaryName,director_score\nMani Ratnam,7.9\nS. S. Rajamouli,8.3\n",
    )
    .unwrap();
    std::fs::write(dir.join("actor_scores.csv"), "primaryName,actor_score\nPrabhas,7.1\n").unwrap();
}

fn requests(n: usize) -> Vec<PredictionRequest> {
    let genres = ["Action", "Drama", "Horror", "Action, Drama"];
    let languages = ["hi", "ta", "te", "bn"];
    let directors = [Some("S. S. Rajamouli"), Some("mani ratnam"), Some("Unknown Person"), None];
    (0..n)
        .map(|i| PredictionRequest {
            release_year: 1990 + (i % 35) as i64,
            runtime_minutes: 90 + (i % 100) as i64,
            genre: genres[i % genres.len()].to_string(),
            language: languages[i % languages.len()].to_string(),
            expected_votes: (i * 97 % 20_000) as i64,
            director: directors[i % directors.len()].map(str::to_string),
            actor: (i % 2 == 0).then(|| "Prabhas".to_string()),
        })
        .collect()
}

fn load(dir: &Path) -> PredictionService {
    let config = PipelineConfig {
        out_dir: dir.to_path_buf(),
        ..PipelineConfig::default()
    };
    PredictionService::load(&config).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_predictions_match_sequential() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let service = load(dir.path());

    let inputs = requests(200);
    let sequential: Vec<_> = inputs.iter().map(|r| service.predict(r)).collect();

    let mut handles = Vec::new();
    for request in inputs.clone() {
        let service = service.clone();
        handles.push(tokio::task::spawn_blocking(move || service.predict(&request)));
    }
    let mut concurrent = Vec::new();
    for handle in handles {
        concurrent.push(handle.await.unwrap());
    }
    assert_eq!(sequential, concurrent);

    for response in concurrent.into_iter().map(Result::unwrap) {
        assert!((0.0..=10.0).contains(&response.rating));
    }
}

#[tokio::test]
async fn test_predict_blocking_reports_fallbacks() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let service = load(dir.path());

    let response = service
        .predict_blocking(PredictionRequest {
            release_year: 2022,
            runtime_minutes: 187,
            genre: "Sci-Fi".to_string(),
            language: "te".to_string(),
            expected_votes: 150_000,
            director: Some("s. s. rajamouli".to_string()),
            actor: Some("Prabhas".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(response.notices.len(), 1);
    assert!(matches!(response.notices[0], Notice::CategoryFallback { field: "genre", .. }));
    assert_eq!(response.features.director_score, 8.3);
}

#[tokio::test]
async fn test_invalid_request_names_field() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let service = load(dir.path());

    let mut request = requests(1).remove(0);
    request.runtime_minutes = 10;
    let err = service.predict_blocking(request).await.unwrap_err();
    assert_eq!(err.field(), "runtimeMinutes");
    assert!(err.to_string().contains("runtimeMinutes"));
}

#[test]
fn test_missing_score_tables_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    std::fs::remove_file(dir.path().join("actor_scores.csv")).unwrap();
    let service = load(dir.path());

    let mut request = requests(1).remove(0);
    request.actor = Some("Prabhas".to_string());
    let response = service.predict(&request).unwrap();
    assert_eq!(response.features.actor_score, 5.8);
}

#[test]
fn test_missing_model_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        out_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    assert!(PredictionService::load(&config).is_err());
}
