//! End-to-end pipeline tests: train, persist, load, score

use crate::constants::MODEL_FILE;
use crate::error::TriageError;
use crate::logic::alert::{AlertRecord, AlertTable};
use crate::logic::artifacts::ArtifactStore;
use crate::logic::config::TriageConfig;
use crate::logic::features::set_label;
use crate::logic::model::{threshold, BackendConfig, BoostingParams};
use crate::logic::pipeline::{LabelSource, Scorer, Trainer};

fn test_config(model_dir: &std::path::Path) -> TriageConfig {
    TriageConfig {
        model_dir: model_dir.to_path_buf(),
        backend: BackendConfig::BoostedTrees(BoostingParams {
            n_trees: 20,
            max_depth: 3,
            learning_rate: 0.3,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn benign(i: usize) -> AlertRecord {
    AlertRecord::new()
        .with("timestamp", format!("2024-03-0{}T{:02}:10:00Z", 1 + i % 7, 8 + i % 10).as_str())
        .with("rule.level", 3i64)
        .with("rule.id", 5715i64)
        .with("agent.name", format!("web-0{}", i % 3).as_str())
        .with("data.srcip", format!("10.0.0.{}", i % 4).as_str())
        .with("full_log", format!("sshd accepted publickey for deploy port {}", 40000 + i).as_str())
}

fn threat(i: usize) -> AlertRecord {
    AlertRecord::new()
        .with("timestamp", format!("2024-03-0{}T02:{:02}:00Z", 1 + i % 7, i % 60).as_str())
        .with("rule.level", 12i64)
        .with("rule.id", 92052i64)
        .with("agent.name", "win-dc01")
        .with("data.srcip", format!("10.0.0.{}", i % 4).as_str())
        .with("data.win.eventdata.commandLine", "powershell -enc SQBFAFgA downloadstring")
}

/// 40 rows, every 4th a threat
fn dataset() -> AlertTable {
    AlertTable::from(
        (0..40)
            .map(|i| if i % 4 == 0 { threat(i) } else { benign(i) })
            .collect::<Vec<_>>(),
    )
}

#[test]
fn test_train_reports_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let outcome = Trainer::new(&config).train(&dataset()).unwrap();

    let d = &outcome.diagnostics;
    assert_eq!(d.rows, 40);
    assert_eq!(d.threats, 10);
    assert!((d.threat_ratio - 0.25).abs() < 1e-12);
    assert_eq!(d.feature_width, outcome.transform.width());
    assert_eq!(d.feature_width, outcome.model.n_features());
    assert!(d.text_vocab_size > 0);
    assert_eq!(d.backend, "boosted_trees");
    assert_eq!(d.labeling.as_ref().map(|l| l.threats), Some(10));

    let cv = d.cv.as_ref().expect("two classes → CV runs");
    assert_eq!(cv.folds, 5);
    assert!(cv.accuracy.mean > 0.9);
}

#[test]
fn test_train_score_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = ArtifactStore::new(&config.model_dir);
    Trainer::new(&config).train_and_save(&dataset(), &store).unwrap();

    let scorer = Scorer::load(&config);
    assert!(scorer.is_available());

    let scores = scorer.score(&dataset()).unwrap().expect("model loaded");
    assert_eq!(scores.len(), 40);
    let expected: Vec<u8> = (0..40).map(|i| u8::from(i % 4 == 0)).collect();
    assert_eq!(scores.predictions, expected);
    assert!(scores.probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn test_score_unseen_values_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    Trainer::new(&config)
        .train_and_save(&dataset(), &ArtifactStore::new(&config.model_dir))
        .unwrap();
    let scorer = Scorer::load(&config);

    let table = AlertTable::from(vec![
        AlertRecord::new()
            .with("rule.id", 1i64)
            .with("agent.name", "never-seen")
            .with("full_log", "completely new words"),
        AlertRecord::new(),
    ]);
    let scores = scorer.score(&table).unwrap().unwrap();
    assert_eq!(scores.len(), 2);
}

#[test]
fn test_no_model_is_unavailable_not_benign() {
    let dir = tempfile::tempdir().unwrap();
    let scorer = Scorer::load(&test_config(&dir.path().join("empty")));

    assert!(!scorer.is_available());
    assert!(!scorer.status().model_loaded);
    assert_eq!(scorer.score(&dataset()).unwrap(), None);
}

#[test]
fn test_corrupt_artifacts_are_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    Trainer::new(&config)
        .train_and_save(&dataset(), &ArtifactStore::new(&config.model_dir))
        .unwrap();

    std::fs::write(dir.path().join(MODEL_FILE), b"{}").unwrap();
    let scorer = Scorer::load(&config);
    assert!(!scorer.is_available());
    assert_eq!(scorer.score(&dataset()).unwrap(), None);
}

#[test]
fn test_single_class_skips_cv_but_trains() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let table = AlertTable::from((1..20).map(benign).collect::<Vec<_>>());

    let outcome = Trainer::new(&config).train(&table).unwrap();
    assert_eq!(outcome.diagnostics.threats, 0);
    assert!(outcome.diagnostics.cv.is_none());
    assert_eq!(outcome.model.n_features(), outcome.transform.width());
}

#[test]
fn test_train_requires_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let table = AlertTable::from(vec![AlertRecord::new().with("rule.level", 12i64)]);

    match Trainer::new(&config).train(&table) {
        Err(TriageError::MissingColumn(column)) => assert_eq!(column, "timestamp"),
        other => panic!("expected MissingColumn, got {:?}", other.map(|o| o.diagnostics)),
    }
}

#[test]
fn test_train_labeled_requires_label() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let err = Trainer::new(&config).train_labeled(&dataset()).unwrap_err();
    assert!(matches!(err, TriageError::MissingColumn(ref c) if c == "is_threat"));

    let mut table = dataset();
    for (i, record) in table.rows_mut().iter_mut().enumerate() {
        set_label(record, u8::from(i % 4 == 0));
    }
    let outcome = Trainer::new(&config).train_labeled(&table).unwrap();
    assert!(outcome.diagnostics.labeling.is_none());
    assert_eq!(outcome.diagnostics.threats, 10);
}

#[test]
fn test_empty_tables_are_data_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    assert!(matches!(Trainer::new(&config).train(&AlertTable::default()), Err(TriageError::EmptyTable)));
    assert!(matches!(Scorer::new(&config).score(&AlertTable::default()), Err(TriageError::EmptyTable)));
}

#[test]
fn test_failed_training_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = ArtifactStore::new(&config.model_dir);

    let bad = AlertTable::from(vec![AlertRecord::new().with("rule.level", 1i64)]);
    assert!(Trainer::new(&config).train_and_save(&bad, &store).is_err());
    assert!(!store.exists());
}

#[test]
fn test_existing_labels_train_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = ArtifactStore::new(&config.model_dir);

    // Missing is_threat: nothing written
    let existing = Trainer::new(&config).with_labels(LabelSource::Existing);
    assert!(existing.train_and_save(&dataset(), &store).is_err());
    assert!(!store.exists());

    let mut table = dataset();
    for (i, record) in table.rows_mut().iter_mut().enumerate() {
        set_label(record, u8::from(i % 4 == 0));
    }
    let (outcome, manifest) = existing.train_and_save(&table, &store).unwrap();
    assert!(outcome.diagnostics.labeling.is_none());
    assert_eq!(manifest.feature_width, outcome.transform.width());
    assert!(Scorer::load(&config).is_available());
}

#[test]
fn test_threshold_sidecar_applies_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    Trainer::new(&config)
        .train_and_save(&dataset(), &ArtifactStore::new(&config.model_dir))
        .unwrap();
    threshold::save_sidecar(dir.path(), 1.0).unwrap();

    let scorer = Scorer::load(&config);
    let scores = scorer.score(&dataset()).unwrap().unwrap();
    assert_eq!(scores.threat_count(), 0);
    assert_eq!(scorer.status().threshold.map(|t| t.value), Some(1.0));
}
