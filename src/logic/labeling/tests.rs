use super::labeler::AutoLabeler;
use crate::logic::alert::{AlertRecord, AlertTable};
use crate::logic::config::TriageConfig;
use crate::logic::features::engineer;

fn labeler() -> AutoLabeler {
    AutoLabeler::new(&TriageConfig::default()).unwrap()
}

fn levels(levels: &[i64]) -> AlertTable {
    AlertTable::new(
        levels
            .iter()
            .map(|&l| AlertRecord::new().with("rule.level", l).with("full_log", "sshd: session opened"))
            .collect(),
    )
}

#[test]
fn test_level_threshold_only() {
    let outcomes = labeler().score_table(&levels(&[2, 12, 5]));
    let labels: Vec<u8> = outcomes.iter().map(|o| o.label).collect();

    assert_eq!(labels, vec![0, 1, 0]);
    assert_eq!(outcomes[1].score, 0.5);
    assert_eq!(outcomes[1].breakdown.level_contribution, 0.5);
    assert_eq!(outcomes[0].score, 0.0);
}

#[test]
fn test_keyword_in_full_log() {
    let table = AlertTable::new(vec![AlertRecord::new()
        .with("full_log", "user ran mimikatz.exe")
        .with("rule.level", 3i64)]);

    let outcome = &labeler().score_table(&table)[0];
    assert!(outcome.score >= 0.7);
    assert_eq!(outcome.breakdown.keyword_contribution, 0.7);
    assert_eq!(outcome.label, 1);
}

#[test]
fn test_keyword_in_marker_column() {
    let table = AlertTable::new(vec![
        AlertRecord::new().with("data.win.eventdata.parentImage", "C:\\Tools\\PowerShell.exe"),
        AlertRecord::new().with("rule.description", "powershell seen in description only"),
    ]);

    let outcomes = labeler().score_table(&table);
    assert_eq!(outcomes[0].label, 1);
    // rule.description is not a free-text column
    assert_eq!(outcomes[1].label, 0);
}

#[test]
fn test_rule_id_overrides() {
    let mut config = TriageConfig::default();
    config.rule_id_overrides.insert("5710".into(), 1.0);
    config.rule_id_overrides.insert("100".into(), -1.0);
    let labeler = AutoLabeler::new(&config).unwrap();

    let table = AlertTable::new(vec![
        AlertRecord::new().with("rule.id", 5710i64).with("rule.level", 2i64),
        AlertRecord::new().with("rule.id", "100").with("rule.level", 12i64),
        AlertRecord::new().with("rule.id", "5711").with("rule.level", 2i64),
    ]);

    let outcomes = labeler.score_table(&table);
    assert_eq!(outcomes[0].score, 1.0);
    assert_eq!(outcomes[0].label, 1);
    assert_eq!(outcomes[1].score, -0.5);
    assert_eq!(outcomes[1].label, 0);
    assert_eq!(outcomes[2].label, 0);
}

#[test]
fn test_rare_ip_is_table_relative() {
    let mut rows: Vec<AlertRecord> = (0..1000)
        .map(|_| AlertRecord::new().with("data.srcip", "10.0.0.1"))
        .collect();
    rows.push(AlertRecord::new().with("data.srcip", "203.0.113.9"));
    let big = AlertTable::new(rows);

    let outcomes = labeler().score_table(&big);
    assert_eq!(outcomes[1000].breakdown.rare_ip_contribution, 0.2);
    assert_eq!(outcomes[1000].label, 0);
    assert_eq!(outcomes[0].breakdown.rare_ip_contribution, 0.0);

    // Same alert in a small batch is not rare
    let small = AlertTable::new(vec![AlertRecord::new().with("data.srcip", "203.0.113.9")]);
    assert_eq!(labeler().score_table(&small)[0].breakdown.rare_ip_contribution, 0.0);
}

#[test]
fn test_rare_ip_plus_level_crosses_cutoff() {
    let mut rows: Vec<AlertRecord> = (0..1500)
        .map(|_| AlertRecord::new().with("data.srcip", "10.0.0.1"))
        .collect();
    rows.push(AlertRecord::new().with("rule.level", 11i64));

    let outcomes = labeler().score_table(&AlertTable::new(rows));
    // Missing IP → "unknown", itself rare here
    let last = outcomes.last().unwrap();
    assert!((last.score - 0.7).abs() < 1e-9);
    assert_eq!(last.label, 1);
}

#[test]
fn test_labeling_is_deterministic() {
    let table = AlertTable::new(vec![
        AlertRecord::new().with("rule.level", 12i64).with("data.srcip", "1.1.1.1"),
        AlertRecord::new().with("message", "whoami executed").with("data.srcip", "2.2.2.2"),
        AlertRecord::new(),
    ]);

    let first = labeler().score_table(&table);
    let second = labeler().score_table(&table);
    assert_eq!(first, second);
}

#[test]
fn test_raising_level_never_lowers_score() {
    let contexts = vec![
        AlertRecord::new(),
        AlertRecord::new().with("full_log", "mimikatz"),
        AlertRecord::new().with("rule.id", "42").with("data.srcip", "9.9.9.9"),
    ];

    for base in contexts {
        let low = AlertTable::new(vec![base.clone().with("rule.level", 3i64)]);
        let high = AlertTable::new(vec![base.clone().with("rule.level", 15i64)]);

        let low_score = labeler().score_table(&low)[0].score;
        let high_score = labeler().score_table(&high)[0].score;
        assert!(high_score >= low_score);
    }
}

#[test]
fn test_label_writes_columns_for_training() {
    let mut table = levels(&[2, 12, 5]);
    let summary = labeler().label(&mut table);

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.threats, 1);
    assert_eq!(table.rows()[1].number_or("is_threat_score", -1.0), 0.5);

    let bundle = engineer(&table, true).unwrap();
    assert_eq!(bundle.labels, Some(vec![0, 1, 0]));
}
