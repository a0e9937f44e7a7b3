//! Tests for regression configuration loading and validation.

use std::fs;
use std::path::Path;

use omni_fusion_regression::{FusionMethodKind, HarnessSettings, RegressionConfig, RegressionError};
use tempfile::TempDir;

const SAMPLE: &str = include_str!("../regressions/nfcorpus-fusion.yaml");

fn config_yaml(methods: &str, topics: &str) -> String {
    format!(
        r#"
runs:
  - file: runs/a.txt
  - file: runs/b.txt
methods:
{methods}
topics:
{topics}
metrics:
  - metric: nDCG@10
    command: bin/trec_eval
    params: -c -m ndcg_cut.10
    separator: "\t"
    parse_index: 2
    metric_precision: 4
"#
    )
}

const TWO_TOPICS: &str = "  - id: dl19\n    qrel: qrels.dl19.txt\n  - id: dl20\n    qrel: qrels.dl20.txt";

#[test]
fn test_sample_regression_parses() -> Result<(), Box<dyn std::error::Error>> {
    let config = RegressionConfig::from_yaml(SAMPLE)?;
    assert_eq!(config.runs.len(), 2);
    assert_eq!(config.methods.len(), 4);
    assert_eq!(config.topics.len(), 1);
    assert_eq!(config.metrics.len(), 3);

    let average = &config.methods[1];
    assert_eq!(average.name, FusionMethodKind::Average);
    assert_eq!(average.expected().get("R@1000", "nfcorpus"), Some(0.6395));

    let interpolation = &config.methods[2];
    assert!((interpolation.alpha - 0.7).abs() < f64::EPSILON);
    assert_eq!(config.metrics[0].separator, "\t");
    Ok(())
}

#[test]
fn test_method_defaults_applied() -> Result<(), Box<dyn std::error::Error>> {
    let methods = "  - name: average\n    output: out.txt\n    results:\n      nDCG@10: [0.4, 0.5]";
    let config = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS))?;
    let method = &config.methods[0];
    assert_eq!(method.k, 1000);
    assert_eq!(method.depth, 1000);
    assert_eq!(method.rrf_k, 60);
    assert!((method.alpha - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.metrics[0].params.as_deref(), Some("-c -m ndcg_cut.10"));
    Ok(())
}

#[test]
fn test_positional_scores_resolve_by_topic_id() -> Result<(), Box<dyn std::error::Error>> {
    let methods = "  - name: rrf\n    output: out.txt\n    results:\n      nDCG@10: [0.41, 0.52]";
    let config = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS))?;
    let expected = config.methods[0].expected();
    assert_eq!(expected.get("nDCG@10", "dl19"), Some(0.41));
    assert_eq!(expected.get("nDCG@10", "dl20"), Some(0.52));
    assert_eq!(expected.len(), 2);
    Ok(())
}

#[test]
fn test_keyed_scores_resolve_by_topic_id() -> Result<(), Box<dyn std::error::Error>> {
    let methods =
        "  - name: rrf\n    output: out.txt\n    results:\n      nDCG@10:\n        dl20: 0.52\n        dl19: 0.41";
    let config = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS))?;
    let expected = config.methods[0].expected();
    assert_eq!(expected.get("nDCG@10", "dl19"), Some(0.41));
    assert_eq!(expected.get("nDCG@10", "dl20"), Some(0.52));
    Ok(())
}

#[test]
fn test_positional_length_mismatch_rejected() {
    let methods = "  - name: rrf\n    output: out.txt\n    results:\n      nDCG@10: [0.41]";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("1 expected scores for 2 topic sets")));
}

#[test]
fn test_keyed_unknown_topic_rejected() {
    let methods = "  - name: rrf\n    output: out.txt\n    results:\n      nDCG@10:\n        dl19: 0.41\n        dl21: 0.52";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("dl21")));
}

#[test]
fn test_keyed_missing_topic_rejected() {
    let methods = "  - name: rrf\n    output: out.txt\n    results:\n      nDCG@10:\n        dl19: 0.41";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("dl20")));
}

#[test]
fn test_missing_metric_results_rejected() {
    let methods = "  - name: rrf\n    output: out.txt\n    results:\n      R@100: [0.41, 0.52]";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("nDCG@10")));
}

#[test]
fn test_missing_required_key_fails_fast() {
    // `output` is required.
    let methods = "  - name: rrf\n    results:\n      nDCG@10: [0.41, 0.52]";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::ConfigParse { .. })));
}

#[test]
fn test_unknown_method_name_rejected() {
    let methods = "  - name: combsum\n    output: out.txt\n    results:\n      nDCG@10: [0.41, 0.52]";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::ConfigParse { .. })));
}

#[test]
fn test_non_positive_depth_rejected() {
    let methods = "  - name: rrf\n    output: out.txt\n    depth: 0\n    results:\n      nDCG@10: [0.41, 0.52]";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("depth")));
}

#[test]
fn test_alpha_out_of_range_rejected() {
    let methods = "  - name: interpolation\n    output: out.txt\n    alpha: 1.5\n    results:\n      nDCG@10: [0.41, 0.52]";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, TWO_TOPICS));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("alpha")));
}

#[test]
fn test_duplicate_topic_ids_rejected() {
    let methods = "  - name: rrf\n    output: out.txt\n    results:\n      nDCG@10: [0.41, 0.52]";
    let topics = "  - id: dl19\n    qrel: a.txt\n  - id: dl19\n    qrel: b.txt";
    let result = RegressionConfig::from_yaml(&config_yaml(methods, topics));
    assert!(matches!(result, Err(RegressionError::InvalidConfig(msg)) if msg.contains("duplicate topic")));
}

#[test]
fn test_load_missing_file_reports_not_found() {
    let result = RegressionConfig::load(Path::new("/nonexistent/fusion/regression.yaml"));
    assert!(matches!(result, Err(RegressionError::ConfigNotFound(_))));
}

#[test]
fn test_load_from_disk_and_preflight() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let present = tmp.path().join("present.txt");
    let absent = tmp.path().join("absent.txt");
    fs::write(&present, "1 Q0 doc1 1 10.0 run\n")?;

    let yaml = format!(
        r#"
runs:
  - file: {present}
  - file: {absent}
methods:
  - name: rrf
    output: out.txt
    results:
      nDCG@10: [0.41]
topics:
  - id: dl19
    qrel: qrels.dl19.txt
metrics:
  - metric: nDCG@10
    command: bin/trec_eval
    separator: "\t"
    parse_index: 2
    metric_precision: 4
"#,
        present = present.display(),
        absent = absent.display()
    );
    let path = tmp.path().join("fusion.yaml");
    fs::write(&path, yaml)?;

    let config = RegressionConfig::load(&path)?;
    assert_eq!(config.missing_run_files(), vec![absent.clone()]);
    assert!(config.metrics[0].params.is_none());
    match config.preflight() {
        Err(RegressionError::MissingRunFiles(paths)) => assert_eq!(paths, vec![absent]),
        other => panic!("expected MissingRunFiles, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_settings_resolve_config_and_qrels_paths() {
    let settings = HarnessSettings::default();
    assert_eq!(
        settings.config_path("beir-fusion"),
        Path::new("src/main/resources/fusion_regression/beir-fusion.yaml")
    );
    assert_eq!(
        settings.config_path("custom/path.yml"),
        Path::new("custom/path.yml")
    );
    assert_eq!(
        settings.qrels_path(Path::new("qrels.dl19.txt")),
        Path::new("tools/topics-and-qrels/qrels.dl19.txt")
    );
    assert_eq!(
        settings.qrels_path(Path::new("/abs/qrels.txt")),
        Path::new("/abs/qrels.txt")
    );
}
