//! Tests for fusion command construction across both backends.

use std::path::Path;

use omni_fusion_regression::{
    AnseriniBackend, BackendKind, CommandExecutor, ExecutionMode, ExecutionOutcome,
    FusionBackend, FusionMethodKind, HarnessSettings, PyseriniBackend, RegressionConfig,
    SUPPORTED_FUSION_METHODS, build_fusion_commands,
};
use tempfile::TempDir;

const SAMPLE: &str = include_str!("../regressions/nfcorpus-fusion.yaml");

fn sample() -> Result<RegressionConfig, Box<dyn std::error::Error>> {
    Ok(RegressionConfig::from_yaml(SAMPLE)?)
}

fn single_method_config(method: &str) -> Result<RegressionConfig, Box<dyn std::error::Error>> {
    let yaml = format!(
        r#"
runs:
  - file: runs/a.txt
  - file: runs/b.txt
methods:
{method}
topics:
  - id: dl19
    qrel: qrels.dl19.txt
metrics:
  - metric: nDCG@10
    command: bin/trec_eval
    separator: "\t"
    parse_index: 2
    metric_precision: 4
"#
    );
    Ok(RegressionConfig::from_yaml(&yaml)?)
}

#[test]
fn test_anserini_passes_every_parameter() -> Result<(), Box<dyn std::error::Error>> {
    let config = single_method_config(
        "  - name: average\n    output: out/avg.txt\n    results:\n      nDCG@10: [0.4]",
    )?;
    let backend = AnseriniBackend::new("bin/run.sh io.anserini.fusion.FuseRuns");
    let commands = build_fusion_commands(&config, &backend);

    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands[0].command_line(),
        "bin/run.sh io.anserini.fusion.FuseRuns -runs runs/a.txt runs/b.txt -output out/avg.txt \
         -method average -k 1000 -depth 1000 -rrf_k 60 -alpha 0.5"
    );
    assert_eq!(commands[0].flag_value("-runs"), Some("runs/a.txt runs/b.txt"));
    Ok(())
}

#[test]
fn test_pyserini_rrf_uses_namespaced_flag() -> Result<(), Box<dyn std::error::Error>> {
    let config = single_method_config(
        "  - name: rrf\n    output: out/rrf.txt\n    rrf_k: 60\n    k: 100\n    results:\n      nDCG@10: [0.4123]",
    )?;
    let backend = PyseriniBackend::new("python -m pyserini.fusion");
    let commands = build_fusion_commands(&config, &backend);

    assert_eq!(
        commands[0].command_line(),
        "python -m pyserini.fusion --method rrf --runs runs/a.txt runs/b.txt --output out/rrf.txt \
         --runtag pyserini.rrf --k 100 --depth 1000 --rrf.k 60"
    );
    assert!(!commands[0].has_flag("--alpha"));
    Ok(())
}

#[test]
fn test_pyserini_interpolation_conveys_alpha_only() -> Result<(), Box<dyn std::error::Error>> {
    let config = single_method_config(
        "  - name: interpolation\n    output: out/interp.txt\n    alpha: 0.7\n    results:\n      nDCG@10: [0.4]",
    )?;
    let backend = PyseriniBackend::new("python -m pyserini.fusion");
    let commands = build_fusion_commands(&config, &backend);

    assert_eq!(commands[0].flag_value("--alpha"), Some("0.7"));
    assert_eq!(commands[0].flag_value("--runtag"), Some("pyserini.interpolation"));
    assert!(!commands[0].has_flag("--rrf.k"));
    Ok(())
}

#[test]
fn test_pyserini_average_has_no_method_specific_flags() -> Result<(), Box<dyn std::error::Error>> {
    let config = single_method_config(
        "  - name: average\n    output: out/avg.txt\n    results:\n      nDCG@10: [0.4]",
    )?;
    let commands = build_fusion_commands(&config, &PyseriniBackend::new("pyserini-fuse"));
    assert!(!commands[0].has_flag("--alpha"));
    assert!(!commands[0].has_flag("--rrf.k"));
    assert_eq!(commands[0].tokens()[0], "pyserini-fuse");
    Ok(())
}

#[test]
fn test_one_command_per_supported_method_for_both_backends() -> Result<(), Box<dyn std::error::Error>> {
    let config = sample()?;
    let settings = HarnessSettings::default();
    let supported: Vec<_> = config
        .methods
        .iter()
        .filter(|method| SUPPORTED_FUSION_METHODS.contains(&method.name))
        .collect();

    for kind in [BackendKind::Anserini, BackendKind::Pyserini] {
        let backend = kind.adapter(&settings);
        let commands = build_fusion_commands(&config, backend.as_ref());
        assert_eq!(commands.len(), supported.len(), "backend {kind}");

        for (command, method) in commands.iter().zip(&supported) {
            let output_flag = if kind == BackendKind::Anserini { "-output" } else { "--output" };
            let method_flag = if kind == BackendKind::Anserini { "-method" } else { "--method" };
            assert_eq!(
                command.flag_value(output_flag),
                Some(method.output.display().to_string().as_str())
            );
            assert_eq!(command.flag_value(method_flag), Some(method.name.as_str()));
            for run in config.run_paths() {
                assert!(
                    command.command_line().contains(&run.display().to_string()),
                    "backend {kind} dropped run {}",
                    run.display()
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_normalize_excluded_for_every_backend() -> Result<(), Box<dyn std::error::Error>> {
    let config = sample()?;
    assert!(
        config
            .methods
            .iter()
            .any(|method| method.name == FusionMethodKind::Normalize)
    );
    let settings = HarnessSettings::default();
    for kind in [BackendKind::Anserini, BackendKind::Pyserini] {
        let backend = kind.adapter(&settings);
        for command in build_fusion_commands(&config, backend.as_ref()) {
            assert!(
                !command.tokens().iter().any(|token| token == "normalize"),
                "backend {kind} emitted normalize: {}",
                command.command_line()
            );
        }
    }
    Ok(())
}

#[test]
fn test_backend_adapters_report_names() {
    let settings = HarnessSettings::default();
    assert_eq!(BackendKind::Anserini.adapter(&settings).name(), "anserini");
    assert_eq!(BackendKind::Pyserini.adapter(&settings).name(), "pyserini");
    assert_eq!(BackendKind::default(), BackendKind::Anserini);
}

#[test]
fn test_dry_run_pyserini_interpolation_spawns_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let marker = tmp.path().join("spawned");
    let config = single_method_config(
        "  - name: interpolation\n    output: out/interp.txt\n    alpha: 0.7\n    results:\n      nDCG@10: [0.4]",
    )?;
    // A real spawn would create the marker before running the fusion module.
    let backend = PyseriniBackend::new(format!("touch {}; python -m pyserini.fusion", marker.display()));
    let commands = build_fusion_commands(&config, &backend);
    let rendered = commands[0].command_line();
    assert!(rendered.contains("--alpha 0.7"), "rendered: {rendered}");

    let executor = CommandExecutor::new("sh", ExecutionMode::DryRun);
    let outcomes = executor.run_all(&commands);
    assert_eq!(outcomes, vec![ExecutionOutcome::Skipped]);
    assert!(!Path::new(&marker).exists());
    Ok(())
}
