use nailview_core::pipeline::{INSTRUCTIONS_MD, INTERCHANGE_JSON, NORMAL_SVG, REVEAL_SVG};
use nailview_core::{
    compose_view, generate_all, Dataset, GenerateOptions, InterchangeDocument, PipelineError,
};
use serde_json::json;
use std::path::Path;

fn dataset_json() -> serde_json::Value {
    let domain = |name: &str, category: &str, r: f64, p: f64, n: u64, role: &str| {
        json!({
            "name": name,
            "category": category,
            "effect_size_r": r,
            "p_value": p,
            "sample_size": n,
            "key_metric": "odds ratio",
            "primary_names": [format!("{name} A"), format!("{name} B")],
            "mechanism": "selection",
            "nail_role": role,
            "violence_type": "structural"
        })
    };
    json!({
        "metadata": { "total_domains": 7, "generated": "2025-11-02" },
        "domains": [
            domain("wages", "employment", 0.31, 0.0002, 48000, "vertical"),
            domain("loans", "social_financial", 0.22, 0.001, 5000, "vertical"),
            domain("grades", "education", 0.12, 0.03, 900, "horizontal"),
            domain("sentencing", "criminal_justice", 0.27, 0.004, 12000, "horizontal"),
            domain("rentals", "housing", 0.19, 0.01, 2300, "intersection"),
            domain("votes", "political", 0.05, 0.2, 400, "peripheral"),
            domain("films", "mythology", 0.08, 0.04, 150, "peripheral")
        ],
        "geometry": { "reveal_angle": 90.0 }
    })
}

fn load(value: &serde_json::Value) -> Dataset {
    Dataset::from_json_str(&value.to_string(), Path::new("fixture.json")).expect("fixture loads")
}

#[test]
fn generate_all_writes_four_artifacts() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = workspace.path().join("output");
    let report = generate_all(&load(&dataset_json()), &GenerateOptions::new(&out_dir)).unwrap();

    assert_eq!(report.artifacts.len(), 4);
    for name in [NORMAL_SVG, REVEAL_SVG, INTERCHANGE_JSON, INSTRUCTIONS_MD] {
        assert!(out_dir.join(name).is_file(), "missing {name}");
    }
    // `films` uses a category without a color
    assert_eq!(report.warnings, 1);

    let normal = std::fs::read_to_string(out_dir.join(NORMAL_SVG)).unwrap();
    let reveal = std::fs::read_to_string(out_dir.join(REVEAL_SVG)).unwrap();
    assert!(!normal.contains("<text"));
    assert!(!normal.contains("polyline"));
    assert!(reveal.contains("id=\"vertical\""));
    assert!(reveal.contains("id=\"horizontal\""));
    assert!(reveal.contains("id=\"intersection\""));

    // no staging directories are left next to the output
    let leftovers: Vec<_> = std::fs::read_dir(workspace.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("output")]);
}

#[test]
fn interchange_normal_view_matches_direct_render() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = workspace.path().join("output");
    let dataset = load(&dataset_json());
    generate_all(&dataset, &GenerateOptions::new(&out_dir)).unwrap();

    let text = std::fs::read_to_string(out_dir.join(INTERCHANGE_JSON)).unwrap();
    let document: InterchangeDocument = serde_json::from_str(&text).unwrap();
    let direct = compose_view(dataset.records(), dataset.config(), 0.0);
    let reveal = compose_view(dataset.records(), dataset.config(), 90.0);

    assert_eq!(document.reveal_angle, 90.0);
    assert_eq!(document.metadata.generated.as_deref(), Some("2025-11-02"));
    assert_eq!(document.normal_view.len(), direct.visuals.len());
    for ((element, visual), nail) in document
        .normal_view
        .iter()
        .zip(&direct.visuals)
        .zip(&document.nail_view)
    {
        assert_eq!(element.name, visual.name);
        assert_eq!(nail.name, visual.name);
        assert!((element.x - visual.x).abs() < 1e-9);
        assert!((element.y - visual.y).abs() < 1e-9);
        assert!((element.z - visual.z).abs() < 1e-9);
        assert!(nail.role.is_some());
    }
    for (nail, visual) in document.nail_view.iter().zip(&reveal.visuals) {
        assert!((nail.x - visual.x).abs() < 1e-9);
        assert!((nail.y - visual.y).abs() < 1e-9);
    }
}

#[test]
fn two_runs_produce_identical_artifacts() {
    let workspace = tempfile::tempdir().unwrap();
    let first = workspace.path().join("first");
    let second = workspace.path().join("second");
    let dataset = load(&dataset_json());
    generate_all(&dataset, &GenerateOptions::new(&first)).unwrap();
    generate_all(&dataset, &GenerateOptions::new(&second)).unwrap();

    for name in [NORMAL_SVG, REVEAL_SVG, INTERCHANGE_JSON, INSTRUCTIONS_MD] {
        assert_eq!(
            std::fs::read(first.join(name)).unwrap(),
            std::fs::read(second.join(name)).unwrap(),
            "{name} differs between runs"
        );
    }
}

#[test]
fn regenerating_replaces_previous_output() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = workspace.path().join("output");
    std::fs::create_dir(&out_dir).unwrap();
    std::fs::write(out_dir.join("stale.txt"), "old").unwrap();

    generate_all(&load(&dataset_json()), &GenerateOptions::new(&out_dir)).unwrap();
    assert!(!out_dir.join("stale.txt").exists());
    assert!(out_dir.join(NORMAL_SVG).is_file());
}

#[test]
fn empty_dataset_renders_empty_canvas() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = workspace.path().join("output");
    let report = generate_all(&load(&json!({})), &GenerateOptions::new(&out_dir)).unwrap();

    assert_eq!(report.warnings, 0);
    let svg = std::fs::read_to_string(out_dir.join(NORMAL_SVG)).unwrap();
    assert!(svg.contains("<rect"));
    assert!(!svg.contains("<circle"));
    let document: InterchangeDocument =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join(INTERCHANGE_JSON)).unwrap())
            .unwrap();
    assert!(document.normal_view.is_empty() && document.nail_view.is_empty());
}

#[test]
fn io_failure_is_fatal_and_leaves_no_output_directory() {
    let workspace = tempfile::tempdir().unwrap();
    let blocker = workspace.path().join("not-a-dir");
    std::fs::write(&blocker, "file in the way").unwrap();
    let out_dir = blocker.join("output");

    let err = generate_all(&load(&dataset_json()), &GenerateOptions::new(&out_dir)).unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
    assert!(err.to_string().contains("not-a-dir"));
    assert!(!out_dir.exists());
}

#[test]
fn shipped_sample_dataset_loads_cleanly() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/domains.json");
    let dataset = Dataset::load(&path).unwrap();

    assert_eq!(dataset.records().len(), dataset.metadata().total_domains);
    assert!(dataset.warnings().is_empty());
    let counts = nailview_core::RoleCounts::of(dataset.records());
    assert!(counts.degenerate_parts().is_empty());
}
