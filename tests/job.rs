//! JSON batch jobs.

mod common;

use std::fs;

use common::registry;
use usdlook::export::ExportJob;
use usdlook::host::ExportItemStore;
use usdlook::settings::Preferences;

const JOB: &str = r#"{
    "scene": {
        "entity": "chair",
        "models": [
            {"id": "USD Preview Surface", "inputs": [
                {"name": "diffuseColor", "kind": "color", "default": [0.18, 0.18, 0.18, 1]},
                {"name": "roughness", "kind": "float", "default": [0.5, 0.5, 0.5, 1]},
                {"name": "metallic", "kind": "float", "default": [0, 0, 0, 1]}
            ]}
        ],
        "nodes": [
            {"name": "wood_diffuse", "kind": "channel"},
            {"name": "wood_rough", "kind": "channel", "depth": "half"}
        ],
        "shaders": [
            {"name": "Wood Preview", "model": "USD Preview Surface", "parameters": {"metallic": 0.25, "roughness": 0.5}}
        ],
        "connections": [
            {"node": "Wood Preview", "input": "diffuseColor", "source": "wood_diffuse"},
            {"node": "Wood Preview", "input": "roughness", "source": "wood_rough"}
        ],
        "selection_groups": [{"name": "seat", "faces": {"/chair/seat": [0, 1]}}],
        "face_counts": {"/chair/seat": 2}
    },
    "materials": [
        {"name": "Wood", "shaders": ["Wood Preview"], "locations": ["/chair/seat"], "selection_groups": ["seat", "missing"]},
        {"name": "Unused", "enabled": false, "shaders": ["Wood Preview"]}
    ],
    "export": {
        "export_root": "out",
        "look_file": "chair_look.usda",
        "stage_root": "/Chair",
        "overrides": {"resolution": "2048"}
    }
}"#;

#[test]
fn test_job_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("out")).unwrap();
    let path = dir.path().join("job.json");
    fs::write(&path, JOB).unwrap();

    let job = ExportJob::load(&path).unwrap();
    let (host, report) = job.run(&registry(), &Preferences::default()).unwrap();

    assert_eq!(report.materials, 1);
    assert_eq!(report.baked_items, 2);
    // both faces of the seat are covered, so the prim itself is bound
    assert_eq!(report.bindings, 1);
    assert_eq!(host.export_item_ids().len(), 2);

    let call = &host.bake_calls()[0];
    assert_eq!(call.overrides.resolution.as_deref(), Some("2048"));
    assert!(call.root.ends_with("out"));

    let text = fs::read_to_string(dir.path().join("out/chair_look.usda")).unwrap();
    assert!(text.contains("defaultPrim = \"Chair\""));
    assert!(text.contains("def Material \"Wood\""));
    assert!(!text.contains("Unused"));
    assert!(text.contains("float inputs:metallic = 0.25"));
    assert!(!text.contains("float inputs:roughness = 0.5"));
    assert!(text.contains("Wood_Preview.roughness.<UDIM>.exr@"));
    assert!(!text.contains("GeomSubset"));
}

#[test]
fn test_job_report_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("out")).unwrap();
    let path = dir.path().join("job.json");
    fs::write(&path, JOB).unwrap();

    let job = ExportJob::load(&path).unwrap();
    let (_, report) = job.run(&registry(), &Preferences::default()).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["materials"], 1);
    assert!(value["assembly_file"].is_null());
}

#[test]
fn test_job_with_unknown_shader_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.json");
    fs::write(
        &path,
        r#"{"materials": [{"name": "M", "shaders": ["Nope"]}], "export": {"export_root": ".", "look_file": "l.usda"}}"#,
    )
    .unwrap();
    let job = ExportJob::load(&path).unwrap();
    let err = job.run(&registry(), &Preferences::default()).unwrap_err();
    assert_eq!(err.title(), "Node Not Found");
    assert!(!dir.path().join("l.usda").exists());
}
