//! End to end look and assembly export.

mod common;

use std::fs;

use common::*;
use usdlook::export::{export_usd_shade_look, ExportItemResolver, UsdMaterialSource};
use usdlook::host::memory::{MemoryHost, NodeKind};
use usdlook::host::{BitDepth, ExportItemStore, GeometryQuery, ShadingGraph};
use usdlook::renderers::{preview, prman};
use usdlook::settings::Preferences;
use usdlook::ExportError;

fn metal_host() -> MemoryHost {
    let mut host = host();
    host.add_shader(
        "Metal Shader",
        prman::SHADER_MODEL_ID,
        floats(&[("specularRoughness", 0.35), ("presence", 1.0)]),
    )
    .unwrap();
    paint(&mut host, "Metal Shader", "diffuseColor", "metal_diffuse", BitDepth::Byte);
    paint(&mut host, "Metal Shader", "Normal", "metal_normal", BitDepth::Half);
    host.add_selection_group("seat", [("/chair/seat", vec![0, 1, 2, 3, 4])]);
    host.set_face_count("/chair/seat", 10);
    host.set_face_count("/chair/legs", 6);
    host
}

fn metal_material(host: &mut MemoryHost, prefs: &Preferences) -> UsdMaterialSource {
    let registry = registry();
    let shader = host.shader_by_name("Metal Shader").unwrap();
    let mut material = UsdMaterialSource::new("Metal01");
    let mut resolver = ExportItemResolver::new(host, &registry, prefs);
    material.set_shader_source(resolver.shader_source(material.id(), &shader, "st"));
    material.add_binding_location("/chair/legs");
    material
}

/// Layer text without the timestamped comment.
fn stable_text(path: &std::path::Path) -> String {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.contains("Generated by usdlook"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_metal01_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = metal_host();
    let mut params = params(dir.path());
    params.set_look_file_target_path("Metal01_look.usda").unwrap();

    let material = metal_material(&mut host, &prefs);
    let report = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap();
    assert_eq!(report.materials, 1);
    assert_eq!(report.shaders, 1);
    assert_eq!(report.bindings, 1);
    assert_eq!(report.baked_items, 2);
    assert!(report.assembly_file.is_none());

    let look = dir.path().join("Metal01_look.usda");
    let text = fs::read_to_string(&look).unwrap();
    assert!(text.starts_with("#usda 1.0\n(\n    \"Generated by usdlook "));
    assert!(text.contains("defaultPrim = \"Root\""));
    assert!(text.contains("def Material \"Metal01\""));
    assert!(text.contains("uniform token info:id = \"PxrSurface\""));
    assert!(text.contains(
        "token outputs:ri:surface.connect = </Root/Metal01/Metal_Shader.outputs:out>"
    ));
    assert!(text.contains("float inputs:specularRoughness = 0.35"));
    assert!(!text.contains("inputs:presence"));
    assert!(text.contains("uniform token info:id = \"PxrNormalMap\""));
    assert!(text.contains("rel material:binding = </Root/Metal01>"));
    assert!(text.contains("over \"chair\""));

    // a second run reuses the hidden items and writes the same network
    let items_before = host.export_item_count();
    let first = stable_text(&look);
    let material = metal_material(&mut host, &prefs);
    export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap();
    assert_eq!(host.export_item_count(), items_before);
    assert_eq!(stable_text(&look), first);
    assert_eq!(host.bake_calls().len(), 2);
}

#[test]
fn test_selection_group_subset_and_full_binding() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = metal_host();
    let full = host.add_selection_group("legs_all", [("/chair/legs", (0..6).collect::<Vec<u32>>())]);
    let seat = host.selection_group_by_name("seat").map(|g| g.id).unwrap();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();

    let mut material = metal_material(&mut host, &prefs);
    material.add_binding_location("/chair/seat");
    material.add_selection_group(seat);
    material.add_selection_group(full);

    let report = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap();
    assert_eq!(report.bindings, 2);

    let text = fs::read_to_string(dir.path().join("look.usda")).unwrap();
    // half the seat faces: a subset
    assert!(text.contains("def GeomSubset \"Metal01_subset\""));
    assert!(text.contains("int[] indices = [0, 1, 2, 3, 4]"));
    assert!(text.contains("uniform token familyName = \"materialBind\""));
    // every leg face: the prim itself
    assert_eq!(text.matches("rel material:binding = </Root/Metal01>").count(), 2);
}

#[test]
fn test_name_conflict_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = host();
    host.add_shader("Shader 1", preview::SHADER_MODEL_ID, Default::default()).unwrap();
    host.add_shader("Shader_1", preview::SHADER_MODEL_ID, Default::default()).unwrap();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();

    let mut a = UsdMaterialSource::new("A");
    a.set_shader_source(source(&mut host, &registry, &prefs, "A", "Shader 1", "st"));
    let mut b = UsdMaterialSource::new("B");
    b.set_shader_source(source(&mut host, &registry, &prefs, "B", "Shader_1", "st"));

    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[a, b]).unwrap_err();
    assert_eq!(err.title(), "Shader Name Conflict");
    assert!(!dir.path().join("look.usda").exists());
    assert!(host.bake_calls().is_empty());
}

#[test]
fn test_same_shader_in_two_materials_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = host();
    host.add_shader("Shared", preview::SHADER_MODEL_ID, Default::default()).unwrap();
    paint(&mut host, "Shared", "diffuseColor", "shared_paint", BitDepth::Byte);
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();
    fs::write(dir.path().join("look.usda"), "#usda 1.0\n").unwrap();

    let mut a = UsdMaterialSource::new("A");
    a.set_shader_source(source(&mut host, &registry, &prefs, "A", "Shared", "st"));
    let mut b = UsdMaterialSource::new("B");
    b.set_shader_source(source(&mut host, &registry, &prefs, "B", "Shared", "st"));

    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[a, b]).unwrap_err();
    assert!(matches!(err, ExportError::ShaderNameConflict { .. }));
    assert!(host.bake_calls().is_empty());
    // the previous look file is left alone
    assert_eq!(fs::read_to_string(dir.path().join("look.usda")).unwrap(), "#usda 1.0\n");
}

#[test]
fn test_material_name_conflict_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = host();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();

    let a = UsdMaterialSource::new("rust-red");
    let b = UsdMaterialSource::new("rust_red");
    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[a, b]).unwrap_err();
    assert_eq!(err.title(), "Material Name Conflict");
    assert!(!dir.path().join("look.usda").exists());
}

#[test]
fn test_empty_material_name_keeps_old_look_file() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = host();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();
    fs::write(dir.path().join("look.usda"), "#usda 1.0\n").unwrap();

    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[UsdMaterialSource::new("")])
        .unwrap_err();
    assert_eq!(err.title(), "Invalid Prim Path");
    assert!(dir.path().join("look.usda").exists());
}

#[test]
fn test_unregistered_shader_model() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = host();
    host.add_model(usdlook::host::ShaderModel::new("Redshift Material"));
    host.add_shader("RS", "Redshift Material", Default::default()).unwrap();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();

    let mut material = UsdMaterialSource::new("Mat");
    material.set_shader_source(source(&mut host, &registry, &prefs, "Mat", "RS", "st"));
    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap_err();
    assert!(matches!(err, ExportError::NoExporter { .. }));
    assert!(!dir.path().join("look.usda").exists());
}

#[test]
fn test_assembly_needs_payload() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = metal_host();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();
    params.set_assembly_target_path("asset.usda").unwrap();

    let material = metal_material(&mut host, &prefs);
    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap_err();
    assert!(matches!(err, ExportError::MissingPayloadFile));
    assert!(!dir.path().join("look.usda").exists());
}

#[test]
fn test_assembly_arcs() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("geo")).unwrap();
    fs::write(dir.path().join("geo/chair.usd"), "#usda 1.0\n").unwrap();

    let registry = registry();
    let prefs = Preferences::default();
    let mut host = metal_host();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();
    params.set_assembly_target_path("chair_asset.usda").unwrap();
    params.set_payload_source_path("geo/chair.usd").unwrap();
    params.set_stage_root_path("/chair").unwrap();

    let material = metal_material(&mut host, &prefs);
    let report = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap();
    assert!(report.assembly_file.is_some());

    let text = fs::read_to_string(dir.path().join("chair_asset.usda")).unwrap();
    assert!(text.contains("defaultPrim = \"chair\""));
    assert!(text.contains("append payload = @geo/chair.usd@"));
    assert!(text.contains("append references = @look.usda@"));
    assert!(text.contains("def \"chair\""));
}

#[test]
fn test_bake_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = metal_host();
    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();

    let material = metal_material(&mut host, &prefs);
    host.set_fail_bake(Some("out of disk space".into()));
    let err = export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap_err();
    assert_eq!(err.title(), "Texture Export Failed");
}

#[test]
fn test_group_wrapped_channel_is_exported() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let prefs = Preferences::default();
    let mut host = host();
    host.add_shader("Preview", preview::SHADER_MODEL_ID, Default::default()).unwrap();
    let shader = host.node_by_name("Preview").unwrap();
    let group = host.add_node("layer_group", NodeKind::Group, BitDepth::Byte);
    let bake = host.add_node("rough_bake", NodeKind::BakePoint, BitDepth::Float);
    host.set_group_output(group, "Output", bake);
    host.connect(shader, "roughness", group);

    let mut params = params(dir.path());
    params.set_look_file_target_path("look.usda").unwrap();
    let mut material = UsdMaterialSource::new("Mat");
    material.set_shader_source(source(&mut host, &registry, &prefs, "Mat", "Preview", "st"));

    export_usd_shade_look(&registry, &prefs, &mut host, &params, &[material]).unwrap();
    let (_, item) = host.export_items().next().unwrap();
    assert_eq!(item.source_node, Some(bake));
    assert_eq!(item.file_template, "Preview.roughness.$UDIM.exr");
    let id = host.export_item_ids()[0];
    assert_eq!(host.bake_calls()[0].items, vec![id]);
}
