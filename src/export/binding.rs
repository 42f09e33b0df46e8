//! Material binding, whole prim or face subset.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::source::UsdMaterialSource;
use crate::host::GeometryQuery;
use crate::usd::{SdfPath, Stage, MATERIAL_BIND_FAMILY};
use crate::util::Result;

/// How a material lands on one location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingTarget {
    /// Bind the whole prim.
    Prim,
    /// Bind a face subset with these indices.
    Subset(Vec<i32>),
}

/// Union of the material's selection groups, per mesh location.
///
/// Groups the host no longer knows are skipped.
pub fn selection_faces<G>(geometry: &G, material: &UsdMaterialSource) -> BTreeMap<String, BTreeSet<u32>>
where
    G: GeometryQuery + ?Sized,
{
    let mut union: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for id in material.selection_groups() {
        let Some(group) = geometry.selection_group(*id) else {
            debug!("Selection group {} not found, skipping", id);
            continue;
        };
        for (location, faces) in &group.faces {
            union.entry(location.clone()).or_default().extend(faces.iter().copied());
        }
    }
    union
}

/// Decide how to bind `location` given the selection union.
///
/// `None` means the location is not covered by a non-empty union.
pub fn binding_target(
    union: &BTreeMap<String, BTreeSet<u32>>,
    location: &str,
    face_count: Option<usize>,
) -> Option<BindingTarget> {
    if union.is_empty() {
        return Some(BindingTarget::Prim);
    }
    let faces = union.get(location).filter(|f| !f.is_empty())?;
    if covers_all_faces(faces, face_count) {
        Some(BindingTarget::Prim)
    } else {
        Some(BindingTarget::Subset(faces.iter().map(|f| *f as i32).collect()))
    }
}

fn covers_all_faces(faces: &BTreeSet<u32>, face_count: Option<usize>) -> bool {
    let Some(count) = face_count else {
        return false;
    };
    // the set is sorted and unique, so equal length plus bounds means 0..count
    faces.len() == count
        && faces.first() == Some(&0)
        && faces.last().map(|f| *f as usize + 1) == Some(count)
}

/// Bind `material_path` to every location of `material`.
///
/// Returns the number of successful bindings. Failures are logged and the
/// location is skipped.
pub fn bind_material_locations<G>(
    stage: &mut Stage,
    geometry: &G,
    material: &UsdMaterialSource,
    material_path: &SdfPath,
) -> usize
where
    G: GeometryQuery + ?Sized,
{
    let union = selection_faces(geometry, material);
    let mut bound = 0;
    for location in material.binding_locations() {
        let Some(target) = binding_target(&union, location, geometry.face_count(location)) else {
            debug!("{} is not covered by the selection of {}", location, material.name());
            continue;
        };
        match bind_location(stage, location, material_path, &target) {
            Ok(path) => {
                debug!("Bound {} to {}", material_path, path);
                bound += 1;
            }
            Err(e) => warn!("Failed to bind {} to '{}': {}", material_path, location, e),
        }
    }
    bound
}

fn bind_location(
    stage: &mut Stage,
    location: &str,
    material_path: &SdfPath,
    target: &BindingTarget,
) -> Result<SdfPath> {
    let prim_path = SdfPath::parse(location)?;
    stage.override_prim(&prim_path)?;
    let bind_path = match target {
        BindingTarget::Prim => prim_path,
        BindingTarget::Subset(indices) => stage.define_face_subset(
            &prim_path,
            &format!("{}_subset", material_path.name()),
            indices.clone(),
            MATERIAL_BIND_FAMILY,
        )?,
    };
    stage.bind_material(&bind_path, material_path)?;
    Ok(bind_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::usd::{material_binding_target, Value};

    fn union(loc: &str, faces: impl IntoIterator<Item = u32>) -> BTreeMap<String, BTreeSet<u32>> {
        let mut map = BTreeMap::new();
        map.insert(loc.to_string(), faces.into_iter().collect());
        map
    }

    #[test]
    fn test_binding_target() {
        let full = union("/m", 0..10);
        assert_eq!(binding_target(&full, "/m", Some(10)), Some(BindingTarget::Prim));
        assert_eq!(
            binding_target(&union("/m", 0..5), "/m", Some(10)),
            Some(BindingTarget::Subset(vec![0, 1, 2, 3, 4]))
        );
        // unknown face count never counts as full
        assert!(matches!(binding_target(&full, "/m", None), Some(BindingTarget::Subset(_))));
        assert_eq!(binding_target(&full, "/other", Some(10)), None);
        assert_eq!(binding_target(&BTreeMap::new(), "/other", None), Some(BindingTarget::Prim));
    }

    #[test]
    fn test_bind_locations() {
        let mut host = MemoryHost::new("chair");
        let group = host.add_selection_group("seat", [("/chair/seat", vec![4, 0, 2])]);
        host.set_face_count("/chair/seat", 10);

        let mut stage = Stage::create_in_memory();
        let mat_path = SdfPath::parse("/Root/Wood").unwrap();
        stage.define_material(&mat_path).unwrap();

        let mut material = UsdMaterialSource::new("Wood");
        material.add_binding_location("/chair/seat");
        material.add_binding_location("/chair/legs");
        material.add_binding_location("not a path");
        material.add_selection_group(group);

        let bound = bind_material_locations(&mut stage, &host, &material, &mat_path);
        assert_eq!(bound, 1);
        assert!(stage.prim(&SdfPath::parse("/chair/legs").unwrap()).is_none());

        let subset_path = SdfPath::parse("/chair/seat/Wood_subset").unwrap();
        let subset = stage.prim(&subset_path).unwrap();
        assert_eq!(subset.type_name, "GeomSubset");
        assert_eq!(
            subset.attribute("indices").unwrap().value,
            Some(Value::IntArray(vec![0, 2, 4]))
        );
        assert_eq!(material_binding_target(subset), Some("/Root/Wood"));
    }

    #[test]
    fn test_no_groups_binds_everything() {
        let host = MemoryHost::new("chair");
        let mut stage = Stage::create_in_memory();
        let mat_path = SdfPath::parse("/Root/Wood").unwrap();
        stage.define_material(&mat_path).unwrap();

        let mut material = UsdMaterialSource::new("Wood");
        material.add_binding_location("/chair/seat");
        material.add_binding_location("/chair/legs");
        assert_eq!(bind_material_locations(&mut stage, &host, &material, &mat_path), 2);
        let legs = stage.prim(&SdfPath::parse("/chair/legs").unwrap()).unwrap();
        assert_eq!(material_binding_target(legs), Some("/Root/Wood"));
    }
}
