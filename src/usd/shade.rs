//! UsdShade conventions on top of [`Stage`].
//!
//! Reference: `pxr/usd/usdShade/material.h`, `shader.h`, `connectableAPI.h`,
//! `materialBindingAPI.h`, `pxr/usd/usdGeom/subset.h`.

use super::path::SdfPath;
use super::stage::Stage;
use super::value::{Value, ValueType};
use crate::util::{ExportError, Result};

/// Subset family used for material bindings.
pub const MATERIAL_BIND_FAMILY: &str = "materialBind";

const BINDING_REL: &str = "material:binding";
const BINDING_API: &str = "MaterialBindingAPI";

/// Target of the direct material binding on `prim`, if any.
pub fn material_binding_target(prim: &super::Prim) -> Option<&str> {
    prim.relationship(BINDING_REL)
        .and_then(|r| r.targets.first())
        .map(String::as_str)
}

impl Stage {
    /// Define a `Material` prim.
    pub fn define_material(&mut self, path: &SdfPath) -> Result<()> {
        self.define_prim(path, "Material")?;
        Ok(())
    }

    /// Define a `Shader` prim, setting `info:id` when given.
    pub fn define_shader(&mut self, path: &SdfPath, shader_id: Option<&str>) -> Result<()> {
        let prim = self.define_prim(path, "Shader")?;
        if let Some(id) = shader_id {
            let attr = prim.ensure_attribute("info:id", ValueType::Token);
            attr.uniform = true;
            attr.value = Some(Value::Token(id.to_string()));
        }
        Ok(())
    }

    /// Shader id of a shader prim.
    pub fn shader_id(&self, path: &SdfPath) -> Option<&str> {
        match &self.prim(path)?.attribute("info:id")?.value {
            Some(Value::Token(id)) => Some(id),
            _ => None,
        }
    }

    /// Declare an input without a value.
    pub fn create_input(&mut self, prim: &SdfPath, name: &str, value_type: ValueType) -> Result<()> {
        self.existing_prim_mut(prim)?
            .ensure_attribute(&format!("inputs:{}", name), value_type);
        Ok(())
    }

    /// Author a literal input value.
    pub fn set_input(&mut self, prim: &SdfPath, name: &str, value: Value) -> Result<()> {
        let attr = self
            .existing_prim_mut(prim)?
            .ensure_attribute(&format!("inputs:{}", name), value.value_type());
        attr.value = Some(value);
        Ok(())
    }

    /// Literal value of an input.
    pub fn input_value(&self, prim: &SdfPath, name: &str) -> Option<&Value> {
        self.prim(prim)?
            .attribute(&format!("inputs:{}", name))?
            .value
            .as_ref()
    }

    /// Connect `prim.inputs:<input>` to `source.outputs:<output>`.
    ///
    /// The source output is declared with the input's type when missing.
    /// Connecting again replaces the previous source.
    pub fn connect_input(
        &mut self,
        prim: &SdfPath,
        input: &str,
        value_type: ValueType,
        source: &SdfPath,
        output: &str,
    ) -> Result<()> {
        let output_name = format!("outputs:{}", output);
        self.existing_prim_mut(source)?
            .ensure_attribute(&output_name, value_type);
        let attr = self
            .existing_prim_mut(prim)?
            .ensure_attribute(&format!("inputs:{}", input), value_type);
        attr.connections = vec![source.property(&output_name)];
        Ok(())
    }

    /// Source of a connected input as `(prim path, output name)`.
    pub fn input_source(&self, prim: &SdfPath, input: &str) -> Option<(SdfPath, String)> {
        let attr = self.prim(prim)?.attribute(&format!("inputs:{}", input))?;
        let target = attr.connections.first()?;
        let (path, prop) = target.split_once('.')?;
        let output = prop.strip_prefix("outputs:")?;
        Some((SdfPath::parse(path).ok()?, output.to_string()))
    }

    /// Create the material's surface output, optionally in a render context,
    /// and connect it to `shader.outputs:<terminal>`.
    pub fn connect_surface_output(
        &mut self,
        material: &SdfPath,
        render_context: Option<&str>,
        shader: &SdfPath,
        terminal: &str,
    ) -> Result<()> {
        let output = match render_context {
            Some(ctx) if !ctx.is_empty() => format!("outputs:{}:surface", ctx),
            _ => "outputs:surface".to_string(),
        };
        let terminal_name = format!("outputs:{}", terminal);
        self.existing_prim_mut(shader)?
            .ensure_attribute(&terminal_name, ValueType::Token);
        let attr = self
            .existing_prim_mut(material)?
            .ensure_attribute(&output, ValueType::Token);
        attr.connections = vec![shader.property(&terminal_name)];
        Ok(())
    }

    /// Bind `material` to `target` with a direct binding.
    pub fn bind_material(&mut self, target: &SdfPath, material: &SdfPath) -> Result<()> {
        match self.prim(material) {
            Some(p) if p.type_name == "Material" => {}
            _ => return Err(ExportError::PrimNotFound(material.to_string())),
        }
        let prim = self.existing_prim_mut(target)?;
        prim.apply_api_schema(BINDING_API);
        prim.set_relationship_targets(BINDING_REL, vec![material.to_string()]);
        Ok(())
    }

    /// Define a face `GeomSubset` child of `parent`.
    pub fn define_face_subset(
        &mut self,
        parent: &SdfPath,
        name: &str,
        indices: Vec<i32>,
        family: &str,
    ) -> Result<SdfPath> {
        if self.prim(parent).is_none() {
            return Err(ExportError::PrimNotFound(parent.to_string()));
        }
        let path = parent.append_child(name)?;
        let prim = self.define_prim(&path, "GeomSubset")?;

        let attr = prim.ensure_attribute("elementType", ValueType::Token);
        attr.uniform = true;
        attr.value = Some(Value::Token("face".to_string()));
        let attr = prim.ensure_attribute("familyName", ValueType::Token);
        attr.uniform = true;
        attr.value = Some(Value::Token(family.to_string()));
        prim.ensure_attribute("indices", ValueType::IntArray).value = Some(Value::IntArray(indices));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> SdfPath {
        SdfPath::parse(s).unwrap()
    }

    #[test]
    fn test_material_and_connections() {
        let mut stage = Stage::create_in_memory();
        stage.define_material(&p("/Root/Mat")).unwrap();
        stage.define_shader(&p("/Root/Mat/Shader"), Some("PxrSurface")).unwrap();
        stage.connect_surface_output(&p("/Root/Mat"), Some("ri"), &p("/Root/Mat/Shader"), "out").unwrap();
        stage.define_shader(&p("/Root/Mat/Shader/tex"), Some("PxrTexture")).unwrap();
        stage
            .connect_input(&p("/Root/Mat/Shader"), "diffuseColor", ValueType::Color3f, &p("/Root/Mat/Shader/tex"), "resultRGB")
            .unwrap();

        assert_eq!(stage.shader_id(&p("/Root/Mat/Shader")), Some("PxrSurface"));
        let mat = stage.prim(&p("/Root/Mat")).unwrap();
        assert_eq!(
            mat.attribute("outputs:ri:surface").unwrap().connections,
            vec!["/Root/Mat/Shader.outputs:out".to_string()]
        );
        let (src, out) = stage.input_source(&p("/Root/Mat/Shader"), "diffuseColor").unwrap();
        assert_eq!(src, p("/Root/Mat/Shader/tex"));
        assert_eq!(out, "resultRGB");
        let tex = stage.prim(&src).unwrap();
        assert_eq!(tex.attribute("outputs:resultRGB").unwrap().value_type, ValueType::Color3f);
    }

    #[test]
    fn test_connect_requires_source() {
        let mut stage = Stage::create_in_memory();
        stage.define_shader(&p("/S"), None).unwrap();
        assert!(stage
            .connect_input(&p("/S"), "a", ValueType::Float, &p("/Missing"), "r")
            .is_err());
    }

    #[test]
    fn test_bind_and_subset() {
        let mut stage = Stage::create_in_memory();
        stage.define_material(&p("/Root/Mat")).unwrap();
        stage.override_prim(&p("/geo/mesh")).unwrap();
        let subset = stage
            .define_face_subset(&p("/geo/mesh"), "Mat_subset", vec![0, 1, 2], MATERIAL_BIND_FAMILY)
            .unwrap();
        stage.bind_material(&subset, &p("/Root/Mat")).unwrap();

        let prim = stage.prim(&subset).unwrap();
        assert_eq!(prim.type_name, "GeomSubset");
        assert_eq!(material_binding_target(prim), Some("/Root/Mat"));
        assert_eq!(prim.api_schemas, vec!["MaterialBindingAPI".to_string()]);
        assert!(stage.bind_material(&p("/geo/mesh"), &p("/Root/Nope")).is_err());
    }
}
