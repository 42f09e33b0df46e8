//! usda text writer.
//!
//! Reference: `pxr/usd/sdf/fileFormat` usda grammar (`textFileFormat.yy`).

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::prim::{Attribute, Prim};
use super::stage::Stage;
use super::value::quote;
use crate::util::Result;

const INDENT: &str = "    ";

/// Output stream for writing usda layers.
pub struct UsdaStream<W: Write> {
    writer: W,
}

impl UsdaStream<BufWriter<File>> {
    /// Create a new output stream for the given file path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> UsdaStream<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn line(&mut self, depth: usize, text: &str) -> Result<()> {
        for _ in 0..depth {
            self.writer.write_all(INDENT.as_bytes())?;
        }
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a whole stage.
    pub fn write_stage(&mut self, stage: &Stage) -> Result<()> {
        self.line(0, "#usda 1.0")?;

        let mut meta = Vec::new();
        if let Some(comment) = stage.comment() {
            meta.push(quote(comment));
        }
        if let Some(default_prim) = stage.default_prim() {
            meta.push(format!("defaultPrim = {}", quote(default_prim)));
        }
        if !meta.is_empty() {
            self.line(0, "(")?;
            for m in &meta {
                self.line(1, m)?;
            }
            self.line(0, ")")?;
        }

        for prim in &stage.pseudo_root().children {
            self.line(0, "")?;
            self.write_prim(prim, 0)?;
        }
        Ok(())
    }

    fn write_prim(&mut self, prim: &Prim, depth: usize) -> Result<()> {
        let mut header = String::from(prim.specifier.keyword());
        if !prim.type_name.is_empty() {
            header.push(' ');
            header.push_str(&prim.type_name);
        }
        header.push(' ');
        header.push_str(&quote(&prim.name));

        let meta = prim_metadata(prim);
        if meta.is_empty() {
            self.line(depth, &header)?;
        } else {
            header.push_str(" (");
            self.line(depth, &header)?;
            for m in &meta {
                self.line(depth + 1, m)?;
            }
            self.line(depth, ")")?;
        }

        self.line(depth, "{")?;
        for attr in &prim.attributes {
            self.write_attribute(attr, depth + 1)?;
        }
        for rel in &prim.relationships {
            let targets = list_or_single(rel.targets.iter().map(|t| format!("<{}>", t)).collect());
            self.line(depth + 1, &format!("rel {} = {}", rel.name, targets))?;
        }
        let has_props = !prim.attributes.is_empty() || !prim.relationships.is_empty();
        for (i, child) in prim.children.iter().enumerate() {
            if i > 0 || has_props {
                self.line(0, "")?;
            }
            self.write_prim(child, depth + 1)?;
        }
        self.line(depth, "}")
    }

    fn write_attribute(&mut self, attr: &Attribute, depth: usize) -> Result<()> {
        let decl = if attr.uniform {
            format!("uniform {} {}", attr.value_type, attr.name)
        } else {
            format!("{} {}", attr.value_type, attr.name)
        };
        if let Some(value) = &attr.value {
            self.line(depth, &format!("{} = {}", decl, value.to_usda()))?;
        }
        if !attr.connections.is_empty() {
            let targets = list_or_single(attr.connections.iter().map(|t| format!("<{}>", t)).collect());
            self.line(depth, &format!("{}.connect = {}", decl, targets))?;
        }
        if attr.value.is_none() && attr.connections.is_empty() {
            self.line(depth, &decl)?;
        }
        Ok(())
    }
}

fn prim_metadata(prim: &Prim) -> Vec<String> {
    let mut meta = Vec::new();
    if !prim.api_schemas.is_empty() {
        let schemas: Vec<String> = prim.api_schemas.iter().map(|s| quote(s)).collect();
        meta.push(format!("prepend apiSchemas = [{}]", schemas.join(", ")));
    }
    if !prim.payloads.is_empty() {
        let assets = prim.payloads.iter().map(|a| format!("@{}@", a)).collect();
        meta.push(format!("append payload = {}", list_or_single(assets)));
    }
    if !prim.references.is_empty() {
        let assets = prim.references.iter().map(|a| format!("@{}@", a)).collect();
        meta.push(format!("append references = {}", list_or_single(assets)));
    }
    meta
}

fn list_or_single(mut items: Vec<String>) -> String {
    if items.len() == 1 {
        items.remove(0)
    } else {
        format!("[{}]", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usd::{SdfPath, Value, ValueType};

    #[test]
    fn test_write_layer() {
        let mut stage = Stage::create_in_memory();
        let root = SdfPath::parse("/Root").unwrap();
        stage.define_prim(&root, "").unwrap();
        stage.set_default_prim(&root).unwrap();
        stage.set_comment("hello");
        let mat = root.append_child("Mat").unwrap();
        let prim = stage.define_prim(&mat, "Material").unwrap();
        prim.ensure_attribute("inputs:opacity", ValueType::Float).value = Some(Value::Float(0.5));
        prim.references.push("./look.usda".into());

        let text = stage.to_usda().unwrap();
        let expected = "#usda 1.0
(
    \"hello\"
    defaultPrim = \"Root\"
)

def \"Root\"
{
    def Material \"Mat\" (
        append references = @./look.usda@
    )
    {
        float inputs:opacity = 0.5
    }
}
";
        assert_eq!(text, expected);
    }
}
