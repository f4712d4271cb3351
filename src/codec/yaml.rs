use super::yaml_doc::YamlDocument;
use super::{CodecError, ConfigCodec, read_text, remove_if_exists};
use crate::options::{ConfigEntry, OptionTree, OptionValue, StructuredMap};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde_yaml_ng::Value;
use std::fs;

/// Codec for `vrperfkit.yml`.
///
/// Writes edit the existing document (or the shipped template) in place, so comments, key
/// order and keys this tool doesn't know about survive. An existing file is copied to
/// `<file>.orig` before it is overwritten.
#[derive(Debug, Clone, Default)]
pub struct YamlCodec;

impl YamlCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn backup_path(file: &Utf8Path) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.orig", file))
    }

    /// Pick the text the write starts from: the current file, else the template.
    fn load_source(
        file: &Utf8Path,
        template: Option<&Utf8Path>,
    ) -> Result<Option<(String, Utf8PathBuf)>, CodecError> {
        if file.exists() {
            return Ok(Some((read_text(file)?, file.to_path_buf())));
        }
        match template.filter(|t| t.exists()) {
            Some(template) => Ok(Some((read_text(template)?, template.to_path_buf()))),
            None => {
                tracing::warn!(
                    "No existing config or template for {}, starting from an empty document",
                    file
                );
                Ok(None)
            }
        }
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_text(tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn leaf(value: Value) -> Option<OptionValue> {
    match value {
        Value::Bool(v) => Some(OptionValue::Bool(v)),
        Value::Number(n) => n
            .as_i64()
            .map(OptionValue::Int)
            .or_else(|| n.as_f64().map(OptionValue::Float)),
        Value::String(s) => Some(OptionValue::Text(s)),
        Value::Sequence(items) => Some(OptionValue::List(
            items.into_iter().filter_map(scalar_text).collect(),
        )),
        Value::Tagged(tagged) => leaf(tagged.value),
        Value::Null | Value::Mapping(_) => None,
    }
}

/// Convert a parsed document into the two-level structured map.
fn to_structured(value: Value, file: &Utf8Path) -> Result<StructuredMap, CodecError> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(StructuredMap::new()),
        _ => return Err(CodecError::parse(file, "top level is not a mapping")),
    };

    let mut map = StructuredMap::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str().map(str::to_string) else {
            tracing::debug!("Skipping non-string key in {}", file);
            continue;
        };
        match value {
            Value::Mapping(children) => {
                let children: IndexMap<String, OptionValue> = children
                    .into_iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), leaf(v)?)))
                    .collect();
                map.insert(key, ConfigEntry::Group(children));
            }
            other => {
                if let Some(v) = leaf(other) {
                    map.insert(key, ConfigEntry::Value(v));
                }
            }
        }
    }
    Ok(map)
}

impl ConfigCodec for YamlCodec {
    fn read(&self, file: &Utf8Path) -> Result<StructuredMap, CodecError> {
        let text = read_text(file)?;
        let value: Value = serde_yaml_ng::from_str(&text).map_err(|e| CodecError::parse(file, e))?;
        let map = to_structured(value, file)?;

        tracing::debug!("Read {} entries from {}", map.len(), file);
        Ok(map)
    }

    fn write(
        &self,
        tree: &OptionTree,
        file: &Utf8Path,
        template: Option<&Utf8Path>,
    ) -> Result<(), CodecError> {
        let source = Self::load_source(file, template)?;

        let mut doc = match &source {
            Some((text, origin)) => {
                serde_yaml_ng::from_str::<Value>(text)
                    .map_err(|e| CodecError::parse(origin, e))?;
                YamlDocument::parse(text)
            }
            None => YamlDocument::default(),
        };

        if file.exists() {
            let backup = Self::backup_path(file);
            match fs::copy(file, &backup) {
                Ok(_) => tracing::info!("Backed up existing config to {}", backup),
                Err(e) => tracing::warn!("Failed to back up {} to {}: {}", file, backup, e),
            }
        }

        doc.normalize_style();
        for (key, entry) in tree.to_structured_map() {
            match entry {
                ConfigEntry::Value(value) => {
                    if !doc.upsert(&[&key], &value) {
                        tracing::debug!("Could not place {} in {}", key, file);
                    }
                }
                ConfigEntry::Group(children) => {
                    for (child, value) in children {
                        if !doc.upsert(&[&key, &child], &value) {
                            tracing::debug!("Could not place {}.{} in {}", key, child, file);
                        }
                    }
                }
            }
        }

        let text = doc.render();
        serde_yaml_ng::from_str::<Value>(&text)
            .map_err(|e| CodecError::parse(file, format!("edited document is invalid: {}", e)))?;
        fs::write(file, text).map_err(|e| CodecError::io(file, e))?;

        tracing::info!("Written updated config at {}", file);
        Ok(())
    }

    fn delete(&self, file: &Utf8Path) -> Result<(), CodecError> {
        remove_if_exists(file)?;
        remove_if_exists(&Self::backup_path(file))
    }
}
