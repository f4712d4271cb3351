use super::{CodecError, ConfigCodec, read_text};
use crate::options::{ConfigEntry, OptionTree, OptionValue, StructuredMap};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;

/// Codec for `openvr_mod.cfg` style files.
///
/// Any line containing `//` or `#` is dropped before parsing. Writes emit plain JSON, so
/// comments in an existing file do not survive a write.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    section: &'static str,
}

impl JsonCodec {
    pub fn new(section: &'static str) -> Self {
        Self { section }
    }

    pub fn section(&self) -> &str {
        self.section
    }

    /// Drop every line carrying a comment token.
    pub fn strip_comments(text: &str) -> String {
        text.lines()
            .filter(|line| !line.contains("//") && !line.contains('#'))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(tree: &OptionTree) -> Map<String, Value> {
        tree.to_structured_map()
            .into_iter()
            .map(|(key, entry)| {
                let value = match entry {
                    ConfigEntry::Value(v) => Value::from(v),
                    ConfigEntry::Group(children) => Value::Object(
                        children
                            .into_iter()
                            .map(|(child, v)| (child, Value::from(v)))
                            .collect(),
                    ),
                };
                (key, value)
            })
            .collect()
    }
}

fn leaf(key: &str, value: Value) -> Option<OptionValue> {
    match OptionValue::try_from(value) {
        Ok(v) if !v.is_group() => Some(v),
        Ok(_) => {
            tracing::debug!("Ignoring nested object at '{}'", key);
            None
        }
        Err(e) => {
            tracing::debug!("Ignoring value at '{}': {}", key, e);
            None
        }
    }
}

impl ConfigCodec for JsonCodec {
    fn read(&self, file: &Utf8Path) -> Result<StructuredMap, CodecError> {
        let text = read_text(file)?;
        let json: Value = serde_json::from_str(&Self::strip_comments(&text))
            .map_err(|e| CodecError::parse(file, e))?;

        let section = match json.get(self.section) {
            Some(Value::Object(section)) => section.clone(),
            Some(_) => {
                return Err(CodecError::parse(
                    file,
                    format!("section '{}' is not an object", self.section),
                ));
            }
            None => {
                return Err(CodecError::MissingSection(
                    file.to_path_buf(),
                    self.section.to_string(),
                ));
            }
        };

        let mut map = StructuredMap::new();
        for (key, value) in section {
            match value {
                Value::Object(children) => {
                    let children: IndexMap<String, OptionValue> = children
                        .into_iter()
                        .filter_map(|(child, v)| leaf(&child, v).map(|v| (child, v)))
                        .collect();
                    map.insert(key, ConfigEntry::Group(children));
                }
                other => {
                    if let Some(v) = leaf(&key, other) {
                        map.insert(key, ConfigEntry::Value(v));
                    }
                }
            }
        }

        tracing::debug!("Read {} entries from {}", map.len(), file);
        Ok(map)
    }

    fn write(
        &self,
        tree: &OptionTree,
        file: &Utf8Path,
        _template: Option<&Utf8Path>,
    ) -> Result<(), CodecError> {
        let mut root = Map::new();
        root.insert(self.section.to_string(), Value::Object(Self::to_json(tree)));

        let text = serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|e| CodecError::parse(file, e))?;
        fs::write(file, text).map_err(|e| CodecError::io(file, e))?;

        tracing::info!("Written updated config at {}", file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::defaults;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn temp_cfg() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join("openvr_mod.cfg")).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_strip_comments() {
        let text = "{\n  // a comment\n  \"a\": 1, # trailing\n  \"b\": 2\n}";
        assert_eq!(JsonCodec::strip_comments(text), "{\n  \"b\": 2\n}");
    }

    #[test]
    fn test_read_commented_file() {
        let (_temp_dir, path) = temp_cfg();
        fs::write(
            &path,
            r#"{
  "fsr": {
    // enable image upscaling
    "enabled": false,
    "renderScale": 0.5,
    # hotkeys
    "hotkeys": {
      "toggleUseNIS": 120
    }
  }
}"#,
        )
        .unwrap();

        let map = JsonCodec::new("fsr").read(&path).unwrap();
        assert_eq!(map["enabled"], ConfigEntry::Value(OptionValue::Bool(false)));
        assert_eq!(map["renderScale"], ConfigEntry::Value(OptionValue::Float(0.5)));
        let ConfigEntry::Group(hotkeys) = &map["hotkeys"] else {
            panic!("hotkeys should be a group");
        };
        assert_eq!(hotkeys["toggleUseNIS"], OptionValue::Int(120));
    }

    #[test]
    fn test_missing_section_is_not_found() {
        let (_temp_dir, path) = temp_cfg();
        fs::write(&path, r#"{"foveated": {"enabled": true}}"#).unwrap();

        let err = JsonCodec::new("fsr").read(&path).unwrap_err();
        assert!(matches!(err, CodecError::MissingSection(..)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unparsable_file() {
        let (_temp_dir, path) = temp_cfg();
        fs::write(&path, "{ not json").unwrap();

        let err = JsonCodec::new("fsr").read(&path).unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_write_wraps_section() {
        let (_temp_dir, path) = temp_cfg();
        let tree = OptionTree::new(defaults::fsr);
        JsonCodec::new("fsr").write(&tree, &path, None).unwrap();

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["fsr"]["renderScale"], Value::from(0.77));
        assert_eq!(json["fsr"]["hotkeys"]["captureOutput"], Value::from(118));
        assert!(json["fsr"]["hotkeys"].get("hotkeys").is_none());
    }

    #[test]
    fn test_delete_missing_file_succeeds() {
        let (_temp_dir, path) = temp_cfg();
        assert!(JsonCodec::new("fsr").delete(&path).is_ok());
    }
}
