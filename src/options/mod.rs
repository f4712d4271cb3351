//! Typed option tree for a single mod's tunable settings.
//!
//! Every mod type compiles in an ordered list of [`ModOption`]s. The tree is at most two levels
//! deep: top-level options, and options whose `parent` names a top-level group marker. Group
//! markers are `hidden` and never persisted as a leaf value of their own.
//!
//! The tree is mutated in place from three directions:
//! - codec reads from disk ([`OptionTree::apply_structured`])
//! - override lists coming from the UI boundary ([`OptionTree::apply_overrides`])
//! - [`OptionTree::reset_to_defaults`]

pub mod defaults;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single option value.
///
/// Integers are kept apart from floats so key codes stay `112` on disk instead of `112.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", try_from = "serde_json::Value")]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    /// Opaque marker carried by group options.
    Group,
}

impl OptionValue {
    /// Convert `self` into the same kind as `like`, if the two are compatible.
    ///
    /// Numbers convert between `Int` and `Float` (floats only when integral). NaN and
    /// infinities are refused, as are all values offered to a group marker.
    pub fn coerce_like(self, like: &OptionValue) -> Option<OptionValue> {
        match (self, like) {
            (_, OptionValue::Group) => None,
            (OptionValue::Float(v), _) if !v.is_finite() => None,
            (OptionValue::Bool(v), OptionValue::Bool(_)) => Some(OptionValue::Bool(v)),
            (OptionValue::Int(v), OptionValue::Int(_)) => Some(OptionValue::Int(v)),
            (OptionValue::Float(v), OptionValue::Float(_)) => Some(OptionValue::Float(v)),
            (OptionValue::Int(v), OptionValue::Float(_)) => Some(OptionValue::Float(v as f64)),
            (OptionValue::Float(v), OptionValue::Int(_)) if v.fract() == 0.0 => {
                Some(OptionValue::Int(v as i64))
            }
            (OptionValue::Text(v), OptionValue::Text(_)) => Some(OptionValue::Text(v)),
            (OptionValue::List(v), OptionValue::List(_)) => Some(OptionValue::List(v)),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, OptionValue::Group)
    }
}

impl From<OptionValue> for serde_json::Value {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::Bool(v) => serde_json::Value::Bool(v),
            OptionValue::Int(v) => serde_json::Value::from(v),
            OptionValue::Float(v) => serde_json::Number::from_f64(v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            OptionValue::Text(v) => serde_json::Value::String(v),
            OptionValue::List(v) => {
                serde_json::Value::Array(v.into_iter().map(serde_json::Value::String).collect())
            }
            OptionValue::Group => serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl TryFrom<serde_json::Value> for OptionValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(v) => Ok(OptionValue::Bool(v)),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(OptionValue::Int(v))
                } else if let Some(v) = n.as_f64() {
                    Ok(OptionValue::Float(v))
                } else {
                    Err(format!("unsupported number: {}", n))
                }
            }
            serde_json::Value::String(v) => Ok(OptionValue::Text(v)),
            serde_json::Value::Array(items) => Ok(OptionValue::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            serde_json::Value::Object(_) => Ok(OptionValue::Group),
            serde_json::Value::Null => Err("option value cannot be null".to_string()),
        }
    }
}

/// Presentation hint for the front end. Has no effect on persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "settingType", rename_all = "camelCase")]
pub enum UiHint {
    Choice {
        value: OptionValue,
        name: String,
    },
    Range {
        min: f64,
        max: f64,
        step: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display: Option<String>,
    },
    KeyCombo,
}

/// Display metadata attached to an option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionMeta {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub hints: Vec<UiHint>,
}

/// One named, typed, user-configurable setting.
#[derive(Debug, Clone, PartialEq)]
pub struct ModOption {
    pub key: String,
    pub parent: Option<String>,
    pub value: OptionValue,
    pub hidden: bool,
    pub meta: OptionMeta,
}

impl ModOption {
    pub fn new(key: &str, name: &str, category: &str, value: OptionValue) -> Self {
        Self {
            key: key.to_string(),
            parent: None,
            value,
            hidden: false,
            meta: OptionMeta {
                name: name.to_string(),
                category: category.to_string(),
                ..OptionMeta::default()
            },
        }
    }

    /// A hidden group marker for nesting child options one level deep.
    pub fn group(key: &str, name: &str, category: &str) -> Self {
        Self {
            hidden: true,
            ..Self::new(key, name, category, OptionValue::Group)
        }
    }

    pub fn under(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.meta.desc = desc.to_string();
        self
    }

    pub fn hint(mut self, hint: UiHint) -> Self {
        self.meta.hints.push(hint);
        self
    }

    pub fn on_off(self) -> Self {
        self.hint(UiHint::Choice {
            value: OptionValue::Bool(true),
            name: "On".to_string(),
        })
        .hint(UiHint::Choice {
            value: OptionValue::Bool(false),
            name: "Off".to_string(),
        })
    }

    pub fn range(self, min: f64, max: f64, step: f64) -> Self {
        self.hint(UiHint::Range {
            min,
            max,
            step,
            display: None,
        })
    }

    fn matches(&self, key: &str, parent: Option<&str>) -> bool {
        self.key == key && self.parent.as_deref() == parent
    }

    fn to_record(&self, redact_internal: bool) -> OptionRecord {
        OptionRecord {
            key: self.key.clone(),
            parent: self.parent.clone(),
            value: self.value.clone(),
            hidden: self.hidden,
            meta: (!redact_internal).then(|| self.meta.clone()),
        }
    }
}

/// Flat, serializable form of a [`ModOption`].
///
/// This is what Application Records store per mod and what the UI sends back as overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub key: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub value: OptionValue,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<OptionMeta>,
}

impl OptionRecord {
    pub fn new(key: &str, parent: Option<&str>, value: OptionValue) -> Self {
        Self {
            key: key.to_string(),
            parent: parent.map(str::to_string),
            value,
            hidden: false,
            meta: None,
        }
    }
}

/// A nested config entry: either a top-level leaf or a group's sub-map.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEntry {
    Value(OptionValue),
    Group(IndexMap<String, OptionValue>),
}

/// Nested representation shared by both codecs.
pub type StructuredMap = IndexMap<String, ConfigEntry>;

/// Ordered collection of options belonging to one mod type.
#[derive(Debug, Clone)]
pub struct OptionTree {
    options: Vec<ModOption>,
    defaults: fn() -> Vec<ModOption>,
}

impl OptionTree {
    /// Build a tree populated with the compiled-in defaults.
    pub fn new(defaults: fn() -> Vec<ModOption>) -> Self {
        let options = defaults();
        debug_assert!(check_shape(&options).is_ok(), "{:?}", check_shape(&options));
        Self { options, defaults }
    }

    pub fn reset_to_defaults(&mut self) {
        self.options = (self.defaults)();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, key: &str, parent: Option<&str>) -> Option<&ModOption> {
        self.options.iter().find(|o| o.matches(key, parent))
    }

    pub fn value(&self, key: &str, parent: Option<&str>) -> Option<&OptionValue> {
        self.get(key, parent).map(|o| &o.value)
    }

    /// Overwrite the value of the option at (key, parent).
    ///
    /// Returns `false` when no such option exists or the value kind is incompatible.
    pub fn set_value(&mut self, key: &str, parent: Option<&str>, value: OptionValue) -> bool {
        let Some(option) = self.options.iter_mut().find(|o| o.matches(key, parent)) else {
            tracing::trace!("Ignoring unknown option {:?}/{}", parent, key);
            return false;
        };

        match value.coerce_like(&option.value) {
            Some(coerced) => {
                option.value = coerced;
                true
            }
            None => {
                tracing::debug!(
                    "Ignoring incompatible value for option {:?}/{}",
                    parent,
                    key
                );
                false
            }
        }
    }

    /// Apply a list of overrides; entries that match nothing are skipped.
    ///
    /// Returns the number of options that were updated.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> usize
    where
        I: IntoIterator<Item = &'a OptionRecord>,
    {
        overrides
            .into_iter()
            .filter(|o| self.set_value(&o.key, o.parent.as_deref(), o.value.clone()))
            .count()
    }

    /// Apply values read back from a config file by direct key matching.
    pub fn apply_structured(&mut self, map: &StructuredMap) -> usize {
        let mut applied = 0;
        for (key, entry) in map {
            match entry {
                ConfigEntry::Value(value) => {
                    if self.set_value(key, None, value.clone()) {
                        applied += 1;
                    }
                }
                ConfigEntry::Group(children) => {
                    for (child, value) in children {
                        if self.set_value(child, Some(key), value.clone()) {
                            applied += 1;
                        }
                    }
                }
            }
        }
        applied
    }

    pub fn to_flat_list(&self, redact_internal: bool) -> Vec<OptionRecord> {
        self.options
            .iter()
            .map(|o| o.to_record(redact_internal))
            .collect()
    }

    /// Nest options under their parent group's key.
    ///
    /// Hidden group markers only contribute their children; other top-level options sit next
    /// to the groups as plain values.
    pub fn to_structured_map(&self) -> StructuredMap {
        let mut map = StructuredMap::new();

        for option in &self.options {
            match &option.parent {
                None if option.hidden => {
                    map.entry(option.key.clone())
                        .or_insert_with(|| ConfigEntry::Group(IndexMap::new()));
                }
                None => {
                    map.insert(option.key.clone(), ConfigEntry::Value(option.value.clone()));
                }
                Some(parent) => {
                    let entry = map
                        .entry(parent.clone())
                        .or_insert_with(|| ConfigEntry::Group(IndexMap::new()));
                    if let ConfigEntry::Value(_) = entry {
                        *entry = ConfigEntry::Group(IndexMap::new());
                    }
                    if let ConfigEntry::Group(children) = entry {
                        children.insert(option.key.clone(), option.value.clone());
                    }
                }
            }
        }

        map
    }
}

/// Verify (key, parent) uniqueness and the two-level depth limit.
pub fn check_shape(options: &[ModOption]) -> Result<(), String> {
    for (i, option) in options.iter().enumerate() {
        let parent = option.parent.as_deref();
        if options[..i].iter().any(|o| o.matches(&option.key, parent)) {
            return Err(format!("duplicate option {:?}/{}", parent, option.key));
        }
        if let Some(parent_key) = parent {
            match options.iter().find(|o| o.matches(parent_key, None)) {
                Some(group) if group.parent.is_none() => {}
                _ => {
                    return Err(format!(
                        "option {} has no top-level parent {}",
                        option.key, parent_key
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ModOption> {
        vec![
            ModOption::new("enabled", "Enabled", "Main", OptionValue::Bool(true)),
            ModOption::new("scale", "Scale", "Main", OptionValue::Float(0.5)),
            ModOption::group("keys", "Keys", "Keys"),
            ModOption::new("toggle", "Toggle", "Keys", OptionValue::Int(112)).under("keys"),
            ModOption::new("enabled", "Enabled", "Keys", OptionValue::Bool(false)).under("keys"),
        ]
    }

    #[test]
    fn test_same_key_under_different_parents() {
        let mut tree = OptionTree::new(sample);
        assert!(tree.set_value("enabled", Some("keys"), OptionValue::Bool(true)));

        assert_eq!(tree.value("enabled", None), Some(&OptionValue::Bool(true)));
        assert_eq!(tree.value("enabled", Some("keys")), Some(&OptionValue::Bool(true)));
        assert!(tree.set_value("enabled", None, OptionValue::Bool(false)));
        assert_eq!(tree.value("enabled", Some("keys")), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_numeric_coercion() {
        let mut tree = OptionTree::new(sample);
        assert!(tree.set_value("scale", None, OptionValue::Int(2)));
        assert_eq!(tree.value("scale", None), Some(&OptionValue::Float(2.0)));

        assert!(tree.set_value("toggle", Some("keys"), OptionValue::Float(113.0)));
        assert_eq!(tree.value("toggle", Some("keys")), Some(&OptionValue::Int(113)));

        assert!(!tree.set_value("toggle", Some("keys"), OptionValue::Float(1.5)));
        assert!(!tree.set_value("enabled", None, OptionValue::Text("yes".to_string())));
    }

    #[test]
    fn test_non_finite_floats_are_refused() {
        let mut tree = OptionTree::new(sample);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!tree.set_value("scale", None, OptionValue::Float(bad)));
            assert!(!tree.set_value("toggle", Some("keys"), OptionValue::Float(bad)));
        }
        assert_eq!(tree.value("scale", None), OptionTree::new(sample).value("scale", None));
    }

    #[test]
    fn test_group_marker_is_not_writable() {
        let mut tree = OptionTree::new(sample);
        assert!(!tree.set_value("keys", None, OptionValue::Group));
        assert!(!tree.set_value("keys", None, OptionValue::Bool(true)));
    }

    #[test]
    fn test_structured_map_nests_children() {
        let tree = OptionTree::new(sample);
        let map = tree.to_structured_map();

        assert_eq!(map.len(), 3);
        assert_eq!(map["scale"], ConfigEntry::Value(OptionValue::Float(0.5)));
        let ConfigEntry::Group(keys) = &map["keys"] else {
            panic!("keys should be a group");
        };
        assert_eq!(keys["toggle"], OptionValue::Int(112));
        assert_eq!(keys["enabled"], OptionValue::Bool(false));
        assert!(!keys.contains_key("keys"));
    }

    #[test]
    fn test_apply_structured_skips_unknown() {
        let mut tree = OptionTree::new(sample);
        let mut keys = IndexMap::new();
        keys.insert("toggle".to_string(), OptionValue::Int(120));
        keys.insert("bogus".to_string(), OptionValue::Int(1));

        let mut map = StructuredMap::new();
        map.insert("keys".to_string(), ConfigEntry::Group(keys));
        map.insert("unknown".to_string(), ConfigEntry::Value(OptionValue::Bool(true)));

        assert_eq!(tree.apply_structured(&map), 1);
        assert_eq!(tree.value("toggle", Some("keys")), Some(&OptionValue::Int(120)));
    }

    #[test]
    fn test_flat_list_redaction() {
        let tree = OptionTree::new(sample);
        assert!(tree.to_flat_list(true).iter().all(|r| r.meta.is_none()));
        assert!(tree.to_flat_list(false).iter().all(|r| r.meta.is_some()));
    }

    #[test]
    fn test_option_value_json_forms() {
        let json = serde_json::to_string(&OptionValue::Int(112)).unwrap();
        assert_eq!(json, "112");
        let json = serde_json::to_string(&OptionValue::Group).unwrap();
        assert_eq!(json, "{}");

        let value: OptionValue = serde_json::from_str("0.77").unwrap();
        assert_eq!(value, OptionValue::Float(0.77));
        let value: OptionValue = serde_json::from_str(r#"["ctrl", "f1"]"#).unwrap();
        assert_eq!(value, OptionValue::List(vec!["ctrl".into(), "f1".into()]));
        assert!(serde_json::from_str::<OptionValue>("null").is_err());
    }

    #[test]
    fn test_check_shape_rejects_duplicates_and_depth() {
        let mut options = sample();
        options.push(ModOption::new("scale", "Scale", "Main", OptionValue::Float(1.0)));
        assert!(check_shape(&options).is_err());

        let mut options = sample();
        options.push(ModOption::new("deep", "Deep", "Keys", OptionValue::Int(1)).under("toggle"));
        assert!(check_shape(&options).is_err());
    }
}
