//! Line-oriented YAML editing that keeps comments, key order and blank lines intact.
//!
//! Only block mappings are understood structurally; every other line is carried through as
//! text. Two normalizations are applied on request: block sequences of scalars are folded into
//! flow form (`[a, b]`) and single-line flow mappings are expanded into block form.

use crate::options::OptionValue;
use serde_yaml_ng::{Mapping, Value};

const INDENT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlDocument {
    lines: Vec<String>,
}

/// A `key: value` line and the block nested beneath it.
#[derive(Debug, Clone)]
struct Entry {
    line: usize,
    indent: usize,
    path: Vec<String>,
    /// Byte offset just past the key's colon.
    colon_end: usize,
    /// Byte offset where the inline value ends and the trailing comment (if any) begins.
    value_end: usize,
}

impl Entry {
    fn is_at(&self, path: &[&str]) -> bool {
        self.path.len() == path.len() && self.path.iter().zip(path).all(|(a, b)| a == b)
    }

    fn is_below(&self, other: &Entry) -> bool {
        self.path.len() > other.path.len() && self.path.starts_with(&other.path)
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Blank lines, comments and document markers carry no structure.
fn is_structural(line: &str) -> bool {
    let trimmed = line.trim();
    !(trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" || trimmed == "...")
}

fn is_seq_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Byte offset of a trailing `#` comment. Hashes inside quotes or glued to a token don't count.
fn comment_start(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if (c == '"' || c == '\'') && matches!(prev, ' ' | '[' | '{' | ',') => {
                quote = Some(c)
            }
            None if c == '#' && prev.is_whitespace() => return Some(i),
            None => {}
        }
        prev = c;
    }
    None
}

/// Split a mapping key off `content`, returning the key and the byte offset past its colon.
fn split_key(content: &str) -> Option<(String, usize)> {
    if is_seq_item(content) || content.starts_with(['{', '[', '#']) {
        return None;
    }

    if let Some(q) = content.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let close = content[1..].find(q)? + 1;
        let rest = &content[close + 1..];
        let after = rest.trim_start();
        if !after.starts_with(':') {
            return None;
        }
        let colon = close + 1 + (rest.len() - after.len());
        return Some((content[1..close].to_string(), colon + 1));
    }

    let end = comment_start(content).unwrap_or(content.len());
    let mut search = 0;
    while let Some(pos) = content[search..end].find(':') {
        let colon = search + pos;
        let next = content[colon + 1..].chars().next();
        if next.is_none_or(char::is_whitespace) {
            let key = content[..colon].trim_end();
            return (!key.is_empty()).then(|| (key.to_string(), colon + 1));
        }
        search = colon + 1;
    }
    None
}

fn json_quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text))
}

/// Render a scalar with the YAML serializer so quoting follows its rules.
fn represent(value: &Value) -> String {
    let text = serde_yaml_ng::to_string(value).unwrap_or_default();
    let text = text.strip_prefix("--- ").unwrap_or(&text).trim_end_matches('\n');
    match value {
        Value::String(s) if text.is_empty() || text.contains('\n') => json_quote(s),
        _ => text.to_string(),
    }
}

fn flow_item(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let text = represent(value);
            if text.contains([',', '[', ']', '{', '}']) && !text.starts_with(['"', '\'']) {
                json_quote(s)
            } else {
                text
            }
        }
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => represent_inline(value),
        scalar => represent(scalar),
    }
}

fn represent_inline(value: &Value) -> String {
    match value {
        Value::Sequence(items) => format!(
            "[{}]",
            items.iter().map(flow_item).collect::<Vec<_>>().join(", ")
        ),
        Value::Mapping(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", flow_item(k), flow_item(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::Tagged(tagged) => represent_inline(&tagged.value),
        scalar => represent(scalar),
    }
}

fn render_block(map: &Mapping, indent: usize, out: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        let key = flow_item(key);
        match value {
            Value::Mapping(children) if !children.is_empty() => {
                out.push(format!("{}{}:", pad, key));
                render_block(children, indent + INDENT, out);
            }
            other => out.push(format!("{}{}: {}", pad, key, represent_inline(other))),
        }
    }
}

/// Flow-safe rendering of a raw block sequence item.
fn fold_item(raw: &str) -> String {
    if raw.starts_with(['"', '\'']) || !raw.contains([',', '[', ']', '{', '}']) {
        raw.to_string()
    } else {
        json_quote(raw)
    }
}

pub fn to_yaml_value(value: &OptionValue) -> Value {
    match value {
        OptionValue::Bool(v) => Value::Bool(*v),
        OptionValue::Int(v) => Value::Number((*v).into()),
        OptionValue::Float(v) => Value::Number((*v).into()),
        OptionValue::Text(v) => Value::String(v.clone()),
        OptionValue::List(items) => {
            Value::Sequence(items.iter().cloned().map(Value::String).collect())
        }
        OptionValue::Group => Value::Mapping(Mapping::new()),
    }
}

/// Inline YAML text for an option value. Lists are always flow sequences.
pub fn render_value(value: &OptionValue) -> String {
    represent_inline(&to_yaml_value(value))
}

impl YamlDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut i = 0;

        while i < self.lines.len() {
            let line = &self.lines[i];
            i += 1;
            if !is_structural(line) {
                continue;
            }
            let indent = indent_of(line);
            let Some((key, colon)) = split_key(&line[indent..]) else {
                continue;
            };

            while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
                stack.pop();
            }
            let mut path: Vec<String> = stack.iter().map(|(_, k)| k.clone()).collect();
            path.push(key.clone());

            let colon_end = indent + colon;
            let rest = &line[colon_end..];
            let value_len = comment_start(rest).unwrap_or(rest.len());
            let value_end = colon_end + rest[..value_len].trim_end().len();
            let block_scalar = rest[..value_len].trim().starts_with(['|', '>']);

            entries.push(Entry {
                line: i - 1,
                indent,
                path,
                colon_end,
                value_end,
            });
            stack.push((indent, key));

            if block_scalar {
                while i < self.lines.len()
                    && (!is_structural(&self.lines[i]) || indent_of(&self.lines[i]) > indent)
                {
                    i += 1;
                }
            }
        }

        entries
    }

    fn inline(&self, entry: &Entry) -> &str {
        self.lines[entry.line][entry.colon_end..entry.value_end].trim()
    }

    /// Last line (inclusive) belonging to `entry`'s nested block.
    fn block_end(&self, entry: &Entry) -> usize {
        let inline_empty = self.inline(entry).is_empty();
        let mut end = entry.line;
        for (i, line) in self.lines.iter().enumerate().skip(entry.line + 1) {
            if !is_structural(line) {
                continue;
            }
            let indent = indent_of(line);
            let nested = indent > entry.indent
                || (inline_empty && indent == entry.indent && is_seq_item(&line[indent..]));
            if !nested {
                break;
            }
            end = i;
        }
        end
    }

    /// Inline text of the value at `path`, without any trailing comment.
    pub fn raw_value(&self, path: &[&str]) -> Option<&str> {
        let entry = self.entries().into_iter().find(|e| e.is_at(path))?;
        let line = &self.lines[entry.line];
        Some(line[entry.colon_end..entry.value_end].trim())
    }

    /// Replace the value at an existing leaf `path`, keeping its trailing comment.
    ///
    /// Returns `false` when the key is absent or holds a nested mapping.
    pub fn set(&mut self, path: &[&str], value: &OptionValue) -> bool {
        let entries = self.entries();
        let Some(entry) = entries.iter().find(|e| e.is_at(path)) else {
            return false;
        };
        if entries.iter().any(|e| e.is_below(entry)) {
            tracing::debug!("Not overwriting mapping at {}", path.join("."));
            return false;
        }

        let end = self.block_end(entry);
        let line = &self.lines[entry.line];
        let updated = format!(
            "{} {}{}",
            &line[..entry.colon_end],
            render_value(value),
            &line[entry.value_end..]
        );
        self.lines[entry.line] = updated;
        if end > entry.line {
            self.lines.drain(entry.line + 1..=end);
        }
        true
    }

    /// Set `path`, inserting it (and any missing parent mappings) when absent.
    pub fn upsert(&mut self, path: &[&str], value: &OptionValue) -> bool {
        if self.set(path, value) {
            return true;
        }
        if self.entries().iter().any(|e| e.is_at(path)) {
            return false;
        }

        let Some((key, parents)) = path.split_last() else {
            return false;
        };
        let Some((at, indent)) = self.ensure_mapping(parents) else {
            tracing::debug!("Cannot nest {} under a scalar", path.join("."));
            return false;
        };
        let key = flow_item(&Value::String(key.to_string()));
        self.lines.insert(
            at,
            format!("{}{}: {}", " ".repeat(indent), key, render_value(value)),
        );
        true
    }

    /// Find or create the mapping at `path`; returns where a new child goes and its indent.
    fn ensure_mapping(&mut self, path: &[&str]) -> Option<(usize, usize)> {
        if path.is_empty() {
            return Some((self.lines.len(), 0));
        }

        let entries = self.entries();
        if let Some(entry) = entries.iter().find(|e| e.is_at(path)) {
            if !self.inline(entry).is_empty() {
                return None;
            }
            let child_indent = entries
                .iter()
                .find(|e| e.path.len() == path.len() + 1 && e.is_below(entry))
                .map_or(entry.indent + INDENT, |e| e.indent);
            return Some((self.block_end(entry) + 1, child_indent));
        }

        let (key, parents) = path.split_last()?;
        let (at, indent) = self.ensure_mapping(parents)?;
        let key = flow_item(&Value::String(key.to_string()));
        self.lines.insert(at, format!("{}{}:", " ".repeat(indent), key));
        Some((at + 1, indent + INDENT))
    }

    /// Fold scalar block sequences into flow form and expand flow mappings into blocks.
    pub fn normalize_style(&mut self) {
        // Later lines first, so earlier entries' line numbers stay valid.
        for entry in self.entries().iter().rev() {
            let inline = self.inline(entry).to_string();
            if inline.starts_with('{') {
                self.expand_flow_mapping(entry, &inline);
            } else if inline.is_empty() {
                self.fold_block_sequence(entry);
            }
        }
    }

    fn expand_flow_mapping(&mut self, entry: &Entry, inline: &str) {
        let map = match serde_yaml_ng::from_str::<Value>(inline) {
            Ok(Value::Mapping(map)) if !map.is_empty() => map,
            Ok(_) => return,
            Err(e) => {
                tracing::debug!("Leaving flow mapping at {} as is: {}", entry.path.join("."), e);
                return;
            }
        };

        let mut block = Vec::new();
        render_block(&map, entry.indent + INDENT, &mut block);

        let line = &self.lines[entry.line];
        let head = format!("{}{}", &line[..entry.colon_end], &line[entry.value_end..]);
        self.lines[entry.line] = head;
        self.lines.splice(entry.line + 1..entry.line + 1, block);
    }

    fn fold_block_sequence(&mut self, entry: &Entry) {
        let end = self.block_end(entry);
        if end == entry.line {
            return;
        }

        let mut items = Vec::new();
        let mut item_indent = None;
        for line in &self.lines[entry.line + 1..=end] {
            if !is_structural(line) {
                continue;
            }
            let indent = indent_of(line);
            let content = &line[indent..];
            if !is_seq_item(content) || *item_indent.get_or_insert(indent) != indent {
                return;
            }
            let item = content[1..].trim_start();
            let item = item[..comment_start(item).unwrap_or(item.len())].trim_end();
            if item.is_empty()
                || item.starts_with(['-', '{', '[', '|', '>', '&', '*', '!'])
                || split_key(item).is_some()
            {
                return;
            }
            items.push(fold_item(item));
        }

        let line = &self.lines[entry.line];
        let folded = format!(
            "{} [{}]{}",
            &line[..entry.colon_end],
            items.join(", "),
            &line[entry.value_end..]
        );
        self.lines[entry.line] = folded;
        self.lines.drain(entry.line + 1..=end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# vrperfkit settings
upscaling:
  # fsr, nis or cas
  method: fsr
  renderScale: 100   # percent
  enabled: true

debugMode: false
";

    #[test]
    fn test_set_keeps_comments_and_order() {
        let mut doc = YamlDocument::parse(SAMPLE);
        assert!(doc.set(&["upscaling", "renderScale"], &OptionValue::Float(2.5)));

        let text = doc.render();
        assert!(text.starts_with("# vrperfkit settings\nupscaling:\n  # fsr, nis or cas\n"));
        assert!(text.contains("  renderScale: 2.5   # percent\n"));
        assert!(text.contains("\n\ndebugMode: false\n"));
        assert_eq!(doc.raw_value(&["upscaling", "renderScale"]), Some("2.5"));
    }

    #[test]
    fn test_set_refuses_mapping() {
        let mut doc = YamlDocument::parse(SAMPLE);
        assert!(!doc.set(&["upscaling"], &OptionValue::Bool(true)));
        assert!(!doc.set(&["missing"], &OptionValue::Bool(true)));
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_upsert_inserts_missing_keys() {
        let mut doc = YamlDocument::parse("upscaling:\n  enabled: true\n");
        assert!(doc.upsert(&["upscaling", "radius"], &OptionValue::Float(0.95)));
        assert!(doc.upsert(&["hotkeys", "enabled"], &OptionValue::Bool(false)));
        assert!(doc.upsert(&["debugMode"], &OptionValue::Bool(true)));

        assert_eq!(
            doc.render(),
            concat!(
                "upscaling:\n  enabled: true\n  radius: 0.95\n",
                "hotkeys:\n  enabled: false\ndebugMode: true\n",
            )
        );
    }

    #[test]
    fn test_upsert_into_empty_document() {
        let mut doc = YamlDocument::default();
        assert!(doc.upsert(&["upscaling", "method"], &OptionValue::Text("nis".into())));
        assert_eq!(doc.render(), "upscaling:\n  method: nis\n");
    }

    #[test]
    fn test_fold_block_sequence() {
        let mut doc = YamlDocument::parse(
            concat!(
                "hotkeys:\n  toggleDebugMode:  # combo\n    - ctrl\n    - f1\n",
                "  captureOutput: [ctrl, f8]\n",
            ),
        );
        doc.normalize_style();

        assert_eq!(
            doc.render(),
            "hotkeys:\n  toggleDebugMode: [ctrl, f1]  # combo\n  captureOutput: [ctrl, f8]\n"
        );
    }

    #[test]
    fn test_expand_flow_mapping() {
        let mut doc =
            YamlDocument::parse("upscaling: {enabled: true, renderScale: 70}\nother: 1\n");
        doc.normalize_style();

        assert_eq!(
            doc.render(),
            "upscaling:\n  enabled: true\n  renderScale: 70\nother: 1\n"
        );
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&OptionValue::Float(70.0)), "70.0");
        assert_eq!(render_value(&OptionValue::Int(112)), "112");
        assert_eq!(render_value(&OptionValue::Bool(false)), "false");
        assert_eq!(
            render_value(&OptionValue::List(vec!["ctrl".into(), "f1".into()])),
            "[ctrl, f1]"
        );

        let quoted = render_value(&OptionValue::Text("true".into()));
        let parsed: Value = serde_yaml_ng::from_str(&quoted).unwrap();
        assert_eq!(parsed, Value::String("true".into()));

        let list = render_value(&OptionValue::List(vec!["a,b".into(), "c".into()]));
        let parsed: Value = serde_yaml_ng::from_str(&list).unwrap();
        assert_eq!(
            parsed,
            Value::Sequence(vec![Value::String("a,b".into()), Value::String("c".into())])
        );
    }

    #[test]
    fn test_split_key_and_comments() {
        assert_eq!(split_key("renderScale: 70"), Some(("renderScale".to_string(), 12)));
        assert_eq!(split_key("\"quoted key\": 1"), Some(("quoted key".to_string(), 13)));
        assert_eq!(split_key("- item"), None);
        assert_eq!(split_key("url: http://x"), Some(("url".to_string(), 4)));
        assert_eq!(comment_start("value # note"), Some(6));
        assert_eq!(comment_start("\"a # b\""), None);
        assert_eq!(comment_start("a#b"), None);
    }
}
