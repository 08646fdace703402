//! Corpus loading from raw JSON records.
//!
//! Accepts either a JSON array of objects or JSON lines (one object per line).
//! Column names from the common recipe dumps are accepted as aliases, and
//! missing values are filled so every record becomes a complete [`Document`].

use anyhow::{Context, Result};
use pantry_core::document::UNKNOWN_TOTAL_TIME;
use pantry_core::Document;
use serde_json::{Map, Value};
use std::path::Path;

pub const UNNAMED_TITLE: &str = "Unnamed Recipe";

type RawRecord = Map<String, Value>;

// Keys per field, highest priority first. A record may carry several.
const ID_KEYS: &[&str] = &["id"];
const TITLE_KEYS: &[&str] = &["title", "recipe", "Name", "name", "recipe_name"];
/// Already-indexable text, used as written.
const TEXT_KEYS: &[&str] = &["body", "text"];
/// Raw ingredient columns; the indexed text becomes `"{title} {ingredients}"`.
const INGREDIENT_KEYS: &[&str] = &["Ingredients", "ingredients"];
const TOTAL_TIME_KEYS: &[&str] = &["total_time", "Total Time"];
const URL_KEYS: &[&str] = &["url", "URL"];

pub fn load_corpus<P: AsRef<Path>>(path: P, id_prefix: &str) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    let docs = parse_corpus(&content, id_prefix)
        .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;
    tracing::info!("Loaded {} documents from {}", docs.len(), path.display());
    Ok(docs)
}

pub fn parse_corpus(content: &str, id_prefix: &str) -> Result<Vec<Document>> {
    let records: Vec<RawRecord> = if content.trim_start().starts_with('[') {
        serde_json::from_str(content).context("Invalid JSON array")?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<RawRecord>(line)
                    .with_context(|| format!("Invalid JSON on line {}", n + 1))
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(records
        .iter()
        .enumerate()
        .map(|(index, raw)| into_document(raw, index, id_prefix))
        .collect())
}

/// First key in `keys` whose value is present and not null.
fn field<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

/// First key in `keys` holding a non-blank scalar, as text.
fn field_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(scalar_text)
}

fn into_document(raw: &RawRecord, index: usize, id_prefix: &str) -> Document {
    let id = field_text(raw, ID_KEYS).unwrap_or_else(|| format!("{id_prefix}{index}"));
    let title = field_text(raw, TITLE_KEYS).unwrap_or_else(|| UNNAMED_TITLE.to_string());
    let body = match field(raw, TEXT_KEYS) {
        Some(text) => flatten_body(text),
        None => {
            let ingredients = field(raw, INGREDIENT_KEYS)
                .map(flatten_body)
                .unwrap_or_default();
            [title.as_str(), ingredients.trim()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        }
    };
    let total_time =
        field_text(raw, TOTAL_TIME_KEYS).unwrap_or_else(|| UNKNOWN_TOTAL_TIME.to_string());
    let url = field_text(raw, URL_KEYS).unwrap_or_default();

    Document::new(id, title, body)
        .with_total_time(total_time)
        .with_url(url)
}

/// Strings, numbers and bools as text; blank strings and everything else as `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ingredient lists arrive either as free text or as `[{"name": ...}, ...]`,
/// sometimes with the list itself encoded as a string.
fn flatten_body(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.trim_start().starts_with("[{") {
                if let Ok(list @ Value::Array(_)) = serde_json::from_str::<Value>(s) {
                    return flatten_body(&list);
                }
            }
            s.clone()
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => obj.get("name").and_then(scalar_text),
                other => scalar_text(other),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => scalar_text(other).unwrap_or_default(),
    }
}
