//! Submitted form payloads.
//!
//! A [`FormData`] is an ordered multimap of field names to [`FormValue`]s,
//! mirroring what a browser sends for an HTML form. Keys may be dot-paths
//! (`user.email`) addressing nested object fields; [`FormData::to_value`]
//! expands them into a nested JSON document for schema validation.
//!
//! # Example
//!
//! ```
//! use form_action_core::payload::FormData;
//! use serde_json::json;
//!
//! let form = FormData::from_urlencoded(b"user.email=a%40b.cz&tags=x&tags=y");
//!
//! assert_eq!(form.get_text("user.email"), Some("a@b.cz"));
//! assert_eq!(
//!     form.to_value(),
//!     json!({ "user": { "email": "a@b.cz" }, "tags": ["x", "y"] })
//! );
//! ```

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Separator between the segments of a nested field name.
pub const PATH_SEPARATOR: char = '.';

/// An uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    /// Client-side file name
    pub name: String,
    /// Declared MIME type, if the client sent one
    pub content_type: Option<String>,
    /// Raw file contents
    pub content: Bytes,
}

impl FormFile {
    /// Create a file part.
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: Option<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type,
            content,
        }
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// JSON metadata for the file, used in place of its contents when the
    /// payload is expanded for validation. `size` is a JSON number, which
    /// no text field expands to.
    #[must_use]
    pub fn metadata(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "type": self.content_type,
            "size": self.size(),
        })
    }
}

/// One submitted value: either text or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A text field
    Text(String),
    /// A file field
    File(FormFile),
}

impl FormValue {
    /// The text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    /// The file, if this is a file value.
    #[must_use]
    pub const fn as_file(&self) -> Option<&FormFile> {
        match self {
            Self::Text(_) => None,
            Self::File(file) => Some(file),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::File(file) => file.metadata(),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<FormFile> for FormValue {
    fn from(value: FormFile) -> Self {
        Self::File(value)
    }
}

/// Ordered mapping of field names to submitted values.
///
/// Keys may repeat (checkbox groups, multi-selects); insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    /// Create an empty payload.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn from_urlencoded(body: &[u8]) -> Self {
        form_urlencoded::parse(body)
            .into_owned()
            .map(|(key, value)| (key, FormValue::Text(value)))
            .collect()
    }

    /// Append a value, keeping any existing values under the same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<FormValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Set a value, replacing every existing value under the same key.
    ///
    /// The new value takes the position of the first replaced entry, or is
    /// appended if the key was absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FormValue>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`FormData::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove every value under `key`.
    pub fn delete(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// First value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// First value under `key`, if it is text.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FormValue::as_text)
    }

    /// First value under `key`, if it is a file.
    #[must_use]
    pub fn get_file(&self, key: &str) -> Option<&FormFile> {
        self.get(key).and_then(FormValue::as_file)
    }

    /// All values under `key`, in submission order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether at least one value is present under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate over all entries in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries (repeated keys count separately).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the payload has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand the payload into a nested JSON object.
    ///
    /// Dot-path keys become nested objects, repeated keys become arrays and
    /// files become their [`FormFile::metadata`]. When a key is used both as
    /// a leaf and as a parent (`user=x` and `user.email=y`), the later entry
    /// wins.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        let mut seen = HashSet::new();

        for (key, value) in &self.entries {
            let repeated = !seen.insert(key.as_str());
            let mut segments = key.split(PATH_SEPARATOR).peekable();
            let mut node = &mut root;

            while let Some(segment) = segments.next() {
                if segments.peek().is_none() {
                    insert_leaf(node, segment, value.to_json(), repeated);
                    break;
                }

                let child = node
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !child.is_object() {
                    *child = Value::Object(Map::new());
                }
                let Value::Object(map) = child else { break };
                node = map;
            }
        }

        Value::Object(root)
    }
}

fn insert_leaf(node: &mut Map<String, Value>, key: &str, value: Value, repeated: bool) {
    match node.get_mut(key) {
        Some(Value::Array(values)) if repeated => values.push(value),
        Some(existing) if repeated => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
        _ => {
            node.insert(key.to_string(), value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<FormValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = &'a (String, FormValue);
    type IntoIter = std::slice::Iter<'a, (String, FormValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Serializes as a flat object: repeated keys collapse into arrays, files
/// into their metadata.
impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut flat: Vec<(&str, Value)> = Vec::new();
        for (key, value) in &self.entries {
            match flat.iter_mut().find(|(k, _)| k == key) {
                Some((_, Value::Array(values))) => values.push(value.to_json()),
                Some((_, existing)) => {
                    let previous = existing.take();
                    *existing = Value::Array(vec![previous, value.to_json()]);
                }
                None => flat.push((key, value.to_json())),
            }
        }

        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (key, value) in &flat {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urlencoded_keeps_order_and_repeats() {
        let form = FormData::from_urlencoded(b"a=1&b=2&a=3");

        let keys: Vec<_> = form.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "a"]);
        let a: Vec<_> = form.get_all("a").filter_map(FormValue::as_text).collect();
        assert_eq!(a, ["1", "3"]);
    }

    #[test]
    fn test_set_replaces_all_values_in_place() {
        let mut form = FormData::from_urlencoded(b"a=1&b=2&a=3");
        form.set("a", "9");

        let entries: Vec<_> = form
            .iter()
            .map(|(k, v)| (k, v.as_text().unwrap_or_default()))
            .collect();
        assert_eq!(entries, [("a", "9"), ("b", "2")]);
    }

    #[test]
    fn test_delete() {
        let mut form = FormData::new().with("a", "1").with("b", "2");
        form.delete("a");
        assert!(!form.contains_key("a"));
        assert_eq!(form.len(), 1);
    }

    #[test]
    fn test_nested_expansion() {
        let form = FormData::new()
            .with("user.email", "a@b.cz")
            .with("user.name", "Ann")
            .with("password", "secret");

        assert_eq!(
            form.to_value(),
            json!({
                "user": { "email": "a@b.cz", "name": "Ann" },
                "password": "secret"
            })
        );
    }

    #[test]
    fn test_later_parent_replaces_leaf() {
        let form = FormData::from_urlencoded(b"user=x&user.email=y");
        assert_eq!(form.to_value(), json!({ "user": { "email": "y" } }));
    }

    #[test]
    fn test_file_expands_to_metadata() {
        let mut form = FormData::new();
        form.append(
            "avatar",
            FormFile::new("me.png", Some("image/png".into()), Bytes::from_static(b"png")),
        );

        assert_eq!(
            form.to_value(),
            json!({ "avatar": { "name": "me.png", "type": "image/png", "size": 3 } })
        );
        assert_eq!(form.get_file("avatar").map(FormFile::size), Some(3));
        assert_eq!(form.get_text("avatar"), None);
    }

    #[test]
    fn test_serialize_flat() {
        let form = FormData::from_urlencoded(b"a=1&user.email=x&a=2");
        let value = serde_json::to_value(&form).unwrap_or_default();
        assert_eq!(value, json!({ "a": ["1", "2"], "user.email": "x" }));
    }
}
