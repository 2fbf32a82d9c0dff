//! Ordered field maps for scan and recon records.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One scan or reconstruction-job record extracted from a protocol file.
///
/// Field order is imposed by the parameter lookup table at extraction time
/// and drives the row order of the rendered sheet, so fields are kept as an
/// ordered list of pairs rather than a sorted map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    fields: Vec<(String, String)>,
}

impl Entry {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field, keeping insertion order.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, _)| key == name)
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when any field value contains `keyword` as a substring.
    ///
    /// Kind keywords (localizer and monitoring range names) may appear in
    /// any extracted field, so detection scans all values.
    pub fn any_value_contains(&self, keyword: &str) -> bool {
        self.fields.iter().any(|(_, value)| value.contains(keyword))
    }
}

impl FromIterator<(String, String)> for Entry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = Entry;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of field names to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Entry, A::Error> {
        let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            fields.push((key, value));
        }
        Ok(Entry { fields })
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        let mut entry = Entry::new();
        entry.push("Range", "\"Topogram\"");
        entry.push("kVp", "120");
        entry.push("mA", "35");
        entry
    }

    #[test]
    fn preserves_insertion_order() {
        let entry = sample();
        let names: Vec<&str> = entry.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Range", "kVp", "mA"]);
    }

    #[test]
    fn get_and_contains() {
        let entry = sample();
        assert_eq!(entry.get("kVp"), Some("120"));
        assert_eq!(entry.get("Pitch"), None);
        assert!(entry.contains_key("mA"));
        assert!(!entry.contains_key("ReconJob"));
    }

    #[test]
    fn value_keyword_search() {
        let entry = sample();
        assert!(entry.any_value_contains("Topogram"));
        assert!(!entry.any_value_contains("Monitoring"));
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let entry = sample();
        let json = serde_json::to_string(&entry).expect("serialize entry");
        assert_eq!(json, r#"{"Range":"\"Topogram\"","kVp":"120","mA":"35"}"#);
        let round: Entry = serde_json::from_str(&json).expect("deserialize entry");
        assert_eq!(round, entry);
    }
}
