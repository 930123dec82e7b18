//! The in-memory dictionary: key→value mapping plus version/name.
//!
//! A plain mutable value with no change tracking. Keys are unique,
//! non-empty strings; iteration follows insertion order, though the
//! wire format does not promise any particular entry order.

use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    archive::{ArchiveReader, ArchiveWriter},
    error::{DictError, DictResult},
};

use super::{decode, encode, value::DictValue};

/// A serializable dictionary of typed values.
///
/// `version` is producer-supplied and opaque to the protocol (a
/// date-style integer such as `20260829` works well); `name` is an
/// optional human label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dictionary {
    version: i32,
    name: String,
    items: IndexMap<String, DictValue>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: i32) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn with_version_and_name(version: i32, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            items: IndexMap::new(),
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// An empty key is a usage error, reported before anything
    /// touches a stream.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<DictValue>) -> DictResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(DictError::EmptyKey);
        }
        self.items.insert(key, value.into());
        Ok(())
    }

    /// Stores a plane equation, which must have exactly four
    /// coefficients. Any other length is a usage error.
    pub fn set_plane_equation(&mut self, key: impl Into<String>, coeffs: &[f64]) -> DictResult<()> {
        let eq: [f64; 4] = coeffs
            .try_into()
            .map_err(|_| DictError::PlaneEquationLength(coeffs.len()))?;
        self.set(key, DictValue::PlaneEquation(eq))
    }

    pub fn get(&self, key: &str) -> Option<&DictValue> {
        self.items.get(key)
    }

    /// Removes an entry, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<DictValue> {
        self.items.shift_remove(key)
    }

    /// Drops every entry; `version` and `name` stay as they are.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DictValue)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ---- typed accessors ---------------------------------------------------

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(DictValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(DictValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(DictValue::Int64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(DictValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(DictValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_guid(&self, key: &str) -> Option<Uuid> {
        match self.get(key) {
            Some(DictValue::Guid(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_dictionary(&self, key: &str) -> Option<&Dictionary> {
        match self.get(key) {
            Some(DictValue::Dictionary(v)) => Some(v),
            _ => None,
        }
    }

    // ---- serialization -----------------------------------------------------

    /// Writes this dictionary into an open archive session.
    ///
    /// See [`encode::write_dictionary`].
    pub fn write<W: Write>(&self, archive: &mut ArchiveWriter<W>) -> DictResult<()> {
        encode::write_dictionary(archive, self)
    }

    /// Reads a dictionary from an open archive session.
    ///
    /// `Ok(None)` means the stream holds a dictionary written by
    /// some other producer; see [`decode::read_dictionary`].
    pub fn read<R: Read>(archive: &mut ArchiveReader<R>) -> DictResult<Option<Dictionary>> {
        decode::read_dictionary(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut d = Dictionary::new();
        d.set("answer", 42i32).unwrap();
        d.set("label", "hello").unwrap();

        assert_eq!(d.len(), 2);
        assert_eq!(d.get_i32("answer"), Some(42));
        assert_eq!(d.get_str("label"), Some("hello"));
        assert_eq!(d.get_i32("label"), None); // не тот тип
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut d = Dictionary::new();
        d.set("k", 1i32).unwrap();
        d.set("k", 2i32).unwrap();

        assert_eq!(d.len(), 1);
        assert_eq!(d.get_i32("k"), Some(2));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut d = Dictionary::new();
        assert!(matches!(d.set("", 1i32), Err(DictError::EmptyKey)));
        assert!(d.is_empty());
    }

    #[test]
    fn test_plane_equation_length_checked() {
        let mut d = Dictionary::new();
        assert!(matches!(
            d.set_plane_equation("p", &[1.0, 2.0, 3.0]),
            Err(DictError::PlaneEquationLength(3))
        ));
        assert!(d.is_empty());

        d.set_plane_equation("p", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        match d.get("p") {
            Some(DictValue::PlaneEquation(c)) => assert_eq!(c, &[1.0, 2.0, 3.0, 4.0]),
            other => panic!("Expected PlaneEquation, got {other:?}"),
        }
    }

    #[test]
    fn test_clear_keeps_version_and_name() {
        let mut d = Dictionary::with_version_and_name(20260829, "settings");
        d.set("k", 1i32).unwrap();
        d.clear();

        assert!(d.is_empty());
        assert_eq!(d.version(), 20260829);
        assert_eq!(d.name(), "settings");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut d = Dictionary::new();
        d.set("b", 1i32).unwrap();
        d.set("a", 2i32).unwrap();
        d.set("c", 3i32).unwrap();

        let keys: Vec<_> = d.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove() {
        let mut d = Dictionary::new();
        d.set("k", 1i32).unwrap();

        assert_eq!(d.remove("k"), Some(DictValue::Int32(1)));
        assert_eq!(d.remove("k"), None);
    }
}
