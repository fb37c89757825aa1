//! Deterministic key/value maps for control and object data.
//!
//! Both maps carried by a message use the same representation: string keys of
//! at most `u16::MAX` bytes mapped to byte-string values of at most
//! `u32::MAX` bytes. Order is irrelevant semantically but the serialized form
//! is always sorted by key in ascending lexicographic order. The signature
//! covers the serialized bytes, so a map that serialized in insertion order
//! would break verification against a server that sorts; determinism here is
//! load-bearing, not cosmetic.
//!
//! Values distinguish three states: unset, present but empty, and present
//! with bytes. An unset value is omitted from serialization entirely, while
//! an empty value still emits a zero-length value block. Decoding therefore
//! reports empty for both; [`ObjectMap::insert`] normalises unset values away
//! so that a decoded map compares equal to the map that produced it.

use std::collections::BTreeMap;

use crate::byte_order::{write_network_i32, write_network_u16, write_network_u32};

/// Four-byte wire encoding of boolean true.
pub const TRUE: [u8; 4] = [0, 0, 0, 1];

/// Four-byte wire encoding of boolean false.
pub const FALSE: [u8; 4] = [0, 0, 0, 0];

/// One map value, distinguishing unset from present-but-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapValue {
    /// No value; the entry is omitted from serialization.
    Unset,
    /// A present, zero-length value.
    Empty,
    /// A present value with at least one byte.
    Bytes(Vec<u8>),
}

impl MapValue {
    /// Wrap a signed 32-bit integer in its four-byte big-endian wire form.
    #[must_use]
    pub fn from_i32(value: i32) -> Self { Self::Bytes(write_network_i32(value).to_vec()) }

    /// Wrap a boolean in the protocol's four-byte 1/0 encoding.
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Self::Bytes(if value { TRUE } else { FALSE }.to_vec())
    }

    /// Wrap a byte slice, treating an empty slice as [`MapValue::Unset`].
    ///
    /// Object mappers use this for optional fields that the server expects
    /// to be absent rather than empty.
    #[must_use]
    pub fn bytes_or_unset(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            Self::Unset
        } else {
            Self::Bytes(bytes.to_vec())
        }
    }

    /// Wrap a string, treating an empty string as [`MapValue::Unset`].
    #[must_use]
    pub fn text_or_unset(text: &str) -> Self { Self::bytes_or_unset(text.as_bytes()) }

    /// View the value bytes, if present.
    ///
    /// Returns an empty slice for [`MapValue::Empty`] and `None` for
    /// [`MapValue::Unset`].
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Unset => None,
            Self::Empty => Some(&[]),
            Self::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<&str> for MapValue {
    fn from(value: &str) -> Self { Self::from(value.as_bytes().to_vec()) }
}

impl From<&[u8]> for MapValue {
    fn from(value: &[u8]) -> Self { Self::from(value.to_vec()) }
}

impl From<Vec<u8>> for MapValue {
    fn from(value: Vec<u8>) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Bytes(value)
        }
    }
}

/// Unordered key/value mapping with a deterministic serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectMap {
    entries: BTreeMap<String, MapValue>,
}

impl ObjectMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Insert a value under `key`, replacing any previous entry.
    ///
    /// Inserting [`MapValue::Unset`] removes the entry instead: a stored map
    /// never contains unset values, so structural equality matches
    /// serialization equality.
    ///
    /// # Panics
    ///
    /// Panics if the key is longer than `u16::MAX` bytes; the wire format
    /// cannot represent such a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MapValue>) {
        let key = key.into();
        assert!(
            key.len() <= usize::from(u16::MAX),
            "map key exceeds the 16-bit wire length"
        );
        match value.into() {
            MapValue::Unset => {
                self.entries.remove(&key);
            }
            value => {
                self.entries.insert(key, value);
            }
        }
    }

    /// Remove the entry under `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<MapValue> { self.entries.remove(key) }

    /// Look up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MapValue> { self.entries.get(key) }

    /// View the value bytes stored under `key`, if present.
    #[must_use]
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        self.get(key).and_then(MapValue::as_bytes)
    }

    /// Read the value under `key` as lossy UTF-8 text.
    ///
    /// A missing or unset entry reads as the empty string.
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.bytes(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    /// Read the value under `key` as a big-endian signed 32-bit integer.
    ///
    /// A missing entry or a value shorter than four bytes reads as zero,
    /// matching the tolerant decoding the object mappers rely on.
    #[must_use]
    pub fn i32_or_zero(&self, key: &str) -> i32 {
        match self.bytes(key) {
            Some([a, b, c, d, ..]) => crate::byte_order::read_network_i32([*a, *b, *c, *d]),
            _ => 0,
        }
    }

    /// Return true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Return the number of entries.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Iterate over the entries in serialization (ascending key) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Append the deterministic wire form of this map to `out`.
    ///
    /// Entries are emitted as `{u16 key_len, key, u32 val_len, val}` in
    /// ascending key order, terminated by a zero-length key marker.
    ///
    /// # Panics
    ///
    /// Panics if a value is longer than `u32::MAX` bytes; the wire format
    /// cannot represent such a value.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for (key, value) in &self.entries {
            let Some(bytes) = value.as_bytes() else {
                // Unset values are normalised away on insert; nothing to emit.
                continue;
            };
            let key_len = u16::try_from(key.len()).expect("key length checked on insert");
            let value_len =
                u32::try_from(bytes.len()).expect("map value exceeds the 32-bit wire length");
            out.extend_from_slice(&write_network_u16(key_len));
            out.extend_from_slice(key.as_bytes());
            out.extend_from_slice(&write_network_u32(value_len));
            out.extend_from_slice(bytes);
        }
        out.extend_from_slice(&write_network_u16(0));
    }
}

impl FromIterator<(String, MapValue)> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = (String, MapValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    //! Determinism and three-way value semantics tests.

    use super::{FALSE, MapValue, ObjectMap, TRUE};

    fn encoded(map: &ObjectMap) -> Vec<u8> {
        let mut out = Vec::new();
        map.encode_into(&mut out);
        out
    }

    #[test]
    fn empty_map_encodes_as_terminator_only() {
        assert_eq!(encoded(&ObjectMap::new()), vec![0, 0]);
    }

    #[test]
    fn entries_serialize_in_ascending_key_order() {
        let mut forward = ObjectMap::new();
        forward.insert("alpha", "1");
        forward.insert("beta", "2");
        forward.insert("gamma", "3");

        let mut backward = ObjectMap::new();
        backward.insert("gamma", "3");
        backward.insert("beta", "2");
        backward.insert("alpha", "1");

        assert_eq!(encoded(&forward), encoded(&backward));
        assert_eq!(forward, backward);
    }

    #[test]
    fn single_entry_wire_layout() {
        let mut map = ObjectMap::new();
        map.insert("ip", vec![10, 0, 0, 2]);
        assert_eq!(
            encoded(&map),
            vec![
                0, 2, // key length
                b'i', b'p', // key
                0, 0, 0, 4, // value length
                10, 0, 0, 2, // value
                0, 0, // terminator
            ]
        );
    }

    #[test]
    fn empty_value_emits_zero_length_block() {
        let mut map = ObjectMap::new();
        map.insert("name", MapValue::Empty);
        assert_eq!(
            encoded(&map),
            vec![0, 4, b'n', b'a', b'm', b'e', 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn unset_value_is_omitted_entirely() {
        let mut map = ObjectMap::new();
        map.insert("name", "h1");
        map.insert("name", MapValue::Unset);
        assert!(map.is_empty());
        assert_eq!(encoded(&map), vec![0, 0]);
    }

    #[test]
    fn bool_and_i32_wire_forms() {
        assert_eq!(MapValue::from_bool(true), MapValue::Bytes(TRUE.to_vec()));
        assert_eq!(MapValue::from_bool(false), MapValue::Bytes(FALSE.to_vec()));
        assert_eq!(
            MapValue::from_i32(7),
            MapValue::Bytes(vec![0, 0, 0, 7])
        );
    }

    #[test]
    fn i32_or_zero_tolerates_missing_and_short_values() {
        let mut map = ObjectMap::new();
        map.insert("short", vec![1, 2]);
        map.insert("result", MapValue::from_i32(18));
        assert_eq!(map.i32_or_zero("missing"), 0);
        assert_eq!(map.i32_or_zero("short"), 0);
        assert_eq!(map.i32_or_zero("result"), 18);
    }

    #[test]
    fn text_reads_lossy_utf8() {
        let mut map = ObjectMap::new();
        map.insert("name", "h1");
        assert_eq!(map.text("name"), "h1");
        assert_eq!(map.text("missing"), "");
    }

    #[test]
    fn empty_inputs_normalise_to_empty_value() {
        let mut map = ObjectMap::new();
        map.insert("hostname", "");
        assert_eq!(map.get("hostname"), Some(&MapValue::Empty));
        assert_eq!(map.bytes("hostname"), Some(&[][..]));
    }

    #[test]
    fn or_unset_helpers_treat_empty_as_absent() {
        assert_eq!(MapValue::text_or_unset(""), MapValue::Unset);
        assert_eq!(MapValue::bytes_or_unset(&[]), MapValue::Unset);
        assert_eq!(
            MapValue::text_or_unset("h1"),
            MapValue::Bytes(b"h1".to_vec())
        );
    }
}
