//! A ready-made CBOR witness built on `serde` and `ciborium`.

use crate::error::{CodecError, CodecResult};
use crate::witness::Witness;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Witness for any `serde`-capable key and value types.
///
/// The stored descriptor is `(key_type, value_type, revision)`. Bump
/// `revision` whenever the serialized shape of `K` or `V` changes; the next
/// startup then re-stamps every live record under the new witness.
///
/// Records are CBOR arrays `[key, value]` where a tombstone stores `null`.
pub struct CborWitness<K, V> {
    key_type: String,
    value_type: String,
    revision: u32,
    _types: PhantomData<fn() -> (K, V)>,
}

#[derive(Serialize, Deserialize)]
struct Descriptor {
    key_type: String,
    value_type: String,
    revision: u32,
}

impl<K, V> CborWitness<K, V> {
    /// Creates a witness with explicit type labels.
    #[must_use]
    pub fn new(key_type: impl Into<String>, value_type: impl Into<String>, revision: u32) -> Self {
        Self {
            key_type: key_type.into(),
            value_type: value_type.into(),
            revision,
            _types: PhantomData,
        }
    }

    /// Creates a witness labelled with the Rust type names of `K` and `V`.
    ///
    /// Type names are not guaranteed stable across compiler versions, so a
    /// toolchain upgrade may trigger one extra compaction.
    #[must_use]
    pub fn named(revision: u32) -> Self {
        Self::new(
            std::any::type_name::<K>(),
            std::any::type_name::<V>(),
            revision,
        )
    }

    /// Returns the key type label.
    #[must_use]
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// Returns the value type label.
    #[must_use]
    pub fn value_type(&self) -> &str {
        &self.value_type
    }

    /// Returns the revision number.
    #[must_use]
    pub fn revision(&self) -> u32 {
        self.revision
    }
}

impl<K, V> Clone for CborWitness<K, V> {
    fn clone(&self) -> Self {
        Self::new(self.key_type.clone(), self.value_type.clone(), self.revision)
    }
}

impl<K, V> PartialEq for CborWitness<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key_type == other.key_type
            && self.value_type == other.value_type
            && self.revision == other.revision
    }
}

impl<K, V> Eq for CborWitness<K, V> {}

impl<K, V> fmt::Debug for CborWitness<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CborWitness")
            .field("key_type", &self.key_type)
            .field("value_type", &self.value_type)
            .field("revision", &self.revision)
            .finish()
    }
}

fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(out)
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let mut reader = bytes;
    let value = ciborium::de::from_reader(&mut reader)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            count: reader.len(),
        });
    }
    Ok(value)
}

impl<K, V> Witness for CborWitness<K, V>
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    type Key = K;
    type Value = V;

    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(&Descriptor {
            key_type: self.key_type.clone(),
            value_type: self.value_type.clone(),
            revision: self.revision,
        })
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let descriptor: Descriptor = from_cbor(bytes)?;
        Ok(Self::new(
            descriptor.key_type,
            descriptor.value_type,
            descriptor.revision,
        ))
    }

    fn encode_record(&self, key: &K, value: Option<&V>) -> CodecResult<Vec<u8>> {
        to_cbor(&(key, value))
    }

    fn decode_record(&self, bytes: &[u8]) -> CodecResult<(K, Option<V>)> {
        from_cbor(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness::witness_matches;

    type StringWitness = CborWitness<String, u64>;

    #[test]
    fn witness_survives_encoding() {
        let witness = StringWitness::new("file", "hash", 3);
        let decoded = StringWitness::decode(&witness.encode().unwrap()).unwrap();
        assert_eq!(decoded, witness);
        assert_eq!(decoded.key_type(), "file");
        assert_eq!(decoded.value_type(), "hash");
        assert_eq!(decoded.revision(), 3);
    }

    #[test]
    fn witnesses_compare_structurally() {
        let current = StringWitness::new("file", "hash", 3);
        assert!(witness_matches(&StringWitness::new("file", "hash", 3), &current));
        assert!(!witness_matches(&StringWitness::new("file", "hash", 4), &current));
        assert!(!witness_matches(&StringWitness::new("path", "hash", 3), &current));
    }

    #[test]
    fn named_uses_type_names() {
        let witness = StringWitness::named(1);
        assert_eq!(witness.key_type(), std::any::type_name::<String>());
        assert_eq!(witness.value_type(), "u64");
    }

    #[test]
    fn record_and_tombstone_decode() {
        let witness = StringWitness::named(1);

        let put = witness.encode_record(&"a".to_string(), Some(&7)).unwrap();
        assert_eq!(
            witness.decode_record(&put).unwrap(),
            ("a".to_string(), Some(7))
        );

        let tombstone = witness.encode_record(&"a".to_string(), None).unwrap();
        assert_eq!(witness.decode_record(&tombstone).unwrap(), ("a".to_string(), None));
    }

    #[test]
    fn garbage_record_is_a_decode_error() {
        let witness = StringWitness::named(1);
        let err = witness.decode_record(&[0xFF, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, CodecError::DecodingFailed { .. }));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let witness = StringWitness::named(1);
        let mut bytes = witness.encode_record(&"a".to_string(), Some(&1)).unwrap();
        bytes.push(0x00);
        assert_eq!(
            witness.decode_record(&bytes).unwrap_err(),
            CodecError::TrailingBytes { count: 1 }
        );
    }

    #[test]
    fn wrong_value_type_is_a_decode_error() {
        let text = CborWitness::<String, String>::named(1);
        let bytes = text
            .encode_record(&"a".to_string(), Some(&"not a number".to_string()))
            .unwrap();

        let numeric = StringWitness::named(1);
        assert!(numeric.decode_record(&bytes).is_err());
    }
}
