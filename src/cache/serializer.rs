//! Serializer Module
//!
//! Bytes-in/bytes-out contract used by the disk tier.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

// == Serializer ==
/// Encodes values for the disk tier and decodes them back.
pub trait Serializer<V>: Send + Sync {
    fn serialize(&self, value: &V) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<V>;
}

// == JSON Serializer ==
/// [`Serializer`] backed by serde_json.
#[derive(Debug)]
pub struct JsonSerializer<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> JsonSerializer<V> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for JsonSerializer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Serializer<V> for JsonSerializer<V>
where
    V: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &V) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
