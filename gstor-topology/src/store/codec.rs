//! Binary encoding of stored entities (bincode).

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::Result;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(buf)?)
}
