//! Pluggable value encoding at the get/put boundary
//!
//! The engines store and return raw bytes; a [`ValueCodec`] turns typed
//! values into bytes on the way in and back on the way out. Encoding and
//! decoding failures are fatal per the error taxonomy. [`JsonCodec`] is the
//! stock implementation for any serde-serializable type.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode/decode values of type `T` to and from cache payload bytes.
pub trait ValueCodec<T> {
    /// Encode a value into the bytes stored under a slot.
    fn encode(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode the bytes previously stored under a slot.
    ///
    /// Only ever invoked on a present read; the engines never ask a codec to
    /// decode "absent".
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON codec for any serde-serializable value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> ValueCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::codec(format!("encode failed: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::codec(format!("decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let codec = JsonCodec;
        let bytes = codec.encode(&vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = codec.decode(&bytes).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_garbage_is_codec_error() {
        let codec = JsonCodec;
        let err = ValueCodec::<String>::decode(&codec, b"\xff\xfe").unwrap_err();
        assert!(matches!(err, Error::Codec { .. }));
    }
}
