pub mod error;

pub use error::DecodeError;

use crate::domain::Event;

/// Decode a raw stream payload into an [`Event`].
///
/// Fails on malformed structure, a non-numeric `value` or an unparsable
/// timestamp. A decode failure is never fatal to the caller: the poller
/// logs it and skips to the next record in the batch.
pub fn decode(data: &[u8]) -> Result<Event, DecodeError> {
    Ok(serde_json::from_slice(data)?)
}

/// Encode an [`Event`] into its wire payload. Inverse of [`decode`]:
/// `decode(encode(e)) == e` for every valid event.
pub fn encode(event: &Event) -> Result<Vec<u8>, DecodeError> {
    Ok(serde_json::to_vec(event)?)
}
