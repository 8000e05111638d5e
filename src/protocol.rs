//! TPI wire protocol: requests, extraction patterns and response decoding
//!
//! Requests are HTTP GETs of the form `/prog/{verb}?{object}&name=value...`.
//! Responses are plain text, either an `ERROR:` line or label/value tokens
//! that each object's [`pattern`] turns into [`decode::Record`]s.

use crate::{Result, error::DecodeError};

/// Applying patterns to bodies
pub mod decode;
/// Per-object extraction patterns
pub mod pattern;
/// Request construction and parameter encoding
pub mod request;
/// Typed values built from decoded records
pub mod response;
/// Verbs, objects and capability keys
pub mod types;

use decode::Record;
use types::ObjectKind;

/// A value that can be built from one record of an object's response
pub trait FromRecord: Sized {
    /// Object whose pattern produces the record
    const OBJECT: ObjectKind;

    fn from_record(record: &Record) -> core::result::Result<Self, DecodeError>;
}

/// Decodes the first record of `body` with a custom conversion
///
/// A body with no matching record is a decode failure.
pub fn decode_first_with<T>(
    kind: ObjectKind,
    body: &str,
    convert: impl FnOnce(&Record) -> core::result::Result<T, DecodeError>,
) -> Result<T> {
    let records = decode::decode(kind, body)?;
    let first = records.first().ok_or(DecodeError::NoMatch(kind))?;
    Ok(convert(first)?)
}

/// Decodes the first record of `body` as `T`
pub fn decode_first<T: FromRecord>(body: &str) -> Result<T> {
    decode_first_with(T::OBJECT, body, T::from_record)
}

/// Decodes every record of `body` as `T`, in textual order
pub fn decode_all<T: FromRecord>(body: &str) -> Result<Vec<T>> {
    decode::decode(T::OBJECT, body)?
        .iter()
        .map(|record| T::from_record(record).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TpiError;

    #[test]
    fn test_decode_first_without_match() {
        assert!(matches!(
            decode_first::<response::GpsTimestamp>("GpsTime unavailable"),
            Err(TpiError::Decode(DecodeError::NoMatch(ObjectKind::GpsTime)))
        ));
    }

    #[test]
    fn test_decode_all_allows_empty_lists() {
        let readings = decode_all::<response::VoltageReading>("Voltages\n").unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_error_body_is_never_a_decode_error() {
        assert!(matches!(
            decode_first::<response::VoltageReading>("ERROR: bad request"),
            Err(TpiError::Protocol(_))
        ));
        assert!(matches!(
            decode_all::<response::VoltageReading>(""),
            Err(TpiError::Protocol(_))
        ));
    }
}
