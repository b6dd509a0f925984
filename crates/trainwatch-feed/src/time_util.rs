use time::OffsetDateTime;

use crate::error::DecodeError;

/// Convert a millisecond-epoch field to an instant, preserving sub-second
/// precision rather than truncating to whole seconds.
pub fn from_epoch_ms(ms: i64) -> Result<OffsetDateTime, DecodeError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map_err(|_| DecodeError::InvalidTimestamp(ms))
}
