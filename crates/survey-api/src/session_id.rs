//! Participant session identifiers: `RISE_<unix millis>_<8 base-36 chars>`.
//!
//! Unique with overwhelming probability only. There is no collision retry; the store's
//! uniqueness constraint decides.

use chrono::{SecondsFormat, Utc};

pub const PREFIX: &str = "RISE_";
const SUFFIX_LEN: usize = 8;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[must_use]
pub fn generate() -> String {
    format_id(Utc::now().timestamp_millis(), uuid::Uuid::new_v4().as_u128())
}

fn format_id(millis: i64, mut entropy: u128) -> String {
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        // The modulus is below 36, so the index is always in range.
        suffix.push(char::from(ALPHABET[(entropy % 36) as usize]));
        entropy /= 36;
    }
    format!("{PREFIX}{millis}_{suffix}")
}

/// Whether `s` has the shape produced by [`generate`].
#[must_use]
pub fn is_well_formed(s: &str) -> bool {
    let Some(rest) = s.strip_prefix(PREFIX) else {
        return false;
    };
    let Some((millis, suffix)) = rest.split_once('_') else {
        return false;
    };
    !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Current UTC time as RFC 3339 with millisecond precision, e.g. `2026-10-16T09:30:00.123Z`.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
