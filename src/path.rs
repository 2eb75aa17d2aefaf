//! Request-path decoding helpers.
//!
//! # Responsibilities
//! - Extract the path portion of an origin-form request target
//! - Percent-decode a path for matching, keeping an encoded `*` escaped
//! - Finish decoding parameter values before they reach the caller
//!
//! # Design Decisions
//! - Matching runs over decoded bytes, so `/a%20b` and `/a b` are the same
//!   path; decoding can produce non-UTF-8 bytes, hence `Vec<u8>`
//! - `%2A`/`%2a` is the one escape left in place (canonicalized to `%2A`):
//!   a raw `*` in a pattern always introduces a wildcard, so the escaped
//!   form is the only way a path or pattern literal can carry a literal
//!   star without colliding with wildcard syntax
//! - Invalid escapes pass through unchanged (the percent-encoding crate's
//!   lenient decoder) and can only match a pattern spelling the same bytes

use percent_encoding::percent_decode;

use crate::matcher::Params;

/// Path portion of an origin-form request target: everything before the
/// query or fragment.
pub(crate) fn request_path(target: &str) -> &str {
    match target.find(['?', '#']) {
        Some(end) => &target[..end],
        None => target,
    }
}

/// Decode a raw path into the byte form the matcher runs over: every
/// percent escape is decoded except `%2A`/`%2a`, which is kept as the
/// canonical `%2A`.
pub(crate) fn decode_path(raw: &str) -> Vec<u8> {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut chunk = 0;
    let mut i = 0;
    while i < bytes.len() {
        if is_star_escape(bytes, i) {
            decoded.extend(percent_decode(&bytes[chunk..i]));
            decoded.extend_from_slice(b"%2A");
            i += 3;
            chunk = i;
        } else {
            i += 1;
        }
    }
    decoded.extend(percent_decode(&bytes[chunk..]));
    decoded
}

/// Replace the `%2A` sequences [`decode_path`] preserved with the literal
/// star, in place. Runs only on values handed back to the caller.
pub(crate) fn restore_stars(params: &mut Params) {
    for value in params.values_mut() {
        if value.contains("%2A") {
            *value = value.replace("%2A", "*");
        }
    }
}

/// True when `bytes[i..]` starts a percent escape of `*`.
fn is_star_escape(bytes: &[u8], i: usize) -> bool {
    bytes.len() >= i + 3
        && bytes[i] == b'%'
        && bytes[i + 1] == b'2'
        && (bytes[i + 2] == b'A' || bytes[i + 2] == b'a')
}
