//! Signature algorithm and verification for the Gravity Forms REST API.
//!
//! Requests sent over plain HTTP authenticate with a one-legged,
//! OAuth-1.0a-style signature carried in the query string:
//!
//! ```text
//! GET /wp-json/gf/v2/entries?api_key={public_key}&expires={unix}&signature={b64}
//! ```
//!
//! The signature is `base64(HMAC-SHA1("{api_key}:{METHOD}:{route}:{expires}", private_key))`
//! where `route` is the request path below the `gf/v2/` namespace without a
//! trailing slash. The canonical string is never transmitted; both sides
//! rebuild it from the request.

use std::borrow::Cow;

use subtle::ConstantTimeEq;
use url::Url;

/// Query parameter carrying the public key.
pub const API_KEY_PARAM: &str = "api_key";

/// Query parameter carrying the unix expiry timestamp.
pub const EXPIRES_PARAM: &str = "expires";

/// Query parameter carrying the base64 signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Errors produced by signature verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature expired")]
    Expired,
    #[error("invalid signature")]
    SignatureMismatch,
}

// ---------------------------------------------------------------------------
// Canonical string and HMAC
// ---------------------------------------------------------------------------

/// Build the exact byte sequence that gets signed.
///
/// The method is uppercased; every other component is used verbatim.
pub fn canonical_string(api_key: &str, method: &str, route: &str, expires: i64) -> String {
    format!(
        "{api_key}:{}:{route}:{expires}",
        method.to_ascii_uppercase()
    )
}

/// `base64(HMAC-SHA1(canonical, private_key))`, standard alphabet with padding.
pub fn calculate_signature(canonical: &str, private_key: &[u8]) -> String {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, private_key);
    let tag = ring::hmac::sign(&key, canonical.as_bytes());
    fast32::base64::RFC4648.encode(tag.as_ref())
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - _ . ~`.
pub fn raw_url_encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Compare a client-supplied signature against the calculated one.
///
/// Accepts either the plain base64 value or its percent-encoded form. Both
/// comparisons always run and each one is constant-time.
pub fn signatures_match(provided: &str, calculated: &str) -> bool {
    let encoded = raw_url_encode(calculated);
    let plain = provided.as_bytes().ct_eq(calculated.as_bytes());
    let percent_encoded = provided.as_bytes().ct_eq(encoded.as_bytes());
    (plain | percent_encoded).into()
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// A signature is valid strictly before its expiry second.
pub fn check_expiry(expires: i64, now: i64) -> Result<(), SignatureError> {
    if now >= expires {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

/// Read an `expires` query value with integer-cast semantics.
///
/// Leading whitespace and an optional sign are accepted, then the leading
/// numeric prefix is used; trailing garbage is ignored. A prefix with a
/// fraction or an exponent (`1.5`, `1e10`) is read as a float and truncated.
/// A value without a leading number reads as `0`. Out-of-range values
/// saturate.
pub fn parse_expires(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    let int_digits = leading_digits(&bytes[end..]);
    end += int_digits;

    let mut is_float = false;
    if bytes.get(end) == Some(&b'.') {
        let fraction = leading_digits(&bytes[end + 1..]);
        if int_digits > 0 || fraction > 0 {
            end += 1 + fraction;
            is_float = true;
        }
    }
    if int_digits == 0 && !is_float {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'-' | b'+')) {
            exponent += 1;
        }
        let digits = leading_digits(&bytes[exponent..]);
        if digits > 0 {
            end = exponent + digits;
            is_float = true;
        }
    }

    let number = &trimmed[..end];
    if is_float {
        // `as` saturates and maps NaN to zero.
        return number.parse::<f64>().map_or(0, |value| value as i64);
    }

    let (negative, digits) = match number.as_bytes().first() {
        Some(b'-') => (true, &number[1..]),
        Some(b'+') => (false, &number[1..]),
        _ => (false, number),
    };
    let mut value: i64 = 0;
    for digit in digits.bytes() {
        let d = i64::from(digit - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }
    value
}

fn leading_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Unix timestamp `lifetime_secs` from now.
pub fn expires_in(lifetime_secs: i64) -> i64 {
    time::OffsetDateTime::now_utc()
        .unix_timestamp()
        .saturating_add(lifetime_secs)
}

// ---------------------------------------------------------------------------
// SignedRequest
// ---------------------------------------------------------------------------

/// The signed part of one API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub api_key: String,
    pub method: String,
    pub route: String,
    pub expires: i64,
    pub signature: String,
}

impl SignedRequest {
    /// Sign `method route` for `api_key` until `expires`.
    pub fn sign(
        api_key: impl Into<String>,
        private_key: &[u8],
        method: &str,
        route: impl Into<String>,
        expires: i64,
    ) -> Self {
        let api_key = api_key.into();
        let route = route.into();
        let method = method.to_ascii_uppercase();
        let signature =
            calculate_signature(&canonical_string(&api_key, &method, &route, expires), private_key);
        Self {
            api_key,
            method,
            route,
            expires,
            signature,
        }
    }

    pub fn canonical_string(&self) -> String {
        canonical_string(&self.api_key, &self.method, &self.route, self.expires)
    }

    /// Recompute the signature under `private_key` and check it together
    /// with the expiry against `now`.
    pub fn verify(&self, private_key: &[u8], now: i64) -> Result<(), SignatureError> {
        let calculated = calculate_signature(&self.canonical_string(), private_key);
        check_expiry(self.expires, now)?;
        if !signatures_match(&self.signature, &calculated) {
            return Err(SignatureError::SignatureMismatch);
        }
        Ok(())
    }

    /// The three authentication query parameters, unencoded.
    pub fn to_query_pairs(&self) -> [(&'static str, String); 3] {
        [
            (API_KEY_PARAM, self.api_key.clone()),
            (EXPIRES_PARAM, self.expires.to_string()),
            (SIGNATURE_PARAM, self.signature.clone()),
        ]
    }

    /// Append the authentication parameters to `url`'s query string.
    pub fn append_to_url(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in self.to_query_pairs() {
            pairs.append_pair(name, &value);
        }
    }
}
