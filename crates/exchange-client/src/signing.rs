//! Request signing.

use crate::{ExchangeError, ExchangeResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign one request.
///
/// `query` is either empty or starts with `?`. `body` is the exact JSON
/// text sent on the wire, empty for GET.
pub fn sign(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    query: &str,
    body: &str,
) -> ExchangeResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.to_ascii_uppercase().as_bytes());
    mac.update(path.as_bytes());
    mac.update(query.as_bytes());
    mac.update(body.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Form-encode `params` as `?k=v&...`, or an empty string if there are none.
pub fn build_query(params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("?{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_post_known_vector() {
        let signature = sign(
            "test-secret",
            "1700000000000",
            "post",
            "/capi/v2/order/uploadAiLog",
            "",
            r#"{"stage":"Decision Making"}"#,
        )
        .unwrap();
        assert_eq!(signature, "nWK4ceDV5Dpj5ysWfuUyVeSq6PAPCLtnnXDuoW6SYgA=");
    }

    #[test]
    fn test_sign_get_with_query_known_vector() {
        let query = build_query(&[("symbol", "cmt_btcusdt".into()), ("limit", "15".into())]);
        assert_eq!(query, "?symbol=cmt_btcusdt&limit=15");

        let signature = sign(
            "test-secret",
            "1700000000000",
            "GET",
            "/capi/v2/market/depth",
            &query,
            "",
        )
        .unwrap();
        assert_eq!(signature, "exKjpFXW4pjW0cQqDWk38BBugkW4RV/iIAbxMQPQAuI=");
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let a = sign("a", "1", "GET", "/p", "", "").unwrap();
        let b = sign("b", "1", "GET", "/p", "", "").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_build_query_encodes() {
        assert_eq!(build_query(&[]), "");
        assert_eq!(build_query(&[("q", "a b&c".into())]), "?q=a+b%26c");
    }
}
