//! 거래소 API 요청 서명: 바이낸스 스타일 HMAC-SHA256 쿼리 서명과
//! 업비트 스타일 JWT(HS256) 서명.

use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

/// 서명 과정에서 발생하는 에러.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("JWT encoding failed: {0}")]
    JwtEncodingFailed(String),
}

/// 바이낸스 스타일 요청 서명: 쿼리 파라미터를 `key=value` 순서 그대로
/// `&`로 이어 붙인 문자열의 HMAC-SHA256을 16진수로 반환한다.
///
/// 파라미터 순서는 호출부 책임이다 — 거래소는 수신한 쿼리 문자열 그대로
/// 재서명하므로, 맵을 알파벳순으로 정렬해 호출해야 재현 가능한 서명이
/// 나온다.
pub fn binance_style_sign_query(query_string: &str, secret: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(query_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Serialize)]
struct UpbitClaims {
    access_key: String,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash_alg: Option<String>,
}

/// 업비트 스타일 JWT(HS256) 서명.
///
/// `query_string`이 비어 있으면(파라미터 없는 GET) `query_hash`/`query_hash_alg`
/// 클레임을 생략한다 — `null`로 채우면 업비트가 서명 불일치로 거절한다.
/// 있으면 SHA-512 해시를 16진수로 담는다. 반환값은 `Authorization` 헤더에
/// 그대로 쓸 수 있는 `"Bearer <token>"` 문자열이다.
pub fn upbit_style_sign_jwt(
    access_key: &str,
    secret: &str,
    query_string: Option<&str>,
) -> Result<String, SigningError> {
    let nonce = uuid::Uuid::new_v4().to_string();
    let (query_hash, query_hash_alg) = match query_string {
        Some(qs) if !qs.is_empty() => {
            let mut hasher = Sha512::new();
            hasher.update(qs.as_bytes());
            (Some(hex::encode(hasher.finalize())), Some("SHA512".to_string()))
        }
        _ => (None, None),
    };

    let claims = UpbitClaims {
        access_key: access_key.to_string(),
        nonce,
        query_hash,
        query_hash_alg,
    };

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    let token = encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| SigningError::JwtEncodingFailed(e.to_string()))?;

    Ok(format!("Bearer {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_binance_sign_is_deterministic() {
        let sig1 = binance_style_sign_query("symbol=BTCUSDT&side=SELL&timestamp=1", "secret");
        let sig2 = binance_style_sign_query("symbol=BTCUSDT&side=SELL&timestamp=1", "secret");
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 64); // SHA256 hex
    }

    #[test]
    fn test_binance_sign_changes_with_query() {
        let sig1 = binance_style_sign_query("symbol=BTCUSDT&timestamp=1", "secret");
        let sig2 = binance_style_sign_query("symbol=ETHUSDT&timestamp=1", "secret");
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_upbit_jwt_omits_query_hash_when_no_params() {
        let token = upbit_style_sign_jwt("access-key", "secret", None).unwrap();
        assert!(token.starts_with("Bearer "));
    }

    #[test]
    fn test_upbit_jwt_includes_query_hash_when_params_present() {
        let token = upbit_style_sign_jwt("access-key", "secret", Some("market=KRW-BTC")).unwrap();
        assert!(token.starts_with("Bearer "));
    }

    proptest! {
        /// 동일한 쿼리 문자열과 비밀키에 대해 서명은 몇 번을 다시 계산해도
        /// 바이트 단위로 동일해야 한다.
        #[test]
        fn prop_binance_sign_is_deterministic(
            query in "[a-zA-Z0-9=&_]{0,64}",
            secret in "[a-zA-Z0-9]{1,32}",
        ) {
            let first = binance_style_sign_query(&query, &secret);
            let second = binance_style_sign_query(&query, &secret);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_binance_sign_is_hex_sha256(
            query in "[a-zA-Z0-9=&_]{0,64}",
            secret in "[a-zA-Z0-9]{1,32}",
        ) {
            let sig = binance_style_sign_query(&query, &secret);
            prop_assert_eq!(sig.len(), 64);
            prop_assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
