use super::PreviewError;
use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const PREVIEW_COOKIE: &str = "preview_session";

/// An editor's preview session: the content ref every query of the
/// request is scoped to. Only the content API gives the ref any meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSession {
    reference: String,
}

impl PreviewSession {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Reads the session from the request cookies. A missing, malformed or
    /// tampered cookie means no preview.
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Option<Self> {
        let signed_value = get_cookie_value(headers, PREVIEW_COOKIE)?;
        verify_signed_value(secret, &signed_value).map(Self::new)
    }

    pub fn to_cookie(&self, secret: &str, secure: bool) -> Result<String, PreviewError> {
        let signed_value = create_signed_value(secret, &self.reference)?;
        Ok(format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
            PREVIEW_COOKIE,
            signed_value,
            if secure { "; Secure" } else { "" }
        ))
    }

    pub fn clear_cookie() -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            PREVIEW_COOKIE
        )
    }
}

/// `base64url(value):base64url(hmac)`. The value is encoded so refs that
/// are themselves URLs stay cookie-safe.
pub fn create_signed_value(secret: &str, value: &str) -> Result<String, PreviewError> {
    let encoded = general_purpose::URL_SAFE_NO_PAD.encode(value);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PreviewError::Signing("Invalid secret key".to_string()))?;
    mac.update(encoded.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);
    Ok(format!("{}:{}", encoded, signature_b64))
}

pub fn verify_signed_value(secret: &str, signed_value: &str) -> Option<String> {
    let (encoded, signature_b64) = signed_value.split_once(':')?;
    let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(encoded.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let value = general_purpose::URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(value).ok()
}

pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}
