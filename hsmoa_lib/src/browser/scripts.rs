//! JavaScript evaluated inside the page, and the shape of its results.
//!
//! Values interpolated into scripts are encoded as JSON string literals, so
//! URLs and keys never need manual escaping.

use serde::Deserialize;
use url::Url;

use crate::source::FetchDecodeError;

/// Injects a `<script src>` for the cipher library and resolves to whether it
/// loaded. Resolves immediately when `CryptoJS` is already present.
pub fn inject_cipher(script_url: &str) -> String {
    format!(
        r#"new Promise((resolve) => {{
    if (typeof window.CryptoJS !== 'undefined') {{ resolve(true); return; }}
    const s = document.createElement('script');
    s.src = {src};
    s.onload = () => resolve(true);
    s.onerror = () => resolve(false);
    (document.head || document.documentElement).appendChild(s);
}})"#,
        src = js_string(script_url)
    )
}

pub const CIPHER_PRESENT: &str = "typeof window.CryptoJS !== 'undefined'";

/// Fetches `url` with the page's cookies, decrypts `results` with `key` and
/// the response `iv`, and reports one [`PageOutcome`].
pub fn fetch_and_decrypt(url: &Url, key: &str) -> String {
    format!(
        r#"(async () => {{
    try {{
        const res = await fetch({url}, {{
            credentials: 'include',
            headers: {{ 'accept': 'application/json, text/plain, */*' }}
        }});
        if (!res.ok) return {{ kind: 'http', status: res.status }};
        const body = await res.json();
        if (!body || !body.results || !body.iv) {{
            return {{ kind: 'missing-fields', raw: JSON.stringify(body).slice(0, 500) }};
        }}
        const key = CryptoJS.enc.Utf8.parse({key});
        const iv = CryptoJS.enc.Hex.parse(body.iv);
        const plain = CryptoJS.AES.decrypt(body.results, key, {{
            iv: iv,
            mode: CryptoJS.mode.CBC,
            padding: CryptoJS.pad.Pkcs7
        }});
        const text = plain.toString(CryptoJS.enc.Utf8);
        if (!text) return {{ kind: 'decrypt-empty' }};
        return {{ kind: 'ok', data: text }};
    }} catch (e) {{
        return {{ kind: 'exception', message: String((e && e.message) || e) }};
    }}
}})()"#,
        url = js_string(url.as_str()),
        key = js_string(key)
    )
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Result object produced by [`fetch_and_decrypt`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PageOutcome {
    Ok { data: String },
    Http { status: u16 },
    MissingFields { raw: String },
    DecryptEmpty,
    Exception { message: String },
}

impl PageOutcome {
    pub fn interpret(self) -> Result<String, FetchDecodeError> {
        match self {
            PageOutcome::Ok { data } if !data.is_empty() => Ok(data),
            PageOutcome::Ok { .. } | PageOutcome::DecryptEmpty => Err(FetchDecodeError::DecryptEmpty),
            PageOutcome::Http { status } => Err(FetchDecodeError::HttpStatus(status)),
            PageOutcome::MissingFields { raw } => {
                tracing::error!("Response without results/iv: {}", raw);
                Err(FetchDecodeError::MissingFields)
            }
            PageOutcome::Exception { message } => Err(FetchDecodeError::Other(message)),
        }
    }
}
