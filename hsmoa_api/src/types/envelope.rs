use serde::{Deserialize, Serialize};

use crate::Error;

/// Encrypted response body of the schedule endpoint.
///
/// `results` is base64 ciphertext; `iv` is the hex-encoded CBC initialization
/// vector chosen per response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub results: String,
    pub iv: String,
}

#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    results: Option<serde_json::Value>,
    #[serde(default)]
    iv: Option<serde_json::Value>,
}

impl Envelope {
    /// Parses a response body, requiring both fields to be non-empty strings.
    pub fn from_json(body: &str) -> Result<Self, Error> {
        let wire: WireEnvelope =
            serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;
        match (non_empty(wire.results), non_empty(wire.iv)) {
            (Some(results), Some(iv)) => Ok(Self { results, iv }),
            _ => Err(Error::MissingFields),
        }
    }
}

fn non_empty(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_envelope() {
        let env = Envelope::from_json(r#"{"results":"abc=","iv":"00ff"}"#).unwrap();
        assert_eq!(env.results, "abc=");
        assert_eq!(env.iv, "00ff");
    }

    #[test]
    fn missing_iv_is_missing_fields() {
        let err = Envelope::from_json(r#"{"results":"abc="}"#).unwrap_err();
        assert!(matches!(err, Error::MissingFields));
    }

    #[test]
    fn empty_results_is_missing_fields() {
        let err = Envelope::from_json(r#"{"results":"","iv":"00ff"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingFields));
    }

    #[test]
    fn non_object_body_is_parse_error() {
        let err = Envelope::from_json("[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
