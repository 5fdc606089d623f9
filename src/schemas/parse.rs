use serde::{Deserialize, Deserializer, Serialize};

/// `POST /functions/<name>` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct FunctionEnvelope<T> {
    pub(crate) result: T,
}

/// `GET /classes/<ClassName>` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryEnvelope<T> {
    pub(crate) results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ParseErrorBody {
    #[serde(default)]
    pub(crate) code: Option<i64>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub(crate) object_id: String,
    pub(crate) session_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthStatus {
    pub(crate) status: String,
}

/// Reference to another Parse object; included relations carry more fields,
/// which are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Pointer {
    pub(crate) object_id: String,
}

/// Cloud Code serialises decimals with `toFixed`, so numbers arrive either as
/// JSON numbers or as numeric strings.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<f64>().map(Some).map_err(serde::de::Error::custom)
        }
    }
}
