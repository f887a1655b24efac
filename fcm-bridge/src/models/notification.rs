use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

/// Names of the required fields, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 3] = ["token", "title", "body"];

/// Wire encoding of an inbound `/send` body, chosen from its `content-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    FormUrlEncoded,
    Json,
    PlainText,
}

impl BodyEncoding {
    /// Case-insensitive substring match; anything unrecognised (or no header)
    /// falls back to plain text.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

        if content_type.contains("application/x-www-form-urlencoded") {
            BodyEncoding::FormUrlEncoded
        } else if content_type.contains("application/json") {
            BodyEncoding::Json
        } else {
            BodyEncoding::PlainText
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_content_type(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
    }
}

/// One notification to forward. Fields are trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NotificationRequest {
    #[validate(length(min = 1, message = "token cannot be empty"))]
    pub token: String,
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "body cannot be empty"))]
    pub body: String,
}

/// Shape shared by the form and JSON encodings. Absent or `null` fields are empty.
#[derive(Debug, Default, Deserialize)]
struct StructuredFields {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

impl NotificationRequest {
    pub fn new(token: &str, title: &str, body: &str) -> Self {
        Self {
            token: token.trim().to_string(),
            title: title.trim().to_string(),
            body: body.trim().to_string(),
        }
    }

    /// Decode a raw body. Only structural problems fail here; empty fields are
    /// reported by [`NotificationRequest::ensure_complete`].
    pub fn decode(encoding: BodyEncoding, raw: &[u8]) -> Result<Self, AppError> {
        match encoding {
            BodyEncoding::FormUrlEncoded => {
                let fields: StructuredFields = serde_urlencoded::from_bytes(raw)
                    .map_err(|e| AppError::InvalidBody(format!("malformed form body: {}", e)))?;
                Ok(fields.into())
            }
            BodyEncoding::Json => {
                if raw.iter().all(u8::is_ascii_whitespace) {
                    return Ok(StructuredFields::default().into());
                }
                let fields: StructuredFields = serde_json::from_slice(raw)
                    .map_err(|e| AppError::InvalidBody(format!("malformed JSON body: {}", e)))?;
                Ok(fields.into())
            }
            BodyEncoding::PlainText => Ok(Self::from_lines(&String::from_utf8_lossy(raw))),
        }
    }

    /// `<token>\n<title>\n<body...>`; every line after the second belongs to the body.
    fn from_lines(text: &str) -> Self {
        let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        let token = lines.next().unwrap_or_default();
        let title = lines.next().unwrap_or_default();
        let body = lines.collect::<Vec<_>>().join("\n");

        Self::new(token, title, &body)
    }

    pub fn ensure_complete(&self) -> Result<(), AppError> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };

        let field_errors = errors.field_errors();
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| field_errors.contains_key(*field))
            .collect();

        Err(AppError::MissingFields(format!(
            "token, title y body son obligatorios (faltan: {})",
            missing.join(", ")
        )))
    }
}

impl From<StructuredFields> for NotificationRequest {
    fn from(fields: StructuredFields) -> Self {
        Self::new(
            fields.token.as_deref().unwrap_or_default(),
            fields.title.as_deref().unwrap_or_default(),
            fields.body.as_deref().unwrap_or_default(),
        )
    }
}
