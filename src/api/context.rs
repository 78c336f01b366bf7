use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::errors::ApiError;
use crate::core::state::AppState;

pub(crate) const ACTIVE_SECTION_HEADER: &str = "x-active-section";

/// Section the adviser is currently working in, sent by the client on every request.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveSection(pub(crate) Option<String>);

impl ActiveSection {
    /// Explicit value wins; the header is only a default.
    pub(crate) fn or(self, explicit: Option<String>) -> Option<String> {
        explicit.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()).or(self.0)
    }

    pub(crate) fn require(self, explicit: Option<String>) -> Result<String, ApiError> {
        self.or(explicit).ok_or_else(|| {
            ApiError::BadRequest(
                "section_id is required (or send the x-active-section header)".to_string(),
            )
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ActiveSection {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACTIVE_SECTION_HEADER) else {
            return Ok(ActiveSection(None));
        };

        let value = value
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid x-active-section header".to_string()))?
            .trim();

        Ok(ActiveSection((!value.is_empty()).then(|| value.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_section_overrides_header() {
        let active = ActiveSection(Some("sec-header".to_string()));
        assert_eq!(active.or(Some("sec-query".to_string())).as_deref(), Some("sec-query"));
    }

    #[test]
    fn blank_explicit_section_falls_back_to_header() {
        let active = ActiveSection(Some("sec-header".to_string()));
        assert_eq!(active.or(Some("  ".to_string())).as_deref(), Some("sec-header"));
    }

    #[test]
    fn missing_section_is_a_bad_request() {
        let result = ActiveSection(None).require(None);
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
