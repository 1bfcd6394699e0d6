// SPDX-License-Identifier: Apache-2.0

use axum::http::HeaderMap;
use waypoint_model::UserId;

/// Pre-validated identity attached by the fronting identity collaborator.
/// The core does not re-authenticate; it trusts this pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub name: String,
}

pub(crate) fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| UserId::parse(raw).ok())?;
    let name = headers
        .get("x-user-name")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?
        .to_string();
    Some(Principal { user_id, name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn both_headers_are_required() {
        let mut headers = HeaderMap::new();
        assert!(principal_from_headers(&headers).is_none());
        headers.insert("x-user-id", HeaderValue::from_static("u1"));
        assert!(principal_from_headers(&headers).is_none());
        headers.insert("x-user-name", HeaderValue::from_static("Ann"));
        let principal = principal_from_headers(&headers).expect("principal");
        assert_eq!(principal.user_id.as_str(), "u1");
        assert_eq!(principal.name, "Ann");
    }

    #[test]
    fn malformed_user_id_yields_no_principal() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static(" padded"));
        headers.insert("x-user-name", HeaderValue::from_static("Ann"));
        assert!(principal_from_headers(&headers).is_none());
    }
}
