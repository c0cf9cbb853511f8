#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    use crate::error::{present, AppError, ErrorKind, OptionExt};

    #[test]
    fn test_kind_status_table() {
        assert_eq!(ErrorKind::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::TooManyRequests.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorKind::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::SessionExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorKind::ServerError.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorKind::ServiceUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_kind_wire_identifiers_are_screaming_snake() {
        for kind in [
            ErrorKind::BadRequest,
            ErrorKind::TooManyRequests,
            ErrorKind::InvalidCredentials,
            ErrorKind::ServiceUnavailable,
        ] {
            let s = kind.as_str();
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{}", s);
        }
    }

    async fn response_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_into_response_envelope_shape() {
        let err = AppError::with_message(ErrorKind::ValidationError, "Name is required")
            .with_details(json!({"field": "name"}));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        // The boundary relies on finding the error in the extensions
        assert!(res.extensions().get::<AppError>().is_some());

        let body = response_json(res).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "Name is required");
        assert_eq!(body["details"]["field"], "name");
    }

    #[tokio::test]
    async fn test_present_strips_details_in_production() {
        let err = AppError::with_message(ErrorKind::Storage, "disk io failure")
            .with_details(json!({"query": "SELECT ..."}));

        let body = response_json(present(&err, true, false)).await;
        assert_eq!(body["details"]["query"], "SELECT ...");
        assert_eq!(body["message"], "disk io failure");

        let body = response_json(present(&err, true, true)).await;
        assert!(body.get("details").is_none());
        assert_eq!(body["error"], "STORAGE");
        // Internal kinds also lose their raw message in production
        assert_eq!(body["message"], "A storage error occurred");
    }

    #[tokio::test]
    async fn test_present_page_routes_get_generic_body() {
        let err = AppError::with_message(ErrorKind::Storage, "disk io failure");
        let res = present(&err, false, true);
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        // Generic message only, never the internal one
        assert_eq!(text, "A storage error occurred");
        assert!(!text.contains("disk io"));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_from_sqlx_pool_timeout_is_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_option_ext() {
        let some: Option<u32> = Some(7);
        assert_eq!(some.ok_or_not_found("Cocktail").unwrap(), 7);

        let none: Option<u32> = None;
        let err = none.ok_or_not_found("Cocktail").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Cocktail not found");
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::bad_request("missing field");
        assert_eq!(err.to_string(), "BAD_REQUEST: missing field");
    }
}
