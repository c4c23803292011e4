//! Response classifier.
//!
//! # Design
//! One function maps a completed exchange to an [`Outcome`]:
//!
//! | status            | outcome                                       |
//! |-------------------|-----------------------------------------------|
//! | 2xx               | `Success`, `None` for an empty body            |
//! | 300-303           | `Redirect`, follow-up is a bodiless `GET`      |
//! | 307, 308          | `Redirect`, follow-up replays method and body  |
//! | everything else   | `Failure`                                      |
//!
//! A redirect without a resolvable `Location` is a failure too: there is
//! nowhere to go.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, LOCATION};
use crate::redirect::{redirect_kind, resolve_location, Redirect};

/// Classified result of one transport round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Parsed JSON body, `None` when the response carried no content.
    Success(Option<Value>),
    /// Follow `location`; only ever consumed by the redirect loop.
    Redirect(Redirect),
    Failure(ApiError),
}

/// Classify `response`, which was returned for `request`.
pub fn classify(request: &HttpRequest, response: &HttpResponse) -> Outcome {
    let status = response.status;

    if (200..300).contains(&status) {
        return parse_success(request, response);
    }

    if let Some(preserve_method) = redirect_kind(status) {
        let location = response
            .header(LOCATION)
            .and_then(|location| resolve_location(&request.url, location).ok());
        if let Some(location) = location {
            return Outcome::Redirect(Redirect {
                location,
                preserve_method,
            });
        }
        tracing::debug!(status, "redirect without a usable Location header");
    }

    Outcome::Failure(ApiError::from_status(
        status,
        &request.method,
        &request.url,
        &response.body,
    ))
}

fn parse_success(request: &HttpRequest, response: &HttpResponse) -> Outcome {
    if response.body.trim().is_empty() {
        return Outcome::Success(None);
    }

    match serde_json::from_str(&response.body) {
        Ok(value) => Outcome::Success(Some(value)),
        Err(err) => {
            tracing::warn!(
                status = response.status,
                url = %request.url,
                "response body is not valid JSON: {err}"
            );
            Outcome::Failure(ApiError::invalid_json(
                response.status,
                &request.method,
                &request.url,
                &response.body,
                &err,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::RequestOptions;
    use crate::http::{Body, HttpMethod};
    use crate::request::build_request;

    fn request(method: HttpMethod) -> HttpRequest {
        build_request(
            method,
            Url::parse("https://api.example.com/v1/widgets/1").unwrap(),
            Body::Empty,
            &RequestOptions::defaults(),
        )
        .unwrap()
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }
    }

    #[test]
    fn success_parses_json() {
        let outcome = classify(&request(HttpMethod::Get), &response(200, &[], r#"{"id":1}"#));
        assert_eq!(outcome, Outcome::Success(Some(json!({ "id": 1 }))));
    }

    #[test]
    fn success_accepts_any_json_type() {
        let outcome = classify(&request(HttpMethod::Get), &response(200, &[], "[1,2]"));
        assert_eq!(outcome, Outcome::Success(Some(json!([1, 2]))));
        let outcome = classify(&request(HttpMethod::Get), &response(200, &[], "null"));
        assert_eq!(outcome, Outcome::Success(Some(Value::Null)));
    }

    #[test]
    fn empty_success_is_absent_content() {
        for status in [200, 201, 204] {
            let outcome = classify(&request(HttpMethod::Delete), &response(status, &[], ""));
            assert_eq!(outcome, Outcome::Success(None), "{status}");
        }
        let outcome = classify(&request(HttpMethod::Get), &response(200, &[], " \r\n"));
        assert_eq!(outcome, Outcome::Success(None));
    }

    #[test]
    fn invalid_success_body_is_invalid_json() {
        let outcome = classify(&request(HttpMethod::Get), &response(200, &[], "not json"));
        let Outcome::Failure(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.code, "invalid_json");
        assert_eq!(err.status_code, Some(200));
        assert_eq!(err.meta["data"], "not json");
    }

    #[test]
    fn see_other_redirects_without_method() {
        let outcome = classify(
            &request(HttpMethod::Post),
            &response(303, &[("Location", "/v1/widgets/9?fresh=1")], ""),
        );
        assert_eq!(
            outcome,
            Outcome::Redirect(Redirect {
                location: Url::parse("https://api.example.com/v1/widgets/9?fresh=1").unwrap(),
                preserve_method: false,
            })
        );
    }

    #[test]
    fn permanent_redirect_preserves_method() {
        let outcome = classify(
            &request(HttpMethod::Put),
            &response(308, &[("location", "https://other.example.com/w")], ""),
        );
        assert!(matches!(
            outcome,
            Outcome::Redirect(Redirect { preserve_method: true, .. })
        ));
    }

    #[test]
    fn non_actionable_redirects_fail() {
        for status in [304, 305, 306] {
            let outcome = classify(
                &request(HttpMethod::Get),
                &response(status, &[("Location", "/elsewhere")], ""),
            );
            assert!(matches!(outcome, Outcome::Failure(_)), "{status}");
        }
    }

    #[test]
    fn redirect_without_location_fails() {
        let outcome = classify(&request(HttpMethod::Get), &response(302, &[], ""));
        let Outcome::Failure(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.code, "found");
        assert_eq!(err.status_code, Some(302));
    }

    #[test]
    fn informational_status_fails() {
        let outcome = classify(&request(HttpMethod::Get), &response(100, &[], ""));
        let Outcome::Failure(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.message, "HTTP 100: Continue");
    }

    #[test]
    fn client_error_merges_payload() {
        let body = r#"{"code":"validation_failed","fields":[{"name":"required"}]}"#;
        let outcome = classify(&request(HttpMethod::Post), &response(422, &[], body));
        let Outcome::Failure(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.code, "validation_failed");
        assert_eq!(err.message, "HTTP 422: Unprocessable Entity");
        assert_eq!(err.field("fields"), Some(&json!([{ "name": "required" }])));
        assert_eq!(err.meta["method"], "POST");
        assert_eq!(err.meta["url"], "https://api.example.com/v1/widgets/1");
    }

    #[test]
    fn server_error_keeps_raw_text() {
        let outcome = classify(&request(HttpMethod::Get), &response(500, &[], "internal failure"));
        let Outcome::Failure(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.code, "internal_server_error");
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.meta["data"], "internal failure");
    }
}
