//! Request builder: turns a method, resolved URL, body and merged options
//! into a transport-ready `HttpRequest`.

use serde_json::Value;
use url::Url;

use crate::config::RequestOptions;
use crate::error::Error;
use crate::http::{Body, HttpMethod, HttpRequest, CONTENT_LENGTH, CONTENT_TYPE, JSON_MEDIA_TYPE};

/// Build the request descriptor.
///
/// Structured bodies are serialized to JSON and tagged with
/// `Content-Type: application/json`, overriding an identical key from the
/// options. Any body that ends up non-empty gets a `Content-Length` in
/// UTF-8 bytes.
pub fn build_request(
    method: HttpMethod,
    url: Url,
    body: Body,
    options: &RequestOptions,
) -> Result<HttpRequest, Error> {
    let mut headers = options.headers.clone();

    let body = match body {
        Body::Empty | Body::Json(Value::Null) => None,
        Body::Text(text) => Some(text),
        Body::Json(value) => {
            headers.insert(CONTENT_TYPE.to_string(), JSON_MEDIA_TYPE.to_string());
            Some(serde_json::to_string(&value)?)
        }
    };
    let body = body.filter(|text| !text.is_empty());

    if let Some(text) = &body {
        headers.insert(CONTENT_LENGTH.to_string(), text.len().to_string());
    }

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
        timeout: options.timeout,
        extensions: options.extensions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn url() -> Url {
        Url::parse("https://api.example.com/widgets").unwrap()
    }

    #[test]
    fn json_body_sets_content_headers() {
        let req = build_request(
            HttpMethod::Post,
            url(),
            Body::Json(json!({ "name": "gear", "size": 3 })),
            &RequestOptions::defaults(),
        )
        .unwrap();

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        let body = req.body.as_deref().unwrap();
        assert_eq!(req.header("Content-Length"), Some(body.len().to_string().as_str()));
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, json!({ "name": "gear", "size": 3 }));
    }

    #[test]
    fn structured_bodies_round_trip() {
        for value in [
            json!([1, 2, 3]),
            json!("just a string"),
            json!(42.5),
            json!(false),
            json!({ "nested": { "list": [null, "ünïcödé", { "k": 1 }] } }),
        ] {
            let req = build_request(HttpMethod::Put, url(), Body::Json(value.clone()), &RequestOptions::new())
                .unwrap();
            let parsed: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn content_length_counts_utf8_bytes() {
        let req = build_request(HttpMethod::Post, url(), Body::from("héllo"), &RequestOptions::new()).unwrap();
        assert_eq!(req.header("Content-Length"), Some("6"));
        assert!(req.header("Content-Type").is_none());
    }

    #[test]
    fn null_and_empty_bodies_send_nothing() {
        for body in [Body::Empty, Body::Json(Value::Null), Body::Text(String::new())] {
            let req = build_request(HttpMethod::Post, url(), body, &RequestOptions::new()).unwrap();
            assert!(req.body.is_none());
            assert!(req.header("Content-Length").is_none());
            assert!(req.header("Content-Type").is_none());
        }
    }

    #[test]
    fn computed_content_type_wins_over_options() {
        let options = RequestOptions::new().header("Content-Type", "text/plain");
        let req = build_request(HttpMethod::Post, url(), Body::Json(json!({})), &options).unwrap();
        assert_eq!(req.headers["Content-Type"], "application/json");
    }

    #[test]
    fn text_body_keeps_caller_content_type() {
        let options = RequestOptions::new().header("Content-Type", "application/merge-patch+json");
        let req = build_request(HttpMethod::Patch, url(), Body::from(r#"{"a":1}"#), &options).unwrap();
        assert_eq!(req.headers["Content-Type"], "application/merge-patch+json");
        assert_eq!(req.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn passthrough_options_are_forwarded() {
        let options = RequestOptions::new()
            .timeout(Duration::from_secs(2))
            .extension("clientCert", "cert.pem");
        let req = build_request(HttpMethod::Get, url(), Body::Empty, &options).unwrap();
        assert_eq!(req.timeout, Some(Duration::from_secs(2)));
        assert_eq!(req.extensions["clientCert"], "cert.pem");
    }
}
