//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::Serialize;

use crate::models::ErrorBody;
use crate::relay::RelayReply;

/// CORS headers attached to every try-on function response.
pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    (
        "access-control-allow-headers",
        "authorization, x-client-info, apikey, content-type",
    ),
];

fn builder(status: u16) -> lambda_http::http::response::Builder {
    CORS_HEADERS
        .iter()
        .fold(Response::builder().status(status), |b, (name, value)| {
            b.header(*name, *value)
        })
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(builder(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ErrorBody::new(message))
}

/// Empty response for CORS preflight requests.
pub fn preflight_response() -> Result<Response<Body>, lambda_http::Error> {
    Ok(builder(200).body(Body::Empty).map_err(Box::new)?)
}

/// Render a relay reply.
pub fn reply_response(reply: &RelayReply) -> Result<Response<Body>, lambda_http::Error> {
    json_response(reply.status_code(), &reply.to_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{GenerationFailure, GenerationOutcome};

    #[test]
    fn test_error_response_has_cors_and_json() {
        let response = error_response(400, "Missing required fields").unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "application/json");

        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["error"], "Missing required fields");
    }

    #[test]
    fn test_reply_response_status() {
        let reply = RelayReply {
            outcome: GenerationOutcome::from(GenerationFailure::RateLimited),
            instructions: Some("Edit this image: hat. Generate the edited image.".to_string()),
        };
        let response = reply_response(&reply).unwrap();
        assert_eq!(response.status(), 429);
    }

    #[test]
    fn test_preflight_has_allow_headers() {
        let response = preflight_response().unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["access-control-allow-headers"],
            "authorization, x-client-info, apikey, content-type"
        );
    }
}
