use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::Value;

use super::Error;

/// A response to a [`Request`](super::Request).
///
/// The `data` value mirrors the request's selection shape exactly: only
/// requested fields appear, in request order. `data` is absent entirely when
/// the request was rejected before execution (a request-shape error).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The errors encountered while resolving the request.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,
}

#[buildstructor::buildstructor]
impl Response {
    /// Returns a builder that builds a [`Response`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.data(impl Into<`[`Value`]`>)`
    ///   Optional.
    ///
    /// * `.errors(impl Into<`[`Vec`]`<`[`Error`]`>>)` / `.error(`[`Error`]`)`
    ///   Optional.
    ///
    /// * `.build()`
    #[builder(visibility = "pub")]
    fn new(data: Option<Value>, errors: Vec<Error>) -> Self {
        Self { data, errors }
    }

    /// Returns `true` if the request produced data and no fatal error.
    pub fn is_success(&self) -> bool {
        self.data.is_some() && !self.errors.iter().any(|error| error.fatal)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use serde_json_bytes::json as bjson;

    use super::*;
    use crate::json_ext::Path;

    #[test]
    fn test_response() {
        let result = serde_json::from_str::<Response>(
            json!({
                "data": {
                    "games": [
                        { "title": "Zelda", "platform": ["Switch"] }
                    ]
                },
                "errors": [
                    {
                        "message": "boom",
                        "path": ["games", 0, "reviews"],
                        "fatal": false,
                    }
                ],
            })
            .to_string()
            .as_str(),
        );
        assert_eq!(
            result.unwrap(),
            Response::builder()
                .data(bjson!({
                    "games": [
                        { "title": "Zelda", "platform": ["Switch"] }
                    ]
                }))
                .error(
                    Error::builder()
                        .message("boom")
                        .path(Path::from("games/0/reviews"))
                        .build()
                )
                .build()
        );
    }

    #[test]
    fn rejected_requests_serialize_without_data() {
        let response = Response::builder()
            .error(
                Error::builder()
                    .message("cannot query field 'tite' on type 'Game'")
                    .fatal(true)
                    .extension_code("UNKNOWN_FIELD")
                    .build(),
            )
            .build();
        assert!(!response.is_success());

        let serialized = serde_json::to_value(&response).unwrap();
        assert!(serialized.get("data").is_none());
    }
}
