//! Route parameters and where they end up.
//!
//! Parameters named by the URL template are consumed by it. The rest go to
//! the query string for GET/HEAD and to the request body for every other
//! method.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::http::HttpMethod;
use crate::template::Expression;

/// Parameter name to value, in insertion order.
pub type Params = serde_json::Map<String, Value>;

/// Serialize any struct or map into `Params`.
pub fn to_params<T: Serialize>(value: &T) -> Result<Params, Error> {
    match serde_json::to_value(value).map_err(|e| Error::SerializationError(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(Error::SerializationError(format!(
            "parameters must serialize to an object, got `{other}`"
        ))),
    }
}

/// Where the parameters not consumed by the URL template go.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Query(Params),
    Body(Params),
}

/// Split off the parameters the template did not consume and route them by
/// method.
pub fn classify(params: &Params, consumed: &BTreeSet<String>, method: HttpMethod) -> Placement {
    let remaining: Params = params
        .iter()
        .filter(|(name, _)| !consumed.contains(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    if method.can_have_body() {
        Placement::Body(remaining)
    } else {
        Placement::Query(remaining)
    }
}

/// Append `params` to `url` with form-style query expansion, continuing an
/// existing query string with `&`.
pub fn add_query_parameters(url: &str, params: &Params) -> String {
    let query = Expression::query(params.keys().map(String::as_str)).expand(params);
    if query.is_empty() {
        return url.to_string();
    }
    if url.contains('?') {
        format!("{url}&{}", &query[1..])
    } else {
        format!("{url}{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        to_params(&value).unwrap()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn consumed_parameters_are_removed() {
        let p = params(json!({"owner": "a", "repo": "b", "per_page": 10}));
        let placement = classify(&p, &names(&["owner", "repo"]), HttpMethod::Get);
        assert_eq!(placement, Placement::Query(params(json!({"per_page": 10}))));
    }

    #[test]
    fn body_methods_route_to_body() {
        let p = params(json!({"owner": "a", "title": "bug"}));
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch, HttpMethod::Delete] {
            let placement = classify(&p, &names(&["owner"]), method);
            assert_eq!(placement, Placement::Body(params(json!({"title": "bug"}))), "{method}");
        }
    }

    #[test]
    fn head_routes_to_query() {
        let p = params(json!({"q": "x"}));
        assert!(matches!(classify(&p, &BTreeSet::new(), HttpMethod::Head), Placement::Query(_)));
    }

    #[test]
    fn query_uses_question_mark_on_bare_url() {
        let p = params(json!({"page": 2, "sort": "created at"}));
        assert_eq!(
            add_query_parameters("https://api.test/issues", &p),
            "https://api.test/issues?page=2&sort=created%20at"
        );
    }

    #[test]
    fn query_continues_existing_query_string() {
        let p = params(json!({"page": 2}));
        assert_eq!(
            add_query_parameters("https://api.test/issues?state=open", &p),
            "https://api.test/issues?state=open&page=2"
        );
    }

    #[test]
    fn undefined_query_values_are_skipped() {
        assert_eq!(add_query_parameters("/x", &params(json!({"a": null}))), "/x");
        assert_eq!(add_query_parameters("/x", &Params::new()), "/x");
        assert_eq!(add_query_parameters("/x", &params(json!({"a": null, "b": true}))), "/x?b=true");
    }

    #[test]
    fn to_params_accepts_structs_and_rejects_scalars() {
        #[derive(Serialize)]
        struct Issue {
            title: String,
            labels: Vec<String>,
        }
        let p = to_params(&Issue {
            title: "bug".to_string(),
            labels: vec!["p1".to_string()],
        })
        .unwrap();
        assert_eq!(p["title"], "bug");
        assert!(matches!(to_params(&5), Err(Error::SerializationError(_))));
    }
}
