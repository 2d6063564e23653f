//! Verify template expansion and request building against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector names its inputs and the expected output. Bodies are compared
//! as parsed JSON so whitespace differences do not cause false negatives.

use clientele_core::{builder, HttpMethod, Params, RequestConfig, Route, Template};

fn params(value: &serde_json::Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

fn config(value: &serde_json::Value) -> RequestConfig {
    let mut config = RequestConfig::default();
    if let Some(base_url) = value["base_url"].as_str() {
        config = config.with_base_url(base_url);
    }
    if let Some(method) = value["method"].as_str() {
        config = config.with_method(method.parse().unwrap());
    }
    if let Some(headers) = value["headers"].as_object() {
        for (name, v) in headers {
            config = config.with_header(name.as_str(), v.as_str().unwrap());
        }
    }
    config
}

// ---------------------------------------------------------------------------
// URI templates
// ---------------------------------------------------------------------------

#[test]
fn uri_template_test_vectors() {
    let raw = include_str!("../../test-vectors/uri_template.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let template = case["template"].as_str().unwrap();
        let expected = case["expected"].as_str().unwrap();

        let expanded = Template::parse(template).expand(&params(&case["params"]));
        assert_eq!(expanded, expected, "{name}: expansion");
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let route = Route::parse(case["route"].as_str().unwrap()).unwrap();
        let expected_req = &case["expected_request"];

        let req = builder::build(&route, &params(&case["params"]), &config(&case["config"])).unwrap();

        let method: HttpMethod = expected_req["method"].as_str().unwrap().parse().unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, expected_req["url"].as_str().unwrap(), "{name}: url");

        match expected_req["body"].as_str() {
            Some(expected) => {
                let body = req.body.as_ref().and_then(|b| b.as_text()).unwrap();
                let actual: serde_json::Value = serde_json::from_str(body).unwrap();
                let expected: serde_json::Value = serde_json::from_str(expected).unwrap();
                assert_eq!(actual, expected, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body"),
        }

        if let Some(headers) = expected_req["headers"].as_object() {
            for (header, value) in headers {
                assert_eq!(req.header(header), value.as_str(), "{name}: header {header}");
            }
        }
    }
}
