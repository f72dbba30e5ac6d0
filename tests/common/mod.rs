//! Common test utilities for directory-contacts integration tests

#![allow(dead_code)]

use std::time::Duration;

use directory_contacts::{ContactsConfig, PeopleApiClient, QuotaRetryConfig};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Display name and email of the numbered test person `i`.
pub fn numbered_person(i: usize) -> (String, String) {
    (format!("Person {i:04}"), format!("p{i}@example.com"))
}

/// Answers `people:batchGet` for numbered people, echoing whatever IDs were requested.
pub struct NumberedPeople;

impl Respond for NumberedPeople {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let responses: Vec<Value> = request
            .url
            .query_pairs()
            .filter(|(key, _)| key == "resourceNames")
            .map(|(_, name)| {
                let index: usize = name
                    .trim_start_matches("people/c")
                    .parse()
                    .unwrap_or_default();
                let (display_name, email) = numbered_person(index);
                json!({
                    "requestedResourceName": name,
                    "person": {
                        "resourceName": name,
                        "names": [{ "displayName": display_name }],
                        "emailAddresses": [{ "value": email }]
                    }
                })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "responses": responses }))
    }
}

/// Mount a `contactGroups/all` listing with `count` numbered members.
pub async fn mount_group(server: &MockServer, count: usize) {
    let names: Vec<String> = (0..count).map(|i| format!("people/c{i}")).collect();
    Mock::given(method("GET"))
        .and(path("/v1/contactGroups/all"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceName": "contactGroups/all",
            "memberResourceNames": names,
            "memberCount": count
        })))
        .mount(server)
        .await;
}

/// Mount a batch-get endpoint that serves numbered people.
pub async fn mount_people(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/people:batchGet"))
        .respond_with(NumberedPeople)
        .mount(server)
        .await;
}

/// Google-style JSON error body
pub fn error_body(code: u16, message: &str, status: &str) -> Value {
    json!({ "error": { "code": code, "message": message, "status": status } })
}

pub fn client(server: &MockServer) -> PeopleApiClient {
    PeopleApiClient::with_base_url(&server.uri(), TOKEN).expect("client")
}

/// Default config with retry delays short enough for tests
pub fn fast_config() -> ContactsConfig {
    ContactsConfig {
        retry: QuotaRetryConfig {
            max_attempts: Some(5),
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..ContactsConfig::default()
    }
}
