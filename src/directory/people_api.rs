//! HTTP/JSON [`DirectoryClient`] for a Google People style REST API.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ContactId, DirectoryClient, GroupMembers, PersonField, PersonRecord};
use crate::error::DirectoryError;

/// Per-request timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Production [`DirectoryClient`] backed by `reqwest`.
///
/// Authentication is the caller's concern: an already-issued OAuth access token
/// is sent as a bearer token on every request.
pub struct PeopleApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

impl PeopleApiClient {
    /// Public endpoint of the Google People API
    pub const DEFAULT_BASE_URL: &'static str = "https://people.googleapis.com/";

    /// Create a client for the public People API
    pub fn new(access_token: impl Into<String>) -> Result<Self, DirectoryError> {
        Self::with_base_url(Self::DEFAULT_BASE_URL, access_token)
    }

    /// Create a client for a People-compatible API rooted at `base_url`
    pub fn with_base_url(
        base_url: &str,
        access_token: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            DirectoryError::Other(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("directory-contacts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            access_token: access_token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base_url
            .join(path)
            .map_err(|e| DirectoryError::Other(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DirectoryError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl DirectoryClient for PeopleApiClient {
    async fn list_group_members(
        &self,
        group_id: &str,
        max_members: usize,
    ) -> Result<GroupMembers, DirectoryError> {
        let mut url = self.endpoint(&format!("v1/{}", group_id))?;
        url.query_pairs_mut()
            .append_pair("maxMembers", &max_members.to_string());

        let group: ContactGroupResponse = self.get_json(url).await?;

        Ok(GroupMembers {
            member_ids: group
                .member_resource_names
                .into_iter()
                .map(ContactId)
                .collect(),
            total_count: group.member_count,
        })
    }

    async fn batch_get_people(
        &self,
        ids: &[ContactId],
        fields: &[PersonField],
    ) -> Result<Vec<PersonRecord>, DirectoryError> {
        let mut url = self.endpoint("v1/people:batchGet")?;
        {
            let mut query = url.query_pairs_mut();
            for id in ids {
                query.append_pair("resourceNames", id.as_str());
            }
            let person_fields: Vec<&str> = fields.iter().map(PersonField::as_str).collect();
            query.append_pair("personFields", &person_fields.join(","));
        }

        let batch: BatchGetResponse = self.get_json(url).await?;

        Ok(batch
            .responses
            .into_iter()
            .filter_map(|r| match r.person {
                Some(person) => Some(person.into()),
                None => {
                    tracing::debug!(
                        requested = ?r.requested_resource_name,
                        "Batch-get entry returned no person"
                    );
                    None
                }
            })
            .collect())
    }
}

/// Pull the human-readable message out of a JSON error envelope, falling back to the raw body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactGroupResponse {
    #[serde(default)]
    member_resource_names: Vec<String>,
    #[serde(default)]
    member_count: usize,
}

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(default)]
    responses: Vec<PersonResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonResponse {
    #[serde(default)]
    requested_resource_name: Option<String>,
    #[serde(default)]
    person: Option<Person>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    names: Vec<Name>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Name {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<Person> for PersonRecord {
    fn from(person: Person) -> Self {
        Self {
            names: person.names.into_iter().map(|n| n.display_name).collect(),
            emails: person
                .email_addresses
                .into_iter()
                .map(|e| e.value)
                .collect(),
        }
    }
}
