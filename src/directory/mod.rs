//! Remote directory abstraction with identifiers, person records and the client trait.
//!
//! The fetcher talks to the directory only through [`DirectoryClient`], so tests
//! can script responses and production code can use [`PeopleApiClient`].

mod people_api;

pub use people_api::PeopleApiClient;

use crate::error::DirectoryError;
use serde::{Deserialize, Serialize};

/// Opaque resource name identifying one directory entry (e.g. "people/c123")
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl ContactId {
    /// Borrow the underlying resource name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContactId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names and email addresses of a single person, in directory order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonRecord {
    /// Display names; only the first is used for formatting
    pub names: Vec<String>,
    /// Email addresses
    pub emails: Vec<String>,
}

impl PersonRecord {
    /// First listed display name, or "" when the person has none
    pub fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }
}

/// Result of a group member listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupMembers {
    /// Member IDs returned, capped by the requested maximum
    pub member_ids: Vec<ContactId>,
    /// Total members the directory reports for the group
    pub total_count: usize,
}

/// Person fields that can be requested from a batch-get
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersonField {
    /// Display names
    Names,
    /// Email addresses
    EmailAddresses,
}

impl PersonField {
    /// Field name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonField::Names => "names",
            PersonField::EmailAddresses => "emailAddresses",
        }
    }
}

/// Fields needed to build formatted addresses
pub const CONTACT_FIELDS: &[PersonField] = &[PersonField::Names, PersonField::EmailAddresses];

/// Abstraction over the remote directory, enabling testability.
///
/// Implementations do not need to handle cancellation: callers race every
/// call against their cancellation token and drop the future when it fires.
#[async_trait::async_trait]
pub trait DirectoryClient: Send + Sync {
    /// List the member IDs of `group_id`, returning at most `max_members` of them
    async fn list_group_members(
        &self,
        group_id: &str,
        max_members: usize,
    ) -> Result<GroupMembers, DirectoryError>;

    /// Fetch the requested fields for every ID in `ids` in a single call
    async fn batch_get_people(
        &self,
        ids: &[ContactId],
        fields: &[PersonField],
    ) -> Result<Vec<PersonRecord>, DirectoryError>;
}
