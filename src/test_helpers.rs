//! Scripted directory client shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::directory::{ContactId, DirectoryClient, GroupMembers, PersonField, PersonRecord};
use crate::error::DirectoryError;

/// Build a person with one display name (or none when `name` is empty).
pub(crate) fn person(name: &str, emails: &[&str]) -> PersonRecord {
    PersonRecord {
        names: if name.is_empty() {
            vec![]
        } else {
            vec![name.to_string()]
        },
        emails: emails.iter().map(|e| e.to_string()).collect(),
    }
}

/// In-memory [`DirectoryClient`] with per-batch scripted failures.
///
/// Batches are identified by their first contact ID. Queued failures for a
/// batch are returned one per call before the batch succeeds.
pub(crate) struct ScriptedDirectory {
    members: Vec<ContactId>,
    total_count: usize,
    listing_error: Mutex<Option<String>>,
    people: HashMap<ContactId, PersonRecord>,
    failures: Mutex<HashMap<ContactId, VecDeque<String>>>,
    always_fail: HashMap<ContactId, String>,
    panic_on: Option<ContactId>,
    hang_on: Mutex<Option<ContactId>>,
    call_delay: Duration,
    batch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested_batches: Mutex<Vec<Vec<ContactId>>>,
}

impl ScriptedDirectory {
    /// Directory whose group contains `people` in order, keyed "people/c{index}".
    pub(crate) fn with_people(people: Vec<PersonRecord>) -> Self {
        let members: Vec<ContactId> = (0..people.len())
            .map(|i| ContactId(format!("people/c{i}")))
            .collect();
        let people = members.iter().cloned().zip(people).collect();
        Self {
            total_count: members.len(),
            members,
            listing_error: Mutex::new(None),
            people,
            failures: Mutex::new(HashMap::new()),
            always_fail: HashMap::new(),
            panic_on: None,
            hang_on: Mutex::new(None),
            call_delay: Duration::ZERO,
            batch_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requested_batches: Mutex::new(Vec::new()),
        }
    }

    /// Directory with `count` people named "Person{i}" at "p{i}@x.com".
    pub(crate) fn numbered(count: usize) -> Self {
        Self::with_people(
            (0..count)
                .map(|i| person(&format!("Person{i}"), &[&format!("p{i}@x.com")]))
                .collect(),
        )
    }

    pub(crate) fn listing_fails(self, message: &str) -> Self {
        self.break_listing(message);
        self
    }

    /// Make every later group listing fail with `message`.
    pub(crate) fn break_listing(&self, message: &str) {
        *self.listing_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn reported_total(mut self, total: usize) -> Self {
        self.total_count = total;
        self
    }

    /// Queue `messages` as errors for the batch starting at member `first_index`.
    pub(crate) fn fail_batch_times(self, first_index: usize, messages: &[&str]) -> Self {
        let id = self.members[first_index].clone();
        self.failures
            .lock()
            .unwrap()
            .insert(id, messages.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Fail every call for the batch starting at member `first_index`.
    pub(crate) fn fail_batch_always(mut self, first_index: usize, message: &str) -> Self {
        let id = self.members[first_index].clone();
        self.always_fail.insert(id, message.to_string());
        self
    }

    pub(crate) fn panic_on_batch(mut self, first_index: usize) -> Self {
        self.panic_on = Some(self.members[first_index].clone());
        self
    }

    pub(crate) fn hang_on_batch(self, first_index: usize) -> Self {
        self.hang_batch(first_index);
        self
    }

    /// Never answer later calls for the batch starting at member `first_index`.
    pub(crate) fn hang_batch(&self, first_index: usize) {
        *self.hang_on.lock().unwrap() = Some(self.members[first_index].clone());
    }

    pub(crate) fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    pub(crate) fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn requested_batches(&self) -> Vec<Vec<ContactId>> {
        self.requested_batches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DirectoryClient for ScriptedDirectory {
    async fn list_group_members(
        &self,
        _group_id: &str,
        max_members: usize,
    ) -> Result<GroupMembers, DirectoryError> {
        let listing_error = self.listing_error.lock().unwrap().clone();
        if let Some(message) = listing_error {
            return Err(DirectoryError::Other(message));
        }
        Ok(GroupMembers {
            member_ids: self.members.iter().take(max_members).cloned().collect(),
            total_count: self.total_count,
        })
    }

    async fn batch_get_people(
        &self,
        ids: &[ContactId],
        _fields: &[PersonField],
    ) -> Result<Vec<PersonRecord>, DirectoryError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_batches.lock().unwrap().push(ids.to_vec());

        let Some(first) = ids.first() else {
            return Ok(vec![]);
        };

        if self.panic_on.as_ref() == Some(first) {
            panic!("scripted panic for {first}");
        }
        let hangs = self.hang_on.lock().unwrap().as_ref() == Some(first);
        if hangs {
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = self.always_fail.get(first) {
            return Err(DirectoryError::Other(message.clone()));
        }
        let queued = self
            .failures
            .lock()
            .unwrap()
            .get_mut(first)
            .and_then(VecDeque::pop_front);
        if let Some(message) = queued {
            return Err(DirectoryError::Other(message));
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.people.get(id).cloned())
            .collect())
    }
}
