use crate::{MAX_TRANSACTION_RETRIES, StoreError, TallyStore, TallySubscription, TallyUpdate};
use async_trait::async_trait;
use domain::VoteTally;
use std::sync::Mutex;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default)]
struct Versioned {
    version: u64,
    record: Option<VoteTally>,
}

/// In-memory implementation of the TallyStore trait
///
/// Every commit bumps a version counter; a transaction only lands when the
/// version it read is still current, mirroring a remote compare-and-set.
pub struct InMemoryTallyStore {
    state: Mutex<Versioned>,
    notify: watch::Sender<Option<VoteTally>>,
    max_retries: usize,
}

impl InMemoryTallyStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (notify, _) = watch::channel(None);
        Self {
            state: Mutex::new(Versioned::default()),
            notify,
            max_retries: MAX_TRANSACTION_RETRIES,
        }
    }

    /// Start from an existing record
    pub fn with_record(self, record: VoteTally) -> Self {
        self.replace(Some(record));
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Overwrite the record, bypassing the transaction protocol
    pub fn replace(&self, record: Option<VoteTally>) {
        let mut state = self.state.lock().expect("Failed to acquire tally lock");
        state.version += 1;
        state.record = record;
        self.notify.send_replace(record);
    }

    fn snapshot(&self) -> Versioned {
        *self.state.lock().expect("Failed to acquire tally lock")
    }

    /// Commit `record` if nobody wrote since `version` was read
    fn compare_and_set(&self, version: u64, record: VoteTally) -> bool {
        let mut state = self.state.lock().expect("Failed to acquire tally lock");
        if state.version != version {
            return false;
        }
        state.version += 1;
        state.record = Some(record);
        self.notify.send_replace(Some(record));
        true
    }
}

impl Default for InMemoryTallyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TallyStore for InMemoryTallyStore {
    async fn read(&self) -> Result<Option<VoteTally>, StoreError> {
        Ok(self.snapshot().record)
    }

    async fn transaction(&self, update: &TallyUpdate) -> Result<VoteTally, StoreError> {
        for attempt in 1..=self.max_retries {
            let Versioned { version, record } = self.snapshot();
            let next = update(record.as_ref());

            // stands in for the network round trip between read and write
            tokio::task::yield_now().await;

            if self.compare_and_set(version, next) {
                return Ok(next);
            }
            tracing::debug!(attempt, "tally transaction conflicted, retrying");
        }
        Err(StoreError::TooManyRetries(self.max_retries))
    }

    fn subscribe(&self) -> TallySubscription {
        TallySubscription::new(self.notify.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::VoteOption;
    use std::sync::Arc;

    fn vote(option: VoteOption) -> impl Fn(Option<&VoteTally>) -> VoteTally + Send + Sync {
        move |current| VoteTally::apply_vote(current, option)
    }

    #[tokio::test]
    async fn first_vote_creates_record_and_second_increments() {
        let store = InMemoryTallyStore::new();
        assert_eq!(store.read().await.unwrap(), None);

        let tally = store.transaction(&vote(VoteOption::First)).await.unwrap();
        assert_eq!(
            tally,
            VoteTally {
                votes1: 1,
                votes2: 0,
                active: true
            }
        );

        let tally = store.transaction(&vote(VoteOption::Second)).await.unwrap();
        assert_eq!((tally.votes1, tally.votes2), (1, 1));
        assert_eq!(store.read().await.unwrap(), Some(tally));
    }

    #[tokio::test]
    async fn concurrent_votes_are_never_lost() {
        let store = Arc::new(InMemoryTallyStore::new().with_max_retries(100));
        let mut handles = Vec::new();
        for i in 0..40 {
            let store = store.clone();
            let option = if i % 3 == 0 {
                VoteOption::First
            } else {
                VoteOption::Second
            };
            handles.push(tokio::spawn(async move {
                store.transaction(&vote(option)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let tally = store.read().await.unwrap().unwrap();
        assert_eq!(tally.votes1, 14);
        assert_eq!(tally.votes2, 26);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn total_matches_committed_votes_when_retries_run_out() {
        let store = Arc::new(InMemoryTallyStore::new().with_max_retries(2));
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            let option = VoteOption::from_index(i % 2).unwrap();
            handles.push(tokio::spawn(async move {
                store.transaction(&vote(option)).await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(StoreError::TooManyRetries(2)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let total = store.read().await.unwrap().map(|t| t.total()).unwrap_or(0);
        assert!(committed > 0);
        assert_eq!(total, committed);
    }

    #[tokio::test]
    async fn subscribers_see_every_commit() {
        let store = InMemoryTallyStore::new();
        let mut subscription = store.subscribe();
        assert_eq!(subscription.current(), None);

        store.transaction(&vote(VoteOption::Second)).await.unwrap();
        let seen = subscription.changed().await.unwrap().unwrap();
        assert_eq!((seen.votes1, seen.votes2), (0, 1));
    }

    #[tokio::test]
    async fn existing_fields_survive_a_vote() {
        let store = InMemoryTallyStore::new().with_record(VoteTally {
            votes1: 4,
            votes2: 9,
            active: false,
        });
        let tally = store.transaction(&vote(VoteOption::First)).await.unwrap();
        assert_eq!(
            tally,
            VoteTally {
                votes1: 5,
                votes2: 9,
                active: false
            }
        );
    }
}
