use domain::{LocalVoteState, VoteOption};
use std::collections::HashMap;

/// Key marking that this client already voted ("true" when set)
pub const HAS_VOTED_KEY: &str = "hasVoted";

/// Key holding the index of the option this client voted for
pub const VOTED_FOR_KEY: &str = "votedFor";

/// Client-local persisted key/value pairs, shaped after browser local storage
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: &str);
}

/// Storage that lives only as long as the value
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }
}

/// Remembers whether this client has voted.
///
/// The marker never expires and is never cleared here; a client that wipes
/// its storage can vote again.
#[derive(Debug, Clone, Default)]
pub struct VoteGuard<S> {
    storage: S,
}

impl<S: LocalStorage> VoteGuard<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn has_voted(&self) -> bool {
        self.storage
            .get_item(HAS_VOTED_KEY)
            .is_some_and(|value| !value.is_empty())
    }

    pub fn voted_for(&self) -> Option<VoteOption> {
        let raw = self.storage.get_item(VOTED_FOR_KEY)?;
        let parsed = raw.trim().parse::<usize>().ok().and_then(VoteOption::from_index);
        if parsed.is_none() {
            tracing::debug!(value = %raw, "ignoring unreadable votedFor marker");
        }
        parsed
    }

    pub fn state(&self) -> LocalVoteState {
        LocalVoteState {
            has_voted: self.has_voted(),
            voted_for: self.voted_for(),
        }
    }

    /// Persist a committed vote
    pub fn record(&mut self, option: VoteOption) {
        self.storage.set_item(HAS_VOTED_KEY, "true");
        self.storage
            .set_item(VOTED_FOR_KEY, &option.index().to_string());
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_guard_has_not_voted() {
        let guard = VoteGuard::new(MemoryStorage::new());
        assert_eq!(guard.state(), LocalVoteState::default());
    }

    #[test]
    fn record_persists_both_keys() {
        let mut guard = VoteGuard::new(MemoryStorage::new());
        guard.record(VoteOption::Second);

        assert!(guard.has_voted());
        assert_eq!(guard.voted_for(), Some(VoteOption::Second));
        let storage = guard.into_storage();
        assert_eq!(storage.get_item(HAS_VOTED_KEY).as_deref(), Some("true"));
        assert_eq!(storage.get_item(VOTED_FOR_KEY).as_deref(), Some("1"));
    }

    #[test]
    fn state_is_read_back_from_existing_storage() {
        let mut storage = MemoryStorage::new();
        storage.set_item(HAS_VOTED_KEY, "true");
        storage.set_item(VOTED_FOR_KEY, "0");

        let guard = VoteGuard::new(storage);
        assert_eq!(
            guard.state(),
            LocalVoteState {
                has_voted: true,
                voted_for: Some(VoteOption::First),
            }
        );
    }

    #[test]
    fn garbage_choice_still_counts_as_voted() {
        let mut storage = MemoryStorage::new();
        storage.set_item(HAS_VOTED_KEY, "yes");
        storage.set_item(VOTED_FOR_KEY, "7");

        let guard = VoteGuard::new(storage);
        assert!(guard.has_voted());
        assert_eq!(guard.voted_for(), None);
    }
}
