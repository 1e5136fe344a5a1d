//! Sender allowlist.

/// Sorted set of Telegram user ids allowed to use the bot.
///
/// An empty allowlist admits everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    ids: Vec<u64>,
}

impl Allowlist {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut ids: Vec<u64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    /// Check whether `id` may talk to the bot.
    pub fn contains(&self, id: u64) -> bool {
        self.ids.is_empty() || self.ids.binary_search(&id).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
