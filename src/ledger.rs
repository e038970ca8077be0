use std::collections::HashSet;

/// Profile URLs already emitted during this session. Only an in-session
/// filter; the remote upsert still has to tolerate resubmissions.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        DedupLedger::default()
    }

    pub fn contains(&self, profile_url: &str) -> bool {
        self.seen.contains(profile_url)
    }

    /// Records `profile_url`. Returns `false` if it was already seen.
    pub fn insert(&mut self, profile_url: &str) -> bool {
        if self.seen.contains(profile_url) {
            return false;
        }
        self.seen.insert(profile_url.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_is_rejected() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger.insert("https://www.linkedin.com/in/a"));
        assert!(!ledger.insert("https://www.linkedin.com/in/a"));
        assert!(ledger.insert("https://www.linkedin.com/in/b"));
        assert!(ledger.contains("https://www.linkedin.com/in/a"));
        assert!(!ledger.contains("https://www.linkedin.com/in/c"));
        assert_eq!(ledger.len(), 2);
    }
}
