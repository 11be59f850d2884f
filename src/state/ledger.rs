use crate::types::{AnswerEntry, Username};
use std::collections::HashMap;

/// Answers for the current round, in first-answer order
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<(Username, AnswerEntry)>,
    index: HashMap<Username, usize>,
}

impl Ledger {
    pub fn get(&self, username: &str) -> Option<&AnswerEntry> {
        self.index.get(username).map(|&i| &self.entries[i].1)
    }

    /// Insert a first answer or replace an existing one in place
    pub fn upsert(&mut self, username: &str, entry: AnswerEntry) {
        match self.index.get(username) {
            Some(&i) => self.entries[i].1 = entry,
            None => {
                self.index.insert(username.to_string(), self.entries.len());
                self.entries.push((username.to_string(), entry));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Username, &AnswerEntry)> {
        self.entries.iter().map(|(u, e)| (u, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(choice_index: usize) -> AnswerEntry {
        AnswerEntry {
            answered_at: Utc::now(),
            choice_index,
            wager: 10,
            award: 0,
            correct: false,
            display_name: String::new(),
        }
    }

    #[test]
    fn test_upsert_keeps_first_answer_order() {
        let mut ledger = Ledger::default();
        ledger.upsert("carol", entry(0));
        ledger.upsert("alice", entry(1));
        ledger.upsert("carol", entry(2));

        let order: Vec<_> = ledger.iter().map(|(u, e)| (u.as_str(), e.choice_index)).collect();
        assert_eq!(order, vec![("carol", 2), ("alice", 1)]);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("carol").unwrap().choice_index, 2);
    }

    #[test]
    fn test_clear() {
        let mut ledger = Ledger::default();
        ledger.upsert("alice", entry(0));
        ledger.clear();
        assert!(ledger.is_empty());
        assert!(ledger.get("alice").is_none());
    }
}
