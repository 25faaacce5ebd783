//! Partner directory: who is talking to whom.

use std::collections::HashMap;

/// The other side of a pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartnerRef {
    /// A real client, by connection handle.
    Human(String),
    /// The fallback bot.
    Bot,
}

/// Symmetric pairing table. A human pairing {a, b} is two entries a→b and
/// b→a; a bot pairing is a single entry h→Bot. All mutation here is atomic
/// with respect to both entries, so the symmetry invariant holds at every
/// quiescent point.
#[derive(Debug, Default)]
pub struct PartnerDirectory {
    entries: HashMap<String, PartnerRef>,
}

impl PartnerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partner_of(&self, conn_id: &str) -> Option<&PartnerRef> {
        self.entries.get(conn_id)
    }

    pub fn is_paired(&self, conn_id: &str) -> bool {
        self.entries.contains_key(conn_id)
    }

    /// Record a human pairing {a, b}, inserting both entries.
    /// Caller must ensure neither side already has an entry and a != b.
    pub fn pair_humans(&mut self, a: &str, b: &str) {
        debug_assert!(a != b);
        debug_assert!(!self.entries.contains_key(a) && !self.entries.contains_key(b));
        self.entries.insert(a.to_string(), PartnerRef::Human(b.to_string()));
        self.entries.insert(b.to_string(), PartnerRef::Human(a.to_string()));
    }

    /// Record a bot pairing for `conn_id`.
    pub fn pair_bot(&mut self, conn_id: &str) {
        debug_assert!(!self.entries.contains_key(conn_id));
        self.entries.insert(conn_id.to_string(), PartnerRef::Bot);
    }

    /// Remove `conn_id`'s pairing, both entries at once for a human pair.
    /// Returns what `conn_id` was paired with, if anything.
    pub fn unpair(&mut self, conn_id: &str) -> Option<PartnerRef> {
        let partner = self.entries.remove(conn_id)?;
        if let PartnerRef::Human(other) = &partner {
            self.entries.remove(other);
        }
        Some(partner)
    }

    /// Number of active pairings (a human pair counts once).
    pub fn pairing_count(&self) -> usize {
        let humans = self
            .entries
            .values()
            .filter(|p| matches!(p, PartnerRef::Human(_)))
            .count();
        let bots = self.entries.len() - humans;
        humans / 2 + bots
    }

    /// Symmetry check: every human entry has a matching back-entry.
    /// Used by tests and debug assertions.
    pub fn is_symmetric(&self) -> bool {
        self.entries.iter().all(|(id, partner)| match partner {
            PartnerRef::Bot => true,
            PartnerRef::Human(other) => {
                self.entries.get(other) == Some(&PartnerRef::Human(id.clone()))
            },
        })
    }
}
