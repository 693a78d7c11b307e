// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session selection criteria.

use vellum::store::SessionEntry;
use vellum::{Guid, Timestamp};

/// Which recorded sessions a packaging run includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCriteria {
    /// Every session in the directory.
    All,
    /// The single session with this identity.
    Session(Guid),
    /// Sessions that started before the cutoff.
    StartedBefore(Timestamp),
}

impl SessionCriteria {
    pub fn matches(&self, entry: &SessionEntry) -> bool {
        match self {
            SessionCriteria::All => true,
            SessionCriteria::Session(id) => entry.session_id == *id,
            SessionCriteria::StartedBefore(cutoff) => entry.started < *cutoff,
        }
    }
}

impl Default for SessionCriteria {
    fn default() -> Self {
        SessionCriteria::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: Guid, ticks: i64) -> SessionEntry {
        SessionEntry {
            session_id: id,
            started: Timestamp::from_ticks(ticks),
            fragments: Vec::new(),
            total_bytes: 0,
        }
    }

    #[test]
    fn test_all_matches_everything() {
        assert!(SessionCriteria::All.matches(&entry(Guid::generate(), 0)));
    }

    #[test]
    fn test_by_session_id() {
        let wanted = Guid::generate();
        let criteria = SessionCriteria::Session(wanted);
        assert!(criteria.matches(&entry(wanted, 0)));
        assert!(!criteria.matches(&entry(Guid::generate(), 0)));
    }

    #[test]
    fn test_started_before() {
        let criteria = SessionCriteria::StartedBefore(Timestamp::from_ticks(100));
        assert!(criteria.matches(&entry(Guid::generate(), 99)));
        assert!(!criteria.matches(&entry(Guid::generate(), 100)));
    }
}
