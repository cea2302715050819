//! # Record Identifiers
//!
//! Ids are assigned by the store, never by the caller. Each id is the
//! creation timestamp in milliseconds followed by a random suffix, which keeps
//! ids roughly time-ordered while making collisions within the same
//! millisecond practically impossible.
//!
//! ```text
//! 1767225600000 k3f9a0c2e
//! └─── ms ────┘ └suffix─┘
//! ```

use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix appended to the timestamp.
const SUFFIX_LEN: usize = 9;

/// Generates a new record id.
pub fn generate_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", Utc::now().timestamp_millis(), &suffix[..SUFFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_in_a_burst() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_id_starts_with_timestamp() {
        let before = Utc::now().timestamp_millis();
        let id = generate_id();
        let ts: i64 = id[..id.len() - SUFFIX_LEN].parse().unwrap();
        assert!(ts >= before);
    }
}
