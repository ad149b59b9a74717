use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Logical timestamp for one sync run.
///
/// Every write issued during a run is stamped with the run's tag, and the
/// cleanup sweep removes scoped entities whose tag differs from it.
/// Staleness detection relies on tags increasing across real runs, which
/// the default Unix-time source provides but nothing enforces.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct UpdateTag(pub i64);

impl UpdateTag {
    /// Tag derived from the current wall clock, the production default.
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UpdateTag {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for UpdateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_tracks_wall_clock() {
        let before = Utc::now().timestamp();
        let tag = UpdateTag::now();
        let after = Utc::now().timestamp();
        assert!(tag.as_i64() >= before);
        assert!(tag.as_i64() <= after);
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(UpdateTag(2) > UpdateTag(1));
        assert_eq!(UpdateTag::from(7), UpdateTag(7));
    }
}
