use serde::{Deserialize, Serialize};

use crate::domain::person::PersonId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub i64);

/// A group of people in one Slack channel who want to meet each other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    /// Human-readable name, like "2026 interns".
    pub name: String,
    /// Slack channel id, e.g. `C0123456789`.
    pub channel_id: String,
    /// Channel name as displayed, like "#interns-2026".
    pub channel_name: String,
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A person's membership in a pool, including availability for the active
/// round. `available = None` means we have not heard back yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMembership {
    pub person_id: PersonId,
    pub pool_id: PoolId,
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::{Pool, PoolId};

    #[test]
    fn display_uses_pool_name() {
        let pool = Pool {
            id: PoolId(1),
            name: "2026 interns".to_owned(),
            channel_id: "C1".to_owned(),
            channel_name: "#interns-2026".to_owned(),
        };
        assert_eq!(pool.to_string(), "2026 interns");
    }
}
