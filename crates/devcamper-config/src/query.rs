use crate::env_or;

/// Page sizes for list endpoints.
///
/// `QUERY_MAX_LIMIT=0` disables the cap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    pub default_limit: u64,
    pub max_limit: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: Some(100),
        }
    }
}

impl QueryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_limit = env_or("QUERY_MAX_LIMIT", 100u64);

        Self {
            default_limit: env_or("QUERY_DEFAULT_LIMIT", defaults.default_limit).max(1),
            max_limit: (max_limit > 0).then_some(max_limit),
        }
    }
}
