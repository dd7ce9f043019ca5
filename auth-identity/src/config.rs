use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub min_secret_length: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            min_secret_length: 8,
        }
    }
}
