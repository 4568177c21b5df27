// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log raw user/project ids instead of salted hashes
    pub enable_user_identifiers: bool,
    pub hash_salt: String,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            enable_user_identifiers: std::env::var("LOG_USER_IDENTIFIERS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            hash_salt: {
                let salt = std::env::var("LOG_HASH_SALT")
                    .unwrap_or_else(|_| "default-salt-please-change".to_string());
                if salt.is_empty() || salt == "default-salt-please-change" {
                    anyhow::bail!("LOG_HASH_SALT must be set to a unique, secret value");
                }
                salt
            },
        })
    }

    /// Renders an identifier for a log field, hashed unless raw ids are enabled
    pub fn id(&self, id: &impl ToString) -> String {
        let id = id.to_string();
        if self.enable_user_identifiers {
            id
        } else {
            crate::utils::log_safe_id(&id, &self.hash_salt)
        }
    }
}
