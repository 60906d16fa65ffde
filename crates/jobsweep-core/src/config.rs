use crate::credentials::CredentialPool;
use crate::error::AppError;
use crate::models::Credential;

/// Primary credential variable.
pub const API_KEY_VAR: &str = "FIRECRAWL_API_KEY";

/// Comma-separated list of extra credentials.
pub const API_KEYS_VAR: &str = "FIRECRAWL_API_KEYS";

/// Highest numbered variable read (`FIRECRAWL_API_KEY_2` .. `_5`).
const MAX_NUMBERED_KEY: u32 = 5;

/// Read credentials from environment variables.
///
/// - `FIRECRAWL_API_KEY`
/// - `FIRECRAWL_API_KEY_2` .. `FIRECRAWL_API_KEY_5` (optional)
/// - `FIRECRAWL_API_KEYS` (optional, comma-separated)
///
/// Fails with a config error if none are set.
pub fn credentials_from_env() -> Result<CredentialPool, AppError> {
    credentials_from_lookup(|name| std::env::var(name).ok())
}

/// Same as [`credentials_from_env`] with an injectable variable lookup.
///
/// Blank values are skipped and repeated tokens keep their first position.
pub fn credentials_from_lookup<L>(lookup: L) -> Result<CredentialPool, AppError>
where
    L: Fn(&str) -> Option<String>,
{
    let mut tokens: Vec<String> = Vec::new();
    let mut push = |raw: &str| {
        let token = raw.trim();
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    };

    if let Some(key) = lookup(API_KEY_VAR) {
        push(&key);
    }
    for n in 2..=MAX_NUMBERED_KEY {
        if let Some(key) = lookup(&format!("{API_KEY_VAR}_{n}")) {
            push(&key);
        }
    }
    if let Some(list) = lookup(API_KEYS_VAR) {
        list.split(',').for_each(&mut push);
    }

    CredentialPool::new(tokens.into_iter().map(Credential::new).collect())
}
