use crate::error::AppError;
use crate::models::Credential;

/// Ordered, circular pool of interchangeable credentials.
///
/// Invariant: `index < credentials.len()` and the pool is never empty.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    index: usize,
}

impl CredentialPool {
    /// Build a pool, dropping blank tokens. Fails if nothing usable remains.
    pub fn new(credentials: Vec<Credential>) -> Result<Self, AppError> {
        let credentials: Vec<Credential> = credentials
            .into_iter()
            .filter(|c| !c.as_str().trim().is_empty())
            .collect();

        if credentials.is_empty() {
            return Err(AppError::ConfigError(
                "No credentials configured. Set FIRECRAWL_API_KEY (and optionally FIRECRAWL_API_KEY_2..5).".into(),
            ));
        }

        Ok(Self {
            credentials,
            index: 0,
        })
    }

    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(tokens.into_iter().map(Credential::new).collect())
    }

    pub fn current(&self) -> &Credential {
        &self.credentials[self.index]
    }

    /// Position of the current credential.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Advance to the next credential (wrapping) and return it.
    ///
    /// A single-credential pool rotates onto itself.
    pub fn rotate(&mut self) -> &Credential {
        self.index = (self.index + 1) % self.credentials.len();
        &self.credentials[self.index]
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
