use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: Option<String>,
    pub user: Option<UserIdentity>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UserIdentity {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Credentials {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty()) && self.user.is_some()
    }
}

/// Holds the token and user record the API client and views read from.
///
/// The store only ever reads the backing file, it never writes or refreshes a token.
pub struct CredentialStore {
    path: Option<PathBuf>,
    current: ArcSwap<Credentials>,
}

impl CredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            path: None,
            current: ArcSwap::from_pointee(credentials),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(Credentials::default())
    }

    pub async fn from_file(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            path: Some(path.into()),
            current: ArcSwap::from_pointee(Credentials::default()),
        };
        store.reload().await;
        store
    }

    /// Re-reads the backing file. A missing or broken file leaves the session anonymous.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&self) {
        let path = match &self.path {
            Some(p) => p,
            None => return,
        };

        let credentials = match tokio::fs::read(path).await {
            Ok(raw) => match serde_json::from_slice::<Credentials>(&raw) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Parsing Credentials {:?}", e);
                    Credentials::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(?path, "No credentials file, browsing anonymously");
                Credentials::default()
            }
            Err(e) => {
                tracing::error!("Reading Credentials {:?}", e);
                Credentials::default()
            }
        };

        tracing::info!(authenticated = credentials.is_authenticated(), "Loaded credentials");
        self.current.store(Arc::new(credentials));
    }

    pub fn current(&self) -> Arc<Credentials> {
        self.current.load_full()
    }

    pub fn token(&self) -> Option<String> {
        self.current.load().access_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_authenticated()
    }

    pub fn user_name(&self) -> Option<String> {
        self.current.load().user.as_ref().map(|u| u.name.clone())
    }
}
