use std::sync::Arc;

use quick_cache::sync::Cache;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{ActiveNetClient, ClientConfig};
use crate::error::Result;

/// Visitor sessions, each owning its own upstream client. The store is
/// bounded; the least recently used sessions are evicted first.
pub struct SessionManager {
    sessions: Cache<String, Arc<ActiveNetClient>>,
    config: Arc<ClientConfig>,
}

impl SessionManager {
    pub fn new(config: ClientConfig, capacity: usize) -> Self {
        Self {
            sessions: Cache::new(capacity),
            config: Arc::new(config),
        }
    }

    /// Opens a new session. A failed bootstrap against the upstream sign-in
    /// page is logged and otherwise ignored.
    pub async fn create_session(&self) -> Result<(String, Arc<ActiveNetClient>)> {
        let id = Uuid::new_v4().simple().to_string();
        let client = Arc::new(ActiveNetClient::new(Arc::clone(&self.config))?);

        if let Err(err) = client.bootstrap().await {
            warn!(session = short(&id), error = %err, "failed to bootstrap upstream session");
        }

        self.sessions.insert(id.clone(), Arc::clone(&client));
        info!(session = short(&id), "created session");

        Ok((id, client))
    }

    pub fn client(&self, id: &str) -> Option<Arc<ActiveNetClient>> {
        self.sessions.get(id)
    }

    pub async fn destroy_session(&self, id: &str) {
        let Some(client) = self.sessions.get(id) else {
            return;
        };

        client.logout().await;
        self.sessions.remove(id);
        debug!(session = short(id), "destroyed session");
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(capacity: usize) -> SessionManager {
        // Nothing listens here; bootstrap fails fast and is tolerated.
        SessionManager::new(ClientConfig::new("http://127.0.0.1:9/rest"), capacity)
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let sessions = manager(16);
        assert!(sessions.is_empty());

        let (id, client) = sessions.create_session().await.unwrap();
        assert_eq!(id.len(), 32);
        assert!(!client.is_authenticated().await);

        let found = sessions.client(&id).unwrap();
        assert!(Arc::ptr_eq(&found, &client));
        assert!(sessions.client("unknown").is_none());
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_distinct() {
        let sessions = manager(16);
        let (first, _) = sessions.create_session().await.unwrap();
        let (second, _) = sessions.create_session().await.unwrap();

        assert_ne!(first, second);
        assert!(!Arc::ptr_eq(
            &sessions.client(&first).unwrap(),
            &sessions.client(&second).unwrap()
        ));
    }

    #[tokio::test]
    async fn destroy() {
        let sessions = manager(16);
        let (id, _) = sessions.create_session().await.unwrap();

        sessions.destroy_session(&id).await;
        assert!(sessions.client(&id).is_none());

        sessions.destroy_session("already-gone").await;
    }
}
