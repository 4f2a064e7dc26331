use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::{HttpUsersApi, UsersApi};
use crate::cache::{CacheClient, QueryCache};
use crate::clients::{UserClient, UsersQuery};
use crate::config::AppConfig;
use crate::error::{AdminError, AdminResult};
use crate::session::{FileStorage, Session, Storage};

const CACHE_BUFFER: usize = 32;

/// The running application: the query cache task plus the handles every page
/// view is composed from.
///
/// Responsible for starting the cache, wiring the client and session together,
/// and handling shutdown.
pub struct AdminSystem {
    pub user_client: UserClient,
    pub session: Session,
    pub login_redirect_delay: Duration,
    cache: CacheClient<UsersQuery>,
    handle: JoinHandle<()>,
}

impl AdminSystem {
    /// Production wiring: reqwest against the configured API, token in a file.
    pub async fn start(config: &AppConfig) -> AdminResult<Self> {
        let api = HttpUsersApi::new(&config.api)?;
        let storage = FileStorage::new(&config.storage_path);
        info!(
            api = %config.api.base_url,
            storage = %storage.path().display(),
            "Starting admin system"
        );
        Self::with_parts(Arc::new(api), Arc::new(storage), config.login_redirect_delay).await
    }

    pub async fn with_parts(
        api: Arc<dyn UsersApi>,
        storage: Arc<dyn Storage>,
        login_redirect_delay: Duration,
    ) -> AdminResult<Self> {
        let (cache_actor, cache) = QueryCache::<UsersQuery>::new(CACHE_BUFFER);
        let handle = tokio::spawn(cache_actor.run());

        let session = match Session::init(storage).await {
            Ok(session) => session,
            Err(e) => {
                // Nothing else holds the cache yet.
                handle.abort();
                return Err(e);
            }
        };
        let user_client = UserClient::new(api, cache.clone());

        Ok(Self {
            user_client,
            session,
            login_redirect_delay,
            cache,
            handle,
        })
    }

    pub async fn shutdown(self) -> AdminResult<()> {
        info!("Shutting down system...");
        self.cache.shutdown().await?;

        if let Err(e) = self.handle.await {
            error!("Cache task failed: {:?}", e);
            return Err(AdminError::CacheCommunication(format!("cache task failed: {}", e)));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
