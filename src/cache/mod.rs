//! # Query Cache
//!
//! A tag-aware response cache run as an actor. Views read through it, mutations
//! invalidate it, and subscribers hear about every invalidation of the tags
//! they care about.
//!
//! - **Service** ([`QueryCache`]) owns the entries and runs the receive loop.
//! - **Client** ([`CacheClient`]) is the cloneable handle everyone else holds.
//! - **Subscription** is the observer side: a view subscribes to a [`Tag`] and
//!   re-runs its fetch when [`Subscription::changed`] fires.
//!
//! Every invalidation bumps a generation counter. A miss hands the caller the
//! current generation, and a later `put` carrying an older generation than the
//! tag's last invalidation is dropped, so a fetch that raced a mutation cannot
//! put pre-mutation data back into the cache.

mod subscription;

pub use subscription::Subscription;

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::error::{AdminError, AdminResult};

const INVALIDATION_BUFFER: usize = 64;

/// Label attached to cached query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Users,
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Users => write!(f, "Users"),
        }
    }
}

/// Trait that any cacheable query key must implement.
pub trait Query: Clone + Eq + Hash + Send + Sync + Debug + 'static {
    type Output: Clone + Send + Sync + Debug + 'static;

    /// Tags this query's result is filed under.
    fn tags(&self) -> Vec<Tag>;
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Hit(T),
    /// Nothing fresh cached; `generation` must accompany the follow-up `put`.
    Miss { generation: u64 },
}

pub type Response<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum CacheRequest<Q: Query> {
    Get {
        query: Q,
        respond_to: Response<Lookup<Q::Output>>,
    },
    Put {
        query: Q,
        value: Q::Output,
        generation: u64,
        respond_to: Response<bool>,
    },
    Invalidate {
        tag: Tag,
        respond_to: Response<usize>,
    },
    Subscribe {
        tag: Tag,
        respond_to: Response<Subscription>,
    },
    Generation {
        respond_to: Response<u64>,
    },
    Shutdown,
    #[cfg(test)]
    EntryCount {
        respond_to: Response<usize>,
    },
}

struct Entry<T> {
    value: T,
    tags: Vec<Tag>,
}

pub struct QueryCache<Q: Query> {
    receiver: mpsc::Receiver<CacheRequest<Q>>,
    entries: HashMap<Q, Entry<Q::Output>>,
    generation: u64,
    invalidated_at: HashMap<Tag, u64>,
    invalidations: broadcast::Sender<Tag>,
}

impl<Q: Query> QueryCache<Q> {
    pub fn new(buffer_size: usize) -> (Self, CacheClient<Q>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (invalidations, _) = broadcast::channel(INVALIDATION_BUFFER);
        let cache = Self {
            receiver,
            entries: HashMap::new(),
            generation: 0,
            invalidated_at: HashMap::new(),
            invalidations,
        };
        (cache, CacheClient::new(sender))
    }

    #[instrument(name = "query_cache", skip(self))]
    pub async fn run(mut self) {
        info!("QueryCache starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::Get { query, respond_to } => {
                    self.handle_get(query, respond_to);
                }
                CacheRequest::Put {
                    query,
                    value,
                    generation,
                    respond_to,
                } => {
                    self.handle_put(query, value, generation, respond_to);
                }
                CacheRequest::Invalidate { tag, respond_to } => {
                    self.handle_invalidate(tag, respond_to);
                }
                CacheRequest::Subscribe { tag, respond_to } => {
                    debug!(%tag, "New subscriber");
                    let _ = respond_to.send(Subscription::new(tag, self.invalidations.subscribe()));
                }
                CacheRequest::Generation { respond_to } => {
                    let _ = respond_to.send(self.generation);
                }
                CacheRequest::Shutdown => {
                    info!("QueryCache shutting down");
                    break;
                }
                #[cfg(test)]
                CacheRequest::EntryCount { respond_to } => {
                    let _ = respond_to.send(self.entries.len());
                }
            }
        }

        info!("QueryCache stopped");
    }

    #[instrument(skip(self, respond_to))]
    fn handle_get(&self, query: Q, respond_to: Response<Lookup<Q::Output>>) {
        let lookup = match self.entries.get(&query) {
            Some(entry) => {
                debug!("Cache hit");
                Lookup::Hit(entry.value.clone())
            }
            None => {
                debug!(generation = self.generation, "Cache miss");
                Lookup::Miss {
                    generation: self.generation,
                }
            }
        };
        let _ = respond_to.send(lookup);
    }

    #[instrument(skip(self, value, respond_to))]
    fn handle_put(&mut self, query: Q, value: Q::Output, generation: u64, respond_to: Response<bool>) {
        let tags = query.tags();
        let superseded = tags
            .iter()
            .any(|tag| self.invalidated_at.get(tag).is_some_and(|at| *at > generation));

        if superseded {
            warn!("Discarding result fetched before the latest invalidation");
            let _ = respond_to.send(false);
            return;
        }

        self.entries.insert(query, Entry { value, tags });
        debug!(entry_count = self.entries.len(), "Result cached");
        let _ = respond_to.send(true);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_invalidate(&mut self, tag: Tag, respond_to: Response<usize>) {
        self.generation += 1;
        self.invalidated_at.insert(tag, self.generation);

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.tags.contains(&tag));
        let dropped = before - self.entries.len();

        // No receivers is fine: nobody is mounted.
        let subscribers = self.invalidations.send(tag).unwrap_or(0);
        info!(dropped, subscribers, generation = self.generation, "Tag invalidated");

        let _ = respond_to.send(dropped);
    }
}

/// Generate cache client methods with oneshot channel boilerplate and tracing.
macro_rules! cache_method {
    (fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $variant:ident) => {
        #[instrument(skip(self), level = "debug")]
        pub async fn $method(&self, $($param: $param_type),*) -> AdminResult<$return_type> {
            debug!("Sending request");
            let (respond_to, response) = oneshot::channel();
            self.sender
                .send(CacheRequest::$variant {
                    $($param,)*
                    respond_to,
                })
                .await
                .map_err(|_| AdminError::CacheCommunication("Cache closed".to_string()))?;
            response
                .await
                .map_err(|_| AdminError::CacheCommunication("Cache dropped".to_string()))
        }
    };
}

#[derive(Clone)]
pub struct CacheClient<Q: Query> {
    sender: mpsc::Sender<CacheRequest<Q>>,
}

impl<Q: Query> CacheClient<Q> {
    pub fn new(sender: mpsc::Sender<CacheRequest<Q>>) -> Self {
        Self { sender }
    }

    cache_method!(fn get(query: Q) -> Lookup<Q::Output> as Get);
    cache_method!(fn invalidate(tag: Tag) -> usize as Invalidate);
    cache_method!(fn subscribe(tag: Tag) -> Subscription as Subscribe);
    cache_method!(fn generation() -> u64 as Generation);

    /// Stores a fetched result. Returns `false` when the result was superseded
    /// by an invalidation issued after `generation` was handed out.
    #[instrument(skip(self, value), level = "debug")]
    pub async fn put(&self, query: Q, value: Q::Output, generation: u64) -> AdminResult<bool> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CacheRequest::Put {
                query,
                value,
                generation,
                respond_to,
            })
            .await
            .map_err(|_| AdminError::CacheCommunication("Cache closed".to_string()))?;
        response
            .await
            .map_err(|_| AdminError::CacheCommunication("Cache dropped".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> AdminResult<()> {
        debug!("Sending shutdown request");
        self.sender
            .send(CacheRequest::Shutdown)
            .await
            .map_err(|_| AdminError::CacheCommunication("Cache closed".to_string()))
    }

    #[cfg(test)]
    cache_method!(fn entry_count() -> usize as EntryCount);
}
