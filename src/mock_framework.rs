//! # Mock Framework
//!
//! Utilities for testing cache consumers in isolation.
//!
//! Use [`create_mock_cache`] to get a client and a receiver, then helpers like
//! [`expect_get`] or [`expect_invalidate`] to assert what the consumer sends
//! and to answer on the cache's behalf.

use tokio::sync::{mpsc, oneshot};

use crate::cache::{CacheClient, CacheRequest, Lookup, Query, Tag};

/// Creates a cache client whose requests land on a receiver the test owns,
/// so no `QueryCache` task is needed.
pub fn create_mock_cache<Q: Query>(buffer_size: usize) -> (CacheClient<Q>, mpsc::Receiver<CacheRequest<Q>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CacheClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<Q: Query>(
    receiver: &mut mpsc::Receiver<CacheRequest<Q>>,
) -> Option<(Q, oneshot::Sender<Lookup<Q::Output>>)> {
    match receiver.recv().await {
        Some(CacheRequest::Get { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Put request
pub async fn expect_put<Q: Query>(
    receiver: &mut mpsc::Receiver<CacheRequest<Q>>,
) -> Option<(Q, Q::Output, u64, oneshot::Sender<bool>)> {
    match receiver.recv().await {
        Some(CacheRequest::Put {
            query,
            value,
            generation,
            respond_to,
        }) => Some((query, value, generation, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Invalidate request
pub async fn expect_invalidate<Q: Query>(
    receiver: &mut mpsc::Receiver<CacheRequest<Q>>,
) -> Option<(Tag, oneshot::Sender<usize>)> {
    match receiver.recv().await {
        Some(CacheRequest::Invalidate { tag, respond_to }) => Some((tag, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UsersQuery;
    use crate::domain::UserPage;

    #[tokio::test]
    async fn test_mock_cache() {
        let (client, mut receiver) = create_mock_cache::<UsersQuery>(10);

        let get_task = tokio::spawn(async move { client.get(UsersQuery { page: 1 }).await });

        let (query, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(query.page, 1);
        responder.send(Lookup::Hit(UserPage::default())).unwrap();

        let result = get_task.await.unwrap();
        assert_eq!(result, Ok(Lookup::Hit(UserPage::default())));
    }
}
