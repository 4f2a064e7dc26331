use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::Tag;

/// Observer handle for invalidations of one [`Tag`].
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    tag: Tag,
    receiver: broadcast::Receiver<Tag>,
}

impl Subscription {
    pub(crate) fn new(tag: Tag, receiver: broadcast::Receiver<Tag>) -> Self {
        Self { tag, receiver }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Waits for the next invalidation of this tag. Returns `false` once the
    /// cache has shut down.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(tag) if tag == self.tag => return true,
                Ok(_) => continue,
                // Missed events; assume ours was among them.
                Err(RecvError::Lagged(_)) => return true,
                Err(RecvError::Closed) => return false,
            }
        }
    }

    /// Drains queued events without waiting. True if any of them invalidated
    /// this tag.
    pub fn take_pending(&mut self) -> bool {
        let mut stale = false;
        loop {
            match self.receiver.try_recv() {
                Ok(tag) => stale |= tag == self.tag,
                Err(TryRecvError::Lagged(_)) => stale = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return stale,
            }
        }
    }
}
