use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use coven_core::PeerId;

use super::peer::{ConnHandle, Peer};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Live connected peers:
/// - `ConnHandle -> Peer`
/// - `PeerId -> Peer`
///
/// Each view has its own lock. Mutations take both write locks, always
/// by-handle first, so an entry is in both views or in neither. Readers that
/// iterate get an owned snapshot and never hold a lock while doing I/O.
#[derive(Default)]
pub struct PeerRegistry {
    by_handle: RwLock<HashMap<ConnHandle, Arc<Peer>>>,
    by_id: RwLock<HashMap<PeerId, Arc<Peer>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer: Arc<Peer>) {
        let mut by_handle = write(&self.by_handle);
        let mut by_id = write(&self.by_id);
        by_handle.insert(peer.handle(), Arc::clone(&peer));
        by_id.insert(peer.id(), peer);
    }

    pub fn unregister(&self, handle: ConnHandle) -> Option<Arc<Peer>> {
        let mut by_handle = write(&self.by_handle);
        let mut by_id = write(&self.by_id);
        let peer = by_handle.remove(&handle)?;
        by_id.remove(&peer.id());
        Some(peer)
    }

    /// Remove everything, returning what was registered.
    pub fn drain(&self) -> Vec<Arc<Peer>> {
        let mut by_handle = write(&self.by_handle);
        let mut by_id = write(&self.by_id);
        by_id.clear();
        by_handle.drain().map(|(_, p)| p).collect()
    }

    /// Point-in-time copy of the by-handle view.
    pub fn snapshot(&self) -> Vec<Arc<Peer>> {
        read(&self.by_handle).values().cloned().collect()
    }

    /// Point-in-time copy of the by-id view.
    pub fn snapshot_by_id(&self) -> HashMap<PeerId, Arc<Peer>> {
        read(&self.by_id).clone()
    }

    /// Look up one peer in the by-id view; the entry is cloned out under the lock.
    pub fn resolve(&self, id: &PeerId) -> Option<Arc<Peer>> {
        read(&self.by_id).get(id).cloned()
    }

    pub fn contains(&self, handle: ConnHandle) -> bool {
        read(&self.by_handle).contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        read(&self.by_handle).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<PeerId> {
        read(&self.by_id).keys().copied().collect()
    }

    /// Both views hold exactly the same entries.
    pub fn is_consistent(&self) -> bool {
        let by_handle = read(&self.by_handle);
        let by_id = read(&self.by_id);
        by_handle.len() == by_id.len()
            && by_handle.values().all(|p| {
                by_id
                    .get(&p.id())
                    .map_or(false, |q| q.handle() == p.handle())
            })
    }
}
