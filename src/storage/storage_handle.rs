use std::sync::Arc;

use super::{Handle, ReadableStorageTraits, StorageError};

/// A storage handle.
///
/// Owns an open backend [`Handle`] together with the storage it was acquired from.
/// The handle is released exactly once: explicitly with [`close`](StorageHandle::close), or when the storage handle is dropped.
/// A failure to release on drop is reported through the [`log`] facade.
pub struct StorageHandle<TStorage: ?Sized + ReadableStorageTraits> {
    storage: Arc<TStorage>,
    handle: Handle,
    open: bool,
}

impl<TStorage: ?Sized + ReadableStorageTraits> StorageHandle<TStorage> {
    /// Take ownership of `handle`, which was acquired from `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>, handle: Handle) -> Self {
        Self {
            storage,
            handle,
            open: true,
        }
    }

    /// Return the storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<TStorage> {
        &self.storage
    }

    /// Return the backend handle.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.handle
    }

    /// Release the handle.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to release the handle.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.open = false;
        self.storage.close_handle(self.handle)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Drop for StorageHandle<TStorage> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.storage.close_handle(self.handle) {
                log::warn!("failed to close handle {}: {err}", self.handle);
            }
        }
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> core::fmt::Debug for StorageHandle<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StorageHandle")
            .field("handle", &self.handle)
            .field("open", &self.open)
            .finish()
    }
}
