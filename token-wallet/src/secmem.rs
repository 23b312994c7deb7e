//! Secure Memory Management
//!
//! Buffers holding recovery phrases are locked into RAM where the platform
//! allows it, and scrubbed when released: first overwritten with random
//! bytes, then zeroed.
//!
//! ## Platform Support
//!
//! - **Unix**: Uses `mlock()` to lock memory pages
//! - **Other**: Logs a debug message and continues without locking
//!
//! Locking failures never prevent operation; the scrub on drop always runs.
//!
//! Locks are tracked per page. Several secrets can share a heap page, so a
//! page stays locked until the last region covering it is dropped.

use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;
use std::fmt;
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use zeroize::Zeroize;

/// Result of a memory lock operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockResult {
    /// Memory was successfully locked
    Locked,
    /// Memory locking failed (logged warning, continuing without lock)
    Failed,
    /// Memory locking not supported on this platform
    Unsupported,
}

/// Lock a memory region to prevent it from being swapped to disk.
///
/// # Safety
/// The caller must ensure that `ptr` points to valid memory of at least `len`
/// bytes.
pub unsafe fn mlock(ptr: NonNull<u8>, len: usize) -> LockResult {
    if len == 0 {
        return LockResult::Locked;
    }

    #[cfg(unix)]
    {
        let result = libc::mlock(ptr.as_ptr() as *const libc::c_void, len);
        if result == 0 {
            tracing::debug!("Locked {} bytes of secret memory", len);
            LockResult::Locked
        } else {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            let reason = match errno {
                libc::ENOMEM => "exceeds RLIMIT_MEMLOCK",
                libc::EPERM => "insufficient permissions",
                _ => "unknown error",
            };
            tracing::warn!(
                "Failed to lock secret memory: {} (errno {}); it may be swapped to disk",
                reason,
                errno
            );
            LockResult::Failed
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
        tracing::debug!("Memory locking not supported on this platform");
        LockResult::Unsupported
    }
}

/// Unlock a previously locked memory region.
///
/// # Safety
/// `ptr` must point to valid memory of at least `len` bytes that was locked
/// with [`mlock`].
pub unsafe fn munlock(ptr: NonNull<u8>, len: usize) {
    if len == 0 {
        return;
    }

    #[cfg(unix)]
    {
        if libc::munlock(ptr.as_ptr() as *const libc::c_void, len) != 0 {
            tracing::debug!("munlock returned non-zero (likely already unlocked)");
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
    }
}

/// Lock claims per page, shared by every region in the process.
///
/// `mlock` does not nest: a single `munlock` releases a page however many
/// regions locked it, and small secrets often share a page. A page is locked
/// on its first claim and unlocked only when its last claim is released.
#[derive(Debug, Default)]
struct PageTable {
    counts: HashMap<usize, usize>,
}

impl PageTable {
    /// Register a claim on `page`; true if it is the first and must be locked.
    fn claim(&mut self, page: usize) -> bool {
        let count = self.counts.entry(page).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Drop a claim on `page`; true if it was the last and must be unlocked.
    fn release(&mut self, page: usize) -> bool {
        match self.counts.get_mut(&page) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(&page);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn claims(&self, page: usize) -> usize {
        self.counts.get(&page).copied().unwrap_or(0)
    }
}

fn page_table() -> MutexGuard<'static, PageTable> {
    static TABLE: OnceLock<Mutex<PageTable>> = OnceLock::new();
    TABLE
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return size as usize;
        }
    }
    4096
}

/// Start addresses of the pages covering `len` bytes at `addr`
fn pages_covering(addr: usize, len: usize, page_size: usize) -> impl Iterator<Item = usize> {
    let first = addr / page_size * page_size;
    let end = addr.saturating_add(len);
    (first..end).step_by(page_size)
}

/// RAII guard that keeps a memory region locked until dropped.
#[derive(Debug)]
pub struct LockedRegion {
    /// Pages this region holds a claim on
    pages: Vec<usize>,
    page_size: usize,
    was_locked: bool,
}

impl LockedRegion {
    /// Lock the pages covering `len` bytes starting at `ptr`.
    ///
    /// # Safety
    /// The memory must stay valid, and must not be freed, for the lifetime of
    /// the returned region.
    pub unsafe fn new(ptr: NonNull<u8>, len: usize) -> Self {
        let page_size = page_size();
        let mut table = page_table();
        let mut pages = Vec::new();
        let mut was_locked = true;

        for page in pages_covering(ptr.as_ptr() as usize, len, page_size) {
            if table.claim(page) {
                let locked = match NonNull::new(page as *mut u8) {
                    Some(page_ptr) => mlock(page_ptr, page_size) == LockResult::Locked,
                    None => false,
                };
                if !locked {
                    table.release(page);
                    was_locked = false;
                    continue;
                }
            }
            pages.push(page);
        }

        Self {
            pages,
            page_size,
            was_locked,
        }
    }

    /// Returns true if the memory was successfully locked.
    pub fn is_locked(&self) -> bool {
        self.was_locked
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        let mut table = page_table();
        for &page in &self.pages {
            if !table.release(page) {
                continue;
            }
            if let Some(page_ptr) = NonNull::new(page as *mut u8) {
                // SAFETY: the page was locked by the claim released here, and
                // owners drop the region before releasing the memory.
                unsafe { munlock(page_ptr, self.page_size) }
            }
        }
    }
}

/// Overwrite a buffer with random bytes, then with zeros.
pub fn wipe_bytes(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
    buf.zeroize();
}

/// An immutable UTF-8 secret (a recovery phrase) held in locked memory.
///
/// The backing allocation never moves or grows, so the lock covers every copy
/// of the secret this value owns. Dropping scrubs the bytes.
pub struct SecretString {
    // Dropped before `bytes` so munlock runs on live memory.
    lock: Option<LockedRegion>,
    bytes: Box<[u8]>,
}

impl SecretString {
    /// Copy `value` into a new locked buffer.
    pub fn new(value: &str) -> Self {
        let bytes: Box<[u8]> = value.as_bytes().into();
        // SAFETY: the boxed slice is owned by the returned value and outlives
        // the region, which is dropped first.
        let lock = NonNull::new(bytes.as_ptr() as *mut u8)
            .filter(|_| !bytes.is_empty())
            .map(|ptr| unsafe { LockedRegion::new(ptr, bytes.len()) });
        Self { lock, bytes }
    }

    pub fn as_str(&self) -> &str {
        // Only ever constructed from `&str`, so this is always valid.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if the buffer is locked against swapping.
    pub fn is_memory_locked(&self) -> bool {
        self.lock.as_ref().map_or(false, LockedRegion::is_locked)
    }

    /// Scrub the secret now rather than at the end of scope.
    pub fn wipe(self) {
        drop(self)
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.as_str())
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        wipe_bytes(&mut self.bytes);
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(<redacted, {} bytes>)", self.bytes.len())
    }
}

impl PartialEq<str> for SecretString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
