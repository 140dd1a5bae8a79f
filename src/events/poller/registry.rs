use std::{os::fd::{AsRawFd, OwnedFd, RawFd}, sync::Arc};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use thiserror::Error;

use crate::{
    events::{key::KeyGenerator, EventSource, Key},
    OsError
};

use super::InterestType;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]

pub enum EventPollerRegistryError {
    #[error("Failed to register interest: {source}")]
    FailedToRegisterInterest {
        source: OsError,
    },

    #[error("Failed to modify interest: {source}")]
    FailedToModifyInterest {
        source: OsError,
    },

    #[error("Failed to deregister interest: {source}")]
    FailedToDeregisterInterest {
        source: OsError,
    },
}

/// The registration half of an [`EventPoller`](super::EventPoller).
/// Clones share the same epoll instance and key space.
#[derive(Debug, Clone)]
pub struct EventPollerRegistry {
    pub (in crate::events::poller) inner: Arc<OwnedFd>,
    pub (in crate::events::poller) generator: KeyGenerator,
    pub (in crate::events::poller) key_fds: Arc<DashMap<Key, RawFd, FxBuildHasher>>,
}

impl EventPollerRegistry {

    pub (in crate::events::poller) fn new(inner: Arc<OwnedFd>) -> Self {
        Self {
            inner,
            generator: KeyGenerator::new(1),
            key_fds: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    fn control(
        &self,
        op: libc::c_int,
        fd: RawFd,
        key: Key,
        interest_type: InterestType,
    ) -> Result<(), OsError> {
        let mut event = libc::epoll_event {
            events: interest_type.as_epoll_events(),
            u64: key.as_u64(),
        };
        syscall!(
            epoll_ctl(self.inner.as_raw_fd(), op, fd, &mut event)
        )?;
        Ok(())
    }

    pub fn register_interest(
        &self,
        source: EventSource,
        interest_type: InterestType,
    ) -> Result<Key, EventPollerRegistryError> {
        if !source.is_valid() {
            return Err(EventPollerRegistryError::FailedToRegisterInterest {
                source: OsError::InvalidFd
            });
        }

        let key = self.generator.next();
        let fd = source.as_raw_fd();
        self.control(libc::EPOLL_CTL_ADD, fd, key, interest_type).map_err(|source|
            EventPollerRegistryError::FailedToRegisterInterest { source }
        )?;
        self.key_fds.insert(key, fd);

        info!(
            "registered interest for fd {} with key {} and interest type {:?} in {}",
            fd,
            key,
            interest_type,
            self.inner.as_raw_fd()
        );

        Ok(key)
    }

    pub fn modify_interest(
        &self,
        key: Key,
        interest_type: InterestType,
    ) -> Result<(), EventPollerRegistryError> {
        let fd = *self.key_fds.get(&key).ok_or(
            EventPollerRegistryError::FailedToModifyInterest {
                source: OsError::InvalidOperation
            }
        )?;
        self.control(libc::EPOLL_CTL_MOD, fd, key, interest_type).map_err(|source|
            EventPollerRegistryError::FailedToModifyInterest { source }
        )?;

        info!(
            "modified interest for fd {} with key {} and interest type {:?} in {}",
            fd,
            key,
            interest_type,
            self.inner.as_raw_fd()
        );

        Ok(())
    }

    /// Stops watching `key`. A descriptor that was closed while registered is
    /// already gone from epoll, so `EBADF`/`ENOENT` here only forget the key.
    pub fn deregister_interest(&self, key: Key) -> Result<(), EventPollerRegistryError> {
        let (key, fd) = self.key_fds.remove(&key).ok_or(
            EventPollerRegistryError::FailedToDeregisterInterest {
                source: OsError::InvalidOperation
            }
        )?;

        match syscall!(epoll_ctl(self.inner.as_raw_fd(), libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut())) {
            Ok(_) => {},
            Err(e) if matches!(e.raw_os_error(), Some(libc::EBADF) | Some(libc::ENOENT)) => {
                warn!("fd {} for key {} was closed before being deregistered", fd, key);
            },
            Err(e) => {
                return Err(EventPollerRegistryError::FailedToDeregisterInterest {
                    source: e.into()
                });
            }
        }

        info!(
            "deregistered interest for fd {} with key {} in {}",
            fd,
            key,
            self.inner.as_raw_fd()
        );

        Ok(())
    }

    pub fn len(&self) -> usize { self.key_fds.len() }

    pub fn is_empty(&self) -> bool { self.key_fds.is_empty() }

}
