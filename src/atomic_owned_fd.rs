use std::{os::fd::{AsRawFd, RawFd}, sync::atomic::{AtomicI32, Ordering}};

pub const INVALID_FD: RawFd = -1;

// A descriptor that can be given up exactly once, from any number of `&self` callers.
#[derive(Debug)]
pub struct AtomicOwnedFd {
    inner: AtomicI32
}

impl AtomicOwnedFd {

    /*
        SAFETY:

            This function is unsafe because it takes ownership of a raw
            file descriptor. The caller must ensure that the file descriptor
            is open and that nothing else will close it.
    */
    pub unsafe fn new(fd: RawFd) -> Self {
        assert_ne!(fd, INVALID_FD);
        Self {
            inner: AtomicI32::new(fd)
        }
    }

    pub fn invalid() -> Self {
        Self { inner: AtomicI32::new(INVALID_FD) }
    }

    pub fn load(&self) -> RawFd {
        self.inner.load(Ordering::Acquire)
    }

    pub fn is_valid(&self) -> bool { self.load() != INVALID_FD }

    /*
        SAFETY:

            This function is unsafe because it returns an open FD.
            The caller must ensure that the returned FD is cleaned up.
    */
    pub unsafe fn release(&self) -> RawFd {
        self.inner.swap(INVALID_FD, Ordering::AcqRel)
    }

    // Closes the descriptor if this call is the one that invalidated it.
    // Returns whether a live descriptor was released.
    pub fn close(&self) -> bool {
        let fd = unsafe { self.release() };
        if fd == INVALID_FD { return false; }

        match syscall!(close(fd)) {
            Ok(_) => info!("closed fd {}", fd),
            Err(e) if e.raw_os_error() == Some(libc::EBADF) => {
                info!("fd {} was already released elsewhere", fd);
            },
            Err(e) => error!("failed to close fd {}: {}", fd, e),
        }
        true
    }

}

impl AsRawFd for AtomicOwnedFd {
    fn as_raw_fd(&self) -> RawFd {
        self.load()
    }
}

impl Drop for AtomicOwnedFd {
    fn drop(&mut self) {
        self.close();
    }
}
