use thiserror::Error;



#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum OsError {

    #[error("Maximum number of file descriptors reached")]
    MaxFdReached,

    #[error("Not enough memory")]
    NotEnoughMemory,

    #[error("The operation was canceled")]
    OperationCanceled,

    #[error("The operation is not supported")]
    OperationNotSupported,

    #[error("The resource is temporarily unavailable")]
    ResourceUnavailable,

    #[error("Invalid file descriptor")]
    InvalidFd,

    #[error("Invalid pointer")]
    InvalidPointer,

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("The operation was interrupted")]
    OperationInterrupted,

    #[error("Invalid operation")]
    InvalidOperation,

    #[error("Low-level I/O error")]
    IoFailure,

    #[error("Unknown OS error")]
    UnknownError,

    #[error("OS Error: {0}")]
    Generic(i32),
}

impl OsError {

    pub fn last() -> Self {
        let os_error = std::io::Error::last_os_error();
        match os_error.raw_os_error() {
            Some(code) => OsError::from(code),
            None => OsError::UnknownError,
        }
    }

    // The errno this error was built from, or -1 when there was none.
    pub fn code(&self) -> i32 { (*self).into() }

    // The platform's own description of the error code (strerror).
    pub fn message(&self) -> String {
        match self {
            OsError::UnknownError => self.to_string(),
            _ => std::io::Error::from_raw_os_error(self.code()).to_string(),
        }
    }

    // Creation failures the caller can do nothing about but wait or free descriptors.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, OsError::MaxFdReached | OsError::NotEnoughMemory)
    }

    pub fn is_would_block(&self) -> bool {
        matches!(self, OsError::ResourceUnavailable)
    }
}

impl From<std::io::Error> for OsError {
    fn from(error: std::io::Error) -> Self {
       let os_error = match error.raw_os_error() {
           Some(code) => code,
           None => return OsError::UnknownError,
       };

       Self::from(os_error)
    }
}

impl From<i32> for OsError {
    fn from(os_error: i32) -> Self {
        match os_error {
            libc::EINVAL => OsError::InvalidOperation,
            libc::EMFILE | libc::ENFILE => OsError::MaxFdReached,
            libc::ENOMEM => OsError::NotEnoughMemory,
            libc::EBADF => OsError::InvalidFd,
            libc::EFAULT => OsError::InvalidPointer,
            libc::EPERM | libc::EACCES => OsError::PermissionDenied,
            libc::EINTR => OsError::OperationInterrupted,
            libc::ECANCELED => OsError::OperationCanceled,
            libc::EAGAIN => OsError::ResourceUnavailable,
            libc::ENOSYS | libc::EOPNOTSUPP => OsError::OperationNotSupported,
            libc::EIO => OsError::IoFailure,
            _ => OsError::Generic(os_error),
       }
    }
}

impl From<OsError> for i32 {
    fn from(error: OsError) -> i32 {
        match error {
            OsError::Generic(code) => code,
            OsError::InvalidOperation => libc::EINVAL,
            OsError::MaxFdReached => libc::EMFILE,
            OsError::NotEnoughMemory => libc::ENOMEM,
            OsError::InvalidFd => libc::EBADF,
            OsError::InvalidPointer => libc::EFAULT,
            OsError::PermissionDenied => libc::EPERM,
            OsError::OperationInterrupted => libc::EINTR,
            OsError::OperationCanceled => libc::ECANCELED,
            OsError::ResourceUnavailable => libc::EAGAIN,
            OsError::OperationNotSupported => libc::ENOSYS,
            OsError::IoFailure => libc::EIO,
            OsError::UnknownError => -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping_round_trips_for_named_variants() {
        for code in [libc::EINVAL, libc::EMFILE, libc::EBADF, libc::EAGAIN, libc::EPERM] {
            assert_eq!(OsError::from(code).code(), code);
        }
    }

    #[test]
    fn test_unmapped_errno_is_kept() {
        let err = OsError::from(libc::ESPIPE);
        assert_eq!(err, OsError::Generic(libc::ESPIPE));
        assert_eq!(err.code(), libc::ESPIPE);
    }

    #[test]
    fn test_exhaustion_classification() {
        assert!(OsError::from(libc::ENFILE).is_resource_exhausted());
        assert!(OsError::from(libc::ENOMEM).is_resource_exhausted());
        assert!(!OsError::from(libc::EPERM).is_resource_exhausted());

        assert!(OsError::from(libc::EWOULDBLOCK).is_would_block());
        assert!(!OsError::from(libc::EINTR).is_would_block());
    }

    #[test]
    fn test_message_comes_from_platform() {
        let expected = std::io::Error::from_raw_os_error(libc::EBADF).to_string();
        assert_eq!(OsError::InvalidFd.message(), expected);
    }

    #[test]
    fn test_from_io_error_without_code() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "no errno");
        assert_eq!(OsError::from(err), OsError::UnknownError);
        assert_eq!(OsError::UnknownError.code(), -1);
    }
}
