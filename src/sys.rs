// Calls a libc function, turning a `-1` return into the thread's last OS error.
macro_rules! syscall {
    ($fn: ident ( $($arg: expr),* $(,)* ) ) => {{
        #[allow(unused_unsafe)]
        let res = unsafe { libc::$fn($($arg, )*) };
        if res == -1 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(res)
        }
    }};
}

// Same as `syscall!`, but retries for as long as the call is interrupted by a signal.
macro_rules! syscall_retry {
    ($fn: ident ( $($arg: expr),* $(,)* ) ) => {{
        loop {
            match syscall!($fn($($arg, )*)) {
                Err(e) if e.raw_os_error() == Some(libc::EINTR) => continue,
                other => break other,
            }
        }
    }};
}
