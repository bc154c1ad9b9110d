//! Logging shims.
//!
//! Forward to the `log` facade when the `log` feature is enabled and compile
//! to nothing otherwise, so call sites never need their own `cfg`.

macro_rules! rtu_log {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "log")]
        ::log::$level!(target: "mbrtu", $($arg)+);
        #[cfg(not(feature = "log"))]
        {
            let _ = format_args!($($arg)+);
        }
    }};
}

macro_rules! trace {
    ($($arg:tt)+) => { rtu_log!(trace, $($arg)+) };
}

macro_rules! debug {
    ($($arg:tt)+) => { rtu_log!(debug, $($arg)+) };
}

macro_rules! warn {
    ($($arg:tt)+) => { rtu_log!(warn, $($arg)+) };
}
