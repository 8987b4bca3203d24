#![no_std]

//! Logging facade shared by the workspace crates.
//!
//! The macros expand in the calling crate, so the `defmt` and `log` features checked here are the
//! caller's own features. With neither enabled the arguments are only borrowed, which keeps
//! values that exist purely for logging from tripping unused warnings.

#[doc(hidden)]
#[macro_export]
macro_rules! __dispatch {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        #[cfg(feature = "defmt")]
        defmt::$level!($fmt $(, $arg)*);
        #[cfg(feature = "log")]
        log::$level!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        let _ = ($(&$arg,)*);
    };
}

#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => {
        $crate::__dispatch!(trace, $($args)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => {
        $crate::__dispatch!(debug, $($args)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($args:tt)*) => {
        $crate::__dispatch!(info, $($args)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => {
        $crate::__dispatch!(warn, $($args)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($args:tt)*) => {
        $crate::__dispatch!(error, $($args)*)
    };
}
