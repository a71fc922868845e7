//! `tracing` when the `tracing` feature is enabled, no-op stand-ins otherwise.
//!
//! Import logging macros and [`Instrument`] from here rather than from `tracing` so that call
//! sites need no `#[cfg]`. `#[instrument]` is the exception and is written as
//! `#[cfg_attr(feature = "tracing", tracing::instrument)]`.
//!
//! Only what the crate uses is re-exported. Add to both halves when that changes.

#![allow(unused_imports, unused_macros, dead_code)]

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, error, info, info_span, warn};
#[cfg(feature = "tracing")]
pub(crate) use tracing_futures::Instrument;

/// Swallows the arguments of any logging macro.
#[cfg(not(feature = "tracing"))]
macro_rules! event {
    ($($x:tt)*) => {};
}

/// Evaluates to a unit "span" that [`Instrument`] accepts.
#[cfg(not(feature = "tracing"))]
macro_rules! span {
    ($($x:tt)*) => {
        ()
    };
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {event as debug, event as error, event as info, event as warn, span as info_span};

/// Stand-in for `tracing_futures::Instrument` that returns the future untouched.
#[cfg(not(feature = "tracing"))]
pub(crate) trait Instrument: Sized {
    fn instrument(self, span: ()) -> Self {
        let () = span;
        self
    }
}

#[cfg(not(feature = "tracing"))]
impl<T> Instrument for T {}
