#![feature(error_generic_member_access)]
#![deny(missing_docs)]

//! Error handling for colchunk.
//!
//! Every fallible operation in the workspace returns a [`ChunkResult`]. Errors that indicate a
//! broken contract (an unsupported header, a missing value used as a number) are raised with
//! [`chunk_bail!`]; errors that should never happen are raised with [`chunk_panic!`].

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for colchunk.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum ChunkError {
    /// A row index or byte offset is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Backtrace),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Backtrace),
    /// The requested layout or operation is not supported.
    #[error("{0}\nBacktrace:\n{1}")]
    NotImplemented(ErrString, Backtrace),
    /// Two types were expected to match but did not.
    #[error("expected type: {0} but instead got {1}\nBacktrace:\n{2}")]
    MismatchedTypes(ErrString, ErrString, Backtrace),
    /// An internal assertion failed.
    #[error("{0}\nBacktrace:\n{1}")]
    AssertionFailed(ErrString, Backtrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, Box<ChunkError>),
}

impl ChunkError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        ChunkError::Context(msg.into(), Box::new(self))
    }
}

impl Debug for ChunkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for results that return [`ChunkError`]s as their error type.
pub type ChunkResult<T> = Result<T, ChunkError>;

/// A trait for unwrapping a `ChunkResult`.
pub trait ChunkUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn chunk_unwrap(self) -> Self::Output;
}

impl<T, E> ChunkUnwrap for Result<T, E>
where
    E: Into<ChunkError>,
{
    type Output = T;

    #[inline(always)]
    fn chunk_unwrap(self) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|err| chunk_panic!(err))
    }
}

/// A trait for expect-ing a `ChunkResult` or an `Option`.
pub trait ChunkExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn chunk_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> ChunkExpect for Result<T, E>
where
    E: Into<ChunkError>,
{
    type Output = T;

    #[inline(always)]
    fn chunk_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| chunk_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> ChunkExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn chunk_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = ChunkError::AssertionFailed(msg.to_string().into(), Backtrace::capture());
            chunk_panic!(err)
        })
    }
}

/// A convenient macro for creating a [`ChunkError`].
#[macro_export]
macro_rules! chunk_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::ChunkError::OutOfBounds($idx, $start, $stop, Backtrace::capture())
        )
    }};
    (MismatchedTypes: $expected:literal, $actual:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::ChunkError::MismatchedTypes(
                $expected.into(),
                $actual.to_string().into(),
                Backtrace::capture(),
            )
        )
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::ChunkError::Context($msg.into(), Box::new($err))
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::ChunkError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::chunk_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a [`ChunkError`] from the enclosing function.
#[macro_export]
macro_rules! chunk_bail {
    ($($tt:tt)+) => {
        return Err($crate::chunk_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a [`ChunkError`] in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! chunk_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::chunk_panic!($crate::chunk_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::chunk_panic!($crate::chunk_err!($variant: $fmt, $($arg),*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::chunk_panic!($crate::chunk_err!($fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::ChunkError = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)));
    }};
    ($err:expr) => {{
        let err: $crate::ChunkError = $err;
        panic!("{}", err);
    }};
}

#[doc(hidden)]
pub mod __private {
    use crate::ChunkError;

    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn must_use(err: ChunkError) -> ChunkError {
        err
    }
}
