//! Array lengths and the policy bounding "read until end of stream" arrays.

use crate::errors::ReadError;

/// Initial capacity of the growable buffer used by until-end array reads.
pub const INITIAL_ARRAY_CAPACITY: usize = 32;

/// Number of elements in an array read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayCount {
    /// Exactly this many elements; fewer available is an end-of-data error.
    Fixed(usize),
    /// Read until the source is exhausted, subject to an [ArraySizeLimiter].
    ToEnd,
}

impl From<usize> for ArrayCount {
    fn from(value: usize) -> Self {
        ArrayCount::Fixed(value)
    }
}

/// Any negative count selects [ArrayCount::ToEnd].
impl From<i64> for ArrayCount {
    fn from(value: i64) -> Self {
        match usize::try_from(value) {
            Ok(count) => ArrayCount::Fixed(count),
            Err(_) => ArrayCount::ToEnd,
        }
    }
}

/// Policy consulted after every element of an until-end array read.
///
/// * `0` - unlimited.
/// * `N > 0` - hard cap, producing more than `N` elements fails with
///   [ReadError::ArraySizeExceeded].
/// * `N < 0` - soft cap, reading stops after `|N|` elements and the reader's
///   detected-array-limit flag is raised.
pub trait ArraySizeLimiter {
    fn limit(&self) -> i64;
}

/// Limiter that never interrupts a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLimit;

impl ArraySizeLimiter for NoLimit {
    fn limit(&self) -> i64 {
        0
    }
}

impl ArraySizeLimiter for i64 {
    fn limit(&self) -> i64 {
        *self
    }
}

impl<L: ArraySizeLimiter + ?Sized> ArraySizeLimiter for &L {
    fn limit(&self) -> i64 {
        (**self).limit()
    }
}

/// Outcome of consulting a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitCheck {
    Continue,
    /// Soft cap reached, stop reading without error.
    Stop,
}

/// Checks `produced` elements against `limiter`.
pub(crate) fn check_limit<L: ArraySizeLimiter + ?Sized>(
    limiter: &L,
    produced: usize,
) -> Result<LimitCheck, ReadError> {
    let limit = limiter.limit();
    if limit == 0 {
        return Ok(LimitCheck::Continue);
    }

    if limit > 0 {
        if produced as u64 > limit as u64 {
            return Err(ReadError::ArraySizeExceeded {
                limit,
                read: produced,
            });
        }

        return Ok(LimitCheck::Continue);
    }

    if produced as u64 >= limit.unsigned_abs() {
        Ok(LimitCheck::Stop)
    } else {
        Ok(LimitCheck::Continue)
    }
}
