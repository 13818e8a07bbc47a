//! Fallible buffer allocation.
//!
//! Whole-image buffers are reserved with `try_reserve_exact` so that an
//! out-of-memory condition becomes [`Error::Allocation`] instead of an abort.

use crate::error::{Error, Result};

/// Empty vector with room for exactly `len` bytes.
pub fn with_capacity(len: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { what, bytes: len })?;
    Ok(buf)
}

/// Zero-filled vector of `len` bytes.
pub fn zeroed(len: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut buf = with_capacity(len, what)?;
    buf.resize(len, 0);
    Ok(buf)
}
