//! Two-phase size negotiation.
//!
//! The raw-input subsystem answers every variable-length query the same way: call once
//! with no buffer to learn the size, allocate, call again to fill. Between the two calls
//! the answer can change (a device is plugged in or pulled out), so the fill result is
//! authoritative and only the items it reports as written are kept.
//!
//! - Fewer items written than sized: the tail is dropped.
//! - More items than fit: the fill call fails with `InsufficientBuffer`; the result is
//!   empty and the next device-change notification will trigger a fresh query.

use crate::error::{RawInputError, Result};
use log::debug;

/// Run a sizing/fill pair and return exactly the items the fill call wrote.
pub fn query<T, S, F>(sizer: S, filler: F) -> Result<Vec<T>>
where
    T: Clone + Default,
    S: FnOnce() -> Result<usize>,
    F: FnOnce(&mut [T]) -> Result<usize>,
{
    let mut out = Vec::new();
    query_into(&mut out, T::default(), sizer, filler)?;
    Ok(out)
}

/// Like [`query`], but reuses `buf` and seeds new slots with `seed`.
///
/// `buf` is cleared first; on return it holds only the written items. Its capacity is
/// kept so that a caller invoking this per event does not reallocate in steady state.
pub fn query_into<T, S, F>(buf: &mut Vec<T>, seed: T, sizer: S, filler: F) -> Result<()>
where
    T: Clone,
    S: FnOnce() -> Result<usize>,
    F: FnOnce(&mut [T]) -> Result<usize>,
{
    buf.clear();

    let wanted = sizer()?;
    if wanted == 0 {
        return Ok(());
    }

    buf.resize(wanted, seed);
    match filler(buf.as_mut_slice()) {
        Ok(written) => {
            if written != wanted {
                debug!("negotiate: sized {wanted}, filled {written}");
            }
            buf.truncate(written.min(wanted));
            Ok(())
        }
        Err(RawInputError::InsufficientBuffer { required }) => {
            debug!("negotiate: grew from {wanted} to {required} between phases");
            buf.clear();
            Ok(())
        }
        Err(e) => {
            buf.clear();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_result_is_authoritative_when_count_shrinks() {
        let out: Vec<u32> = query(
            || Ok(4),
            |buf| {
                buf[0] = 10;
                buf[1] = 11;
                Ok(2)
            },
        )
        .unwrap();
        assert_eq!(out, vec![10, 11]);
    }

    #[test]
    fn overstated_fill_count_never_reads_past_buffer() {
        let out: Vec<u8> = query(|| Ok(2), |buf| {
            buf.fill(7);
            Ok(5)
        })
        .unwrap();
        assert_eq!(out, vec![7, 7]);
    }

    #[test]
    fn growth_between_phases_yields_empty() {
        let out: Vec<u8> = query(
            || Ok(2),
            |_| Err(RawInputError::InsufficientBuffer { required: 3 }),
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn zero_size_skips_fill() {
        let mut filled = false;
        let out: Vec<u8> = query(|| Ok(0), |_| {
            filled = true;
            Ok(0)
        })
        .unwrap();
        assert!(out.is_empty());
        assert!(!filled);
    }

    #[test]
    fn sizing_and_fill_errors_propagate() {
        let err = query::<u8, _, _>(|| Err(RawInputError::subsystem("size")), |_| Ok(0));
        assert!(err.is_err());

        let mut buf = vec![1u8, 2, 3];
        let err = query_into(&mut buf, 0u8, || Ok(3), |_| Err(RawInputError::subsystem("fill")));
        assert!(err.is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn query_into_keeps_capacity() {
        let mut buf: Vec<u8> = Vec::new();
        query_into(&mut buf, 0, || Ok(64), |b| Ok(b.len())).unwrap();
        let cap = buf.capacity();
        query_into(&mut buf, 0, || Ok(16), |b| Ok(b.len())).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(buf.capacity(), cap);
    }
}
