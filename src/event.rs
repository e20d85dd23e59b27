//! Decoded report events.
//!
//! A [`ReportEvent`] borrows the manager's destination buffer for the duration of one
//! listener callback. Listeners that need the bytes later must copy them out; the
//! buffer is overwritten by the next decode.

use crate::decoder::{DecodedReport, Delivery};
use crate::device::DeviceHandle;
use std::time::Instant;

/// One decoded report, handed to listeners synchronously.
#[derive(Clone, Copy, Debug)]
pub struct ReportEvent<'a> {
    /// Capture time (monotonic).
    pub at: Instant,
    /// Device that produced the report.
    pub device: DeviceHandle,
    /// Foreground/background delivery as reported by the subsystem.
    pub delivery: Delivery,
    /// `dwSizeHid` as declared by the device.
    pub unit_size: i32,
    /// `dwCount` as declared by the device.
    pub unit_count: i32,
    /// The whole destination buffer, including bytes past `len` left from earlier reports.
    pub buffer: &'a [u8],
    /// Bytes written by this decode.
    pub len: usize,
}

impl<'a> ReportEvent<'a> {
    pub fn new(report: &DecodedReport, buffer: &'a [u8]) -> Self {
        Self {
            at: Instant::now(),
            device: report.device,
            delivery: report.delivery,
            unit_size: report.unit_size,
            unit_count: report.unit_count,
            buffer,
            len: report.copied.min(buffer.len()),
        }
    }

    /// Just the bytes written by this decode.
    #[inline]
    pub fn report(&self) -> &'a [u8] {
        &self.buffer[..self.len]
    }

    /// `true` if the declared report was longer than what fit in the buffer.
    pub fn truncated(&self) -> bool {
        crate::decoder::copy_len(self.unit_size, self.unit_count, usize::MAX) > self.len
    }
}
