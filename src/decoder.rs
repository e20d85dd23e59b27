//! Raw input report decoder (`WM_INPUT` → caller buffer).
//!
//! Each event runs a short state machine and stops at the first terminal state:
//!
//! 1. fetch the fixed-size header only;
//! 2. drop the event unless the header's device is in the target set;
//! 3. query the full payload size;
//! 4. fetch header + body into a reused scratch buffer;
//! 5. read `dwSizeHid` / `dwCount` after the header and copy the report bytes that
//!    follow them into the caller's buffer, clamped to its capacity.
//!
//! Step 2 is the common case for every non-target device sharing the registered usage,
//! so it is decided from the header alone before paying for the full fetch.
//!
//! ## Clamping
//! `dwSizeHid` and `dwCount` come straight from the device. Their product is computed as
//! a checked `i32`; a negative product or an overflow is logged and decodes to zero bytes.
//! Otherwise `min(product, capacity)` bytes are copied, further limited to the bytes the
//! payload actually carries. A body too short to hold both integers also decodes to zero
//! bytes. Truncation is not an error.

use crate::api::{EventPart, PayloadToken, RawInputApi};
use crate::device::{DeviceClass, DeviceHandle};
use crate::error::{RawInputError, Result};
use crate::layout::{
    read_i32, read_u32, read_usize, HEADER_DEVICE_OFFSET, HEADER_LEN, HEADER_SIZE_OFFSET,
    HEADER_TYPE_OFFSET, HEADER_WPARAM_OFFSET, HID_DATA_OFFSET, HID_UNIT_COUNT_OFFSET,
    HID_UNIT_SIZE_OFFSET,
};
use crate::negotiate::query_into;
use crate::registrar::TargetDeviceSet;
use log::{trace, warn};

/// `RIM_INPUT`: delivered while the surface was in the foreground.
const RIM_INPUT: usize = 0;
/// `RIM_INPUTSINK`: delivered while the surface was in the background.
const RIM_INPUTSINK: usize = 1;

/// How the event reached the surface, from the header's `wParam`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Foreground,
    Background,
    Other(usize),
}

/// Decoded `RAWINPUTHEADER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEventHeader {
    /// `dwType`; `None` if the value is not a known class.
    pub class: Option<DeviceClass>,
    /// `dwSize`: total payload size in bytes as declared by the producer.
    pub payload_size: u32,
    pub device: DeviceHandle,
    /// `wParam` as delivered.
    pub aux_token: usize,
}

impl RawEventHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let short = || RawInputError::ShortPayload {
            needed: HEADER_LEN,
            got: bytes.len(),
        };
        Ok(Self {
            class: DeviceClass::from_raw(read_u32(bytes, HEADER_TYPE_OFFSET).ok_or_else(short)?),
            payload_size: read_u32(bytes, HEADER_SIZE_OFFSET).ok_or_else(short)?,
            device: DeviceHandle(read_usize(bytes, HEADER_DEVICE_OFFSET).ok_or_else(short)?),
            aux_token: read_usize(bytes, HEADER_WPARAM_OFFSET).ok_or_else(short)?,
        })
    }

    pub fn delivery(&self) -> Delivery {
        match self.aux_token {
            RIM_INPUT => Delivery::Foreground,
            RIM_INPUTSINK => Delivery::Background,
            other => Delivery::Other(other),
        }
    }
}

/// `RAWHID` view over a fetched payload. Borrowed for one decode call only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportBody<'a> {
    pub unit_size: i32,
    pub unit_count: i32,
    /// Bytes following the two integers, as many as the payload carries.
    pub data: &'a [u8],
}

impl<'a> ReportBody<'a> {
    /// Parse the body of a full payload (header included).
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let needed = HEADER_LEN + HID_DATA_OFFSET;
        let short = || RawInputError::ShortPayload {
            needed,
            got: payload.len(),
        };
        let body = payload.get(HEADER_LEN..).ok_or_else(short)?;
        Ok(Self {
            unit_size: read_i32(body, HID_UNIT_SIZE_OFFSET).ok_or_else(short)?,
            unit_count: read_i32(body, HID_UNIT_COUNT_OFFSET).ok_or_else(short)?,
            data: body.get(HID_DATA_OFFSET..).ok_or_else(short)?,
        })
    }

    /// `unit_size * unit_count`, or `None` if the product is negative or overflows.
    pub fn declared_len(&self) -> Option<usize> {
        self.unit_size
            .checked_mul(self.unit_count)
            .and_then(|n| usize::try_from(n).ok())
    }
}

/// Number of bytes a body with the given header values may copy into `capacity` bytes.
///
/// `min(max(unit_size * unit_count, 0), capacity)`; an overflowing product gives `0`.
pub fn copy_len(unit_size: i32, unit_count: i32, capacity: usize) -> usize {
    ReportBody {
        unit_size,
        unit_count,
        data: &[],
    }
    .declared_len()
    .map_or(0, |n| n.min(capacity))
}

/// A successfully decoded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedReport {
    pub device: DeviceHandle,
    pub delivery: Delivery,
    pub unit_size: i32,
    pub unit_count: i32,
    /// Bytes written to the front of the destination buffer.
    pub copied: usize,
}

/// Terminal state of one decode call that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded(DecodedReport),
    /// Event came from a device outside the target set.
    Ignored,
}

/// Stateless apart from a scratch buffer reused across events.
#[derive(Debug, Default)]
pub struct ReportDecoder {
    scratch: Vec<u8>,
}

impl ReportDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one event into `dest`.
    ///
    /// `dest` is never resized; on failure or `Ignored` it is left untouched.
    pub fn decode(
        &mut self,
        api: &dyn RawInputApi,
        token: PayloadToken,
        targets: &TargetDeviceSet,
        dest: &mut [u8],
    ) -> Result<DecodeOutcome> {
        if targets.is_empty() {
            return Ok(DecodeOutcome::Ignored);
        }

        // 1. header only
        let mut head = [0u8; HEADER_LEN];
        let n = api.fill_event(token, EventPart::Header, &mut head)?;
        let header = RawEventHeader::parse(&head[..n.min(HEADER_LEN)])?;

        // 2. membership
        if !targets.contains(header.device) {
            trace!("ignoring event from non-target device {}", header.device);
            return Ok(DecodeOutcome::Ignored);
        }

        // 3 + 4. size query, full fetch
        query_into(
            &mut self.scratch,
            0u8,
            || api.event_len(token, EventPart::Input),
            |buf| api.fill_event(token, EventPart::Input, buf),
        )?;
        if self.scratch.is_empty() {
            return Err(RawInputError::EmptyPayload);
        }

        // 5. body
        let body = match ReportBody::parse(&self.scratch) {
            Ok(body) => body,
            Err(e) => {
                warn!("short report from {}: {e}", header.device);
                return Ok(DecodeOutcome::Decoded(DecodedReport {
                    device: header.device,
                    delivery: header.delivery(),
                    unit_size: 0,
                    unit_count: 0,
                    copied: 0,
                }));
            }
        };
        let declared = body.declared_len().unwrap_or_else(|| {
            warn!(
                "malformed report from {}: unit_size={} unit_count={}",
                header.device, body.unit_size, body.unit_count
            );
            0
        });

        let copied = declared.min(dest.len()).min(body.data.len());
        dest[..copied].copy_from_slice(&body.data[..copied]);
        trace!(
            "decoded {copied}/{declared} byte(s) from {} ({:?})",
            header.device,
            header.delivery()
        );

        Ok(DecodeOutcome::Decoded(DecodedReport {
            device: header.device,
            delivery: header.delivery(),
            unit_size: body.unit_size,
            unit_count: body.unit_count,
            copied,
        }))
    }
}

/// Build a native `RAWINPUT` payload for a HID report.
///
/// Inverse of [`RawEventHeader::parse`] + [`ReportBody::parse`]; used by the in-memory
/// backend and by tests.
pub fn encode_hid_event(
    device: DeviceHandle,
    aux_token: usize,
    unit_size: i32,
    unit_count: i32,
    data: &[u8],
) -> Vec<u8> {
    let total = HEADER_LEN + HID_DATA_OFFSET + data.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&DeviceClass::GenericHid.to_raw().to_ne_bytes());
    out.extend_from_slice(&(total as u32).to_ne_bytes());
    out.extend_from_slice(&device.raw().to_ne_bytes());
    out.extend_from_slice(&aux_token.to_ne_bytes());
    out.extend_from_slice(&unit_size.to_ne_bytes());
    out.extend_from_slice(&unit_count.to_ne_bytes());
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualRawInput;

    const H: DeviceHandle = DeviceHandle(0xB7);
    const TOKEN: PayloadToken = PayloadToken(0x1000);

    fn targets() -> TargetDeviceSet {
        TargetDeviceSet::from_handles([H])
    }

    #[test]
    fn header_parses_every_field() {
        let bytes = encode_hid_event(H, RIM_INPUTSINK, 2, 1, &[9, 9]);
        let hdr = RawEventHeader::parse(&bytes).unwrap();
        assert_eq!(hdr.class, Some(DeviceClass::GenericHid));
        assert_eq!(hdr.payload_size as usize, bytes.len());
        assert_eq!(hdr.device, H);
        assert_eq!(hdr.delivery(), Delivery::Background);
    }

    #[test]
    fn short_header_is_an_error() {
        let err = RawEventHeader::parse(&[0u8; 6]).unwrap_err();
        assert!(matches!(err, RawInputError::ShortPayload { .. }));
    }

    #[test]
    fn copy_len_clamps() {
        assert_eq!(copy_len(4, 2, 16), 8);
        assert_eq!(copy_len(4, 2, 4), 4);
        assert_eq!(copy_len(0, 100, 16), 0);
        assert_eq!(copy_len(-1, 4, 16), 0);
        assert_eq!(copy_len(4, -1, 16), 0);
        assert_eq!(copy_len(-4, -2, 16), 8);
        assert_eq!(copy_len(i32::MAX, 2, 16), 0);
        assert_eq!(copy_len(65536, 32767, usize::MAX), 65536 * 32767);
    }

    #[test]
    fn decodes_into_destination() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, 4, 2, &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut dest = [0u8; 16];
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap();
        match out {
            DecodeOutcome::Decoded(r) => {
                assert_eq!(r.copied, 8);
                assert_eq!(r.device, H);
                assert_eq!(r.delivery, Delivery::Foreground);
            }
            DecodeOutcome::Ignored => panic!("expected a report"),
        }
        assert_eq!(&dest[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&dest[8..], &[0; 8]);
    }

    #[test]
    fn truncates_to_destination_capacity() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, 4, 2, &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut dest = [0u8; 4];
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap();
        assert!(matches!(out, DecodeOutcome::Decoded(r) if r.copied == 4));
        assert_eq!(dest, [1, 2, 3, 4]);
    }

    #[test]
    fn non_target_device_stops_after_header() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, DeviceHandle(0xDEAD), 1, 1, &[1]);

        let mut dest = [0u8; 4];
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap();
        assert_eq!(out, DecodeOutcome::Ignored);
        let calls = api.calls();
        assert_eq!(calls.event_header, 1);
        assert_eq!(calls.event_len, 0);
        assert_eq!(calls.fill_event, 0);
    }

    #[test]
    fn empty_target_set_skips_the_subsystem() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, 1, 1, &[1]);
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &TargetDeviceSet::default(), &mut [0u8; 4])
            .unwrap();
        assert_eq!(out, DecodeOutcome::Ignored);
        assert_eq!(api.calls().event_header, 0);
    }

    #[test]
    fn zero_size_fails_without_writing() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, 4, 2, &[1; 8]);
        api.override_event_len(TOKEN, 0);

        let mut dest = [0xAAu8; 8];
        let err = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap_err();
        assert!(matches!(err, RawInputError::EmptyPayload));
        assert_eq!(api.calls().fill_event, 0);
        assert_eq!(dest, [0xAA; 8]);
    }

    #[test]
    fn negative_or_overflowing_sizes_copy_nothing() {
        let api = VirtualRawInput::new();
        let mut dest = [0u8; 8];
        let mut decoder = ReportDecoder::new();

        api.push_hid_event(TOKEN, H, -4, 2, &[1; 8]);
        let out = decoder.decode(&api, TOKEN, &targets(), &mut dest).unwrap();
        assert!(matches!(out, DecodeOutcome::Decoded(r) if r.copied == 0 && r.unit_size == -4));

        let other = PayloadToken(0x2000);
        api.push_hid_event(other, H, i32::MAX, i32::MAX, &[1; 8]);
        let out = decoder.decode(&api, other, &targets(), &mut dest).unwrap();
        assert!(matches!(out, DecodeOutcome::Decoded(r) if r.copied == 0));
        assert_eq!(dest, [0; 8]);
    }

    #[test]
    fn two_negative_factors_copy_their_product() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, -4, -2, &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut dest = [0u8; 16];
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap();
        assert!(matches!(out, DecodeOutcome::Decoded(r) if r.copied == 8));
        assert_eq!(&dest[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn body_cut_before_count_copies_nothing() {
        let api = VirtualRawInput::new();
        let mut bytes = encode_hid_event(H, RIM_INPUT, 4, 2, &[1; 8]);
        bytes.truncate(HEADER_LEN + HID_UNIT_COUNT_OFFSET);
        api.push_raw_event(TOKEN, bytes);

        let mut dest = [0xAAu8; 8];
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap();
        match out {
            DecodeOutcome::Decoded(r) => {
                assert_eq!(r.copied, 0);
                assert_eq!((r.unit_size, r.unit_count), (0, 0));
                assert_eq!(r.device, H);
            }
            DecodeOutcome::Ignored => panic!("expected a report"),
        }
        assert_eq!(dest, [0xAA; 8]);
    }

    #[test]
    fn declared_length_beyond_payload_copies_what_exists() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, 8, 4, &[5, 6, 7]);
        let mut dest = [0u8; 64];
        let out = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap();
        assert!(matches!(out, DecodeOutcome::Decoded(r) if r.copied == 3));
        assert_eq!(&dest[..3], &[5, 6, 7]);
    }

    #[test]
    fn failed_header_fetch_fails_the_event() {
        let api = VirtualRawInput::new();
        let err = ReportDecoder::new()
            .decode(&api, PayloadToken(0x9999), &targets(), &mut [0u8; 4])
            .unwrap_err();
        assert!(matches!(err, RawInputError::Subsystem { .. }));
    }

    #[test]
    fn failed_full_fetch_fails_the_event() {
        let api = VirtualRawInput::new();
        api.push_hid_event(TOKEN, H, 1, 4, &[1, 2, 3, 4]);
        api.fail_event_fetch(TOKEN);
        let mut dest = [0u8; 4];
        let err = ReportDecoder::new()
            .decode(&api, TOKEN, &targets(), &mut dest)
            .unwrap_err();
        assert!(matches!(err, RawInputError::Subsystem { .. }));
        assert_eq!(dest, [0; 4]);
    }
}
