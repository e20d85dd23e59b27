//! Native payload layouts.
//!
//! The subsystem hands back C structs as raw bytes. Rather than casting pointers into
//! those bytes we read fields at fixed offsets with bounds-checked slice reads in
//! native byte order. Pointer-sized fields (`HANDLE`, `WPARAM`) follow the width of
//! the target, so header sizes differ between 32- and 64-bit builds.
//!
//! ```text
//! RAWINPUTHEADER            RAWHID (immediately after the header)
//!   0  dwType   u32           +0  dwSizeHid  i32
//!   4  dwSize   u32           +4  dwCount    i32
//!   8  hDevice  usize         +8  bRawData   [u8; dwSizeHid * dwCount]
//!   8+P wParam  usize
//! ```

use crate::device::{DeviceClassInfo, HidInfo, KeyboardInfo, MouseInfo, UsagePair};

/// Width of a native pointer-sized field.
pub const PTR_SIZE: usize = core::mem::size_of::<usize>();

/// `RAWINPUTHEADER` field offsets.
pub const HEADER_TYPE_OFFSET: usize = 0;
pub const HEADER_SIZE_OFFSET: usize = 4;
pub const HEADER_DEVICE_OFFSET: usize = 8;
pub const HEADER_WPARAM_OFFSET: usize = 8 + PTR_SIZE;
/// `sizeof(RAWINPUTHEADER)`.
pub const HEADER_LEN: usize = 8 + 2 * PTR_SIZE;

/// `RAWHID` field offsets, relative to the end of the header.
pub const HID_UNIT_SIZE_OFFSET: usize = 0;
pub const HID_UNIT_COUNT_OFFSET: usize = 4;
pub const HID_DATA_OFFSET: usize = 8;

/// `RID_DEVICE_INFO` layout. The union starts at offset 8.
pub const DEVICE_INFO_SIZE_OFFSET: usize = 0;
pub const DEVICE_INFO_TYPE_OFFSET: usize = 4;
pub const DEVICE_INFO_UNION_OFFSET: usize = 8;
/// `sizeof(RID_DEVICE_INFO)`; the keyboard variant (six `DWORD`s) is the largest.
pub const DEVICE_INFO_LEN: usize = DEVICE_INFO_UNION_OFFSET + 24;

#[inline]
fn field<const N: usize>(buf: &[u8], off: usize) -> Option<[u8; N]> {
    let end = off.checked_add(N)?;
    buf.get(off..end)?.try_into().ok()
}

#[inline]
pub fn read_u16(buf: &[u8], off: usize) -> Option<u16> {
    field::<2>(buf, off).map(u16::from_ne_bytes)
}

#[inline]
pub fn read_u32(buf: &[u8], off: usize) -> Option<u32> {
    field::<4>(buf, off).map(u32::from_ne_bytes)
}

#[inline]
pub fn read_i32(buf: &[u8], off: usize) -> Option<i32> {
    field::<4>(buf, off).map(i32::from_ne_bytes)
}

#[inline]
pub fn read_usize(buf: &[u8], off: usize) -> Option<usize> {
    field::<PTR_SIZE>(buf, off).map(usize::from_ne_bytes)
}

/// Decode a `RID_DEVICE_INFO` blob into the matching [`DeviceClassInfo`] variant.
///
/// The tag is checked first and only the union member it selects is read. A short
/// buffer or an unknown tag yields [`DeviceClassInfo::Unknown`].
pub fn parse_device_info(buf: &[u8]) -> DeviceClassInfo {
    let Some(tag) = read_u32(buf, DEVICE_INFO_TYPE_OFFSET) else {
        return DeviceClassInfo::Unknown;
    };
    let u = DEVICE_INFO_UNION_OFFSET;

    let parsed = match tag {
        0 => (|| {
            Some(DeviceClassInfo::Mouse(MouseInfo {
                id: read_u32(buf, u)?,
                buttons: read_u32(buf, u + 4)?,
                sample_rate: read_u32(buf, u + 8)?,
                has_horizontal_wheel: read_i32(buf, u + 12)? != 0,
            }))
        })(),
        1 => (|| {
            Some(DeviceClassInfo::Keyboard(KeyboardInfo {
                kind: read_u32(buf, u)?,
                sub_kind: read_u32(buf, u + 4)?,
                mode: read_u32(buf, u + 8)?,
                function_keys: read_u32(buf, u + 12)?,
                indicators: read_u32(buf, u + 16)?,
                total_keys: read_u32(buf, u + 20)?,
            }))
        })(),
        2 => (|| {
            Some(DeviceClassInfo::Hid(HidInfo {
                vendor_id: read_u32(buf, u)?,
                product_id: read_u32(buf, u + 4)?,
                version: read_u32(buf, u + 8)?,
                usage: UsagePair::new(read_u16(buf, u + 12)?, read_u16(buf, u + 14)?),
            }))
        })(),
        _ => None,
    };

    parsed.unwrap_or(DeviceClassInfo::Unknown)
}

/// Encode a [`DeviceClassInfo`] back into a native `RID_DEVICE_INFO` blob.
///
/// Used by the in-memory backend to hand out byte-exact payloads.
pub fn encode_device_info(info: &DeviceClassInfo) -> Vec<u8> {
    let mut buf = vec![0u8; DEVICE_INFO_LEN];
    buf[DEVICE_INFO_SIZE_OFFSET..DEVICE_INFO_SIZE_OFFSET + 4]
        .copy_from_slice(&(DEVICE_INFO_LEN as u32).to_ne_bytes());

    let mut words: Vec<u8> = Vec::with_capacity(24);
    let tag: u32 = match info {
        DeviceClassInfo::Mouse(m) => {
            for w in [m.id, m.buttons, m.sample_rate, m.has_horizontal_wheel as u32] {
                words.extend_from_slice(&w.to_ne_bytes());
            }
            0
        }
        DeviceClassInfo::Keyboard(k) => {
            for w in [k.kind, k.sub_kind, k.mode, k.function_keys, k.indicators, k.total_keys] {
                words.extend_from_slice(&w.to_ne_bytes());
            }
            1
        }
        DeviceClassInfo::Hid(h) => {
            for w in [h.vendor_id, h.product_id, h.version] {
                words.extend_from_slice(&w.to_ne_bytes());
            }
            words.extend_from_slice(&h.usage.usage_page.to_ne_bytes());
            words.extend_from_slice(&h.usage.usage.to_ne_bytes());
            2
        }
        DeviceClassInfo::Unknown => u32::MAX,
    };

    buf[DEVICE_INFO_TYPE_OFFSET..DEVICE_INFO_TYPE_OFFSET + 4].copy_from_slice(&tag.to_ne_bytes());
    buf[DEVICE_INFO_UNION_OFFSET..DEVICE_INFO_UNION_OFFSET + words.len()].copy_from_slice(&words);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_len_tracks_pointer_width() {
        if cfg!(target_pointer_width = "64") {
            assert_eq!(HEADER_LEN, 24);
        } else {
            assert_eq!(HEADER_LEN, 16);
        }
        assert_eq!(HEADER_WPARAM_OFFSET + PTR_SIZE, HEADER_LEN);
    }

    #[test]
    fn readers_refuse_out_of_bounds() {
        let buf = [1u8, 0, 0, 0, 2];
        assert_eq!(read_u32(&buf, 0), Some(1));
        assert_eq!(read_u32(&buf, 2), None);
        assert_eq!(read_u16(&buf, 4), None);
        assert_eq!(read_u32(&buf, usize::MAX), None);
    }

    #[test]
    fn hid_info_is_decoded_from_native_blob() {
        let info = DeviceClassInfo::Hid(HidInfo {
            vendor_id: 0x057e,
            product_id: 0x2009,
            version: 0x0001,
            usage: UsagePair::GAMEPAD,
        });
        let blob = encode_device_info(&info);
        assert_eq!(blob.len(), DEVICE_INFO_LEN);
        assert_eq!(parse_device_info(&blob), info);
    }

    #[test]
    fn mouse_wheel_flag_is_a_native_bool() {
        let mut blob = encode_device_info(&DeviceClassInfo::Mouse(MouseInfo {
            id: 1,
            buttons: 5,
            sample_rate: 0,
            has_horizontal_wheel: false,
        }));
        blob[DEVICE_INFO_UNION_OFFSET + 12] = 7;
        match parse_device_info(&blob) {
            DeviceClassInfo::Mouse(m) => assert!(m.has_horizontal_wheel),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn truncated_or_unknown_blobs_resolve_to_unknown() {
        let blob = encode_device_info(&DeviceClassInfo::Keyboard(KeyboardInfo {
            kind: 4,
            sub_kind: 0,
            mode: 1,
            function_keys: 12,
            indicators: 3,
            total_keys: 101,
        }));
        assert_eq!(parse_device_info(&blob[..20]), DeviceClassInfo::Unknown);
        assert_eq!(parse_device_info(&[]), DeviceClassInfo::Unknown);

        let mut bad_tag = blob.clone();
        bad_tag[DEVICE_INFO_TYPE_OFFSET] = 9;
        assert_eq!(parse_device_info(&bad_tag), DeviceClassInfo::Unknown);
    }
}
