// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pitch-aware CPU upload path.
//!
//! Texture and buffer writes follow a strict acquire → write → release
//! sequence: the backend locks the resource, writes pixels through the
//! helpers here, and unlocks before the resource is used in a draw call.
//!
//! Native locks expose their own row pitch, which rarely matches the
//! source's. Copies therefore go row by row — a flat `memcpy` across rows
//! with differing strides shears the image. [`blit`] is the one place this
//! is implemented; every backend routes uploads through it.

use crate::format::PixelSlice;

/// A locked, CPU-writable destination region.
///
/// `pitch` is the byte distance between destination row starts, as reported
/// by the native lock. `data` must cover `(rows - 1) * pitch + row_bytes`
/// bytes for whatever is written into it.
#[derive(Debug)]
pub struct LockedRegion<'a> {
    /// Writable destination bytes.
    pub data: &'a mut [u8],
    /// Byte distance between destination row starts.
    pub pitch: usize,
}

/// Copies `src` into `dst` row by row, honoring both pitches.
///
/// Rows are `src.row_bytes()` long; destination padding beyond that is left
/// untouched.
///
/// # Panics
///
/// Panics if the destination pitch is smaller than a source row, or if
/// `dst.data` is too short for the last row.
pub fn blit(dst: &mut LockedRegion<'_>, src: &PixelSlice<'_>) {
    let row_bytes = src.row_bytes();
    assert!(
        dst.pitch >= row_bytes,
        "destination pitch {} smaller than source row {row_bytes}",
        dst.pitch
    );
    if src.height() == 0 {
        return;
    }
    let needed = (src.height() as usize - 1) * dst.pitch + row_bytes;
    assert!(
        dst.data.len() >= needed,
        "destination too short: {} < {needed}",
        dst.data.len()
    );

    for y in 0..src.height() {
        let start = y as usize * dst.pitch;
        dst.data[start..start + row_bytes].copy_from_slice(src.row(y));
    }
}

/// Fills `rows` rows of `row_bytes` each with `value`, honoring the pitch.
///
/// Pitch padding is left untouched. Used to clear a locked region before
/// first use.
///
/// # Panics
///
/// Panics if `dst.data` is too short for the last row.
pub fn fill(dst: &mut LockedRegion<'_>, rows: u32, row_bytes: usize, value: u8) {
    assert!(
        dst.pitch >= row_bytes,
        "destination pitch {} smaller than row {row_bytes}",
        dst.pitch
    );
    for y in 0..rows {
        let start = y as usize * dst.pitch;
        dst.data[start..start + row_bytes].fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::{blit, fill, LockedRegion};
    use crate::format::{PixelFormat, PixelSlice};
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn blit_with_differing_strides_reproduces_the_image() {
        // 3x2 Rgb565: source pitch 8 (2 bytes padding), destination pitch 10.
        let src_data: Vec<u8> = vec![
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12, 0xEE, 0xEE,
        ];
        let src = PixelSlice::new(&src_data, 3, 2, 8, PixelFormat::Rgb565).unwrap();

        let mut dst_data = vec![0_u8; 16];
        let mut dst = LockedRegion {
            data: &mut dst_data,
            pitch: 10,
        };
        blit(&mut dst, &src);

        assert_eq!(&dst_data[0..6], &[1, 2, 3, 4, 5, 6]);
        // Padding untouched.
        assert_eq!(&dst_data[6..10], &[0, 0, 0, 0]);
        assert_eq!(&dst_data[10..16], &[7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn blit_packed_to_packed_is_byte_identical() {
        let src_data: Vec<u8> = (0..24).collect();
        let src = PixelSlice::packed(&src_data, 3, 2, PixelFormat::Xrgb8888).unwrap();

        let mut dst_data = vec![0_u8; 24];
        let mut dst = LockedRegion {
            data: &mut dst_data,
            pitch: 12,
        };
        blit(&mut dst, &src);
        assert_eq!(dst_data, src_data);
    }

    #[test]
    fn blit_empty_source_writes_nothing() {
        let src = PixelSlice::packed(&[], 0, 0, PixelFormat::Rgb565).unwrap();
        let mut dst_data = vec![0xAB_u8; 4];
        let mut dst = LockedRegion {
            data: &mut dst_data,
            pitch: 2,
        };
        blit(&mut dst, &src);
        assert_eq!(dst_data, [0xAB; 4]);
    }

    #[test]
    #[should_panic(expected = "destination pitch")]
    fn blit_rejects_narrow_destination() {
        let src_data = vec![0_u8; 8];
        let src = PixelSlice::packed(&src_data, 2, 2, PixelFormat::Rgb565).unwrap();
        let mut dst_data = vec![0_u8; 8];
        let mut dst = LockedRegion {
            data: &mut dst_data,
            pitch: 3,
        };
        blit(&mut dst, &src);
    }

    #[test]
    fn fill_clears_rows_but_not_padding() {
        let mut dst_data = vec![0xFF_u8; 10];
        let mut dst = LockedRegion {
            data: &mut dst_data,
            pitch: 5,
        };
        fill(&mut dst, 2, 3, 0);
        assert_eq!(dst_data, [0, 0, 0, 0xFF, 0xFF, 0, 0, 0, 0xFF, 0xFF]);
    }
}
