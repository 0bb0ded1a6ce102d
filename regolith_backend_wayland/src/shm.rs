// Copyright 2026 the Regolith Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-memory buffers for `wl_shm` presentation.
//!
//! Buffer files are created with the mechanism negotiated at init: an
//! anonymous `memfd` with a grow seal where the kernel supports it, a named
//! POSIX shared-memory object (unlinked right after handoff) otherwise.
//! Pixels are staged CPU-side and written through the file descriptor, so
//! the buffer never needs to be mapped into our address space.

use std::fs::File;
use std::os::fd::AsFd;
use std::os::unix::fs::FileExt;

use rustix::fs::{FallocateFlags, MemfdFlags, SealFlags};
use wayland_client::protocol::{wl_buffer, wl_shm, wl_shm_pool};
use wayland_client::QueueHandle;

use regolith_core::config::SharedMemoryKind;
use regolith_core::error::BackendError;
use regolith_core::format::{PixelFormat, PixelSlice};
use regolith_core::upload::{self, LockedRegion};

use crate::state::WaylandState;

const SHM_OBJECT_NAME: &str = "/regolith-wayland-shm";

/// Probes which shared-memory mechanism the host supports.
///
/// Prefers `memfd_create`; falls back to named POSIX shared memory.
pub(crate) fn negotiate_shared_memory() -> Option<SharedMemoryKind> {
    match rustix::fs::memfd_create("regolith-probe", MemfdFlags::CLOEXEC) {
        Ok(_) => Some(SharedMemoryKind::Memfd),
        Err(_) => match rustix::shm::open(
            SHM_OBJECT_NAME,
            rustix::shm::OFlags::RDWR | rustix::shm::OFlags::CREATE,
            rustix::fs::Mode::RUSR | rustix::fs::Mode::WUSR,
        ) {
            Ok(_) => {
                let _ = rustix::shm::unlink(SHM_OBJECT_NAME);
                Some(SharedMemoryKind::ShmObject)
            }
            Err(_) => None,
        },
    }
}

fn create_backing_file(kind: SharedMemoryKind, size: u64) -> Result<File, BackendError> {
    match kind {
        SharedMemoryKind::Memfd => {
            let fd = rustix::fs::memfd_create(
                "regolith-wayland-shm",
                MemfdFlags::CLOEXEC | MemfdFlags::ALLOW_SEALING,
            )
            .map_err(|err| BackendError::ResourceCreation(err.to_string()))?;
            // The compositor maps this file; sealing shrink keeps it from
            // faulting on a truncated mapping.
            let _ = rustix::fs::fcntl_add_seals(&fd, SealFlags::SHRINK);
            rustix::fs::fallocate(&fd, FallocateFlags::empty(), 0, size)
                .map_err(|err| BackendError::ResourceCreation(err.to_string()))?;
            Ok(File::from(fd))
        }
        SharedMemoryKind::ShmObject => {
            let fd = rustix::shm::open(
                SHM_OBJECT_NAME,
                rustix::shm::OFlags::RDWR | rustix::shm::OFlags::CREATE,
                rustix::fs::Mode::RUSR | rustix::fs::Mode::WUSR,
            )
            .map_err(|err| BackendError::ResourceCreation(err.to_string()))?;
            // Unlink immediately: the descriptor keeps the object alive.
            let _ = rustix::shm::unlink(SHM_OBJECT_NAME);
            rustix::fs::ftruncate(&fd, size)
                .map_err(|err| BackendError::ResourceCreation(err.to_string()))?;
            Ok(File::from(fd))
        }
    }
}

const fn shm_format(format: PixelFormat) -> wl_shm::Format {
    match format {
        PixelFormat::Rgb565 => wl_shm::Format::Rgb565,
        PixelFormat::Xrgb8888 => wl_shm::Format::Xrgb8888,
        PixelFormat::Argb8888 => wl_shm::Format::Argb8888,
    }
}

/// One `wl_buffer` backed by a shared-memory file.
///
/// Holds the staging copy of its pixels; uploads blit into the staging rows
/// and then push the whole image through the descriptor in one write.
#[derive(Debug)]
pub(crate) struct ShmBuffer {
    file: File,
    pool: wl_shm_pool::WlShmPool,
    pub(crate) buffer: wl_buffer::WlBuffer,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) stride: usize,
    staging: Vec<u8>,
}

impl ShmBuffer {
    /// Allocates a buffer of the given extent and format.
    pub(crate) fn allocate(
        shm: &wl_shm::WlShm,
        kind: SharedMemoryKind,
        qh: &QueueHandle<WaylandState>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, BackendError> {
        let stride = width as usize * format.bytes_per_pixel();
        let size = stride * height as usize;
        if size == 0 {
            return Err(BackendError::ResourceCreation(
                "zero-sized shm buffer".to_string(),
            ));
        }
        let file = create_backing_file(kind, size as u64)?;

        let size_i32 = i32::try_from(size)
            .map_err(|_| BackendError::ResourceCreation("shm buffer too large".to_string()))?;
        let stride_i32 = i32::try_from(stride)
            .map_err(|_| BackendError::ResourceCreation("shm stride too large".to_string()))?;
        let width_i32 = i32::try_from(width)
            .map_err(|_| BackendError::ResourceCreation("shm width too large".to_string()))?;
        let height_i32 = i32::try_from(height)
            .map_err(|_| BackendError::ResourceCreation("shm height too large".to_string()))?;

        let pool = shm.create_pool(file.as_fd(), size_i32, qh, ());
        let buffer = pool.create_buffer(
            0,
            width_i32,
            height_i32,
            stride_i32,
            shm_format(format),
            qh,
            (),
        );

        Ok(Self {
            file,
            pool,
            buffer,
            width,
            height,
            stride,
            staging: vec![0; size],
        })
    }

    /// Copies `src` into the buffer, row by row, honoring both pitches.
    pub(crate) fn write_pixels(&mut self, src: &PixelSlice<'_>) -> Result<(), BackendError> {
        let mut dst = LockedRegion {
            data: &mut self.staging,
            pitch: self.stride,
        };
        upload::blit(&mut dst, src);
        self.file
            .write_all_at(&self.staging, 0)
            .map_err(|err| BackendError::ResourceCreation(err.to_string()))
    }

    /// Fills the buffer with an XRGB checkerboard, honoring the buffer
    /// scale, and pushes it through the descriptor.
    pub(crate) fn paint_checkerboard(
        &mut self,
        scale: u32,
        check: u32,
        bg: u32,
        fg: u32,
    ) -> Result<(), BackendError> {
        assert_eq!(
            self.stride,
            self.width as usize * 4,
            "checkerboard requires a 32-bit format"
        );
        let scale = scale.max(1);
        let logical_w = self.width / scale;
        let logical_h = self.height / scale;
        let mut pixels: Vec<u32> = vec![bg; self.width as usize * self.height as usize];
        let row_px = self.width as usize;

        for y in 0..logical_h {
            for x in 0..logical_w {
                let color = if (x & check) ^ (y & check) != 0 { fg } else { bg };
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = (x * scale + sx) as usize;
                        let py = (y * scale + sy) as usize;
                        pixels[py * row_px + px] = color;
                    }
                }
            }
        }

        self.staging.copy_from_slice(bytemuck::cast_slice(&pixels));
        self.file
            .write_all_at(&self.staging, 0)
            .map_err(|err| BackendError::ResourceCreation(err.to_string()))
    }
}

impl Drop for ShmBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
        self.pool.destroy();
        // The file descriptor closes with `file`.
    }
}

#[cfg(test)]
mod tests {
    use super::negotiate_shared_memory;

    #[test]
    fn shared_memory_negotiation_finds_a_mechanism() {
        // Any Linux host this backend targets supports at least one.
        assert!(negotiate_shared_memory().is_some());
    }
}
