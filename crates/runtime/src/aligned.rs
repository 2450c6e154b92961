// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! An owned, 64-byte-aligned byte buffer. `runtime/column_data.cc` in the
//! reference implementation gets this property for free by `mmap`-ing the
//! column file directly (pages are always page-aligned); spec.md §4.1 allows
//! a full read instead as long as "behavior must be indistinguishable from a
//! full read" for alignment purposes, so `Open` here reads the whole file
//! into an explicitly aligned allocation rather than mmap-ing it.

use std::alloc::{self, Layout};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::slice;

use kepler_common::{KeplerError, Result};

/// Alignment guaranteed for every [`AlignedBytes`] buffer, wide enough for
/// 256-bit (32-byte) SIMD loads used by `SIMDScanSelect` with headroom.
pub const COLUMN_ALIGNMENT: usize = 64;

pub struct AlignedBytes {
    ptr: *mut u8,
    len: usize,
    layout: Layout,
}

// SAFETY: `AlignedBytes` owns its allocation exclusively and exposes it only
// through `&[u8]`/`&[T]` views tied to `&self`, so sharing the pointer across
// threads behind a shared reference is sound (same guarantee as `Vec<u8>`).
unsafe impl Send for AlignedBytes {}
unsafe impl Sync for AlignedBytes {}

impl AlignedBytes {
    /// Reads `path` fully into a freshly allocated `COLUMN_ALIGNMENT`-aligned
    /// buffer. Missing files surface as `ResourceMissing`, matching spec.md §7.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|_| KeplerError::resource_missing(path.display()))?;
        let len = file
            .metadata()
            .map_err(|_| KeplerError::resource_missing(path.display()))?
            .len() as usize;

        let mut buf = AlignedBytes::with_len(len)?;
        file.read_exact(buf.as_mut_slice())?;
        Ok(buf)
    }

    fn with_len(len: usize) -> Result<Self> {
        let alloc_len = len.max(1);
        let layout = Layout::from_size_align(alloc_len, COLUMN_ALIGNMENT)
            .map_err(|e| KeplerError::corrupt(format!("bad column layout: {e}")))?;
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            alloc::handle_alloc_error(layout);
        }
        Ok(AlignedBytes { ptr, len, layout })
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `len` bytes for the lifetime of `self`.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `ptr` is valid for `len` bytes and uniquely borrowed here.
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reinterprets the buffer as a `&[T]`. Caller must ensure `self.len()`
    /// is a multiple of `size_of::<T>()` and that every bit pattern present
    /// is a valid `T` (true for the plain-old-data numeric types this engine
    /// stores).
    pub fn as_slice_of<T: Copy>(&self) -> &[T] {
        let elem = std::mem::size_of::<T>();
        debug_assert_eq!(self.len % elem, 0);
        // SAFETY: alignment is COLUMN_ALIGNMENT >= align_of::<T>() for every
        // T this engine stores (i8/i16/i32/i64/f64), and the byte range is
        // valid per `as_slice`.
        unsafe { slice::from_raw_parts(self.ptr as *const T, self.len / elem) }
    }
}

impl Drop for AlignedBytes {
    fn drop(&mut self) {
        if self.layout.size() > 0 {
            // SAFETY: `ptr`/`layout` are exactly what `alloc_zeroed` returned.
            unsafe { alloc::dealloc(self.ptr, self.layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_reads_full_file_aligned() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&42i32.to_le_bytes()).unwrap();
        file.write_all(&7i32.to_le_bytes()).unwrap();
        file.flush().unwrap();

        let bytes = AlignedBytes::open(file.path()).unwrap();
        assert_eq!(bytes.as_ptr_addr() % COLUMN_ALIGNMENT, 0);
        let ints: &[i32] = bytes.as_slice_of();
        assert_eq!(ints, &[42, 7]);
    }

    #[test]
    fn open_missing_file_is_resource_missing() {
        let err = AlignedBytes::open("/nonexistent/path.kdb").unwrap_err();
        assert!(matches!(err, KeplerError::ResourceMissing(_)));
    }

    impl AlignedBytes {
        fn as_ptr_addr(&self) -> usize {
            self.ptr as usize
        }
    }
}
