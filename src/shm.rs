//! POSIX shared-memory segment holding a [`RingLayout`]
//!
//! The generator creates (and later unlinks) the named object; viewers attach
//! to it by name. The segment size is fixed at `size_of::<RingLayout>()` and
//! never changes after creation.

use crate::error::{IpcError, IpcResult};
use crate::ring::RingLayout;
use std::ffi::CString;
use std::ops::Deref;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::ptr::NonNull;
use tracing::{debug, info};

/// Default shared-memory object name shared by all participants
pub const DEFAULT_SHM_NAME: &str = "/sinescope_buffer";

/// Total bytes of the mapped object
pub const SEGMENT_SIZE: usize = std::mem::size_of::<RingLayout>();

fn c_name(name: &str) -> IpcResult<CString> {
    if !name.starts_with('/') || name.len() < 2 {
        return Err(IpcError::InvalidName(name.to_string()));
    }
    CString::new(name).map_err(|_| IpcError::InvalidName(name.to_string()))
}

/// A mapped ring buffer segment
///
/// Dereferences to the [`RingLayout`] it maps. Dropping unmaps and closes it;
/// the creating side also unlinks the name so the next run starts clean.
pub struct SharedSegment {
    ptr: NonNull<RingLayout>,
    _fd: OwnedFd,
    name: String,
    owner: bool,
}

// SAFETY: the mapping is only accessed through RingLayout, whose fields are
// all atomics, and it stays valid until drop.
unsafe impl Send for SharedSegment {}
unsafe impl Sync for SharedSegment {}

impl SharedSegment {
    /// Create (or replace) the named segment and zero it
    pub fn create(name: &str) -> IpcResult<Self> {
        let c = c_name(name)?;
        let fail = |source: std::io::Error| IpcError::SegmentCreate {
            name: name.to_string(),
            source,
        };

        // SAFETY: c is NUL-terminated; a missing object is not an error here.
        unsafe {
            libc::shm_unlink(c.as_ptr());
        }

        // SAFETY: plain FFI call with a valid name pointer.
        let raw = unsafe {
            libc::shm_open(c.as_ptr(), libc::O_CREAT | libc::O_RDWR, 0o666 as libc::mode_t)
        };
        if raw < 0 {
            return Err(fail(std::io::Error::last_os_error()));
        }
        // SAFETY: shm_open returned a fresh descriptor that nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: fd is open for writing.
        if unsafe { libc::ftruncate(fd.as_raw_fd(), SEGMENT_SIZE as libc::off_t) } < 0 {
            let err = std::io::Error::last_os_error();
            unsafe {
                libc::shm_unlink(c.as_ptr());
            }
            return Err(fail(err));
        }

        let ptr = match map(&fd) {
            Ok(ptr) => ptr,
            Err(err) => {
                unsafe {
                    libc::shm_unlink(c.as_ptr());
                }
                return Err(fail(err));
            }
        };

        let segment = Self {
            ptr,
            _fd: fd,
            name: name.to_string(),
            owner: true,
        };
        segment.reset();

        info!("🧠 Shared memory {} created ({} bytes)", name, SEGMENT_SIZE);

        Ok(segment)
    }

    /// Attach to a segment some generator already created
    pub fn open(name: &str) -> IpcResult<Self> {
        let c = c_name(name)?;
        let fail = |source: std::io::Error| IpcError::SegmentOpen {
            name: name.to_string(),
            source,
        };

        // SAFETY: plain FFI call with a valid name pointer.
        let raw = unsafe { libc::shm_open(c.as_ptr(), libc::O_RDWR, 0 as libc::mode_t) };
        if raw < 0 {
            return Err(fail(std::io::Error::last_os_error()));
        }
        // SAFETY: shm_open returned a fresh descriptor that nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: libc::stat is plain old data; all-zero is a valid value.
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        // SAFETY: stat points to writable memory of the right type.
        if unsafe { libc::fstat(fd.as_raw_fd(), &mut stat) } < 0 {
            return Err(fail(std::io::Error::last_os_error()));
        }
        if (stat.st_size as usize) < SEGMENT_SIZE {
            return Err(fail(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("segment is {} bytes, expected {}", stat.st_size, SEGMENT_SIZE),
            )));
        }

        let ptr = map(&fd).map_err(fail)?;

        debug!("Attached to shared memory {}", name);

        Ok(Self {
            ptr,
            _fd: fd,
            name: name.to_string(),
            owner: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether dropping this handle unlinks the name
    pub fn is_owner(&self) -> bool {
        self.owner
    }
}

fn map(fd: &OwnedFd) -> std::io::Result<NonNull<RingLayout>> {
    // SAFETY: fd refers to an object at least SEGMENT_SIZE bytes long.
    let addr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            SEGMENT_SIZE,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd.as_raw_fd(),
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }

    NonNull::new(addr.cast::<RingLayout>())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "mmap returned null"))
}

impl Deref for SharedSegment {
    type Target = RingLayout;

    fn deref(&self) -> &RingLayout {
        // SAFETY: the mapping is page aligned, SEGMENT_SIZE long, and any bit
        // pattern is a valid RingLayout (atomic integers and a bool that only
        // this crate writes).
        unsafe { self.ptr.as_ref() }
    }
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        // SAFETY: ptr came from mmap with SEGMENT_SIZE and is unmapped once.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), SEGMENT_SIZE);
        }

        if self.owner {
            if let Ok(c) = c_name(&self.name) {
                unsafe {
                    libc::shm_unlink(c.as_ptr());
                }
            }
            debug!("Unlinked shared memory {}", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!(
            "/sinescope_test_{}_{}_{}",
            tag,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(matches!(SharedSegment::create("no_slash"), Err(IpcError::InvalidName(_))));
        assert!(matches!(SharedSegment::create("/"), Err(IpcError::InvalidName(_))));
    }

    #[test]
    fn test_created_segment_is_zeroed() {
        let seg = SharedSegment::create(&unique_name("zero")).unwrap();
        assert!(seg.is_owner());
        assert_eq!(seg.write_position(), 0);
        assert_eq!(seg.read_position(), 0);
        assert_eq!(seg.total_produced(), 0);
        assert!(!seg.is_new_data_available());
    }

    #[test]
    fn test_viewer_sees_producer_writes() {
        let name = unique_name("share");
        let producer = SharedSegment::create(&name).unwrap();
        let viewer = SharedSegment::open(&name).unwrap();
        assert!(!viewer.is_owner());

        producer.publish_frame(&[0.5, -0.5]);

        assert_eq!(viewer.write_position(), 2);
        assert!(viewer.is_new_data_available());
        assert_eq!(viewer.sample_at(1), -0.5);
    }

    #[test]
    fn test_open_missing_segment_fails() {
        let result = SharedSegment::open(&unique_name("missing"));
        assert!(matches!(result, Err(IpcError::SegmentOpen { .. })));
    }

    #[test]
    fn test_owner_drop_unlinks() {
        let name = unique_name("unlink");
        drop(SharedSegment::create(&name).unwrap());
        assert!(SharedSegment::open(&name).is_err());

        // Recreation after a clean shutdown works
        let again = SharedSegment::create(&name).unwrap();
        assert_eq!(again.write_position(), 0);
    }

    #[test]
    fn test_create_replaces_stale_segment() {
        let name = unique_name("stale");
        let first = SharedSegment::create(&name).unwrap();
        first.publish_frame(&[1.0; 10]);

        let second = SharedSegment::create(&name).unwrap();
        assert_eq!(second.write_position(), 0);
        drop(first);
        drop(second);
    }
}
