//! Named FIFO carrying command records from the controller to the generator
//!
//! Controller (`sinescope control`) → FIFO → Generator (`sinescope generate`)
//!
//! The generator owns the FIFO: it creates the node, reads it without
//! blocking, and unlinks it on drop. Exactly one record's worth of bytes is
//! read per call. Anything other than a full record is discarded; there is no
//! resynchronization, so only one controller should write at a time.

use crate::command::{Command, RECORD_SIZE};
use crate::error::{IpcError, IpcResult};
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default FIFO path shared by all participants
pub const DEFAULT_FIFO_PATH: &str = "/tmp/sinescope_commands";

fn make_fifo(path: &Path) -> std::io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e))?;

    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o666) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Generator side of the channel
pub struct CommandReceiver {
    file: File,
    path: PathBuf,
}

impl CommandReceiver {
    /// Create the FIFO (replacing a stale one) and open it for non-blocking reads
    pub fn create(path: impl AsRef<Path>) -> IpcResult<Self> {
        let path = path.as_ref().to_path_buf();

        let _ = std::fs::remove_file(&path);

        make_fifo(&path).map_err(|source| IpcError::ChannelCreate {
            path: path.clone(),
            source,
        })?;

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| IpcError::ChannelCreate {
                path: path.clone(),
                source,
            })?;

        info!("📡 Command FIFO ready at {}", path.display());

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read at most one command without blocking
    ///
    /// Returns `None` when nothing is pending, when no writer is connected,
    /// or when the read came back short (the partial bytes are dropped).
    pub fn try_receive(&mut self) -> Option<Command> {
        let mut buf = [0u8; RECORD_SIZE];

        match self.file.read(&mut buf) {
            Ok(0) => None,
            Ok(n) if n == RECORD_SIZE => {
                let cmd = Command::decode(&buf);
                debug!("Received command {:?}", cmd);
                cmd
            }
            Ok(n) => {
                warn!("Dropped partial command record ({} of {} bytes)", n, RECORD_SIZE);
                None
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                None
            }
            Err(e) => {
                warn!("Command FIFO read failed: {}", e);
                None
            }
        }
    }
}

impl Drop for CommandReceiver {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        debug!("Removed command FIFO {}", self.path.display());
    }
}

/// Controller side of the channel
pub struct CommandSender {
    file: File,
}

impl CommandSender {
    /// Open an existing FIFO for writing
    ///
    /// Blocks until the generator has the read end open, which it always does
    /// once the FIFO exists.
    pub fn connect(path: impl AsRef<Path>) -> IpcResult<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| IpcError::ChannelOpen {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Connected to command FIFO {}", path.display());

        Ok(Self { file })
    }

    /// Write one whole record
    ///
    /// Records are smaller than `PIPE_BUF`, so the kernel never interleaves
    /// them with another writer's bytes.
    pub fn send(&mut self, cmd: &Command) -> IpcResult<()> {
        let bytes = cmd.encode()?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use tempfile::tempdir;

    #[test]
    fn test_empty_fifo_yields_none() {
        let dir = tempdir().unwrap();
        let mut rx = CommandReceiver::create(dir.path().join("cmd")).unwrap();
        assert!(rx.try_receive().is_none());
    }

    #[test]
    fn test_one_record_per_receive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cmd");
        let mut rx = CommandReceiver::create(&path).unwrap();
        let mut tx = CommandSender::connect(&path).unwrap();

        tx.send(&Command::start()).unwrap();
        tx.send(&Command::set_frequency(440.0)).unwrap();

        let first = rx.try_receive().unwrap();
        assert_eq!(first.kind, CommandKind::Start);

        let second = rx.try_receive().unwrap();
        assert_eq!(second.kind, CommandKind::SetFrequency);
        assert_eq!(second.value, 440.0);

        assert!(rx.try_receive().is_none());
    }

    #[test]
    fn test_partial_record_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cmd");
        let mut rx = CommandReceiver::create(&path).unwrap();

        let mut raw = OpenOptions::new().write(true).open(&path).unwrap();
        raw.write_all(&[1, 0, 0]).unwrap();

        assert!(rx.try_receive().is_none());
        assert!(rx.try_receive().is_none());
    }

    #[test]
    fn test_connect_without_fifo_fails() {
        let dir = tempdir().unwrap();
        let result = CommandSender::connect(dir.path().join("missing"));
        assert!(matches!(result, Err(IpcError::ChannelOpen { .. })));
    }

    #[test]
    fn test_drop_unlinks_fifo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cmd");
        {
            let _rx = CommandReceiver::create(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());

        // A later run can recreate it
        let _rx = CommandReceiver::create(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_create_replaces_stale_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cmd");
        std::fs::write(&path, b"stale").unwrap();

        let mut rx = CommandReceiver::create(&path).unwrap();
        assert!(rx.try_receive().is_none());
    }
}
