//! Standard Output Capture
//!
//! **Responsibility:**
//! Swap the process-wide stdout descriptor for a temporary file while a
//! routine runs, then put the original descriptor back.
//!
//! **Guarantees:**
//! - Restoration lives in `Drop`, so it runs on normal return, on error,
//!   and while unwinding from a panic
//! - Text written before a failure is still returned to the caller
//! - At most one capture is active per process; acquisitions queue on a lock
//!
//! Routines write to the ambient stdout (`println!`, `io::stdout()`); they are
//! not handed a writer.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use thiserror::Error;

/// Held for the whole lifetime of a [`StdoutCapture`]
static STDOUT_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to duplicate stdout descriptor: {0}")]
    Duplicate(#[source] io::Error),

    #[error("failed to redirect stdout: {0}")]
    Redirect(#[source] io::Error),

    #[error("failed to restore stdout: {0}")]
    Restore(#[source] io::Error),

    #[error("capture sink I/O failed: {0}")]
    Sink(#[from] io::Error),
}

/// Scoped redirection of file descriptor 1 into a temporary file
pub struct StdoutCapture {
    saved: Option<OwnedFd>,
    sink: File,
    _lock: MutexGuard<'static, ()>,
}

impl StdoutCapture {
    /// Start capturing. Blocks while another capture is active.
    pub fn begin() -> Result<Self, CaptureError> {
        let lock = STDOUT_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sink = tempfile::tempfile()?;

        // Anything the harness buffered so far belongs to the real stdout.
        let _ = io::stdout().flush();

        // SAFETY: dup has no memory-safety preconditions; the result is checked.
        let raw = unsafe { libc::dup(libc::STDOUT_FILENO) };
        if raw < 0 {
            return Err(CaptureError::Duplicate(io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly duplicated descriptor nobody else owns.
        let saved = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: both descriptors stay open for the duration of the call.
        if unsafe { libc::dup2(sink.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
            return Err(CaptureError::Redirect(io::Error::last_os_error()));
        }

        Ok(Self {
            saved: Some(saved),
            sink,
            _lock: lock,
        })
    }

    /// Restore stdout and return everything written while captured
    pub fn finish(mut self) -> Result<String, CaptureError> {
        self.restore()?;

        self.sink.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        self.sink.read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn restore(&mut self) -> Result<(), CaptureError> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };

        // Text still sitting in the std buffer was written while captured.
        let _ = io::stdout().flush();

        // SAFETY: `saved` is owned by us and open; fd 1 is always valid to replace.
        if unsafe { libc::dup2(saved.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
            return Err(CaptureError::Restore(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for StdoutCapture {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::error!(error = %e, "stdout could not be restored after capture");
        }
    }
}

/// Outcome of a captured call together with its output
#[derive(Debug)]
pub struct Captured<R> {
    /// `Err` carries the panic payload if the call panicked
    pub outcome: thread::Result<R>,
    pub stdout: String,
}

/// Run `f` with stdout captured.
///
/// A panic inside `f` is contained and returned as `outcome`; the text
/// written up to the panic is still in `stdout`.
pub fn with_captured_output<F, R>(f: F) -> Result<Captured<R>, CaptureError>
where
    F: FnOnce() -> R,
{
    let capture = StdoutCapture::begin()?;
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    let stdout = capture.finish()?;
    Ok(Captured { outcome, stdout })
}
