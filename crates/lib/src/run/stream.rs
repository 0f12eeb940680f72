//! Reading a child's stdout and stderr line by line.
//!
//! On unix both pipes are switched to non-blocking mode and serviced with
//! `poll(2)` while the child is alive, so lines are delivered in the order they
//! arrive across the two streams. After the child exits the pipes are drained
//! once more and reading stops.
//!
//! Elsewhere [`pump_sequential`] reads stdout to the end first and stderr
//! afterwards. Relative order between the two streams is lost on that path, a
//! child that fills the stderr pipe before closing stdout can stall until
//! stdout ends, and a grandchild holding the pipes open delays the return.

use std::io::{self, ErrorKind, Read};
use std::process::{ChildStderr, ChildStdout};

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
  Stdout,
  Stderr,
}

const CHUNK_SIZE: usize = 8192;

/// Accumulates bytes and hands out complete lines.
///
/// Lines end at `\n`; a trailing `\r` is dropped, empty lines are skipped and
/// invalid UTF-8 is replaced.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
  pending: Vec<u8>,
}

impl LineBuffer {
  pub(crate) fn push(&mut self, chunk: &[u8], emit: &mut dyn FnMut(&str)) {
    self.pending.extend_from_slice(chunk);
    let mut start = 0;
    while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
      let end = start + offset;
      emit_line(&self.pending[start..end], emit);
      start = end + 1;
    }
    self.pending.drain(..start);
  }

  /// Flush a final line that had no terminating newline.
  pub(crate) fn finish(&mut self, emit: &mut dyn FnMut(&str)) {
    let rest = std::mem::take(&mut self.pending);
    emit_line(&rest, emit);
  }
}

fn emit_line(bytes: &[u8], emit: &mut dyn FnMut(&str)) {
  let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
  if !bytes.is_empty() {
    emit(&String::from_utf8_lossy(bytes));
  }
}

/// Read everything currently available. Returns `false` once the pipe is closed.
fn drain(
  reader: &mut impl Read,
  chunk: &mut [u8],
  buffer: &mut LineBuffer,
  emit: &mut dyn FnMut(&str),
) -> io::Result<bool> {
  loop {
    match reader.read(chunk) {
      Ok(0) => {
        buffer.finish(emit);
        return Ok(false);
      }
      Ok(n) => buffer.push(&chunk[..n], emit),
      Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(true),
      Err(e) if e.kind() == ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    }
  }
}

/// How long one `poll(2)` waits before the child is checked again.
#[cfg(unix)]
const POLL_INTERVAL_MS: i64 = 100;

/// Deliver lines from both pipes while the child runs.
///
/// `exited` is asked after every poll round. Once it reports the child gone,
/// whatever is already buffered in the pipes is read and the loop ends, even
/// if a grandchild still holds the write ends open.
#[cfg(unix)]
pub(crate) fn pump(
  mut stdout: ChildStdout,
  mut stderr: ChildStderr,
  exited: &mut dyn FnMut() -> io::Result<bool>,
  on_line: &mut dyn FnMut(StreamKind, &str),
) -> io::Result<()> {
  use rustix::event::{PollFd, PollFlags, Timespec, poll};
  use rustix::io::Errno;

  set_nonblocking(&stdout)?;
  set_nonblocking(&stderr)?;

  let interval = Timespec {
    tv_sec: 0,
    tv_nsec: POLL_INTERVAL_MS * 1_000_000,
  };
  let mut chunk = [0u8; CHUNK_SIZE];
  let mut out_buffer = LineBuffer::default();
  let mut err_buffer = LineBuffer::default();
  let mut out_open = true;
  let mut err_open = true;

  while out_open || err_open {
    let (out_ready, err_ready) = {
      let mut fds = Vec::with_capacity(2);
      if out_open {
        fds.push(PollFd::new(&stdout, PollFlags::IN));
      }
      if err_open {
        fds.push(PollFd::new(&stderr, PollFlags::IN));
      }

      match poll(&mut fds, Some(&interval)) {
        Ok(_) => {}
        Err(Errno::INTR) => continue,
        Err(e) => return Err(e.into()),
      }

      // HUP and ERR count as ready: the read that follows reports EOF or the error
      let mut revents = fds.iter().map(|fd| !fd.revents().is_empty());
      let out_ready = out_open && revents.next().unwrap_or(false);
      let err_ready = err_open && revents.next().unwrap_or(false);
      (out_ready, err_ready)
    };

    if out_ready {
      out_open = drain(&mut stdout, &mut chunk, &mut out_buffer, &mut |line: &str| {
        on_line(StreamKind::Stdout, line)
      })?;
    }
    if err_ready {
      err_open = drain(&mut stderr, &mut chunk, &mut err_buffer, &mut |line: &str| {
        on_line(StreamKind::Stderr, line)
      })?;
    }

    if (out_open || err_open) && exited()? {
      if out_open {
        drain(&mut stdout, &mut chunk, &mut out_buffer, &mut |line: &str| {
          on_line(StreamKind::Stdout, line)
        })?;
        out_buffer.finish(&mut |line: &str| on_line(StreamKind::Stdout, line));
      }
      if err_open {
        drain(&mut stderr, &mut chunk, &mut err_buffer, &mut |line: &str| {
          on_line(StreamKind::Stderr, line)
        })?;
        err_buffer.finish(&mut |line: &str| on_line(StreamKind::Stderr, line));
      }
      break;
    }
  }

  Ok(())
}

#[cfg(unix)]
fn set_nonblocking(fd: impl std::os::fd::AsFd) -> io::Result<()> {
  use rustix::fs::{OFlags, fcntl_getfl, fcntl_setfl};

  let flags = fcntl_getfl(&fd)?;
  fcntl_setfl(&fd, flags | OFlags::NONBLOCK)?;
  Ok(())
}

/// Deliver all of stdout, then all of stderr.
///
/// Reads block until each pipe closes, so the child is never consulted.
#[cfg(not(unix))]
pub(crate) fn pump(
  stdout: ChildStdout,
  stderr: ChildStderr,
  _exited: &mut dyn FnMut() -> io::Result<bool>,
  on_line: &mut dyn FnMut(StreamKind, &str),
) -> io::Result<()> {
  pump_sequential(stdout, stderr, on_line)
}

/// Read `stdout` to its end, then `stderr` to its end.
///
/// Relative order between the two streams is lost.
#[cfg_attr(unix, allow(dead_code))]
pub(crate) fn pump_sequential(
  mut stdout: impl Read,
  mut stderr: impl Read,
  on_line: &mut dyn FnMut(StreamKind, &str),
) -> io::Result<()> {
  let mut chunk = [0u8; CHUNK_SIZE];

  let mut buffer = LineBuffer::default();
  while drain(&mut stdout, &mut chunk, &mut buffer, &mut |line: &str| {
    on_line(StreamKind::Stdout, line)
  })? {}

  let mut buffer = LineBuffer::default();
  while drain(&mut stderr, &mut chunk, &mut buffer, &mut |line: &str| {
    on_line(StreamKind::Stderr, line)
  })? {}

  Ok(())
}
