use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// A [Cursor] with shared ownership, so that a diagnostics emitter can
/// write into it while the caller keeps a handle to read them back.
pub struct SharedCursor {
    inner: Arc<Mutex<Cursor<Vec<u8>>>>
}

impl SharedCursor {
    /// Constructs a new, empty [SharedCursor].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Cursor::new(Vec::new())))
        }
    }

    fn lock(&self) -> std::io::Result<MutexGuard<'_, Cursor<Vec<u8>>>> {
        self.inner
            .lock()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }

    /// A copy of everything written so far.
    pub fn get_ref(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.lock()?.get_ref().clone())
    }
}

impl Clone for SharedCursor {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner)
        }
    }
}

impl Write for SharedCursor {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.lock()?.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let cursor = SharedCursor::new();
        let mut writer = cursor.clone();

        writer.write_all(b"error: unexpected token\n").expect("write failed");

        assert_eq!(cursor.get_ref().expect("read failed"), b"error: unexpected token\n".to_vec());
    }
}
