//! # Tee
//!
//! Reader that mirrors everything it reads into a sink

use std::io::{self, Read, Write};

pub struct TeeReader<R, W> {
    reader: R,
    sink: W,
}

impl<R, W> TeeReader<R, W> {
    pub fn new(reader: R, sink: W) -> Self {
        Self { reader, sink }
    }

    /// Split back into the reader and the sink
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.sink)
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.reader.read(buf)?;
        // Bytes only count as read once the sink has them
        self.sink.write_all(&buf[..count])?;
        Ok(count)
    }
}
