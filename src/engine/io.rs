use crate::core::BYTES_PER_SAMPLE;
use crossbeam_channel::{Receiver, Sender};
use std::io::{self, Read, Write};

/// Blocking source of raw sample bytes
pub trait SampleReader: Send {
    /// Block until the next chunk arrives. `Ok(None)` marks end of stream.
    fn read(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Blocking sink for serialized event records
pub trait EventWriter: Send {
    fn write(&mut self, record: &[u8]) -> io::Result<()>;
}

/// Reader end of an in-process sample pipe
pub struct ChannelReader {
    rx: Receiver<Vec<u8>>,
}

impl SampleReader for ChannelReader {
    fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        // All senders dropped means upstream is finished
        Ok(self.rx.recv().ok())
    }
}

/// Writer end of an in-process event pipe
pub struct ChannelWriter {
    tx: Sender<Vec<u8>>,
}

impl EventWriter for ChannelWriter {
    fn write(&mut self, record: &[u8]) -> io::Result<()> {
        self.tx
            .send(record.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "event consumer disconnected"))
    }
}

/// Bounded pipe feeding a stage. Sends block once `capacity` chunks are queued.
pub fn sample_pipe(capacity: usize) -> (Sender<Vec<u8>>, ChannelReader) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (tx, ChannelReader { rx })
}

/// Bounded pipe carrying a stage's output records
pub fn event_pipe(capacity: usize) -> (ChannelWriter, Receiver<Vec<u8>>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ChannelWriter { tx }, rx)
}

/// Adapts any `Read` into a chunked sample reader.
///
/// Chunks always hold whole samples; a trailing partial sample is carried into
/// the next read and dropped at end of stream.
pub struct IoReader<R> {
    inner: R,
    chunk_bytes: usize,
    pending: Vec<u8>,
}

impl<R: Read + Send> IoReader<R> {
    pub fn new(inner: R, chunk_samples: usize) -> Self {
        Self {
            inner,
            chunk_bytes: chunk_samples.max(1) * BYTES_PER_SAMPLE,
            pending: Vec::new(),
        }
    }
}

impl<R: Read + Send> SampleReader for IoReader<R> {
    fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_bytes];
        loop {
            let n = match self.inner.read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                return Ok(None);
            }

            self.pending.extend_from_slice(&buf[..n]);
            let whole = self.pending.len() - self.pending.len() % BYTES_PER_SAMPLE;
            if whole > 0 {
                let rest = self.pending.split_off(whole);
                return Ok(Some(std::mem::replace(&mut self.pending, rest)));
            }
        }
    }
}

/// Adapts any `Write` into an event writer, flushing after every record
pub struct IoWriter<W> {
    inner: W,
}

impl<W: Write + Send> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> EventWriter for IoWriter<W> {
    fn write(&mut self, record: &[u8]) -> io::Result<()> {
        self.inner.write_all(record)?;
        self.inner.flush()
    }
}
