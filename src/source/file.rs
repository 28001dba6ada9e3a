use crate::core::BYTES_PER_SAMPLE;
use crate::engine::SampleReader;
use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Replays a complex float32 (`.cf32`) recording as a sample stream.
///
/// The file is memory-mapped and handed out in fixed-size chunks. With
/// `realtime` enabled, playback is throttled to `sample_rate * 8` bytes per
/// second, and with `looping` it wraps around forever.
pub struct FileSource {
    path: PathBuf,
    mmap: Mmap,
    sample_rate: u32,
    chunk_samples: usize,
    looping: bool,
    realtime: bool,
    position: usize,
    started: Option<Instant>,
    bytes_sent: u64,
}

impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("path", &self.path)
            .field("sample_rate", &self.sample_rate)
            .field("num_samples", &self.num_samples())
            .field("looping", &self.looping)
            .field("realtime", &self.realtime)
            .field("position", &self.position)
            .finish()
    }
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if sample_rate == 0 {
            bail!("sample rate must be non-zero");
        }

        let file = File::open(&path)
            .with_context(|| format!("failed to open IQ recording {}", path.display()))?;
        // Mapped read-only; recordings are not rewritten during playback
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("failed to map IQ recording {}", path.display()))?;

        if mmap.is_empty() {
            bail!("IQ recording {} is empty", path.display());
        }
        if mmap.len() % BYTES_PER_SAMPLE != 0 {
            bail!(
                "IQ recording {} has {} bytes, not a whole number of cf32 samples",
                path.display(),
                mmap.len()
            );
        }

        Ok(Self {
            path,
            mmap,
            sample_rate,
            chunk_samples: 1024,
            looping: false,
            realtime: false,
            position: 0,
            started: None,
            bytes_sent: 0,
        })
    }

    pub fn with_chunk_samples(mut self, chunk_samples: usize) -> Self {
        self.chunk_samples = chunk_samples.max(1);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn num_samples(&self) -> usize {
        self.mmap.len() / BYTES_PER_SAMPLE
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.num_samples() as f64 / self.sample_rate as f64)
    }

    fn byte_rate(&self) -> f64 {
        self.sample_rate as f64 * BYTES_PER_SAMPLE as f64
    }

    fn throttle(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = Duration::from_secs_f64(self.bytes_sent as f64 / self.byte_rate());
        let elapsed = started.elapsed();
        if due > elapsed {
            thread::sleep(due - elapsed);
        }
    }
}

impl SampleReader for FileSource {
    fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.position >= self.mmap.len() {
            if !self.looping {
                return Ok(None);
            }
            self.position = 0;
        }

        if self.realtime {
            self.throttle();
        }

        let end = (self.position + self.chunk_samples * BYTES_PER_SAMPLE).min(self.mmap.len());
        let chunk = self.mmap[self.position..end].to_vec();
        self.position = end;
        self.bytes_sent += chunk.len() as u64;

        Ok(Some(chunk))
    }
}
