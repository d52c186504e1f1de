use std::time::Duration;

use crate::error::Result;

/// A seekable source of decoded, interleaved `f32` PCM.
///
/// Sample rate and channel count are fixed for the lifetime of the stream.
pub trait SampleStream: Send {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;

    /// Total length, when the container knows it.
    fn total_duration(&self) -> Option<Duration>;

    /// Fill `buf` with interleaved samples. Returns fewer than `buf.len()`
    /// only at the end of the stream; `Ok(0)` means exhausted.
    fn read(&mut self, buf: &mut [f32]) -> Result<usize>;

    /// Reposition so the next `read` starts at `pos`.
    fn seek(&mut self, pos: Duration) -> Result<()>;
}

impl<S: SampleStream + ?Sized> SampleStream for Box<S> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn channels(&self) -> u16 {
        (**self).channels()
    }

    fn total_duration(&self) -> Option<Duration> {
        (**self).total_duration()
    }

    fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, pos: Duration) -> Result<()> {
        (**self).seek(pos)
    }
}
