//! Looping access to a mono sample buffer, chunk by chunk.

use crate::error::{Error, Result};
use std::sync::Arc;

/// Serves fixed-length chunks from a mono buffer, wrapping circularly through it.
///
/// The buffer is shared so that several streams may loop the same sample at different phases.
#[derive(Clone, Debug)]
pub struct SampleStream {
    samples: Arc<[i16]>,
    // Always within `0..samples.len()`.
    next_sample: usize,
}

impl SampleStream {
    /// Construct a stream starting at the beginning of the given buffer.
    ///
    /// Returns an error if the buffer is empty.
    pub fn new<S>(samples: S) -> Result<Self>
    where
        S: Into<Arc<[i16]>>,
    {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(Error::EmptySampleBuffer);
        }
        Ok(SampleStream {
            samples,
            next_sample: 0,
        })
    }

    /// The length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// The index of the next sample to be read.
    pub fn position(&self) -> usize {
        self.next_sample
    }

    /// Retrieve exactly `n` samples, wrapping around the end of the buffer as many times as
    /// necessary.
    pub fn retrieve(&mut self, n: usize) -> Vec<i16> {
        let mut out = vec![0; n];
        self.retrieve_into(&mut out);
        out
    }

    /// Fill `out` with the next `out.len()` samples.
    pub fn retrieve_into(&mut self, out: &mut [i16]) {
        let len = self.samples.len();
        let mut written = 0;
        while written < out.len() {
            let available = len - self.next_sample;
            let n = std::cmp::min(available, out.len() - written);
            let end = self.next_sample + n;
            out[written..written + n].copy_from_slice(&self.samples[self.next_sample..end]);
            written += n;
            self.next_sample = end % len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_rejected() {
        assert!(SampleStream::new(Vec::<i16>::new()).is_err());
    }

    #[test]
    fn wraparound_is_idempotent() {
        let samples: Vec<i16> = (0..44_100).map(|i| (i % 32_000) as i16).collect();
        let mut stream = SampleStream::new(samples).unwrap();
        let blocks: Vec<_> = (0..442).map(|_| stream.retrieve(100)).collect();
        assert_eq!(blocks[0], blocks[441]);
        assert_eq!(stream.position(), 100);
    }

    #[test]
    fn requests_longer_than_the_buffer() {
        let mut stream = SampleStream::new(vec![1i16, 2, 3]).unwrap();
        assert_eq!(stream.retrieve(7), vec![1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(stream.position(), 1);
        assert_eq!(stream.retrieve(2), vec![2, 3]);
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.retrieve(0), Vec::<i16>::new());
    }

    #[test]
    fn consecutive_cycles_match() {
        let mut stream = SampleStream::new(vec![5i16, -5, 10, -10, 20]).unwrap();
        stream.retrieve(2);
        let a = stream.retrieve(5);
        let b = stream.retrieve(5);
        assert_eq!(a, b);
        assert_eq!(a, vec![10, -10, 20, 5, -5]);
    }
}
