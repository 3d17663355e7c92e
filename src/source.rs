//! Byte source with mark/reset on top of a plain [std::io::Read].

use std::collections::VecDeque;
use std::io::{self, Read};

use tracing::debug;

use crate::errors::ReadError;

#[derive(Debug)]
struct Mark {
    limit: usize,
    recorded: Vec<u8>,
    invalidated: bool,
}

/// Wraps a reader and remembers bytes consumed after [MarkableSource::mark] so that
/// [MarkableSource::reset] can replay them.
#[derive(Debug)]
pub struct MarkableSource<R> {
    inner: R,
    replay: VecDeque<u8>,
    mark: Option<Mark>,
}

impl<R: Read> MarkableSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            replay: VecDeque::new(),
            mark: None,
        }
    }

    /// Next raw byte, `None` at end of stream.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.replay.pop_front() {
            Some(byte) => Some(byte),
            None => read_one(&mut self.inner)?,
        };

        if let (Some(byte), Some(mark)) = (byte, self.mark.as_mut()) {
            if !mark.invalidated {
                if mark.recorded.len() >= mark.limit {
                    debug!(limit = mark.limit, "mark invalidated");
                    mark.invalidated = true;
                    mark.recorded = Vec::new();
                } else {
                    mark.recorded.push(byte);
                }
            }
        }

        Ok(byte)
    }

    /// Starts recording; at most `limit` bytes may be read before the mark is lost.
    pub fn mark(&mut self, limit: usize) {
        self.mark = Some(Mark {
            limit,
            recorded: Vec::with_capacity(limit.min(1024)),
            invalidated: false,
        });
    }

    /// Rewinds to the position of the last [MarkableSource::mark]. The mark stays in place.
    pub fn reset(&mut self) -> Result<(), ReadError> {
        let mark = self.mark.as_mut().ok_or(ReadError::ResetWithoutMark)?;
        if mark.invalidated {
            return Err(ReadError::MarkInvalidated { limit: mark.limit });
        }

        let recorded = std::mem::take(&mut mark.recorded);
        debug!(replayed = recorded.len(), "reset to mark");
        for byte in recorded.into_iter().rev() {
            self.replay.push_front(byte);
        }

        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn read_one<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
