//! Per-stream output pipeline: read → decode → frame → decorate.

use std::collections::VecDeque;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::framing::{Frame, LineFramer, Utf8Decoder};
use crate::multiplex::Source;
use crate::output::Decorator;

const READ_BUF: usize = 8 * 1024;

/// A child stream turned into decorated, display-ready byte chunks.
///
/// Each item is one rendered unit (a line, or a chunk of lines). Reads only
/// happen when the next item is requested, so the consumer's pace drives the
/// reader.
pub struct Pipeline<R> {
    reader: Option<R>,
    decoder: Utf8Decoder,
    framer: LineFramer,
    decorator: Decorator,
    ready: VecDeque<Vec<u8>>,
    buf: Vec<u8>,
    finished: bool,
}

impl<R> Pipeline<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// `reader` is `None` for a command that never started; the pipeline is
    /// then empty.
    pub fn new(reader: Option<R>, framer: LineFramer, decorator: Decorator) -> Self {
        Self {
            reader,
            decoder: Utf8Decoder::new(),
            framer,
            decorator,
            ready: VecDeque::new(),
            buf: vec![0; READ_BUF],
            finished: false,
        }
    }

    async fn next_chunk(&mut self) -> Option<io::Result<Vec<u8>>> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(Ok(chunk));
            }
            if self.finished {
                return None;
            }
            let Some(reader) = self.reader.as_mut() else {
                self.finished = true;
                continue;
            };
            match reader.read(&mut self.buf).await {
                Ok(0) => {
                    self.finished = true;
                    self.reader = None;
                    let tail = self.decoder.finish();
                    let mut frames = self.framer.push(&tail);
                    frames.extend(self.framer.finish());
                    self.enqueue(frames);
                }
                Ok(n) => {
                    let text = self.decoder.decode(&self.buf[..n]);
                    let frames = self.framer.push(&text);
                    self.enqueue(frames);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.finished = true;
                    self.reader = None;
                    return Some(Err(err));
                }
            }
        }
    }

    fn enqueue(&mut self, frames: Vec<Frame>) {
        let rendered = self.decorator.decorate(frames).map(String::into_bytes);
        self.ready.extend(rendered);
    }
}

impl<R> Source for Pipeline<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> impl std::future::Future<Output = Option<Self::Item>> + Send {
        self.next_chunk()
    }
}
