//! Backpressured response streaming.

use std::pin::Pin;

use arbor_core::TimingContext;
use futures::channel::mpsc;
use futures::{Future, SinkExt, Stream, StreamExt};

use crate::TransportError;

/// Receiving half of a chunk channel.
pub type ChunkStream = mpsc::Receiver<Vec<u8>>;

/// Producing half of a bounded chunk channel.
///
/// `send` blocks once the channel holds `capacity` chunks, so a slow
/// consumer applies backpressure to the serializer or renderer writing into
/// it. Dropping the producer (or calling `complete`) ends the stream.
pub struct StreamProducer {
    tx: mpsc::Sender<Vec<u8>>,
    timing: TimingContext,
    chunks_sent: usize,
}

/// Create a bounded chunk channel.
pub fn chunk_channel(capacity: usize, timing: TimingContext) -> (StreamProducer, ChunkStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        StreamProducer {
            tx,
            timing,
            chunks_sent: 0,
        },
        rx,
    )
}

impl StreamProducer {
    /// Send one chunk, waiting for channel capacity.
    pub async fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.chunks_sent == 0 {
            self.timing.mark("first_chunk");
        }
        self.tx
            .send(bytes)
            .await
            .map_err(|e| TransportError::Stream(e.to_string()))?;
        self.chunks_sent += 1;
        Ok(())
    }

    /// Send a string chunk.
    pub async fn send_str(&mut self, s: &str) -> Result<(), TransportError> {
        self.send(s.as_bytes().to_vec()).await
    }

    /// Number of chunks sent so far.
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Mark the stream complete and close the channel.
    ///
    /// Consumes the producer; the channel closes when the sender drops.
    pub fn complete(self) {
        self.timing.mark("complete");
    }
}

/// A response body: chunks, terminated by an error item if production
/// failed mid-stream.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Fuse producer work into the body stream.
///
/// The returned stream yields chunks as `work` writes them; polling the
/// body is what drives the work, so no separate task or runtime is needed
/// and bytes reach the consumer before production finishes. If `work`
/// fails, the failure surfaces as the final `Err` item.
pub fn fused_body<F>(work: F, chunks: ChunkStream) -> BodyStream
where
    F: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    let data = chunks.map(Ok);
    let tail = futures::stream::once(work).filter_map(|res| async move { res.err().map(Err) });
    Box::pin(futures::stream::select(data, tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_fused_body_yields_chunks_in_order() {
        let (mut producer, rx) = chunk_channel(2, TimingContext::new());
        let work = async move {
            producer.send_str("alpha").await?;
            producer.send_str("beta").await?;
            producer.complete();
            Ok(())
        };
        let body: Vec<_> = block_on(fused_body(work, rx).collect());
        let chunks: Vec<Vec<u8>> = body.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(chunks, vec![b"alpha".to_vec(), b"beta".to_vec()]);
    }

    #[test]
    fn test_fused_body_surfaces_work_failure() {
        let (mut producer, rx) = chunk_channel(2, TimingContext::new());
        let work = async move {
            producer.send_str("partial").await?;
            Err(TransportError::Serialize("collaborator failed".into()))
        };
        let items: Vec<_> = block_on(fused_body(work, rx).collect());
        assert!(items.iter().any(|i| i.is_err()));
        assert!(items.iter().any(|i| matches!(i, Ok(c) if c == b"partial")));
    }

    #[test]
    fn test_producer_marks_are_visible_through_shared_timing() {
        let timing = TimingContext::new();
        let (mut producer, rx) = chunk_channel(4, timing.clone());
        assert!(timing.time_to_first_byte().is_none());
        block_on(async {
            producer.send_str("x").await.unwrap();
            producer.complete();
        });
        // The producer held a clone; the caller's handle sees its marks.
        assert!(timing.time_to_first_byte().is_some());
        assert!(timing.time_to("complete").is_some());
        drop(rx);
    }

    #[test]
    fn test_chunk_count() {
        let (mut producer, _rx) = chunk_channel(8, TimingContext::new());
        block_on(async {
            producer.send_str("a").await.unwrap();
            producer.send_str("b").await.unwrap();
        });
        assert_eq!(producer.chunks_sent(), 2);
    }
}
