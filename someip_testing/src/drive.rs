//! Drivers that push bytes through the framer and pipeline.

use bytes::Bytes;
use futures::StreamExt;
use someip_wire::{Connection, FrameEvent, Inbound, Pipeline, StreamFramer};
use tokio::io::{self, AsyncWriteExt, duplex};
use tokio_util::codec::FramedRead;

/// Duplex buffer size used when none is given.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Write `writes` into one end of a duplex stream and frame the other end.
///
/// The writer shuts down after the last chunk, so the framer also sees EOF.
///
/// # Errors
///
/// Returns any I/O error raised by the duplex stream or the framer.
pub async fn frame_over_duplex(
    framer: StreamFramer,
    writes: Vec<Vec<u8>>,
) -> io::Result<Vec<FrameEvent>> {
    frame_over_duplex_with_capacity(framer, writes, DEFAULT_CAPACITY).await
}

/// Variant of [`frame_over_duplex`] with an explicit duplex buffer size.
///
/// Small capacities force the framer to see messages in many partial reads.
///
/// # Errors
///
/// Returns any I/O error raised by the duplex stream or the framer.
pub async fn frame_over_duplex_with_capacity(
    framer: StreamFramer,
    writes: Vec<Vec<u8>>,
    capacity: usize,
) -> io::Result<Vec<FrameEvent>> {
    let (mut writer, reader) = duplex(capacity);

    let write = async move {
        for chunk in &writes {
            writer.write_all(chunk).await?;
        }
        writer.shutdown().await?;
        io::Result::Ok(())
    };

    let read = async move {
        let mut frames = FramedRead::new(reader, framer);
        let mut events = Vec::new();
        while let Some(event) = frames.next().await {
            events.push(event?);
        }
        io::Result::Ok(events)
    };

    let ((), events) = tokio::try_join!(write, read)?;
    Ok(events)
}

/// Feed `chunks` to `pipeline` in order and collect every result.
pub fn drive_pipeline<I>(pipeline: &Pipeline, connection: &Connection, chunks: I) -> Vec<Inbound>
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
{
    chunks
        .into_iter()
        .flat_map(|chunk| pipeline.on_receive(connection, chunk.into()))
        .collect()
}
