use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::data_models::Listing;
use crate::error::Result;

/// Writes listings as JSON lines, one object per ad.
pub struct JsonLinesSink<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
    written: usize,
}

impl JsonLinesSink<File> {
    /// Appends to `path`, creating it when missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<JsonLinesSink<File>> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(JsonLinesSink::new(file))
    }
}

impl<W: AsyncWrite + Unpin> JsonLinesSink<W> {
    pub fn new(writer: W) -> JsonLinesSink<W> {
        JsonLinesSink {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    pub async fn write(&mut self, listing: &Listing) -> Result<()> {
        let mut line = serde_json::to_vec(listing)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and hands back the underlying writer with the number of
    /// listings written.
    pub async fn finish(mut self) -> Result<(W, usize)> {
        self.writer.flush().await?;
        Ok((self.writer.into_inner(), self.written))
    }
}

/// Drains `rx` into `sink` until every sender is dropped.
pub fn spawn_sink<W>(
    mut sink: JsonLinesSink<W>,
    mut rx: mpsc::UnboundedReceiver<Listing>,
) -> JoinHandle<Result<usize>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(listing) = rx.recv().await {
            if let Err(e) = sink.write(&listing).await {
                log::error!("error writing listing {}, error: {:#}", listing.url, e);
            }
        }
        let (_, written) = sink.finish().await?;
        log::info!("wrote {written} listings");
        Ok(written)
    })
}
