use crate::dns::CapturedRecord;
use log::{error, warn};
use std::io;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

/// Append-only newline-delimited JSON log.
///
/// The file is owned by one writer task; every producer sends complete lines
/// to it, so lines never interleave.
pub struct JsonLog {
    tx: Option<mpsc::UnboundedSender<String>>,
    writer: JoinHandle<io::Result<u64>>,
}

/// Cheap producer handle; writes never block the caller.
#[derive(Clone)]
pub struct JsonLogHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl JsonLog {
    /// Open `path` for append, creating it if absent.
    pub async fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(writer_loop(BufWriter::new(file), rx));

        Ok(Self {
            tx: Some(tx),
            writer,
        })
    }

    pub fn handle(&self) -> Option<JsonLogHandle> {
        self.tx.clone().map(|tx| JsonLogHandle { tx })
    }

    /// Flush pending lines and close the file. Returns the number of lines
    /// written over the lifetime of the log. Outstanding handles must be
    /// dropped first or this waits for them.
    pub async fn close(mut self) -> Result<io::Result<u64>, JoinError> {
        self.tx.take();
        self.writer.await
    }
}

impl JsonLogHandle {
    pub fn write(&self, record: &CapturedRecord) {
        let line = match record.to_json() {
            Ok(line) => line,
            Err(e) => {
                error!("Cannot serialize record for {}: {e}", record.question_name);
                return;
            }
        };
        if self.tx.send(line).is_err() {
            warn!("JSON log writer stopped, dropping line");
        }
    }
}

async fn writer_loop<W>(mut out: W, mut rx: mpsc::UnboundedReceiver<String>) -> io::Result<u64>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut written = 0u64;

    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        written += 1;

        // Flush once the burst is drained
        while let Ok(mut line) = rx.try_recv() {
            line.push('\n');
            out.write_all(line.as_bytes()).await?;
            written += 1;
        }
        out.flush().await?;
    }

    out.flush().await?;
    out.shutdown().await?;
    Ok(written)
}
