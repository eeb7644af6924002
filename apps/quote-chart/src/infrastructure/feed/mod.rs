//! JSON Lines Quote Feed
//!
//! Reads quote batches from a line-oriented input. Each non-blank line is
//! either a JSON array of quote records (the upstream server's response to
//! one poll) or a single quote record object.
//!
//! [`forward_batches`] pumps any [`QuoteSourcePort`] into a channel until the
//! source ends, the receiver goes away, shutdown is requested, or reading
//! fails.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FeedError, QuoteSourcePort};
use crate::domain::quote::QuoteRecord;

/// Quote source over any buffered async reader.
pub struct JsonLinesSource<R> {
    lines: LinesStream<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin> JsonLinesSource<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: LinesStream::new(reader.lines()),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub const fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl JsonLinesSource<BufReader<Stdin>> {
    /// Read from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Read from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

/// Decode one input line into a batch.
///
/// # Errors
///
/// Returns the JSON error if the line is neither a record array nor a record.
pub fn decode_batch(line: &str) -> Result<Vec<QuoteRecord>, serde_json::Error> {
    if line.trim_start().starts_with('[') {
        serde_json::from_str(line)
    } else {
        serde_json::from_str(line).map(|quote| vec![quote])
    }
}

#[async_trait]
impl<R> QuoteSourcePort for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_batch(&mut self) -> Result<Option<Vec<QuoteRecord>>, FeedError> {
        while let Some(line) = self.lines.next().await {
            let line = line?;
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let batch = decode_batch(&line).map_err(|source| FeedError::Malformed {
                line: self.line_no,
                source,
            })?;
            return Ok(Some(batch));
        }

        Ok(None)
    }
}

/// Forward batches from `source` into `tx`.
///
/// Malformed batches are logged and skipped. Returns the number of batches
/// forwarded once the source is exhausted, the receiver is dropped, or
/// `shutdown_token` is cancelled.
///
/// # Errors
///
/// Returns [`FeedError::Io`] as soon as the underlying input fails; a broken
/// reader does not recover by being polled again.
pub async fn forward_batches<S: QuoteSourcePort>(
    mut source: S,
    tx: mpsc::Sender<Vec<QuoteRecord>>,
    shutdown_token: CancellationToken,
) -> Result<usize, FeedError> {
    let mut forwarded = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown_token.cancelled() => break,
            next = source.next_batch() => next,
        };

        match next {
            Ok(Some(batch)) => {
                if tx.send(batch).await.is_err() {
                    tracing::debug!("Quote receiver closed");
                    break;
                }
                forwarded += 1;
            }
            Ok(None) => {
                tracing::info!(batches = forwarded, "Quote feed exhausted");
                break;
            }
            Err(e @ FeedError::Malformed { .. }) => {
                tracing::warn!(error = %e, "Skipping unreadable quote batch");
            }
            Err(e @ FeedError::Io(_)) => return Err(e),
        }
    }

    Ok(forwarded)
}

impl<R> std::fmt::Debug for JsonLinesSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSource")
            .field("line_no", &self.line_no)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BATCH: &str = r#"[{"stock":"ABC","top_ask":{"price":121.2,"size":36},"top_bid":{"price":120.48,"size":109},"timestamp":"2019-02-11 22:06:30.572453"},{"stock":"DEF","top_ask":null,"top_bid":{"price":117.87,"size":81},"timestamp":"2019-02-11 22:06:30.572453"}]"#;

    #[test]
    fn decode_array_and_single_object() {
        assert_eq!(decode_batch(BATCH).unwrap().len(), 2);

        let single = r#"{"stock":"ABC","timestamp":"2023-01-01T00:00:00Z"}"#;
        assert_eq!(decode_batch(single).unwrap()[0].stock, "ABC");
    }

    #[tokio::test]
    async fn reads_batches_and_skips_blank_lines() {
        let input = format!("{BATCH}\n\n   \n{BATCH}\n");
        let mut source = JsonLinesSource::new(input.as_bytes());

        assert_eq!(source.next_batch().await.unwrap().unwrap().len(), 2);
        assert_eq!(source.next_batch().await.unwrap().unwrap().len(), 2);
        assert!(source.next_batch().await.unwrap().is_none());
        assert_eq!(source.lines_read(), 4);
    }

    #[tokio::test]
    async fn malformed_line_reports_line_number() {
        let input = format!("{BATCH}\nnot json\n");
        let mut source = JsonLinesSource::new(input.as_bytes());

        source.next_batch().await.unwrap();
        let err = source.next_batch().await.unwrap_err();

        assert!(matches!(err, FeedError::Malformed { line: 2, .. }));
    }

    #[tokio::test]
    async fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{BATCH}").unwrap();

        let mut source = JsonLinesSource::open(file.path()).await.unwrap();

        let batch = source.next_batch().await.unwrap().unwrap();
        assert_eq!(batch[1].stock, "DEF");
        assert!(batch[1].top_ask.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonLinesSource::open(dir.path().join("absent.jsonl")).await;
        assert!(matches!(result, Err(FeedError::Io(_))));
    }

    #[test]
    fn odd_side_does_not_drop_the_batch() {
        let line = r#"[{"stock":"ABC","top_ask":{"price":null},"top_bid":[],"timestamp":"2023-01-01T00:00:00Z"},{"stock":"DEF","top_ask":{"price":20.5,"size":3},"timestamp":"2023-01-01T00:00:00Z"}]"#;

        let batch = decode_batch(line).unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch[0].top_ask.is_none());
        assert!(batch[0].top_bid.is_none());
        assert_eq!(batch[1].top_ask.map(|level| level.price), Some(20.5));
    }

    #[test]
    fn read_failure_surfaces_as_io_error() {
        let reader = tokio_test::io::Builder::new()
            .read(format!("{BATCH}\n").as_bytes())
            .read_error(std::io::Error::other("device gone"))
            .build();
        let mut source = JsonLinesSource::new(BufReader::new(reader));

        tokio_test::block_on(async {
            assert_eq!(source.next_batch().await.unwrap().unwrap().len(), 2);
            assert!(matches!(source.next_batch().await, Err(FeedError::Io(_))));
        });
    }

    // =========================================================================
    // Forwarding
    // =========================================================================

    enum Step {
        Batch(usize),
        Malformed,
        Io,
        End,
    }

    /// Plays back `steps`, then fails with I/O errors forever.
    struct ScriptedSource {
        steps: std::collections::VecDeque<Step>,
        calls: usize,
    }

    impl ScriptedSource {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
                calls: 0,
            }
        }
    }

    #[async_trait]
    impl QuoteSourcePort for ScriptedSource {
        async fn next_batch(&mut self) -> Result<Option<Vec<QuoteRecord>>, FeedError> {
            self.calls += 1;
            match self.steps.pop_front().unwrap_or(Step::Io) {
                Step::Batch(len) => Ok(Some(decode_batch(BATCH).unwrap()[..len].to_vec())),
                Step::Malformed => Err(FeedError::Malformed {
                    line: self.calls,
                    source: serde_json::from_str::<QuoteRecord>("not json").unwrap_err(),
                }),
                Step::Io => Err(FeedError::Io(std::io::Error::other("input closed"))),
                Step::End => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn forwards_until_exhausted_skipping_malformed() {
        let (tx, mut rx) = mpsc::channel(8);
        let source = ScriptedSource::new([Step::Batch(2), Step::Malformed, Step::Batch(1), Step::End]);

        let forwarded = forward_batches(source, tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(forwarded, 2);
        assert_eq!(rx.recv().await.unwrap().len(), 2);
        assert_eq!(rx.recv().await.unwrap().len(), 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn persistent_io_error_stops_forwarding() {
        let (tx, mut rx) = mpsc::channel(8);
        let source = ScriptedSource::new([Step::Batch(1)]);

        let result = forward_batches(source, tx, CancellationToken::new()).await;

        assert!(matches!(result, Err(FeedError::Io(_))));
        assert_eq!(rx.recv().await.unwrap().len(), 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_token_stops_forwarding() {
        let (tx, _rx) = mpsc::channel(8);
        let token = CancellationToken::new();
        token.cancel();
        let source = ScriptedSource::new([Step::Batch(1), Step::End]);

        let forwarded = forward_batches(source, tx, token).await.unwrap();

        assert_eq!(forwarded, 0);
    }

    #[tokio::test]
    async fn dropped_receiver_stops_forwarding() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let source = ScriptedSource::new([Step::Batch(1), Step::Batch(1), Step::End]);

        let forwarded = forward_batches(source, tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(forwarded, 0);
    }
}
