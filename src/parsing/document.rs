//! Tagged payload extraction from full-text filing documents.
//!
//! A full-text filing (`edgar/data/<cik>/<accession>.txt`) is an SGML-like
//! envelope: a `<SEC-HEADER>` block followed by one `<DOCUMENT>` per attached
//! file. Structured forms carry their XML between bare `<XML>` and `</XML>`
//! lines:
//!
//! ```text
//! <SEC-DOCUMENT>0001357521-18-000008.txt : 20181015
//! <SEC-HEADER>...
//! </SEC-HEADER>
//! <DOCUMENT>
//! <TYPE>4
//! <TEXT>
//! <XML>                      ◀── extract_tag(reader, "XML") stops here
//! <?xml version="1.0"?>      ─┐
//! <ownershipDocument>...      │ yielded line by line
//! </ownershipDocument>       ─┘
//! </XML>                     ◀── payload ends, nothing past this is read
//! </TEXT>
//! </DOCUMENT>
//! </SEC-DOCUMENT>
//! ```
//!
//! The envelope is scanned once, forwards, one line at a time. Nothing before
//! the opening tag is kept and nothing after the closing tag is read, so a
//! decoder can start on the payload while the rest of the body is still on
//! the wire.

use crate::body::read_line;
use crate::{EdgarError, Result};
use futures_util::Stream;
use futures_util::stream;
use tokio::io::AsyncBufRead;

/// Where a [`TaggedPayload`] is in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadState {
    /// Looking for the opening tag.
    Searching,
    /// Inside the tagged region, yielding lines.
    Emitting,
    /// Closing tag (or an error) reached; nothing more will be read.
    Exhausted,
}

/// Lines strictly between `<tag>` and `</tag>` of an envelope.
#[derive(Debug)]
pub struct TaggedPayload<R> {
    reader: R,
    tag: String,
    close: String,
    state: PayloadState,
}

/// Scans `reader` for a line equal to `<tag>` (ignoring surrounding
/// whitespace) and returns the payload that follows it.
///
/// # Errors
///
/// * `EdgarError::TagNotFound` - the envelope ended without the opening tag.
///   The whole stream has been consumed at that point.
/// * `EdgarError::FileError` - the underlying reader failed.
///
/// # Example
///
/// ```rust
/// use edgarstream::parsing::document::extract_tag;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> edgarstream::Result<()> {
/// let envelope = "<TEXT>\n<XML>\n<a>1</a>\n</XML>\n</TEXT>\n";
/// let mut payload = extract_tag(envelope.as_bytes(), "XML").await?;
/// assert_eq!(payload.next_chunk().await?, Some(b"<a>1</a>".to_vec()));
/// assert_eq!(payload.next_chunk().await?, None);
/// # Ok(())
/// # }
/// ```
pub async fn extract_tag<R>(reader: R, tag: &str) -> Result<TaggedPayload<R>>
where
    R: AsyncBufRead + Unpin,
{
    let mut payload = TaggedPayload {
        reader,
        tag: tag.to_string(),
        close: format!("</{}>", tag),
        state: PayloadState::Searching,
    };

    let open = format!("<{}>", tag);
    let mut line = Vec::new();
    while read_line(&mut payload.reader, &mut line).await? {
        if line.trim_ascii() == open.as_bytes() {
            payload.state = PayloadState::Emitting;
            return Ok(payload);
        }
    }

    Err(EdgarError::TagNotFound {
        tag: tag.to_string(),
    })
}

impl<R: AsyncBufRead + Unpin> TaggedPayload<R> {
    /// Returns the next payload line exactly as it appears in the envelope,
    /// minus its line terminator.
    ///
    /// Returns `None` once the closing tag is reached, and on every call after
    /// that without touching the underlying reader again.
    ///
    /// # Errors
    ///
    /// * `EdgarError::UnterminatedTag` - the envelope ended before the closing
    ///   tag. Reported once; the payload is exhausted afterwards.
    /// * `EdgarError::FileError` - the underlying reader failed.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.state != PayloadState::Emitting {
            return Ok(None);
        }

        let mut line = Vec::new();
        let read = read_line(&mut self.reader, &mut line).await;
        match read {
            Ok(true) if line.trim_ascii() == self.close.as_bytes() => {
                self.state = PayloadState::Exhausted;
                Ok(None)
            }
            Ok(true) => Ok(Some(line)),
            Ok(false) => {
                self.state = PayloadState::Exhausted;
                Err(EdgarError::UnterminatedTag {
                    tag: self.tag.clone(),
                })
            }
            Err(e) => {
                self.state = PayloadState::Exhausted;
                Err(e.into())
            }
        }
    }

    /// Reads the remaining payload, joining lines with `\n`.
    pub async fn read_to_string(&mut self) -> Result<String> {
        let mut out = String::new();
        let mut first = true;
        while let Some(line) = self.next_chunk().await? {
            if !first {
                out.push('\n');
            }
            first = false;
            out.push_str(&String::from_utf8_lossy(&line));
        }
        Ok(out)
    }

    /// Converts the payload into a stream of lines.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<u8>>> {
        stream::try_unfold(self, |mut payload| async move {
            let line = payload.next_chunk().await?;
            Ok::<_, EdgarError>(line.map(|line| (line, payload)))
        })
    }
}

impl<R> TaggedPayload<R> {
    /// Current cursor state.
    pub fn state(&self) -> PayloadState {
        self.state
    }

    /// The tag this payload was extracted from.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Gives back the underlying reader, positioned after the last line read.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use tokio::io::AsyncReadExt;

    const ENVELOPE: &str = "<SEC-DOCUMENT>\n<TEXT>\n<XML>\nPAYLOAD-LINE-1\nPAYLOAD-LINE-2\n</XML>\n</TEXT>\nTRAILER\n";

    #[tokio::test]
    async fn test_extracts_lines_between_tags() {
        let mut payload = extract_tag(ENVELOPE.as_bytes(), "XML").await.unwrap();
        assert_eq!(payload.state(), PayloadState::Emitting);

        assert_eq!(
            payload.next_chunk().await.unwrap(),
            Some(b"PAYLOAD-LINE-1".to_vec())
        );
        assert_eq!(
            payload.next_chunk().await.unwrap(),
            Some(b"PAYLOAD-LINE-2".to_vec())
        );
        assert_eq!(payload.next_chunk().await.unwrap(), None);
        assert_eq!(payload.state(), PayloadState::Exhausted);
        assert_eq!(payload.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stops_reading_at_closing_tag() {
        let mut payload = extract_tag(ENVELOPE.as_bytes(), "XML").await.unwrap();
        while payload.next_chunk().await.unwrap().is_some() {}

        let mut rest = String::new();
        payload.into_inner().read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "</TEXT>\nTRAILER\n");
    }

    #[tokio::test]
    async fn test_tags_match_after_trimming_but_lines_stay_raw() {
        let envelope = "  <XML>  \r\n    <indented>\t\r\n\t</XML>\n";
        let mut payload = extract_tag(envelope.as_bytes(), "XML").await.unwrap();

        assert_eq!(
            payload.next_chunk().await.unwrap(),
            Some(b"    <indented>\t".to_vec())
        );
        assert_eq!(payload.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_tag_consumes_stream() {
        let mut envelope = ENVELOPE.as_bytes();
        let err = extract_tag(&mut envelope, "XBRL").await.unwrap_err();
        assert!(matches!(err, EdgarError::TagNotFound { ref tag } if tag == "XBRL"));
        assert!(envelope.is_empty());
    }

    #[tokio::test]
    async fn test_tag_must_fill_the_line() {
        let envelope = "<XML>inline</XML>\n";
        assert!(matches!(
            extract_tag(envelope.as_bytes(), "XML").await,
            Err(EdgarError::TagNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unterminated_tag_is_reported_once() {
        let envelope = "<XML>\nonly line\n";
        let mut payload = extract_tag(envelope.as_bytes(), "XML").await.unwrap();

        assert_eq!(
            payload.next_chunk().await.unwrap(),
            Some(b"only line".to_vec())
        );
        assert!(matches!(
            payload.next_chunk().await,
            Err(EdgarError::UnterminatedTag { .. })
        ));
        assert_eq!(payload.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let mut payload = extract_tag("<XML>\n</XML>\n".as_bytes(), "XML")
            .await
            .unwrap();
        assert_eq!(payload.read_to_string().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_to_string_and_stream() {
        let payload = extract_tag(ENVELOPE.as_bytes(), "XML").await.unwrap();
        let lines: Vec<Vec<u8>> = payload.into_stream().try_collect().await.unwrap();
        assert_eq!(lines, vec![b"PAYLOAD-LINE-1".to_vec(), b"PAYLOAD-LINE-2".to_vec()]);

        let mut payload = extract_tag(ENVELOPE.as_bytes(), "XML").await.unwrap();
        assert_eq!(
            payload.read_to_string().await.unwrap(),
            "PAYLOAD-LINE-1\nPAYLOAD-LINE-2"
        );
    }
}
