//! Byte-stream framing.
//!
//! [`FrameSplitter`] turns arbitrary chunks of bytes into complete text lines,
//! keeping an incomplete trailing fragment until the rest of it arrives.
//! Lines may be terminated by `\r\n`, `\r` or `\n`.
//!
//! With the `tokio` feature, [`LineCodec`] exposes the same splitter as a
//! `tokio_util` codec.

use encoding::Encoding;

use crate::error::{ProtocolError, Result};

/// Default cap on a single line (and on a pending fragment), in bytes.
pub const MAX_IRC_LINE_LEN: usize = 8191;

/// Splits a byte stream into lines.
///
/// ```
/// use chatmux_proto::line::FrameSplitter;
///
/// let mut splitter = FrameSplitter::new("utf-8").unwrap();
/// assert!(splitter.feed(b"A").unwrap().is_empty());
/// assert_eq!(splitter.feed(b"B\r\nC").unwrap(), vec!["AB"]);
/// assert_eq!(splitter.feed(b"D\r\n").unwrap(), vec!["CD"]);
/// ```
#[derive(Debug)]
pub struct FrameSplitter {
    encoding: &'static Encoding,
    fragment: Vec<u8>,
    strip_empty: bool,
    max_len: Option<usize>,
}

impl FrameSplitter {
    /// Create a splitter decoding lines with the given encoding label
    /// (e.g. `"utf-8"`, `"iso-8859-1"`).
    pub fn new(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ProtocolError::UnknownEncoding(label.to_string()))?;
        Ok(Self {
            encoding,
            fragment: Vec::new(),
            strip_empty: true,
            max_len: Some(MAX_IRC_LINE_LEN),
        })
    }

    /// Set the maximum line length. `None` disables the cap.
    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    /// Whether empty lines are dropped instead of emitted (default: dropped).
    pub fn strip_empty_lines(mut self, strip: bool) -> Self {
        self.strip_empty = strip;
        self
    }

    /// The encoding lines are decoded with.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Number of buffered bytes that do not yet form a complete line.
    pub fn pending_len(&self) -> usize {
        self.fragment.len()
    }

    /// Drop any buffered fragment.
    pub fn reset(&mut self) {
        self.fragment.clear();
    }

    /// Append a chunk and return every line it completed, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MessageTooLong`] if a line or the pending
    /// fragment exceeds the configured cap. The fragment is discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.fragment.extend_from_slice(chunk);

        let encoding = self.encoding;
        let buf = &self.fragment;
        let mut lines = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < buf.len() {
            match buf[i] {
                b'\r' | b'\n' => {
                    let end = i;
                    if buf[i] == b'\r' && buf.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    if let Some(limit) = self.max_len {
                        if end - start > limit {
                            let actual = end - start;
                            self.fragment.clear();
                            return Err(ProtocolError::MessageTooLong { actual, limit });
                        }
                    }
                    if end > start || !self.strip_empty {
                        lines.push(decode(encoding, &buf[start..end]));
                    }
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }

        self.fragment.drain(..start);

        if let Some(limit) = self.max_len {
            if self.fragment.len() > limit {
                let actual = self.fragment.len();
                self.fragment.clear();
                return Err(ProtocolError::MessageTooLong { actual, limit });
            }
        }

        Ok(lines)
    }

    /// Emit the remaining fragment as a final line, if there is one.
    ///
    /// Call this when the stream ends.
    pub fn flush(&mut self) -> Option<String> {
        if self.fragment.is_empty() {
            return None;
        }
        let line = decode(self.encoding, &self.fragment);
        self.fragment.clear();
        Some(line)
    }
}

fn decode(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(feature = "tokio")]
pub use self::codec::LineCodec;

#[cfg(feature = "tokio")]
mod codec {
    use std::collections::VecDeque;

    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    use super::FrameSplitter;
    use crate::error::{ProtocolError, Result};

    /// Line codec for `FramedRead` / `FramedWrite`.
    ///
    /// Decoding hands every buffered byte to a [`FrameSplitter`] and yields the
    /// completed lines one by one. Encoding writes already-serialized lines
    /// in the splitter's encoding.
    #[derive(Debug)]
    pub struct LineCodec {
        splitter: FrameSplitter,
        ready: VecDeque<String>,
    }

    impl LineCodec {
        /// Create a codec with the given encoding label.
        pub fn new(label: &str) -> Result<Self> {
            FrameSplitter::new(label).map(Self::from_splitter)
        }

        /// Wrap an already configured splitter.
        pub fn from_splitter(splitter: FrameSplitter) -> Self {
            Self {
                splitter,
                ready: VecDeque::new(),
            }
        }
    }

    impl Decoder for LineCodec {
        type Item = String;
        type Error = ProtocolError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
            if !src.is_empty() {
                let chunk = src.split();
                let lines = self.splitter.feed(&chunk)?;
                self.ready.extend(lines);
            }
            Ok(self.ready.pop_front())
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
            if let Some(line) = self.decode(src)? {
                return Ok(Some(line));
            }
            Ok(self.splitter.flush())
        }
    }

    impl Encoder<String> for LineCodec {
        type Error = ProtocolError;

        fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<()> {
            let (bytes, _enc, _had_errors) = self.splitter.encoding().encode(&line);
            dst.extend_from_slice(&bytes);
            Ok(())
        }
    }

}
