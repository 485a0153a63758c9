//! Lazy line reader over inline bytes or a streamed HTTP body.

use reqwest::Response;

use wishlist_shared::{Result, WishlistError};

/// A finite, single-pass sequence of text lines.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`. A final line without a
/// terminator is still yielded, but a trailing terminator does not produce an
/// extra empty line. Once exhausted the source cannot be restarted.
#[derive(Debug)]
pub struct LineSource {
    /// Path or URL used in error messages.
    origin: String,
    buf: Vec<u8>,
    /// Start of the unread part of `buf`.
    pos: usize,
    /// Remaining body; `None` once the stream has ended (or for inline bytes).
    body: Option<Response>,
}

impl LineSource {
    /// Lines over bytes already in memory.
    pub fn from_bytes(origin: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            origin: origin.into(),
            buf: bytes,
            pos: 0,
            body: None,
        }
    }

    /// Lines over an HTTP body, pulled chunk by chunk as lines are requested.
    pub(crate) fn from_response(origin: impl Into<String>, response: Response) -> Self {
        Self {
            origin: origin.into(),
            buf: Vec::new(),
            pos: 0,
            body: Some(response),
        }
    }

    /// Next line, or `None` when the source is exhausted.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            let pending = &self.buf[self.pos..];
            let streaming = self.body.is_some();

            match pending.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(idx) => {
                    let is_cr = pending[idx] == b'\r';
                    // A `\r` at the end of the buffer may be half of a split `\r\n`.
                    if !(is_cr && idx + 1 == pending.len() && streaming) {
                        let terminator = if is_cr && pending.get(idx + 1) == Some(&b'\n') {
                            2
                        } else {
                            1
                        };
                        let start = self.pos;
                        self.pos = start + idx + terminator;
                        return self.decode(start, start + idx).map(Some);
                    }
                }
                None if !streaming => {
                    if pending.is_empty() {
                        return Ok(None);
                    }
                    let (start, end) = (self.pos, self.buf.len());
                    self.pos = end;
                    return self.decode(start, end).map(Some);
                }
                None => {}
            }

            self.fill().await?;
        }
    }

    /// Drain every remaining line.
    #[cfg(test)]
    pub(crate) async fn collect_lines(mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Pull the next body chunk, dropping the bytes already handed out.
    async fn fill(&mut self) -> Result<()> {
        let Some(body) = self.body.as_mut() else {
            return Ok(());
        };

        let chunk = body.chunk().await;
        match chunk {
            Ok(Some(chunk)) => {
                self.buf.drain(..self.pos);
                self.pos = 0;
                self.buf.extend_from_slice(&chunk);
            }
            Ok(None) => self.body = None,
            Err(e) => {
                return Err(WishlistError::fetch(
                    self.origin.clone(),
                    format!("failed to read body: {e}"),
                ));
            }
        }
        Ok(())
    }

    fn decode(&self, start: usize, end: usize) -> Result<String> {
        String::from_utf8(self.buf[start..end].to_vec())
            .map_err(|e| WishlistError::decode(self.origin.clone(), e.to_string()))
    }
}
