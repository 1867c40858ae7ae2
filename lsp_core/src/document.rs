use thiserror::Error;
use tower_lsp::lsp_types::{Position, Range};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document already open")]
    AlreadyOpen,
    #[error("stale version: got {got}, expected > {expected}")]
    StaleVersion { got: i32, expected: i32 },
    #[error("range out of bounds: {0:?}")]
    RangeOutOfBounds(Range),
}

impl From<DocumentError> for tower_lsp::jsonrpc::Error {
    fn from(err: DocumentError) -> Self {
        let mut lsp_err = tower_lsp::jsonrpc::Error::invalid_params(err.to_string());
        lsp_err.message = err.to_string().into();
        lsp_err
    }
}

/// One open text document: LSP-visible content plus the version tower-lsp
/// hands back on every change notification.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub version: i32,
}

impl Document {
    pub fn new(content: String, version: i32) -> Self {
        Self { content, version }
    }

    /// Replaces the whole document content (full-sync mode), rejecting
    /// versions that don't strictly advance.
    pub fn apply_full_change(&mut self, content: String, version: i32) -> Result<(), DocumentError> {
        if version <= self.version {
            return Err(DocumentError::StaleVersion {
                got: version,
                expected: self.version,
            });
        }
        self.content = content;
        self.version = version;
        Ok(())
    }

    /// Replaces the text within `range` (incremental-sync mode).
    pub fn apply_range_change(
        &mut self,
        range: Range,
        new_text: &str,
        version: i32,
    ) -> Result<(), DocumentError> {
        if version <= self.version {
            return Err(DocumentError::StaleVersion {
                got: version,
                expected: self.version,
            });
        }

        let start = self
            .position_to_offset(range.start)
            .ok_or(DocumentError::RangeOutOfBounds(range))?;
        let end = self
            .position_to_offset(range.end)
            .ok_or(DocumentError::RangeOutOfBounds(range))?;

        if start > end || end > self.content.len() {
            return Err(DocumentError::RangeOutOfBounds(range));
        }

        self.content.replace_range(start..end, new_text);
        self.version = version;
        Ok(())
    }

    /// Converts an LSP (0-based line, UTF-16 code unit) position into a byte
    /// offset into `content`.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let mut line = 0u32;
        let mut utf16_col = 0u32;
        let mut byte_offset = 0usize;

        if position.line == 0 && position.character == 0 {
            return Some(0);
        }

        for ch in self.content.chars() {
            if line == position.line && utf16_col == position.character {
                return Some(byte_offset);
            }

            if ch == '\n' {
                line += 1;
                utf16_col = 0;
            } else {
                utf16_col += ch.len_utf16() as u32;
            }
            byte_offset += ch.len_utf8();
        }

        if line == position.line && utf16_col == position.character {
            return Some(byte_offset);
        }

        None
    }
}
