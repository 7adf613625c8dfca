// Mapping from processed-text offsets back to original-text offsets.
//
// Preprocessing (markup stripping, entity decoding, line-ending normalization)
// records one block per stretch of text; unaltered blocks map linearly and
// altered blocks snap to one of their ends.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Translates processed-text offsets into original-text offsets.
///
/// `round_forward = false` is used for start endpoints (nearest original
/// position at or before), `true` for end endpoints (at or after). `None`
/// means the offset has no original counterpart.
pub trait OffsetMapper {
    fn map_offset(&self, processed_offset: usize, round_forward: bool) -> Option<usize>;
}

/// One stretch of text as it was in the original and as it is after preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub original_pos: usize,
    pub original_len: usize,
    pub current_pos: usize,
    pub current_len: usize,
}

impl PositionInfo {
    pub fn original_end(&self) -> usize {
        self.original_pos + self.original_len
    }

    pub fn current_end(&self) -> usize {
        self.current_pos + self.current_len
    }

    pub fn is_altered(&self) -> bool {
        self.original_len != self.current_len
    }

    fn map(&self, pos: usize, round_forward: bool) -> usize {
        let delta = pos - self.current_pos;
        if !self.is_altered() {
            self.original_pos + delta
        } else if round_forward {
            if delta == 0 && self.current_len > 0 {
                self.original_pos
            } else {
                self.original_end()
            }
        } else if delta == self.current_len && self.current_len > 0 {
            self.original_end()
        } else {
            self.original_pos
        }
    }
}

/// Ordered list of position blocks for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositioningInfo {
    blocks: Vec<PositionInfo>,
}

impl RepositioningInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block. Blocks must arrive in document order without
    /// overlapping earlier blocks in either coordinate system.
    pub fn add(
        &mut self,
        original_pos: usize,
        original_len: usize,
        current_pos: usize,
        current_len: usize,
    ) -> Result<()> {
        if let Some(last) = self.blocks.last() {
            if original_pos < last.original_end() || current_pos < last.current_end() {
                anyhow::bail!(
                    "Position block ({original_pos}+{original_len} -> {current_pos}+{current_len}) \
                     overlaps previous block ending at ({}, {})",
                    last.original_end(),
                    last.current_end()
                );
            }
        }
        self.blocks.push(PositionInfo {
            original_pos,
            original_len,
            current_pos,
            current_len,
        });
        Ok(())
    }

    pub fn blocks(&self) -> &[PositionInfo] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// True when at least one block changed length, i.e. offsets actually move
    pub fn has_alterations(&self) -> bool {
        self.blocks.iter().any(PositionInfo::is_altered)
    }

    /// Map a processed offset to the original text.
    ///
    /// At a position shared by several blocks (the edges of removed markup),
    /// rounding back uses the first block and rounding forward the last, so
    /// starts land before removed markup and ends after it.
    pub fn original_pos(&self, pos: usize, round_forward: bool) -> Option<usize> {
        let block = if round_forward {
            let upper = self.blocks.partition_point(|b| b.current_pos <= pos);
            upper.checked_sub(1).map(|i| &self.blocks[i])
        } else {
            let lower = self.blocks.partition_point(|b| b.current_end() < pos);
            self.blocks.get(lower)
        }?;

        if block.current_pos <= pos && pos <= block.current_end() {
            Some(block.map(pos, round_forward))
        } else {
            None
        }
    }
}

impl OffsetMapper for RepositioningInfo {
    fn map_offset(&self, processed_offset: usize, round_forward: bool) -> Option<usize> {
        self.original_pos(processed_offset, round_forward)
    }
}
