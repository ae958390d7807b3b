//! Text block geometry and reading order.

use crate::backend::TextLayout;

/// A block of text with its bounding box in page coordinates
/// (origin top-left, y grows downwards).
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub text: String,
}

impl TextBlock {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32, text: impl Into<String>) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            text: text.into(),
        }
    }
}

/// Blocks sorted by top edge, then left edge.
pub fn order_blocks(blocks: &[TextBlock]) -> Vec<&TextBlock> {
    let mut ordered: Vec<&TextBlock> = blocks.iter().collect();
    ordered.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));
    ordered
}

/// Join block texts into page text.
///
/// Blocks are trimmed and empty ones dropped; the rest are joined with
/// newlines, in backend order or sorted order depending on `layout`.
pub fn join_blocks(blocks: &[TextBlock], layout: TextLayout) -> String {
    let ordered = match layout {
        TextLayout::Plain => blocks.iter().collect(),
        TextLayout::ColumnAware => order_blocks(blocks),
    };

    ordered
        .into_iter()
        .map(|b| b.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
