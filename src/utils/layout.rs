/// How a given number of images is arranged on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One image is returned on its own, without a canvas.
    Single,
    Grid { cols: u32, rows: u32 },
}

impl Layout {
    pub fn for_count(count: usize) -> Option<Layout> {
        match count {
            1 => Some(Layout::Single),
            2 => Some(Layout::Grid { cols: 2, rows: 1 }),
            3 | 4 => Some(Layout::Grid { cols: 2, rows: 2 }),
            _ => None,
        }
    }

    /// Output canvas for the given cell size. `None` when a side does not
    /// fit in `u32`.
    pub fn canvas_size(&self, cell_width: u32, cell_height: u32) -> Option<(u32, u32)> {
        let (cols, rows) = match *self {
            Layout::Single => (1, 1),
            Layout::Grid { cols, rows } => (cols, rows),
        };
        Some((cols.checked_mul(cell_width)?, rows.checked_mul(cell_height)?))
    }
}

/// Largest size with the source aspect ratio that fits inside the box.
/// One side always matches the box exactly.
pub fn fit_within(src_width: u32, src_height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    let src_ratio = src_width as f64 / src_height.max(1) as f64;
    let box_ratio = box_width as f64 / box_height as f64;

    let (width, height) = if src_ratio > box_ratio {
        let height = (box_width as f64 / src_ratio).round() as u32;
        (box_width, height)
    } else {
        let width = (box_height as f64 * src_ratio).round() as u32;
        (width, box_height)
    };

    (width.clamp(1, box_width), height.clamp(1, box_height))
}

/// Top-left corner that centres an image of `size` inside cell `index`,
/// counting cells row-major.
pub fn cell_origin(
    index: u32,
    cols: u32,
    cell: (u32, u32),
    size: (u32, u32),
) -> (u32, u32) {
    let (cell_width, cell_height) = cell;
    let col = index % cols;
    let row = index / cols;
    let x = col * cell_width + cell_width.saturating_sub(size.0) / 2;
    let y = row * cell_height + cell_height.saturating_sub(size.1) / 2;
    (x, y)
}
