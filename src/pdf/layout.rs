//! Reading-order reconstruction from glyph positions
//!
//! Glyphs are grouped into lines by their top edge, words are separated by
//! horizontal gaps relative to the dominant font height, and runs of lines
//! with a matching number of wide-gap cells are reported as tables.

use std::cmp::Ordering;

/// A single character with its loose bounds in page space (points, y up)
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Glyph {
    pub fn new(ch: char, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            ch,
            x,
            y,
            width,
            height,
        }
    }

    fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Tolerances derived from the glyph height distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Max vertical drift between glyphs on the same line
    pub y_tolerance: f32,
    /// Horizontal gap that separates two words
    pub word_gap: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            y_tolerance: 5.0,
            word_gap: 3.0,
        }
    }
}

impl Thresholds {
    /// Scale tolerances to the median glyph height
    pub fn from_glyphs(glyphs: &[Glyph]) -> Self {
        let mut heights: Vec<f32> = glyphs
            .iter()
            .filter(|g| g.height > 0.0 && !g.ch.is_whitespace())
            .map(|g| g.height)
            .collect();

        if heights.is_empty() {
            return Self::default();
        }

        heights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let median = heights[heights.len() / 2];

        Self {
            y_tolerance: (median * 0.4).max(2.0),
            word_gap: (median * 0.25).max(1.5),
        }
    }
}

/// Glyphs sharing a baseline band, ordered left to right
#[derive(Debug, Clone)]
pub struct TextLine {
    pub glyphs: Vec<Glyph>,
    pub y: f32,
    pub avg_height: f32,
    pub min_x: f32,
    pub max_x: f32,
}

impl TextLine {
    fn from_glyphs(mut glyphs: Vec<Glyph>) -> Self {
        glyphs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let avg_height = if glyphs.is_empty() {
            0.0
        } else {
            glyphs.iter().map(|g| g.height).sum::<f32>() / glyphs.len() as f32
        };
        let min_x = glyphs.iter().map(|g| g.x).fold(f32::MAX, f32::min);
        let max_x = glyphs.iter().map(Glyph::right).fold(f32::MIN, f32::max);
        let y = glyphs.first().map(|g| g.y).unwrap_or(0.0);

        Self {
            glyphs,
            y,
            avg_height,
            min_x,
            max_x,
        }
    }

    /// Line text with a single space wherever the gap exceeds `word_gap`
    pub fn text(&self, word_gap: f32) -> String {
        join_glyphs(&self.glyphs, word_gap)
    }

    pub fn is_blank(&self) -> bool {
        self.glyphs.iter().all(|g| g.ch.is_whitespace())
    }

    /// Split the line on gaps wider than a column gutter
    pub fn cells(&self, word_gap: f32) -> Vec<String> {
        let gutter = (self.avg_height * 1.5).max(8.0);
        let visible: Vec<&Glyph> = self.glyphs.iter().filter(|g| !g.ch.is_whitespace()).collect();

        let mut cells = Vec::new();
        let mut current: Vec<Glyph> = Vec::new();
        let mut prev_right: Option<f32> = None;

        for glyph in visible {
            if let Some(right) = prev_right {
                if glyph.x - right > gutter && !current.is_empty() {
                    cells.push(join_glyphs(&current, word_gap));
                    current.clear();
                }
            }
            prev_right = Some(glyph.right());
            current.push(glyph.clone());
        }
        if !current.is_empty() {
            cells.push(join_glyphs(&current, word_gap));
        }
        cells
    }
}

fn join_glyphs(glyphs: &[Glyph], word_gap: f32) -> String {
    let mut out = String::new();
    let mut prev_right: Option<f32> = None;

    for glyph in glyphs {
        if glyph.ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            prev_right = Some(glyph.right());
            continue;
        }
        if let Some(right) = prev_right {
            if glyph.x - right > word_gap && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        out.push(glyph.ch);
        prev_right = Some(glyph.right());
    }

    out.trim().to_string()
}

/// Group glyphs into lines, top of page first
pub fn group_into_lines(mut glyphs: Vec<Glyph>, y_tolerance: f32) -> Vec<TextLine> {
    glyphs.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<Glyph> = Vec::new();
    let mut current_y: Option<f32> = None;

    for glyph in glyphs {
        match current_y {
            Some(y) if (y - glyph.y).abs() <= y_tolerance => current.push(glyph),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_glyphs(std::mem::take(&mut current)));
                }
                current_y = Some(glyph.y);
                current.push(glyph);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_glyphs(current));
    }

    lines
}

/// Lines of a page plus the thresholds used to build them
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
    pub thresholds: Thresholds,
}

impl PageLayout {
    pub fn from_glyphs(glyphs: Vec<Glyph>) -> Self {
        let thresholds = Thresholds::from_glyphs(&glyphs);
        let lines = group_into_lines(glyphs, thresholds.y_tolerance);
        Self { lines, thresholds }
    }

    /// Text in reading order; a blank line marks a paragraph break
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev: Option<&TextLine> = None;

        for line in self.lines.iter().filter(|l| !l.is_blank()) {
            if let Some(p) = prev {
                let gap = p.y - line.y;
                if gap > p.avg_height.max(line.avg_height) * 1.5 {
                    out.push('\n');
                }
            }
            out.push_str(&line.text(self.thresholds.word_gap));
            out.push('\n');
            prev = Some(line);
        }

        out.trim_end().to_string()
    }

    /// Split the page into prose lines and tables, in reading order
    pub fn blocks(&self) -> Vec<Block> {
        let rows: Vec<(&TextLine, Vec<String>)> = self
            .lines
            .iter()
            .filter(|l| !l.is_blank())
            .map(|l| (l, l.cells(self.thresholds.word_gap)))
            .collect();

        let mut blocks = Vec::new();
        let mut i = 0;
        while i < rows.len() {
            let columns = rows[i].1.len();
            let mut end = i + 1;
            if columns >= 2 {
                while end < rows.len() && rows[end].1.len() == columns {
                    end += 1;
                }
            }

            if columns >= 2 && end - i >= 2 {
                blocks.push(Block::Table(
                    rows[i..end].iter().map(|(_, cells)| cells.clone()).collect(),
                ));
                i = end;
            } else {
                blocks.push(Block::Line(rows[i].0.text(self.thresholds.word_gap)));
                i += 1;
            }
        }

        blocks
    }

    /// Only the tables of [`PageLayout::blocks`]
    pub fn tables(&self) -> Vec<Vec<Vec<String>>> {
        self.blocks()
            .into_iter()
            .filter_map(|block| match block {
                Block::Table(rows) => Some(rows),
                Block::Line(_) => None,
            })
            .collect()
    }
}

/// A unit of page content for document conversion
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Line(String),
    /// Rows of cells; every row has the same number of cells
    Table(Vec<Vec<String>>),
}
