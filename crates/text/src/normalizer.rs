use crate::error::{Result, TextError};
use xref_protocol::{Location, LocationKind, Point};

/// Byte offset to line/column converter (and back) for one text.
///
/// Every conversion clamps into the text, so callers can hand over
/// unchecked client offsets.
pub struct Normalizer {
    /// Byte offset of the start of each line; always begins with 0.
    line_starts: Vec<usize>,
    len: usize,
}

impl Normalizer {
    pub fn new(text: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in text.iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Expands a byte offset into a full point, clamped into the text.
    pub fn byte_offset(&self, offset: i32) -> Point {
        let offset = (offset.max(0) as usize).min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Point {
            byte_offset: offset as i32,
            line_number: (line + 1) as i32,
            column_offset: (offset - self.line_starts[line]) as i32,
        }
    }

    /// Normalizes a point: a positive byte offset wins; otherwise the
    /// line/column pair is resolved, clamped to the line's extent.
    pub fn point(&self, p: &Point) -> Point {
        if p.byte_offset > 0 {
            return self.byte_offset(p.byte_offset);
        }
        if p.line_number > 0 {
            let line = (p.line_number as usize - 1).min(self.line_starts.len() - 1);
            let line_start = self.line_starts[line];
            let line_end = self
                .line_starts
                .get(line + 1)
                .copied()
                .unwrap_or(self.len);
            let offset = (line_start + p.column_offset.max(0) as usize).min(line_end);
            return self.byte_offset(offset as i32);
        }
        Point {
            byte_offset: 0,
            line_number: 1,
            column_offset: 0,
        }
    }

    /// Resolves a request location to a concrete one.
    ///
    /// `FILE` locations carry no points. `SPAN` locations must carry both
    /// points, normalized and ordered.
    pub fn location(&self, loc: &Location) -> Result<Location> {
        match loc.kind {
            LocationKind::File => Ok(Location::file(loc.ticket.clone())),
            LocationKind::Span => {
                let start = loc.start.ok_or(TextError::MissingPoint("start"))?;
                let end = loc.end.ok_or(TextError::MissingPoint("end"))?;
                let start = self.point(&start);
                let end = self.point(&end);
                if start.byte_offset > end.byte_offset {
                    return Err(TextError::StartAfterEnd);
                }
                Ok(Location::span(loc.ticket.clone(), start, end))
            }
        }
    }

    /// Length of the underlying text in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
