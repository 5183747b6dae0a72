use std::ops::Range;

use crate::reader::header::FIXED_COLUMNS;

/// Reusable tab splitter. Spans are cleared, not reallocated, on every call;
/// the returned `Fields` borrows the splitter and must be dropped before the
/// next line is split.
#[derive(Debug, Default)]
pub struct FieldSplitter {
    spans: Vec<Range<usize>>,
}

impl FieldSplitter {
    pub fn with_capacity(n_fields: usize) -> Self {
        Self {
            spans: Vec::with_capacity(n_fields),
        }
    }

    pub fn split<'a>(&'a mut self, line: &'a str) -> Fields<'a> {
        self.spans.clear();
        let mut start = 0;
        for (idx, b) in line.bytes().enumerate() {
            if b == b'\t' {
                self.spans.push(start..idx);
                start = idx + 1;
            }
        }
        self.spans.push(start..line.len());
        Fields {
            line,
            spans: &self.spans,
        }
    }
}

/// Borrowed view of one tab-split data line.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    line: &'a str,
    spans: &'a [Range<usize>],
}

impl<'a> Fields<'a> {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn get(&self, idx: usize) -> &'a str {
        &self.line[self.spans[idx].clone()]
    }

    /// Genotype columns, in header order.
    pub fn samples(self) -> impl Iterator<Item = &'a str> {
        let line = self.line;
        self.spans
            .iter()
            .skip(FIXED_COLUMNS)
            .map(move |span| &line[span.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_reuses_spans() {
        let mut splitter = FieldSplitter::with_capacity(4);
        {
            let fields = splitter.split("a\tbb\t\tc");
            assert_eq!(fields.len(), 4);
            assert_eq!(fields.get(1), "bb");
            assert_eq!(fields.get(2), "");
        }
        let fields = splitter.split("x");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get(0), "x");
    }

    #[test]
    fn samples_start_after_format() {
        let mut splitter = FieldSplitter::default();
        let fields = splitter.split("1\t2\t3\t4\t5\t6\t7\t8\tGT\t0|1\t1|1");
        assert_eq!(fields.samples().collect::<Vec<_>>(), vec!["0|1", "1|1"]);
    }
}
