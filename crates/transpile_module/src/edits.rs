// crates/transpile_module/src/edits.rs

/// One replacement of the byte range `start..end` of the source.
/// An insertion has `start == end`, a removal has empty `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Collects edits against one source text and applies them in one pass.
#[derive(Debug, Default)]
pub(crate) struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        debug_assert!(start <= end);
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
        });
    }

    pub fn remove(&mut self, start: usize, end: usize) {
        self.replace(start, end, String::new());
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace(at, at, text);
    }

    /// Removes and returns every edit that lies inside `start..end`.
    pub fn take_within(&mut self, start: usize, end: usize) -> Vec<Edit> {
        let (inside, outside): (Vec<Edit>, Vec<Edit>) = self
            .edits
            .drain(..)
            .partition(|e| e.start >= start && e.end <= end);
        self.edits = outside;
        inside
    }

    pub fn apply(self, src: &str) -> String {
        apply_edits(src, 0, self.edits)
    }
}

/// Applies `edits` to `src`, whose first byte sits at offset `base` of the
/// text the edits were recorded against.
///
/// Edits are applied in source order; insertions at the same offset keep the
/// order they were recorded in.  An edit that overlaps an earlier one is
/// dropped, which only happens for edits nested inside a removed range.
pub(crate) fn apply_edits(src: &str, base: usize, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));

    let mut out = String::with_capacity(src.len());
    let mut cursor = base;
    for edit in edits {
        if edit.start < cursor {
            log::trace!("dropping nested edit at {}..{}", edit.start, edit.end);
            continue;
        }
        out.push_str(&src[cursor - base..edit.start - base]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&src[cursor - base..]);
    out
}

/// Widens `start..end` to whole lines when nothing but whitespace shares those
/// lines with it, so removing a statement does not leave a blank line behind.
pub(crate) fn expand_to_lines(src: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = src[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = src[end..].find('\n').map_or(src.len(), |i| end + i);

    let blank_before = src[line_start..start].chars().all(|c| c == ' ' || c == '\t');
    let blank_after = src[end..line_end].trim().is_empty();

    if blank_before && blank_after {
        let stop = if line_end < src.len() { line_end + 1 } else { line_end };
        (line_start, stop)
    } else {
        (start, end)
    }
}

/// Offset of the first byte after the spaces and tabs following `at`.
pub(crate) fn skip_spaces(src: &str, at: usize) -> usize {
    at + src[at..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// Offset of the first space or tab in the run ending at `at`.
pub(crate) fn spaces_before(src: &str, at: usize) -> usize {
    at - src[..at]
        .bytes()
        .rev()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// Leading whitespace of the line containing `at`.
pub(crate) fn line_indent(src: &str, at: usize) -> &str {
    let line_start = src[..at].rfind('\n').map_or(0, |i| i + 1);
    let indent_len = src[line_start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &src[line_start..line_start + indent_len]
}
