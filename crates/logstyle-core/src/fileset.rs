//! Compact source positions and their decoding.
//!
//! Each file added to a [`FileSet`] occupies the offset range
//! `base..=base + size`; a [`Pos`] is an offset into that combined space, so
//! it identifies both the file and the byte within it. `Pos(0)` means "no
//! position".

use std::fmt;

/// Compact position within a [`FileSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(pub u32);

impl Pos {
    /// The absent position.
    pub const NONE: Pos = Pos(0);

    /// Returns true unless this is [`Pos::NONE`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Decoded source position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// File name as registered.
    pub filename: String,
    /// Byte offset within the file.
    pub offset: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Byte column (1-indexed).
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// One file registered in a [`FileSet`].
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    base: u32,
    content: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// File name as registered.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full source text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Base offset of this file.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Converts a byte offset within this file to a [`Pos`].
    #[must_use]
    pub fn pos(&self, offset: usize) -> Pos {
        let offset = offset.min(self.content.len());
        Pos(self.base + u32::try_from(offset).unwrap_or(u32::MAX - self.base))
    }

    /// Returns the text of line `line` (1-indexed) without its terminator.
    #[must_use]
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map_or(self.content.len(), |next| next - 1);
        self.content
            .get(start..end)
            .map(|text| text.strip_suffix('\r').unwrap_or(text))
    }

    fn position(&self, pos: Pos) -> Position {
        let offset = (pos.0 - self.base) as usize;
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        Position {
            filename: self.name.clone(),
            offset,
            line: line_index + 1,
            column: offset - self.line_starts[line_index] + 1,
        }
    }
}

/// A set of source files sharing one position space.
#[derive(Debug, Clone)]
pub struct FileSet {
    files: Vec<SourceFile>,
    next_base: u32,
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSet {
    /// Creates an empty file set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            next_base: 1,
        }
    }

    /// Registers a file and returns it.
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> &SourceFile {
        let content = content.into();
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let size = u32::try_from(content.len()).unwrap_or(u32::MAX / 2);
        let base = self.next_base;
        self.next_base = base.saturating_add(size).saturating_add(1);
        self.files.push(SourceFile {
            name: name.into(),
            base,
            content,
            line_starts,
        });
        &self.files[self.files.len() - 1]
    }

    /// Returns the file containing `pos`.
    #[must_use]
    pub fn file(&self, pos: Pos) -> Option<&SourceFile> {
        if !pos.is_valid() {
            return None;
        }
        let index = match self.files.binary_search_by_key(&pos.0, |f| f.base) {
            Ok(index) => index,
            Err(0) => return None,
            Err(index) => index - 1,
        };
        let file = &self.files[index];
        (pos.0 - file.base <= u32::try_from(file.content.len()).unwrap_or(u32::MAX))
            .then_some(file)
    }

    /// Returns the file registered under `name`.
    #[must_use]
    pub fn file_by_name(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Decodes `pos`; the absent position decodes to an empty [`Position`].
    #[must_use]
    pub fn position(&self, pos: Pos) -> Position {
        self.file(pos).map(|f| f.position(pos)).unwrap_or_default()
    }

    /// Iterates over the registered files in registration order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_line_and_column() {
        let mut fset = FileSet::new();
        let file = fset.add_file("main.go", "package main\n\nfunc main() {\n\tf()\n}\n");
        let call = file.pos(28);

        let position = fset.position(call);
        assert_eq!(position.filename, "main.go");
        assert_eq!(position.line, 4);
        assert_eq!(position.column, 2);
        assert_eq!(position.to_string(), "main.go:4:2");
    }

    #[test]
    fn positions_in_second_file() {
        let mut fset = FileSet::new();
        fset.add_file("a.go", "package a\n");
        let b = fset.add_file("b.go", "package a\nvar x = 1\n");
        let pos = b.pos(14);

        let position = fset.position(pos);
        assert_eq!(position.filename, "b.go");
        assert_eq!(position.line, 2);
        assert_eq!(position.column, 5);
    }

    #[test]
    fn end_of_file_belongs_to_file() {
        let mut fset = FileSet::new();
        let a = fset.add_file("a.go", "abc");
        let end = a.pos(3);
        fset.add_file("b.go", "def");

        assert_eq!(fset.position(end).filename, "a.go");
        assert_eq!(fset.position(end).column, 4);
    }

    #[test]
    fn no_position_decodes_empty() {
        let mut fset = FileSet::new();
        fset.add_file("a.go", "package a\n");
        assert_eq!(fset.position(Pos::NONE), Position::default());
    }

    #[test]
    fn line_text_strips_terminators() {
        let mut fset = FileSet::new();
        let file = fset.add_file("a.go", "one\r\ntwo\nthree");
        assert_eq!(file.line_text(1), Some("one"));
        assert_eq!(file.line_text(2), Some("two"));
        assert_eq!(file.line_text(3), Some("three"));
        assert_eq!(file.line_text(4), None);
        assert_eq!(file.line_text(0), None);
    }
}
