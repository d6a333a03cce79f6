//! Document management for the LSP server.
//!
//! Tracks open documents and their content using rope data structures.
//! The validator reports byte columns while LSP positions count UTF-16
//! code units, so the conversions between the two live here.

use dashmap::DashMap;
use ropey::Rope;
use tower_lsp::lsp_types::Url;

/// A document being edited.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document content as a rope for efficient editing.
    pub content: Rope,
    /// The document version.
    pub version: i32,
}

impl Document {
    /// Create a new document with the given content.
    pub fn new(content: &str, version: i32) -> Self {
        Self {
            content: Rope::from_str(content),
            version,
        }
    }

    /// Get the full text of the document.
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// Get a specific line (0-indexed) without its line break.
    pub fn line(&self, line_idx: usize) -> Option<String> {
        if line_idx < self.content.len_lines() {
            let line = self.content.line(line_idx).to_string();
            Some(line.trim_end_matches(&['\n', '\r'][..]).to_string())
        } else {
            None
        }
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.content.len_lines()
    }

    /// Convert a byte column on `line` to a UTF-16 column.
    ///
    /// Columns past the end of the line are clamped to its length.
    pub fn utf16_column(&self, line: u32, byte_col: u32) -> u32 {
        let Some(text) = self.line(line as usize) else {
            return byte_col;
        };

        let mut units = 0;
        let mut bytes = 0;
        for ch in text.chars() {
            if bytes >= byte_col as usize {
                break;
            }
            units += ch.len_utf16();
            bytes += ch.len_utf8();
        }
        units as u32
    }

    /// Convert a UTF-16 column on `line` to a byte column.
    pub fn byte_column(&self, line: u32, utf16_col: u32) -> u32 {
        let Some(text) = self.line(line as usize) else {
            return utf16_col;
        };

        let mut units = 0;
        let mut bytes = 0;
        for ch in text.chars() {
            if units >= utf16_col as usize {
                break;
            }
            units += ch.len_utf16();
            bytes += ch.len_utf8();
        }
        bytes as u32
    }
}

/// Document store for managing all open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
}

impl DocumentStore {
    /// Create a new document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open a document.
    pub fn open(&self, uri: Url, content: &str, version: i32) {
        self.documents.insert(uri, Document::new(content, version));
    }

    /// Update a document.
    pub fn update(&self, uri: &Url, content: &str, version: i32) {
        if let Some(mut doc) = self.documents.get_mut(uri) {
            doc.content = Rope::from_str(content);
            doc.version = version;
        }
    }

    /// Close a document.
    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// Get a document.
    pub fn get(&self, uri: &Url) -> Option<Document> {
        self.documents.get(uri).map(|doc| doc.clone())
    }

    /// Check if a document is open.
    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    /// URIs of all open documents.
    pub fn uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }
}
