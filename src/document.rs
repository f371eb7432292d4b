//! In-memory document model used by the substitution engine.
//!
//! A document is an ownership tree: the document owns body blocks and
//! sections, sections own header/footer paragraphs, paragraphs own
//! formatted runs. Substitution mutates run text through this tree and
//! never replaces a paragraph's text wholesale, so per-run formatting
//! survives generation.

use serde::{Deserialize, Serialize};

/// Character-level formatting carried by a [`Run`].
///
/// The set mirrors what document containers round-trip for a run; fields
/// the template does not use stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_pt: Option<u32>,
}

/// A contiguous span of identically formatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub style: RunStyle,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A paragraph owning its formatted runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    /// Single-run paragraph with default formatting.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::new(text)],
        }
    }

    /// The paragraph's visible text: run texts concatenated in order.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// One table cell, owning its paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
}

/// One table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// A table in the document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// A top-level body element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// A section with its header and footer paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub header: Vec<Paragraph>,
    #[serde(default)]
    pub footer: Vec<Paragraph>,
}

/// A complete document: body blocks plus sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    /// Visit every text-bearing paragraph mutably: body paragraphs, every
    /// cell of every table, and every section header/footer paragraph.
    pub fn for_each_paragraph_mut<F: FnMut(&mut Paragraph)>(&mut self, mut f: F) {
        for block in &mut self.body {
            match block {
                Block::Paragraph(p) => f(p),
                Block::Table(table) => {
                    for row in &mut table.rows {
                        for cell in &mut row.cells {
                            for p in &mut cell.paragraphs {
                                f(p);
                            }
                        }
                    }
                }
            }
        }
        for section in &mut self.sections {
            for p in &mut section.header {
                f(p);
            }
            for p in &mut section.footer {
                f(p);
            }
        }
    }

    /// Visit every text-bearing paragraph in traversal order.
    pub fn for_each_paragraph<F: FnMut(&Paragraph)>(&self, mut f: F) {
        for block in &self.body {
            match block {
                Block::Paragraph(p) => f(p),
                Block::Table(table) => {
                    for row in &table.rows {
                        for cell in &row.cells {
                            for p in &cell.paragraphs {
                                f(p);
                            }
                        }
                    }
                }
            }
        }
        for section in &self.sections {
            for p in &section.header {
                f(p);
            }
            for p in &section.footer {
                f(p);
            }
        }
    }

    /// All visible text, one string per paragraph, in traversal order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        self.for_each_paragraph(|p| texts.push(p.text()));
        texts
    }
}
