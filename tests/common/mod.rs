//! In-memory document engine shared by the integration tests.

#![allow(dead_code)]

use filing_extract::backend::{
    LayoutBackend, LayoutDocument, LocatedTable, RawTable, TextBlock, TextLine,
};
use filing_extract::error::{Error, Result};
use filing_extract::geometry::Rect;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Test logger: forwards to `env_logger` and keeps every warning or error.
struct CapturingLogger {
    inner: env_logger::Logger,
    captured: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn || self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if record.level() <= Level::Warn {
            if let Ok(mut captured) = self.captured.lock() {
                captured.push((record.level(), record.args().to_string()));
            }
        }
        self.inner.log(record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<&'static CapturingLogger> = OnceLock::new();

fn logger() -> &'static CapturingLogger {
    LOGGER.get_or_init(|| {
        let inner = env_logger::builder().is_test(true).build();
        let max_level = inner.filter().max(LevelFilter::Warn);
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger {
            inner,
            captured: Mutex::new(Vec::new()),
        }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(max_level);
        }
        logger
    })
}

/// Initialize test logging once.
pub fn init_logging() {
    logger();
}

/// Warnings logged so far whose message mentions `needle`.
pub fn warnings_mentioning(needle: &str) -> Vec<String> {
    logger()
        .captured
        .lock()
        .map(|captured| {
            captured
                .iter()
                .filter(|(level, message)| *level == Level::Warn && message.contains(needle))
                .map(|(_, message)| message.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// An existing file to hand to extractors that check the input path.
pub fn existing_path() -> NamedTempFile {
    NamedTempFile::new().unwrap()
}

/// Build a raw matrix; `""` marks a missing cell.
pub fn raw(rows: &[&[&str]]) -> RawTable {
    rows.iter()
        .map(|r| {
            r.iter()
                .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                .collect()
        })
        .collect()
}

/// Text block with one line per entry, stacked 12pt apart from `top`.
pub fn text_block(x0: f32, top: f32, lines: &[&str]) -> TextBlock {
    let lines: Vec<TextLine> = lines
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let y = top + 12.0 * i as f32;
            TextLine::new(Rect::from_points(x0, y, 550.0, y + 12.0), *text)
        })
        .collect();
    let bottom = top + 12.0 * lines.len().max(1) as f32;
    TextBlock::text(Rect::from_points(x0, top, 550.0, bottom), lines)
}

#[derive(Debug, Clone)]
pub struct FakeTable {
    pub bbox: Rect,
    pub rows: RawTable,
    pub cells_fail: bool,
}

impl FakeTable {
    pub fn new(bbox: Rect, rows: RawTable) -> Self {
        Self {
            bbox,
            rows,
            cells_fail: false,
        }
    }

    pub fn with_broken_cells(mut self) -> Self {
        self.cells_fail = true;
        self
    }
}

impl LocatedTable for FakeTable {
    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn extract(&self) -> Result<RawTable> {
        Ok(self.rows.clone())
    }

    fn cells(&self) -> Result<Vec<Option<Rect>>> {
        if self.cells_fail {
            return Err(Error::CellGeometry("cell index out of range".into()));
        }
        let count = self.rows.iter().flatten().count();
        Ok(vec![Some(self.bbox); count])
    }
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
    pub tables: Vec<FakeTable>,
}

impl FakePage {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self {
            width: 600.0,
            height: 800.0,
            blocks,
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: FakeTable) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub pages: Vec<FakePage>,
    /// Delay applied by every table locator call
    pub locate_delay: Option<Duration>,
    /// Fail table location on this page
    pub locate_fails_on: Option<usize>,
}

impl LayoutDocument for FakeDocument {
    type Table = FakeTable;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&mut self, page: usize) -> Result<(f32, f32)> {
        let p = &self.pages[page];
        Ok((p.width, p.height))
    }

    fn text_blocks(&mut self, page: usize) -> Result<Vec<TextBlock>> {
        Ok(self.pages[page].blocks.clone())
    }

    fn find_tables(&mut self, page: usize) -> Result<Vec<FakeTable>> {
        if let Some(delay) = self.locate_delay {
            std::thread::sleep(delay);
        }
        if self.locate_fails_on == Some(page) {
            let crash = std::io::Error::new(std::io::ErrorKind::Other, "locator crashed");
            return Err(Error::Io(crash));
        }
        Ok(self.pages[page].tables.clone())
    }
}

/// Backend handing out clones of one in-memory document.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub document: FakeDocument,
    pub fail_open: bool,
}

impl FakeBackend {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            document: FakeDocument {
                pages,
                ..Default::default()
            },
            fail_open: false,
        }
    }
}

impl LayoutBackend for FakeBackend {
    type Document = FakeDocument;

    fn open(&self, path: &Path) -> Result<FakeDocument> {
        if self.fail_open {
            return Err(Error::extraction(path, "not a fixed-layout document"));
        }
        Ok(self.document.clone())
    }
}
