use std::sync::Arc;

use tracing::trace;

use crate::records::{Record, Table};
use crate::schema::Schema;

/// A pull source of graded records.
///
/// `next` returns `None` exactly once, permanently, at exhaustion; `restart`
/// rewinds a re-entrant source to its first record. A source must have at
/// most one active consumer; fan-out requires [`CachedSource`]. File- or
/// stream-backed implementations release their resource on drop.
pub trait RecordSource {
    fn schema(&self) -> &Arc<Schema>;

    fn next(&mut self) -> Option<Record>;

    fn restart(&mut self);
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn schema(&self) -> &Arc<Schema> {
        self.as_ref().schema()
    }

    fn next(&mut self) -> Option<Record> {
        self.as_mut().next()
    }

    fn restart(&mut self) {
        self.as_mut().restart()
    }
}

/// Scan over a materialized table in insertion order.
#[derive(Debug)]
pub struct TableScan {
    schema: Arc<Schema>,
    records: Vec<Record>,
    pos: usize,
}

impl TableScan {
    pub fn new(table: &Table) -> Self {
        TableScan {
            schema: table.schema().clone(),
            records: table.records(),
            pos: 0,
        }
    }
}

impl RecordSource for TableScan {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn next(&mut self) -> Option<Record> {
        let record = self.records.get(self.pos).cloned();
        if record.is_some() {
            self.pos += 1;
        } else {
            trace!(rows = self.records.len(), "table scan exhausted");
        }
        record
    }

    fn restart(&mut self) {
        self.pos = 0;
    }
}

/// Replayable fan-out wrapper.
///
/// Buffers upstream records as they are first pulled; `restart` replays the
/// buffer from the beginning and continues pulling upstream past its end.
/// This is the sanctioned way to give one source several consumers, and the
/// one place unbounded buffering is unavoidable by construction.
#[derive(Debug)]
pub struct CachedSource<S: RecordSource> {
    source: S,
    buffer: Vec<Record>,
    pos: usize,
    exhausted: bool,
}

impl<S: RecordSource> CachedSource<S> {
    pub fn new(source: S) -> Self {
        CachedSource {
            source,
            buffer: Vec::new(),
            pos: 0,
            exhausted: false,
        }
    }
}

impl<S: RecordSource> RecordSource for CachedSource<S> {
    fn schema(&self) -> &Arc<Schema> {
        self.source.schema()
    }

    fn next(&mut self) -> Option<Record> {
        if self.pos < self.buffer.len() {
            let record = self.buffer[self.pos].clone();
            self.pos += 1;
            return Some(record);
        }
        if self.exhausted {
            return None;
        }
        match self.source.next() {
            Some(record) => {
                self.buffer.push(record.clone());
                self.pos += 1;
                Some(record)
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    fn restart(&mut self) {
        self.pos = 0;
    }
}
