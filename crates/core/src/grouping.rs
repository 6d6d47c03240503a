//! Grouping of consecutive cell records into slide-sized records.
//!
//! A titled markdown record (or one carrying a `slide: new` directive) opens
//! a new group; every other record is folded into the open group. A
//! document that does not start with a titled cell gets an untitled first
//! slide headed by its first record.

use crate::record::{CellRecord, TablePolicy};

/// Accumulator state while walking the records.
enum GroupState {
    /// No slide is open yet.
    Idle,
    /// A slide is open: its leading record and the records folded into it.
    Open {
        base: CellRecord,
        tail: Vec<CellRecord>,
    },
}

/// Groups cell records into one record per slide.
#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    /// How tables from non-leading records are treated.
    table_policy: TablePolicy,
}

impl GroupingEngine {
    /// Create an engine with the default table policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table policy used when merging a group.
    pub fn with_table_policy(mut self, policy: TablePolicy) -> Self {
        self.table_policy = policy;
        self
    }

    /// The table policy in effect.
    pub fn table_policy(&self) -> TablePolicy {
        self.table_policy
    }

    /// Group `records` into slide records, preserving document order.
    ///
    /// Records carrying a `slide: skip` directive are dropped first.
    pub fn group(&self, records: &[CellRecord]) -> Vec<CellRecord> {
        let mut slides = Vec::new();
        let mut state = GroupState::Idle;

        for record in records {
            if record.is_skipped() {
                log::debug!("Skipping cell {:?} (slide: skip)", record.source_index);
                continue;
            }

            state = match state {
                GroupState::Idle => GroupState::Open {
                    base: record.clone(),
                    tail: Vec::new(),
                },
                GroupState::Open { base, tail } if record.starts_slide() => {
                    slides.push(self.close(base, &tail));
                    GroupState::Open {
                        base: record.clone(),
                        tail: Vec::new(),
                    }
                }
                GroupState::Open { base, mut tail } => {
                    tail.push(record.clone());
                    GroupState::Open { base, tail }
                }
            };
        }

        if let GroupState::Open { base, tail } = state {
            slides.push(self.close(base, &tail));
        }

        log::debug!("Grouped {} records into {} slides", records.len(), slides.len());
        slides
    }

    /// Merge an open group into its slide record.
    fn close(&self, base: CellRecord, tail: &[CellRecord]) -> CellRecord {
        if tail.is_empty() {
            base
        } else {
            base.merge_with(tail, self.table_policy)
        }
    }
}
