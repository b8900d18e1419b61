// src/wheel/mod.rs

//! Tiered scheduling wheel.
//!
//! Entries live in buckets keyed by a cycle. On every tick the counter is
//! checked against each cycle and the buckets it divides fire. Inserts from
//! workers land in a shadow map that the scheduler merges at the start of
//! each tick, so a tick never observes a half-applied insert.

mod cycles;

pub use cycles::CycleTable;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::element::{ElementId, Status};
use crate::sync::lock;

pub type WheelEntry = (ElementId, Status);

/// cycle → entries.
pub type Buckets = BTreeMap<u32, BTreeSet<WheelEntry>>;

/// Tick counter. Starts at 1 and wraps from its maximum back to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickCounter(u32);

impl Default for TickCounter {
    fn default() -> Self {
        TickCounter(1)
    }
}

impl TickCounter {
    pub fn starting_at(value: u32) -> Self {
        TickCounter(value.max(1))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 = if self.0 == u32::MAX { 1 } else { self.0 + 1 };
    }

    pub fn fires(self, cycle: u32) -> bool {
        cycle != 0 && self.0 % cycle == 0
    }
}

fn insert_entry(buckets: &mut Buckets, cycle: u32, entry: WheelEntry) -> bool {
    buckets.entry(cycle).or_default().insert(entry)
}

fn remove_entry(buckets: &mut Buckets, cycle: u32, entry: &WheelEntry) -> bool {
    let Some(bucket) = buckets.get_mut(&cycle) else {
        return false;
    };
    let removed = bucket.remove(entry);
    if bucket.is_empty() {
        buckets.remove(&cycle);
    }
    removed
}

fn remove_all_for(buckets: &mut Buckets, cycle: u32, id: ElementId) -> usize {
    let Some(bucket) = buckets.get_mut(&cycle) else {
        return 0;
    };
    let before = bucket.len();
    bucket.retain(|(entry_id, _)| *entry_id != id);
    let removed = before - bucket.len();
    if bucket.is_empty() {
        buckets.remove(&cycle);
    }
    removed
}

#[derive(Debug, Default)]
pub struct SchedulingWheel {
    live: Mutex<Buckets>,
    pending: Mutex<Buckets>,
    counter: Mutex<TickCounter>,
}

impl SchedulingWheel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(counter: TickCounter) -> Self {
        Self {
            counter: Mutex::new(counter),
            ..Self::default()
        }
    }

    pub fn counter(&self) -> u32 {
        lock(&self.counter).get()
    }

    /// Queue an entry. It becomes visible to ticks after the next flush.
    pub fn insert(&self, cycle: u32, id: ElementId, status: Status) -> bool {
        insert_entry(&mut lock(&self.pending), cycle, (id, status))
    }

    /// Remove an entry from both the live and the shadow map.
    pub fn remove(&self, cycle: u32, id: ElementId, status: Status) -> bool {
        let entry = (id, status);
        let live = remove_entry(&mut lock(&self.live), cycle, &entry);
        let pending = remove_entry(&mut lock(&self.pending), cycle, &entry);
        live || pending
    }

    /// Remove every entry of `id` in bucket `cycle`, whatever its status.
    pub fn force_remove(&self, cycle: u32, id: ElementId) -> usize {
        remove_all_for(&mut lock(&self.live), cycle, id)
            + remove_all_for(&mut lock(&self.pending), cycle, id)
    }

    pub fn flush_pending(&self) {
        let drained = std::mem::take(&mut *lock(&self.pending));
        if drained.is_empty() {
            return;
        }
        let mut live = lock(&self.live);
        for (cycle, entries) in drained {
            live.entry(cycle).or_default().extend(entries);
        }
    }

    /// Replace all contents with `buckets` and drop anything unflushed.
    pub fn replace(&self, buckets: Buckets) {
        let mut cleaned = buckets;
        cleaned.retain(|_, entries| !entries.is_empty());
        *lock(&self.live) = cleaned;
        lock(&self.pending).clear();
    }

    /// True when neither map holds an entry.
    pub fn is_empty(&self) -> bool {
        lock(&self.live).is_empty() && lock(&self.pending).is_empty()
    }

    /// Ids due at the current counter, grouped by cycle, then advance the
    /// counter. Only flushed entries are considered; an id appears at most
    /// once per bucket.
    pub fn due(&self) -> Vec<(u32, Vec<ElementId>)> {
        let mut counter = lock(&self.counter);
        let due = {
            let live = lock(&self.live);
            live.iter()
                .filter(|(cycle, _)| counter.fires(**cycle))
                .map(|(cycle, entries)| {
                    let ids: BTreeSet<ElementId> = entries.iter().map(|(id, _)| *id).collect();
                    (*cycle, ids.into_iter().collect())
                })
                .collect()
        };
        counter.advance();
        due
    }

    /// Entries for `id` in either map.
    pub fn entries_for(&self, id: ElementId) -> Vec<(u32, Status)> {
        let mut found = BTreeSet::new();
        for buckets in [&self.live, &self.pending] {
            for (cycle, entries) in lock(buckets).iter() {
                found.extend(
                    entries
                        .iter()
                        .filter(|(entry_id, _)| *entry_id == id)
                        .map(|(_, status)| (*cycle, *status)),
                );
            }
        }
        found.into_iter().collect()
    }

    /// Union of the live and the shadow map.
    pub fn snapshot(&self) -> Buckets {
        let mut merged = lock(&self.live).clone();
        for (cycle, entries) in lock(&self.pending).iter() {
            merged.entry(*cycle).or_default().extend(entries.iter().copied());
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.snapshot().values().map(BTreeSet::len).sum()
    }
}
