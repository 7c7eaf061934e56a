//! Group state store: the latest parade state per company.
//!
//! One slot per group, held in a fixed-size array so the key set can never
//! drift from the enumeration. Every operation holds the lock for its whole
//! duration: an upsert replaces a slot in one step and a snapshot never sees
//! a half-applied reset.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::group::Group;
use super::types::GroupReport;

type Slots = [Option<GroupReport>; Group::COUNT];

/// Point-in-time copy of every slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    slots: Slots,
}

impl StoreSnapshot {
    pub fn get(&self, group: Group) -> Option<&GroupReport> {
        self.slots[group.index()].as_ref()
    }

    /// Every group in display order with its report, if submitted.
    pub fn iter(&self) -> impl Iterator<Item = (Group, Option<&GroupReport>)> + '_ {
        Group::ALL.into_iter().map(|g| (g, self.get(g)))
    }

    /// Submitted groups only, in display order.
    pub fn submitted(&self) -> impl Iterator<Item = (Group, &GroupReport)> + '_ {
        self.iter().filter_map(|(g, r)| r.map(|r| (g, r)))
    }
}

/// In-memory store shared between the message handler and report commands.
pub struct ParadeStore {
    slots: RwLock<Slots>,
}

impl ParadeStore {
    /// Create a store with every group unset.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: RwLock::new(Default::default()),
        })
    }

    /// Replace a group's report. Returns `true` if an earlier report was discarded.
    pub async fn upsert(&self, group: Group, report: GroupReport) -> bool {
        let personnel = report.total();
        let attached = report.attached.len();
        let replaced = {
            let mut slots = self.slots.write().await;
            slots[group.index()].replace(report).is_some()
        };

        info!(
            group = %group,
            personnel,
            attached,
            replaced,
            "Parade state stored"
        );
        replaced
    }

    /// Unset every group.
    pub async fn reset(&self) {
        let mut slots = self.slots.write().await;
        *slots = Default::default();
        info!("Parade store reset");
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let slots = self.slots.read().await;
        StoreSnapshot {
            slots: slots.clone(),
        }
    }

    /// Submission flags in display order.
    pub async fn submitted(&self) -> [(Group, bool); Group::COUNT] {
        let slots = self.slots.read().await;
        Group::ALL.map(|g| (g, slots[g.index()].is_some()))
    }
}
