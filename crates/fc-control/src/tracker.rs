//! Controller-side view of the fleet.
//!
//! Every agent the controller has introduced is in exactly one of two sets:
//! *active* (believed to be driving) or *parked* (removed, by us or by the
//! simulator).  Once per tick the view is reconciled with the simulator's
//! live list:
//!
//! ```text
//!   parked ∩ live   → active   (only once stable; pending count - 1)
//!   active \ live   → parked   (pending and total counts + 1 once stable)
//! ```
//!
//! Agents that disappear while the fleet is still ramping up are parked but
//! not counted: shortfalls during ramp-up are expected.

use std::collections::BTreeSet;

use fc_core::AgentId;

#[cfg(feature = "fx-hash")]
type LiveSet = rustc_hash::FxHashSet<AgentId>;
#[cfg(not(feature = "fx-hash"))]
type LiveSet = std::collections::HashSet<AgentId>;

/// What one [`FleetTracker::reconcile`] call changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Parked agents found driving again, now active.
    pub reactivated: Vec<AgentId>,
    /// Active agents missing from the live list, now parked.
    pub vanished: Vec<AgentId>,
    /// Whether `vanished` was counted as uncontrolled parkings.
    pub counted: bool,
}

/// Active/parked partition of every agent the controller introduced, plus
/// the running count of uncontrolled parkings still owed to the schedule.
#[derive(Clone, Debug, Default)]
pub struct FleetTracker {
    active:             BTreeSet<AgentId>,
    parked:             BTreeSet<AgentId>,
    /// Uncontrolled parkings not yet set off against the schedule.
    uncontrolled:       u32,
    /// Uncontrolled parkings observed over the whole run.
    uncontrolled_total: u64,
    stable:             bool,
}

impl FleetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Reconciliation ────────────────────────────────────────────────────

    /// Bring the active/parked split in line with the simulator's `live`
    /// agent list.  Ids in `live` that were never admitted are ignored.
    pub fn reconcile(&mut self, live: &[AgentId]) -> ReconcileOutcome {
        let live: LiveSet = live.iter().copied().collect();
        let mut outcome = ReconcileOutcome { counted: self.stable, ..Default::default() };

        if self.stable {
            outcome.reactivated = self.parked.iter().copied().filter(|a| live.contains(a)).collect();
            for agent in &outcome.reactivated {
                self.parked.remove(agent);
                self.active.insert(*agent);
                self.uncontrolled = self.uncontrolled.saturating_sub(1);
            }
        }

        outcome.vanished = self.active.iter().copied().filter(|a| !live.contains(a)).collect();
        for agent in &outcome.vanished {
            self.active.remove(agent);
            self.parked.insert(*agent);
        }
        if self.stable {
            let n = outcome.vanished.len();
            self.uncontrolled = self.uncontrolled.saturating_add(n as u32);
            self.uncontrolled_total += n as u64;
        }

        outcome
    }

    // ── Controller-initiated changes ──────────────────────────────────────

    /// Record a freshly introduced agent as active.  Returns `false` (and
    /// changes nothing) if the id is already known.
    pub fn admit(&mut self, agent: AgentId) -> bool {
        if self.parked.contains(&agent) {
            return false;
        }
        self.active.insert(agent)
    }

    /// Move an active agent to parked.  Returns `false` if it was not active.
    pub fn park(&mut self, agent: AgentId) -> bool {
        if !self.active.remove(&agent) {
            return false;
        }
        self.parked.insert(agent);
        true
    }

    /// Latch the stability flag.  Returns `true` only on the call that set it.
    pub fn mark_stable(&mut self) -> bool {
        let first = !self.stable;
        self.stable = true;
        first
    }

    /// Set pending uncontrolled parkings off against `due` scheduled events
    /// and return how many must still be forced.
    pub fn offset_uncontrolled(&mut self, due: u32) -> u32 {
        let (will_park, left) = crate::match_uncontrolled(due, self.uncontrolled);
        self.uncontrolled = left;
        will_park
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn parked_count(&self) -> usize {
        self.parked.len()
    }

    pub fn is_active(&self, agent: AgentId) -> bool {
        self.active.contains(&agent)
    }

    pub fn is_parked(&self, agent: AgentId) -> bool {
        self.parked.contains(&agent)
    }

    /// Active agents in ascending id order.
    pub fn active(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.active.iter().copied()
    }

    pub fn uncontrolled_pending(&self) -> u32 {
        self.uncontrolled
    }

    pub fn uncontrolled_total(&self) -> u64 {
        self.uncontrolled_total
    }
}
