//! Typed identifier wrappers.
//!
//! Ids are `Copy + Ord + Hash` so they key ordered sets and maps directly.
//! `AgentId` and `RouteId` come from a monotonically increasing counter and
//! are never reused within a run; `NodeId`/`EdgeId` are positions in the
//! read-only network arrays.

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty) => $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel for "no id".
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// The id that follows `self` in allocation order.
            #[inline]
            pub fn next(self) -> $name {
                $name(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

typed_id! {
    /// A simulated vehicle.  Displayed as `veh<n>`, the name the external
    /// simulator knows it by.
    pub struct AgentId(u32) => "veh";
}

typed_id! {
    /// A road-network node.
    pub struct NodeId(u32) => "n";
}

typed_id! {
    /// A directed road-network edge.
    pub struct EdgeId(u32) => "e";
}

typed_id! {
    /// A route registered with the external simulator (`trip<n>`).
    pub struct RouteId(u32) => "trip";
}

impl From<AgentId> for RouteId {
    /// Each agent is introduced on a route of its own, numbered alike.
    #[inline]
    fn from(agent: AgentId) -> RouteId {
        RouteId(agent.0)
    }
}
