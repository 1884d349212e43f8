//! Road network representation and builder.
//!
//! # Data layout
//!
//! Edges are sorted by source node and addressed by `EdgeId` (their position
//! in that order).  Two CSR row-pointer arrays give contiguous adjacency:
//!
//! ```text
//! out-edges of n = EdgeId( node_out_start[n] .. node_out_start[n+1] )
//! in-edges  of n = in_edges[ node_in_start[n] .. node_in_start[n+1] ]
//! ```
//!
//! # Fringe classification
//!
//! An edge is *incoming-fringe* when nothing but its own reverse twin feeds
//! its from-node: traffic can only appear on it from outside the network.
//! It is *outgoing-fringe* when nothing but its reverse twin leaves its
//! to-node: a vehicle that follows it has nowhere to go but off the map.
//! Both flags are derived once in [`RoadNetworkBuilder::build`].

use fc_core::{EdgeId, GeoPoint, NodeId};

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph.  Immutable after [`RoadNetworkBuilder::build`].
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    pub node_pos: Vec<GeoPoint>,

    // ── Adjacency ─────────────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,
    /// Length = `node_count + 1`; indexes into `in_edges`.
    pub node_in_start: Vec<u32>,
    /// Incoming edges grouped by destination node.
    pub in_edges: Vec<EdgeId>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,
    pub edge_length_m: Vec<f32>,
    /// Free-flow travel time in milliseconds.
    pub edge_travel_ms: Vec<u32>,
    pub edge_incoming_fringe: Vec<bool>,
    pub edge_outgoing_fringe: Vec<bool>,

    bbox_diagonal_m: f32,
}

/// Everything a weight function may look at for one edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeView {
    pub id: EdgeId,
    pub from_pos: GeoPoint,
    pub to_pos: GeoPoint,
    pub length_m: f32,
    pub incoming_fringe: bool,
    pub outgoing_fringe: bool,
}

impl EdgeView {
    /// Fringe in either direction.
    #[inline]
    pub fn is_fringe(&self) -> bool {
        self.incoming_fringe || self.outgoing_fringe
    }
}

impl RoadNetwork {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        edge.index() < self.edge_count()
    }

    /// Diagonal of the bounding box around every node, in metres.
    ///
    /// No two points of the network are further apart than this, so it caps
    /// any satisfiable trip-distance floor.
    #[inline]
    pub fn bbox_diagonal_m(&self) -> f32 {
        self.bbox_diagonal_m
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn in_edges(&self, node: NodeId) -> &[EdgeId] {
        let start = self.node_in_start[node.index()] as usize;
        let end   = self.node_in_start[node.index() + 1] as usize;
        &self.in_edges[start..end]
    }

    // ── Edge views ────────────────────────────────────────────────────────

    /// A copy of everything known about `edge`.
    ///
    /// # Panics
    /// Panics if `edge` is not in the network; check with
    /// [`contains_edge`](Self::contains_edge) for untrusted ids.
    pub fn edge(&self, edge: EdgeId) -> EdgeView {
        let i = edge.index();
        EdgeView {
            id:              edge,
            from_pos:        self.node_pos[self.edge_from[i].index()],
            to_pos:          self.node_pos[self.edge_to[i].index()],
            length_m:        self.edge_length_m[i],
            incoming_fringe: self.edge_incoming_fringe[i],
            outgoing_fringe: self.edge_outgoing_fringe[i],
        }
    }

    /// All edges in `EdgeId` order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        (0..self.edge_count()).map(|i| self.edge(EdgeId(i as u32)))
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// ```
/// use fc_core::GeoPoint;
/// use fc_network::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(41.16, -8.61));
/// let c = b.add_node(GeoPoint::new(41.17, -8.61));
/// b.add_road(a, c, 1_100.0, 80_000);
/// let net = b.build();
/// assert_eq!(net.edge_count(), 2);
/// ```
#[derive(Default)]
pub struct RoadNetworkBuilder {
    nodes:     Vec<GeoPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:      NodeId,
    to:        NodeId,
    length_m:  f32,
    travel_ms: u32,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a one-way edge.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f32, travel_ms: u32) {
        self.raw_edges.push(RawEdge { from, to, length_m, travel_ms });
    }

    /// Add a two-way road as a pair of reverse-twin edges.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f32, travel_ms: u32) {
        self.add_directed_edge(a, b, length_m, travel_ms);
        self.add_directed_edge(b, a, length_m, travel_ms);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Sort edges, build both adjacency indexes, classify fringe edges and
    /// measure the bounding box.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();

        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:      Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f32>    = raw.iter().map(|e| e.length_m).collect();
        let edge_travel_ms: Vec<u32>    = raw.iter().map(|e| e.travel_ms).collect();

        let node_out_start = row_pointers(node_count, edge_from.iter());
        let node_in_start  = row_pointers(node_count, edge_to.iter());

        // Scatter edges into their destination node's in-edge slot.
        let mut fill = node_in_start.clone();
        let mut in_edges = vec![EdgeId::INVALID; edge_to.len()];
        for (i, to) in edge_to.iter().enumerate() {
            let slot = &mut fill[to.index()];
            in_edges[*slot as usize] = EdgeId(i as u32);
            *slot += 1;
        }

        let mut edge_incoming_fringe = Vec::with_capacity(edge_to.len());
        let mut edge_outgoing_fringe = Vec::with_capacity(edge_to.len());
        for i in 0..edge_to.len() {
            let (from, to) = (edge_from[i], edge_to[i]);

            let in_slice = &in_edges
                [node_in_start[from.index()] as usize..node_in_start[from.index() + 1] as usize];
            let fed = in_slice.iter().any(|f| edge_from[f.index()] != to);

            let out_range =
                node_out_start[to.index()] as usize..node_out_start[to.index() + 1] as usize;
            let continues = out_range.into_iter().any(|g| edge_to[g] != from);

            edge_incoming_fringe.push(!fed);
            edge_outgoing_fringe.push(!continues);
        }

        let bbox_diagonal_m = bbox_diagonal(&self.nodes);

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            node_in_start,
            in_edges,
            edge_from,
            edge_to,
            edge_length_m,
            edge_travel_ms,
            edge_incoming_fringe,
            edge_outgoing_fringe,
            bbox_diagonal_m,
        }
    }
}

/// CSR row pointers for `node_count` rows keyed by the given node sequence.
fn row_pointers<'a>(node_count: usize, keys: impl Iterator<Item = &'a NodeId>) -> Vec<u32> {
    let mut start = vec![0u32; node_count + 1];
    for n in keys {
        start[n.index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }
    start
}

fn bbox_diagonal(nodes: &[GeoPoint]) -> f32 {
    let Some(first) = nodes.first() else {
        return 0.0;
    };
    let (mut min, mut max) = (*first, *first);
    for p in nodes {
        min.lat = min.lat.min(p.lat);
        min.lon = min.lon.min(p.lon);
        max.lat = max.lat.max(p.lat);
        max.lon = max.lon.max(p.lon);
    }
    min.distance_m(max)
}
