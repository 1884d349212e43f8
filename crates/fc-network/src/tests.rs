//! Unit tests for fc-network.
//!
//! All tests use hand-built or synthetic networks.

#[cfg(test)]
mod helpers {
    use fc_core::{GeoPoint, NodeId};

    use crate::{RoadNetwork, RoadNetworkBuilder};

    /// A line with a one-way entry and a one-way exit:
    ///
    /// ```text
    ///   0 ──▶ 1 ◀──▶ 2 ──▶ 3
    /// ```
    pub fn entry_line() -> (RoadNetwork, [NodeId; 4]) {
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.0, 0.000));
        let n1 = b.add_node(GeoPoint::new(0.0, 0.001));
        let n2 = b.add_node(GeoPoint::new(0.0, 0.002));
        let n3 = b.add_node(GeoPoint::new(0.0, 0.003));
        b.add_directed_edge(n0, n1, 111.0, 10_000);
        b.add_road(n1, n2, 111.0, 10_000);
        b.add_directed_edge(n2, n3, 111.0, 10_000);
        (b.build(), [n0, n1, n2, n3])
    }
}

// ── Builder & structure ───────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use fc_core::GeoPoint;

    use crate::RoadNetworkBuilder;

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert!(net.is_empty());
        assert_eq!(net.edge_count(), 0);
        assert_eq!(net.bbox_diagonal_m(), 0.0);
    }

    #[test]
    fn in_and_out_adjacency_agree() {
        let (net, [n0, n1, n2, n3]) = super::helpers::entry_line();
        assert_eq!(net.out_edges(n0).count(), 1);
        assert_eq!(net.in_edges(n0).len(), 0);
        assert_eq!(net.in_edges(n1).len(), 2); // from n0 and n2
        assert_eq!(net.out_edges(n3).count(), 0);
        for &e in net.in_edges(n2) {
            assert_eq!(net.edge_to[e.index()], n2);
        }
        for e in net.out_edges(n1) {
            assert_eq!(net.edge_from[e.index()], n1);
        }
    }

    #[test]
    fn bbox_diagonal_spans_extremes() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(41.0, -8.6));
        let c = b.add_node(GeoPoint::new(41.0, -8.6).offset_m(300.0, 400.0));
        b.add_road(a, c, 500.0, 36_000);
        let net = b.build();
        assert!((net.bbox_diagonal_m() - 500.0).abs() < 5.0, "got {}", net.bbox_diagonal_m());
    }
}

// ── Fringe classification ─────────────────────────────────────────────────────

#[cfg(test)]
mod fringe {
    use fc_core::{EdgeId, NodeId};

    use crate::RoadNetwork;

    fn find(net: &RoadNetwork, from: NodeId, to: NodeId) -> EdgeId {
        net.out_edges(from)
            .find(|e| net.edge_to[e.index()] == to)
            .expect("edge exists")
    }

    #[test]
    fn one_way_entry_is_incoming_fringe() {
        let (net, [n0, n1, ..]) = super::helpers::entry_line();
        let e = net.edge(find(&net, n0, n1));
        assert!(e.incoming_fringe);
        assert!(!e.outgoing_fringe);
    }

    #[test]
    fn one_way_exit_is_outgoing_fringe() {
        let (net, [_, _, n2, n3]) = super::helpers::entry_line();
        let e = net.edge(find(&net, n2, n3));
        assert!(e.outgoing_fringe);
        assert!(!e.incoming_fringe);
    }

    #[test]
    fn reverse_twin_does_not_count_as_connection() {
        // 1 → 2 is fed by 0 → 1 and continues into 2 → 3, so it is interior.
        // 2 → 1 is fed by 1 → 2 only (its twin) and 1 has no exit other than
        // back to 2, so it is fringe both ways.
        let (net, [_, n1, n2, _]) = super::helpers::entry_line();
        let fwd = net.edge(find(&net, n1, n2));
        assert!(!fwd.is_fringe());
        let back = net.edge(find(&net, n2, n1));
        assert!(back.incoming_fringe);
        assert!(back.outgoing_fringe);
    }
}

// ── Synthetic grid ────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid {
    use crate::{GridSpec, build_grid};

    #[test]
    fn edge_count_without_stubs() {
        let spec = GridSpec { rows: 3, cols: 4, boundary_stubs: false, ..GridSpec::default() };
        let net = build_grid(&spec);
        assert_eq!(net.node_count(), 12);
        // 3 rows × 3 horizontal roads + 2 × 4 vertical roads, two directions.
        assert_eq!(net.edge_count(), 2 * (3 * 3 + 2 * 4));
        assert!(net.edges().all(|e| !e.is_fringe()));
    }

    #[test]
    fn stubs_add_fringe_edges_on_both_sides() {
        let spec = GridSpec { rows: 3, cols: 4, boundary_stubs: true, ..GridSpec::default() };
        let net = build_grid(&spec);
        let incoming = net.edges().filter(|e| e.incoming_fringe).count();
        let outgoing = net.edges().filter(|e| e.outgoing_fringe).count();
        assert_eq!(incoming, 2 * 3);
        assert_eq!(outgoing, 2 * 3);
        assert!(net.edges().all(|e| !(e.incoming_fringe && e.outgoing_fringe)));
    }

    #[test]
    fn diagonal_matches_layout() {
        let spec = GridSpec { rows: 4, cols: 4, spacing_m: 100.0, boundary_stubs: false, ..GridSpec::default() };
        let net = build_grid(&spec);
        let expected = (300.0f32 * 300.0 * 2.0).sqrt();
        assert!((net.bbox_diagonal_m() - expected).abs() < 5.0);
    }

    #[test]
    fn degenerate_grid_is_empty() {
        let spec = GridSpec { rows: 0, ..GridSpec::default() };
        assert!(build_grid(&spec).is_empty());
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use fc_core::EdgeId;

    use crate::{DijkstraRouter, GridSpec, NetworkError, Router, build_grid, connect_edges};

    #[test]
    fn trivial_same_node() {
        let (net, [n0, ..]) = super::helpers::entry_line();
        let r = DijkstraRouter.route(&net, n0, n0).unwrap();
        assert!(r.is_trivial());
    }

    #[test]
    fn one_way_blocks_return() {
        let (net, [n0, _, _, n3]) = super::helpers::entry_line();
        let fwd = DijkstraRouter.route(&net, n0, n3).unwrap();
        assert_eq!(fwd.edges.len(), 3);
        assert_eq!(fwd.total_travel_secs, 30.0);
        assert!(matches!(
            DijkstraRouter.route(&net, n3, n0),
            Err(NetworkError::NoRoute { .. })
        ));
    }

    #[test]
    fn connect_edges_is_contiguous() {
        let net = build_grid(&GridSpec { rows: 4, cols: 4, boundary_stubs: false, ..GridSpec::default() });
        let first = EdgeId(0);
        let last = EdgeId(net.edge_count() as u32 - 1);
        let path = connect_edges(&DijkstraRouter, &net, &[first, last]).unwrap();
        assert_eq!(path.first(), Some(&first));
        assert_eq!(path.last(), Some(&last));
        for pair in path.windows(2) {
            assert_eq!(net.edge_to[pair[0].index()], net.edge_from[pair[1].index()]);
        }
    }

    #[test]
    fn connect_edges_rejects_unknown_edge() {
        let (net, _) = super::helpers::entry_line();
        let err = connect_edges(&DijkstraRouter, &net, &[EdgeId(0), EdgeId(99)]).unwrap_err();
        assert!(matches!(err, NetworkError::EdgeNotFound(EdgeId(99))));
    }

    #[test]
    fn connect_edges_collapses_repeats() {
        let (net, _) = super::helpers::entry_line();
        let path = connect_edges(&DijkstraRouter, &net, &[EdgeId(1), EdgeId(1)]).unwrap();
        assert_eq!(path, vec![EdgeId(1)]);
    }
}
