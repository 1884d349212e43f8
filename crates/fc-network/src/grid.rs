//! Synthetic Manhattan-grid networks.
//!
//! Stand-in for a real topology loader: the runner and the tests need a
//! network with known geometry and a controllable set of fringe edges.
//!
//! With `boundary_stubs` enabled, every node on the west and east columns
//! gets two extra one-way edges leading to dead-end stub nodes just outside
//! the grid:
//!
//! ```text
//!   in-stub ──▶ (r,0) ──▶ out-stub        in-stub  : incoming-fringe
//!                                          out-stub : outgoing-fringe
//! ```

use fc_core::{GeoPoint, NodeId};

use crate::{RoadNetwork, RoadNetworkBuilder};

/// Shape of a synthetic grid.
#[derive(Clone, Debug)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    /// Distance between neighbouring intersections.
    pub spacing_m: f32,
    /// Free-flow speed used for edge travel times.
    pub speed_mps: f32,
    /// South-west corner.
    pub origin: GeoPoint,
    pub boundary_stubs: bool,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows:           6,
            cols:           6,
            spacing_m:      200.0,
            speed_mps:      13.9,
            origin:         GeoPoint::new(41.16, -8.62),
            boundary_stubs: true,
        }
    }
}

impl GridSpec {
    fn travel_ms(&self, length_m: f32) -> u32 {
        (length_m / self.speed_mps * 1000.0).round() as u32
    }
}

/// Build the grid described by `spec`.
pub fn build_grid(spec: &GridSpec) -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    if spec.rows == 0 || spec.cols == 0 {
        return b.build();
    }
    let step = spec.spacing_m;
    let travel = spec.travel_ms(step);

    let mut ids = Vec::with_capacity((spec.rows * spec.cols) as usize);
    for r in 0..spec.rows {
        for c in 0..spec.cols {
            ids.push(b.add_node(spec.origin.offset_m(r as f32 * step, c as f32 * step)));
        }
    }
    let at = |r: u32, c: u32| -> NodeId { ids[(r * spec.cols + c) as usize] };

    for r in 0..spec.rows {
        for c in 0..spec.cols {
            if c + 1 < spec.cols {
                b.add_road(at(r, c), at(r, c + 1), step, travel);
            }
            if r + 1 < spec.rows {
                b.add_road(at(r, c), at(r + 1, c), step, travel);
            }
        }
    }

    if spec.boundary_stubs {
        let stub_len = step * 0.5;
        let stub_travel = spec.travel_ms(stub_len);
        for r in 0..spec.rows {
            for (c, east) in [(0, -stub_len), (spec.cols - 1, stub_len)] {
                let anchor = at(r, c);
                let north = r as f32 * step;
                let base_east = c as f32 * step + east;

                let inbound = b.add_node(spec.origin.offset_m(north + step * 0.25, base_east));
                b.add_directed_edge(inbound, anchor, stub_len, stub_travel);

                let outbound = b.add_node(spec.origin.offset_m(north - step * 0.25, base_east));
                b.add_directed_edge(anchor, outbound, stub_len, stub_travel);
            }
        }
    }

    b.build()
}
