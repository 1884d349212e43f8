//! Forced-parking arithmetic.

use fc_core::{AgentId, SimRng};

/// Net scheduled quota against pending uncontrolled parkings.
///
/// Returns `(will_park, uncontrolled)` after matching: whichever side is
/// larger keeps the difference, the other drops to zero.
///
/// ```
/// use fc_control::match_uncontrolled;
///
/// assert_eq!(match_uncontrolled(5, 5), (0, 0));
/// assert_eq!(match_uncontrolled(8, 3), (5, 0));
/// assert_eq!(match_uncontrolled(2, 6), (0, 4));
/// ```
pub fn match_uncontrolled(will_park: u32, uncontrolled: u32) -> (u32, u32) {
    if will_park == 0 || uncontrolled == 0 {
        return (will_park, uncontrolled);
    }
    match will_park.cmp(&uncontrolled) {
        std::cmp::Ordering::Equal   => (0, 0),
        std::cmp::Ordering::Greater => (will_park - uncontrolled, 0),
        std::cmp::Ordering::Less    => (0, uncontrolled - will_park),
    }
}

/// Up to `amount` distinct agents from `pool`, uniformly without
/// replacement.  Asking for more than `pool.len()` returns the whole pool
/// in random order.
pub fn draw_distinct(pool: &[AgentId], amount: usize, rng: &mut SimRng) -> Vec<AgentId> {
    let amount = amount.min(pool.len());
    rng.sample_indices(pool.len(), amount)
        .into_iter()
        .map(|i| pool[i])
        .collect()
}
