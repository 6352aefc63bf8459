//! Capacity accounting in party-size units.
//!
//! Occupancy is always recomputed from the current set of requests; it is
//! never cached, because it gates promotion.

use super::participant::{ParticipantRequest, Role};

/// Sums the party sizes of all `requests` currently in `role`.
///
/// Returns `0` for an empty set.
pub fn occupancy<'a, I>(requests: I, role: Role) -> u64
where
    I: IntoIterator<Item = &'a ParticipantRequest>,
{
    requests
        .into_iter()
        .filter(|req| req.role() == role)
        .map(|req| u64::from(req.party_size))
        .sum()
}

/// Returns `true` if a party of `party_size` can join `current` confirmed
/// units without exceeding `max_participants`.
#[must_use]
pub fn fits(current: u64, party_size: u32, max_participants: u32) -> bool {
    current.saturating_add(u64::from(party_size)) <= u64::from(max_participants)
}
