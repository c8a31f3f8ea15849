//! Task parameter negotiation: channel id selection, handover AND-merge,
//! and the legacy v0 `max_packet_size` merge rule.

use crate::error::TaskError;

/// Negotiation payload placed in the outgoing `auth` message and parsed
/// from the peer's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationPayload {
    /// Channel ids this endpoint refuses to use for signalling.
    pub exclude: Vec<u16>,
    /// Whether this endpoint wants handover.
    pub handover: bool,
    /// v0 only: locally requested maximum chunk length, 0 meaning "no
    /// chunking".
    pub max_packet_size: Option<u32>,
}

/// Pick the smallest `u16` not present in the union of `local_exclude` and
/// `peer_exclude`.
///
/// # Errors
///
/// Returns [`TaskError::NoChannelIdAvailable`] if every id in `0..65535`
/// is excluded.
pub fn select_channel_id(local_exclude: &[u16], peer_exclude: &[u16]) -> Result<u16, TaskError> {
    let excluded: std::collections::HashSet<u16> =
        local_exclude.iter().chain(peer_exclude.iter()).copied().collect();
    (0..u16::MAX).find(|id| !excluded.contains(id)).ok_or(TaskError::NoChannelIdAvailable)
}

/// Merge the local and peer handover preferences: handover is enabled only
/// if both sides want it.
#[must_use]
pub fn merge_handover(local: bool, peer: bool) -> bool {
    local && peer
}

/// Merge two v0 `max_packet_size` values per the legacy negotiation rule:
///
/// - both zero: no chunking (0)
/// - exactly one zero: the non-zero value wins
/// - otherwise: the smaller value wins
#[must_use]
pub fn merge_max_packet_size(local: u32, peer: u32) -> u32 {
    match (local, peer) {
        (0, 0) => 0,
        (0, r) => r,
        (l, 0) => l,
        (l, r) => l.min(r),
    }
}
