//! Table visibility rules

use crate::types::TableSummary;

/// Whether `viewer` may see `table` in the open lobby.
///
/// Public tables are visible to everyone; private tables only to their
/// creator and to invited players.
pub fn is_visible_to(table: &TableSummary, viewer: &str) -> bool {
    !table.is_private
        || table.creator_id == viewer
        || table.invited_players.iter().any(|id| id == viewer)
}
