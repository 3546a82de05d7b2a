use serde::{Deserialize, Serialize};

/// Contact snapshot of the authenticated buyer.
///
/// Copied verbatim onto an order at creation time; never re-synced if the
/// identity provider's profile changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Buyer {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}
