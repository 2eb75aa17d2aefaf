//! Router configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`Router`](crate::Router) construction.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Skip the trie compression pass when a route table is installed.
    ///
    /// Compression only affects lookup speed, never matching semantics.
    /// Leaving the trie uncompressed keeps setup simpler to reason about
    /// and lets routes added after installation stay reachable (see
    /// [`Router::add_route`](crate::Router::add_route)).
    pub disable_trie_compression: bool,
}
