//! redb table definitions for the alertscale state store.

use redb::TableDefinition;

/// Function replica records keyed by `{namespace}/{name}`.
pub const FUNCTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("functions");
