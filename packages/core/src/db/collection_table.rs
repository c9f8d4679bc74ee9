//! Collection Naming
//!
//! Maps a logical collection name (e.g. `alerts`, `chat`) to the physical
//! table that stores its records. This is the only place a table identifier
//! is derived; everything else receives an opaque [`CollectionTable`].
//!
//! Sanitization strips every character outside `[A-Za-z0-9_]`, so two logical
//! names differing only in stripped characters (`ab!c` and `abc`) share one
//! table. That collision is accepted, not corrected.

use std::fmt;

/// Namespace prefix for every collection table
pub const TABLE_PREFIX: &str = "feed_data_";

/// Derive the physical table name for a logical collection name
///
/// Pure and infallible. Empty or fully-stripped input yields the bare
/// prefix, which is syntactically valid but degenerate; callers validate
/// non-emptiness upstream.
///
/// # Examples
///
/// ```
/// use feed_core::db::physical_name;
///
/// assert_eq!(physical_name("alerts"), "feed_data_alerts");
/// assert_eq!(physical_name("ab!c"), physical_name("abc"));
/// assert_eq!(physical_name("drop table;--"), "feed_data_droptable");
/// ```
pub fn physical_name(logical_name: &str) -> String {
    let sanitized: String = logical_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    format!("{}{}", TABLE_PREFIX, sanitized)
}

/// Opaque handle to a collection's physical table
///
/// Holds the already-sanitized identifier, so interpolating it into SQL
/// cannot break out of the quoted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionTable {
    table: String,
}

impl CollectionTable {
    /// Build the handle for a logical collection name
    ///
    /// Does not check that the table exists; the service layer obtains
    /// handles through the collection registry, which does.
    pub fn from_logical_name(logical_name: &str) -> Self {
        Self {
            table: physical_name(logical_name),
        }
    }

    /// Physical table name (unquoted)
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Table name quoted for interpolation into SQL
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.table)
    }

    /// Name of the non-unique index on `column`
    pub fn index_name(&self, column: &str) -> String {
        format!("{}_{}_i", self.table, column)
    }
}

impl fmt::Display for CollectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.table)
    }
}
