//! Resource identities on the CRUD backend.

use std::fmt;

use crate::error::{Error, Result};

/// Prefix of every schema identity.
pub const DASHJOIN_ID: &str = "dj";

/// The three resource families the config store caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
  /// Table metadata, stored in the `Table` collection
  Schema,
  /// Reusable widget layouts
  Widget,
  /// Dashboard pages
  Page,
}

impl ResourceFamily {
  /// Collection name under `<base>/config/`.
  pub fn collection(self) -> &'static str {
    match self {
      ResourceFamily::Schema => "Table",
      ResourceFamily::Widget => "widget",
      ResourceFamily::Page => "page",
    }
  }

  /// Backend path of a single resource, relative to the base URL.
  pub fn resource_path(self, identity: &str) -> String {
    format!(
      "config/{}/{}",
      self.collection(),
      urlencoding::encode(identity)
    )
  }

  /// Backend path listing the whole collection.
  pub fn collection_path(self) -> String {
    format!("config/{}", self.collection())
  }
}

impl fmt::Display for ResourceFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ResourceFamily::Schema => "schema",
      ResourceFamily::Widget => "widget",
      ResourceFamily::Page => "page",
    };
    f.write_str(name)
  }
}

/// Cache identity of a table schema: `dj/<database>/<table>`.
pub fn schema_identity(database: &str, table: &str) -> String {
  format!("{}/{}/{}", DASHJOIN_ID, database, table)
}

/// A parsed composite table id of the form `prefix/database/table`.
///
/// Database and table segments are percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableId {
  pub prefix: String,
  pub database: String,
  pub table: String,
}

impl TableId {
  pub fn parse(id: &str) -> Result<Self> {
    let mut parts = id.split('/');
    let (Some(prefix), Some(database), Some(table), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(Error::InvalidTableId(id.to_string()));
    };

    if prefix.is_empty() || database.is_empty() || table.is_empty() {
      return Err(Error::InvalidTableId(id.to_string()));
    }

    let decode = |segment: &str| {
      urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|_| Error::InvalidTableId(id.to_string()))
    };

    Ok(Self {
      prefix: prefix.to_string(),
      database: decode(database)?,
      table: decode(table)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_schema_identity() {
    assert_eq!(schema_identity("sales", "Orders"), "dj/sales/Orders");
  }

  #[test]
  fn test_resource_path_encodes_identity_as_one_segment() {
    assert_eq!(
      ResourceFamily::Schema.resource_path("dj/sales/Orders"),
      "config/Table/dj%2Fsales%2FOrders"
    );
    assert_eq!(
      ResourceFamily::Page.resource_path("Info Page"),
      "config/page/Info%20Page"
    );
    assert_eq!(ResourceFamily::Widget.collection_path(), "config/widget");
  }

  #[test]
  fn test_parse_table_id() {
    let id = TableId::parse("dj/sales/Orders").unwrap();
    assert_eq!(id.prefix, "dj");
    assert_eq!(id.database, "sales");
    assert_eq!(id.table, "Orders");
  }

  #[test]
  fn test_parse_table_id_decodes_segments() {
    let id = TableId::parse("dj/junit/http:%2F%2Fex.org%2FEMP").unwrap();
    assert_eq!(id.database, "junit");
    assert_eq!(id.table, "http://ex.org/EMP");
  }

  #[test]
  fn test_parse_table_id_rejects_malformed() {
    assert!(TableId::parse("dj/sales").is_err());
    assert!(TableId::parse("dj/sales/Orders/7").is_err());
    assert!(TableId::parse("dj//Orders").is_err());
    assert!(TableId::parse("").is_err());
  }
}
