//! Table allow-list for the catalog database.

use std::collections::BTreeMap;

/// Immutable mapping from table name to its primary-key column.
///
/// Built once at startup and shared read-only across requests. Only tables
/// present here can be reached through the API; everything else is rejected
/// before any SQL is built.
#[derive(Debug, Clone)]
pub struct TableRegistry {
    tables: BTreeMap<&'static str, &'static str>,
}

impl TableRegistry {
    /// The MustWatch catalog tables and their primary-key columns.
    pub fn catalog() -> Self {
        let tables = BTreeMap::from([
            ("serie", "idserie"),
            ("categoria", "idcategoria"),
            ("ator", "idator"),
            ("motivo_assistir", "idmotivo_assistir"),
            ("avaliacao_serie", "idavaliacao_serie"),
            ("ator_serie", "idator_serie"),
        ]);
        Self { tables }
    }

    /// Primary-key column for `table`, or `None` when the table is not allowed.
    pub fn primary_key(&self, table: &str) -> Option<&'static str> {
        self.tables.get(table).copied()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Allowed table names, for diagnostics.
    pub fn table_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_six_tables() {
        let registry = TableRegistry::catalog();
        assert_eq!(registry.table_names().count(), 6);
    }

    #[test]
    fn primary_key_lookup() {
        let registry = TableRegistry::catalog();
        assert_eq!(registry.primary_key("serie"), Some("idserie"));
        assert_eq!(registry.primary_key("ator_serie"), Some("idator_serie"));
        assert_eq!(registry.primary_key("usuarios"), None);
    }

    #[test]
    fn contains_matches_lookup() {
        let registry = TableRegistry::catalog();
        assert!(registry.contains("categoria"));
        assert!(!registry.contains("CATEGORIA"));
    }
}
