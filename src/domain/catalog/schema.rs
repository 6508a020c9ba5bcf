//! Live schema rendered as DDL fragments

use serde::Serialize;
use sha2::{Digest, Sha256};

/// One column of a table as read from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: String,
    pub comment: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = (!comment.trim().is_empty()).then(|| comment.trim().to_string());
        self
    }
}

/// DDL fragment for one table, columns in ordinal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDdl {
    pub table: String,
    pub comment: Option<String>,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDdl {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            comment: None,
            columns: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = (!comment.trim().is_empty()).then(|| comment.trim().to_string());
        self
    }

    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// `CREATE TABLE` statement with business comments inline
    pub fn render(&self) -> String {
        let mut ddl = String::new();

        if let Some(ref comment) = self.comment {
            ddl.push_str(&format!("-- {}\n", comment));
        }

        ddl.push_str(&format!("CREATE TABLE {} (\n", self.table));

        let last = self.columns.len().saturating_sub(1);
        for (idx, column) in self.columns.iter().enumerate() {
            ddl.push_str(&format!("    {} {}", column.name, column.data_type));
            if idx < last {
                ddl.push(',');
            }
            if let Some(ref comment) = column.comment {
                ddl.push_str(&format!(" -- {}", comment));
            }
            ddl.push('\n');
        }

        ddl.push_str(");");
        ddl
    }
}

/// Ordered DDL of every table in the configured schema
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SchemaContext {
    pub schema: String,
    pub tables: Vec<TableDdl>,
}

impl SchemaContext {
    pub fn new(schema: impl Into<String>, tables: Vec<TableDdl>) -> Self {
        Self {
            schema: schema.into(),
            tables,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Rendered DDL of each table, in order
    pub fn fragments(&self) -> Vec<String> {
        self.tables.iter().map(TableDdl::render).collect()
    }

    /// Full schema text for the generation prompt
    pub fn render(&self) -> String {
        self.fragments().join("\n\n")
    }

    /// Short stable hash of the rendered schema, used as the cache generation
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.render().as_bytes());
        hex::encode(digest)[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nasabah() -> TableDdl {
        TableDdl::new("nasabah")
            .with_comment("Data induk nasabah")
            .with_column(
                ColumnDefinition::new("id_nasabah", "character varying").with_comment("CIF"),
            )
            .with_column(ColumnDefinition::new("nama", "text"))
    }

    #[test]
    fn test_render_table() {
        assert_eq!(
            nasabah().render(),
            "-- Data induk nasabah\nCREATE TABLE nasabah (\n    id_nasabah character varying, -- CIF\n    nama text\n);"
        );
    }

    #[test]
    fn test_blank_comments_are_dropped() {
        let column = ColumnDefinition::new("saldo", "numeric").with_comment("   ");
        assert_eq!(column.comment, None);
    }

    #[test]
    fn test_schema_render_keeps_order() {
        let schema = SchemaContext::new(
            "bank",
            vec![nasabah(), TableDdl::new("rekening").with_column(ColumnDefinition::new("saldo", "numeric"))],
        );

        let rendered = schema.render();
        let nasabah_pos = rendered.find("CREATE TABLE nasabah").unwrap();
        let rekening_pos = rendered.find("CREATE TABLE rekening").unwrap();

        assert!(nasabah_pos < rekening_pos);
        assert_eq!(schema.fragments().len(), 2);
    }

    #[test]
    fn test_fingerprint_tracks_schema_changes() {
        let a = SchemaContext::new("bank", vec![nasabah()]);
        let b = SchemaContext::new("bank", vec![nasabah()]);
        let c = SchemaContext::new(
            "bank",
            vec![nasabah().with_column(ColumnDefinition::new("alamat", "text"))],
        );

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
