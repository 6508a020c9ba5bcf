//! Lookup-table contents used to ground literal codes

use serde::{Deserialize, Serialize};

/// A lookup table whose rows are listed as `id = label`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTable {
    pub table: String,
    pub id_column: String,
    pub label_column: String,
}

impl ReferenceTable {
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            id_column: id_column.into(),
            label_column: label_column.into(),
        }
    }

    /// Lookup tables of the ledger schema
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("master_status_rekening", "id_status_rekening", "nama_status"),
            Self::new("master_jenis_rekening", "id_jenis_rekening", "nama_jenis"),
            Self::new("master_tipe_nasabah", "id_tipe_nasabah", "nama_tipe"),
            Self::new("master_tipe_transaksi", "id_tipe_transaksi", "nama_transaksi"),
        ]
    }
}

/// Rows of one lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSection {
    pub table: String,
    pub entries: Vec<(String, String)>,
}

/// Current contents of all configured lookup tables
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReferenceData {
    pub sections: Vec<ReferenceSection>,
}

impl ReferenceData {
    pub fn new(sections: Vec<ReferenceSection>) -> Self {
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| {
                let mut text = format!("Table {}:\n", section.table);
                if section.entries.is_empty() {
                    text.push_str("(empty table)\n");
                }
                for (id, label) in &section.entries {
                    text.push_str(&format!("- ID '{}' = {}\n", id, label));
                }
                text
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sections() {
        let data = ReferenceData::new(vec![
            ReferenceSection {
                table: "master_status_rekening".to_string(),
                entries: vec![
                    ("A".to_string(), "Aktif".to_string()),
                    ("T".to_string(), "Tutup".to_string()),
                ],
            },
            ReferenceSection {
                table: "master_tipe_nasabah".to_string(),
                entries: vec![],
            },
        ]);

        assert_eq!(
            data.render(),
            "Table master_status_rekening:\n- ID 'A' = Aktif\n- ID 'T' = Tutup\n\nTable master_tipe_nasabah:\n(empty table)\n"
        );
    }

    #[test]
    fn test_defaults() {
        let tables = ReferenceTable::defaults();
        assert_eq!(tables.len(), 4);
        assert_eq!(tables[0].label_column, "nama_status");
    }
}
