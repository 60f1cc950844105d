//! In-memory model of the community-maintained DAT schema.
//!
//! The schema is a JSON document describing every known table, its columns,
//! and which game generation each definition is valid for. It is published at
//! [`SCHEMA_URL`] and cached locally; this module only parses and queries it.

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{Error, Result},
    types::FieldType,
};

/// Published location of the community schema document.
pub const SCHEMA_URL: &str =
    "https://github.com/poe-tool-dev/dat-schema/releases/download/latest/schema.min.json";

/// Game-generation compatibility flags of a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidFor(pub u8);

impl ValidFor {
    /// Valid for Path of Exile 1 only (3.x patches)
    pub const POE1: ValidFor = ValidFor(0x01);
    /// Valid for Path of Exile 2 only (4.x patches)
    pub const POE2: ValidFor = ValidFor(0x02);
    /// Valid for both games
    pub const BOTH: ValidFor = ValidFor(0x03);

    /// Whether this definition applies to the given major game version.
    pub fn is_valid_for(self, major: u32) -> bool {
        let bit = if major >= 4 { Self::POE2.0 } else { Self::POE1.0 };
        self.0 & bit != 0
    }

    fn is_known(self) -> bool {
        matches!(self, Self::POE1 | Self::POE2 | Self::BOTH)
    }
}

/// A foreign-key relationship of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    /// Referenced table name
    pub table: String,

    /// Referenced column name, when the reference is not by row index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// One column definition from the community schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Column name; unnamed columns decode under a synthetic `Unknown<i>` key
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Whether the column is an array of `type`
    #[serde(default)]
    pub array: bool,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub localized: bool,

    /// Version in which this column was removed
    #[serde(default)]
    pub until: Option<String>,

    #[serde(default)]
    pub references: Option<ColumnReference>,

    /// File extension for asset-path columns
    #[serde(default)]
    pub file: Option<String>,

    /// Multiple file extensions for asset-path columns
    #[serde(default)]
    pub files: Option<Vec<String>>,

    /// Whether the slot holds a start/end pair of the scalar type
    #[serde(default)]
    pub interval: bool,
}

/// One table definition from the community schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(rename = "validFor")]
    pub valid_for: ValidFor,

    /// Table name, matching the DAT file name without extension
    pub name: String,

    pub columns: Vec<TableColumn>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl TableSchema {
    /// Names of all named columns, in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| c.name.as_deref())
            .collect()
    }
}

/// An enumeration definition from the community schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEnumeration {
    #[serde(rename = "validFor")]
    pub valid_for: ValidFor,

    pub name: String,

    /// 0- or 1-based indexing of the enumerators
    #[serde(default)]
    pub indexing: u8,

    #[serde(default)]
    pub enumerators: Vec<Option<String>>,
}

/// The complete community schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySchema {
    pub version: u32,

    #[serde(rename = "createdAt")]
    pub created_at: i64,

    pub tables: Vec<TableSchema>,

    #[serde(default)]
    pub enumerations: Vec<SchemaEnumeration>,
}

impl CommunitySchema {
    /// Parse and validate a schema document from raw JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let schema: CommunitySchema = serde_json::from_slice(data)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parse and validate a schema document from a reader.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_slice(&data)
    }

    fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(Error::InvalidSchema("schema contains no tables".into()));
        }
        for table in &self.tables {
            if table.name.is_empty() {
                return Err(Error::InvalidSchema("table name cannot be empty".into()));
            }
            if !table.valid_for.is_known() {
                return Err(Error::InvalidSchema(format!(
                    "table {} has invalid validFor value {}",
                    table.name, table.valid_for.0
                )));
            }
            for column in &table.columns {
                if let Some(reference) = &column.references {
                    if reference.table.is_empty() {
                        return Err(Error::InvalidSchema(format!(
                            "table {} references an unnamed table",
                            table.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Find the table definition for `name` compatible with the given major
    /// game version.
    ///
    /// Exact name matches win over case-insensitive ones; among several
    /// compatible definitions the first in document order is used.
    pub fn table_for_version(&self, name: &str, major: u32) -> Result<&TableSchema> {
        let mut matching: Vec<&TableSchema> = self
            .tables
            .iter()
            .filter(|t| t.name == name && t.valid_for.is_valid_for(major))
            .collect();

        if matching.is_empty() {
            let lower = name.to_lowercase();
            matching = self
                .tables
                .iter()
                .filter(|t| t.name.to_lowercase() == lower && t.valid_for.is_valid_for(major))
                .collect();
        }

        if matching.len() > 1 {
            warn!(
                table = name,
                candidates = matching.len(),
                "multiple compatible schemas found, using first match"
            );
        }

        matching.first().copied().ok_or_else(|| Error::SchemaNotFound {
            table: name.to_string(),
            version: format!("{major}.x"),
        })
    }

    /// All table definitions valid for the given major game version.
    pub fn valid_tables(&self, major: u32) -> Vec<&TableSchema> {
        self.tables
            .iter()
            .filter(|t| t.valid_for.is_valid_for(major))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::{CommunitySchema, ValidFor};
    use crate::error::Error;
    use crate::types::FieldType;

    const SAMPLE: &str = r#"{
        "version": 3,
        "createdAt": 1721917000,
        "tables": [
            {
                "validFor": 1,
                "name": "Mods",
                "columns": [
                    {"name": "Id", "array": false, "type": "string", "unique": true, "localized": false},
                    {"name": "Level", "array": false, "type": "i32", "unique": false, "localized": false}
                ],
                "tags": []
            },
            {
                "validFor": 2,
                "name": "Mods",
                "columns": [
                    {"name": "Id", "array": false, "type": "string", "unique": true, "localized": false}
                ],
                "tags": []
            },
            {
                "validFor": 3,
                "name": "BaseItemTypes",
                "columns": [
                    {"name": null, "array": false, "type": "foreignrow", "unique": false, "localized": false, "references": {"table": "ItemClasses"}}
                ],
                "tags": ["item"]
            }
        ],
        "enumerations": [
            {"validFor": 3, "name": "Rarity", "indexing": 0, "enumerators": ["Normal", null, "Rare"]}
        ]
    }"#;

    #[test]
    fn parse_document() {
        let schema = CommunitySchema::from_slice(SAMPLE.as_bytes()).unwrap();
        assert_eq!(schema.version, 3);
        assert_eq!(schema.tables.len(), 3);
        assert_eq!(schema.enumerations.len(), 1);

        let base = &schema.tables[2];
        assert_eq!(base.valid_for, ValidFor::BOTH);
        assert_eq!(base.columns[0].field_type, FieldType::ForeignRow);
        assert_eq!(
            base.columns[0].references.as_ref().unwrap().table,
            "ItemClasses"
        );
    }

    #[test]
    fn version_aware_selection() {
        let schema = CommunitySchema::from_slice(SAMPLE.as_bytes()).unwrap();

        // the PoE1 definition of Mods has two columns, the PoE2 one has one
        assert_eq!(schema.table_for_version("Mods", 3).unwrap().columns.len(), 2);
        assert_eq!(schema.table_for_version("Mods", 4).unwrap().columns.len(), 1);

        // case-insensitive fallback for DAT file names
        let table = schema.table_for_version("baseitemtypes", 3).unwrap();
        assert_eq!(table.name, "BaseItemTypes");

        assert!(matches!(
            schema.table_for_version("NoSuchTable", 3),
            Err(Error::SchemaNotFound { .. })
        ));
    }

    #[traced_test]
    #[test]
    fn ambiguous_selection_warns() {
        let mut schema = CommunitySchema::from_slice(SAMPLE.as_bytes()).unwrap();
        // duplicate the PoE1 Mods definition to force ambiguity
        let dup = schema.tables[0].clone();
        schema.tables.push(dup);

        let table = schema.table_for_version("Mods", 3).unwrap();
        assert_eq!(table.columns.len(), 2);
        assert!(logs_contain("multiple compatible schemas"));
    }

    #[test]
    fn valid_tables_per_generation() {
        let schema = CommunitySchema::from_slice(SAMPLE.as_bytes()).unwrap();
        let poe1: Vec<&str> = schema.valid_tables(3).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(poe1, vec!["Mods", "BaseItemTypes"]);
    }

    #[test]
    fn reject_invalid_documents() {
        assert!(CommunitySchema::from_slice(br#"{"version":1,"createdAt":1,"tables":[]}"#).is_err());

        let bad_validfor = r#"{
            "version": 1, "createdAt": 1,
            "tables": [{"validFor": 9, "name": "X", "columns": [], "tags": []}]
        }"#;
        assert!(matches!(
            CommunitySchema::from_slice(bad_validfor.as_bytes()),
            Err(Error::InvalidSchema(_))
        ));
    }
}
