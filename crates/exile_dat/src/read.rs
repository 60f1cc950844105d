//! The table-reading façade: bridges the bundle layer and the DAT decoder.

use exile_bundle::{cdn::parse_game_version, resolve::DEFAULT_LANGUAGE, BundleManager};
use tracing::debug;

use crate::{
    error::Result,
    parser::{CancelFlag, DatParser},
    schema::CommunitySchema,
    types::ParsedTable,
};

const DAT_EXT: &str = ".datc64";

/// Reads DAT tables out of a cached bundle tree, selecting the right schema
/// for the patch's game generation and the right file for the requested
/// language.
///
/// ```no_run
/// use exile_dat::{CommunitySchema, TableReader};
///
/// fn decode_mods(manager: exile_bundle::BundleManager, schema: CommunitySchema)
///     -> exile_dat::error::Result<()>
/// {
///     let reader = TableReader::new(manager, schema, "3.25.1.1")?;
///     let table = reader.read_table("Mods", "French")?;
///     println!("{} rows", table.rows.len());
///     Ok(())
/// }
/// ```
pub struct TableReader {
    manager: BundleManager,
    schema: CommunitySchema,
    major: u32,
    parser: DatParser,
}

impl TableReader {
    /// Wrap a bundle manager and a loaded schema for the given patch.
    pub fn new(manager: BundleManager, schema: CommunitySchema, patch: &str) -> Result<Self> {
        let major = parse_game_version(patch)?;
        Ok(Self {
            manager,
            schema,
            major,
            parser: DatParser::new(),
        })
    }

    /// The wrapped schema document.
    pub fn schema(&self) -> &CommunitySchema {
        &self.schema
    }

    /// The major game version derived from the patch.
    pub fn game_version(&self) -> u32 {
        self.major
    }

    /// The underlying bundle manager.
    pub fn manager(&self) -> &BundleManager {
        &self.manager
    }

    /// Whether any language variant of `path` exists in the bundle tree.
    pub fn file_exists(&self, path: &str) -> bool {
        self.manager.file_exists(path)
    }

    /// Read the raw contents of a file from the bundle tree.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(self.manager.read_file(path)?)
    }

    /// Decode one table in the given language, falling back to the English
    /// base file when no localized variant exists.
    pub fn read_table(&self, table: &str, language: &str) -> Result<ParsedTable> {
        self.read_table_with_cancel(table, language, &CancelFlag::new())
    }

    /// Decode one table, checking `cancel` once per row.
    pub fn read_table_with_cancel(
        &self,
        table: &str,
        language: &str,
        cancel: &CancelFlag,
    ) -> Result<ParsedTable> {
        let schema = self.schema.table_for_version(table, self.major)?;
        let lower = table.to_lowercase();

        let base_path = format!("data/{lower}{DAT_EXT}");
        let path = if language == DEFAULT_LANGUAGE {
            base_path
        } else {
            let lang_path = format!("data/{}/{lower}{DAT_EXT}", language.to_lowercase());
            if self.manager.index().lookup(&lang_path).is_some() {
                lang_path
            } else {
                debug!(table, language, "no localized variant, using base file");
                base_path
            }
        };

        let data = self.manager.read_file(&path)?;
        let parsed = self
            .parser
            .parse_with_cancel(&data, &path, schema, cancel)?;
        debug!(table, path = %path, rows = parsed.rows.len(), "decoded DAT table");
        Ok(parsed)
    }
}
