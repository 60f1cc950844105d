use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use serde_json::json;
use tracing::{debug, error, info, warn};

use exile_bundle::{
    cache::CacheLayout, cdn::cdn_filename, discovery::required_bundles, resolve, BundleManager,
};
use exile_dat::{CommunitySchema, TableReader, Value};

#[derive(Args)]
pub struct ExtractArgs {
    /// Patch version, e.g. 3.25.1.1
    #[arg(short, long)]
    patch: String,

    /// Cache root directory (defaults to ~/.exiledb/cache)
    #[arg(long, value_name = "DIR")]
    cache: Option<PathBuf>,

    /// Path to the community schema JSON (defaults to the cached copy)
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Tables to decode (defaults to every table valid for the patch)
    #[arg(short, long = "table", value_name = "NAME")]
    tables: Vec<String>,

    /// Languages to decode, in preference order
    #[arg(short, long = "language", default_values_t = [String::from("English")])]
    languages: Vec<String>,

    /// Write decoded rows as JSON lines to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        resolve::validate_languages(&self.languages)?;

        let layout = self
            .cache
            .clone()
            .map(CacheLayout::new)
            .unwrap_or_default();
        let schema_path = self
            .schema
            .clone()
            .unwrap_or_else(|| layout.schema_path());

        let schema_data = std::fs::read(&schema_path)
            .into_diagnostic()
            .context(format!("reading schema {}", schema_path.display()))?;
        let schema = CommunitySchema::from_slice(&schema_data)?;

        let mut manager = BundleManager::open(layout.root(), &self.patch)?;
        manager.set_languages(&self.languages);

        let required = required_bundles(
            manager.index(),
            &self.tables,
            &self.languages,
            &[],
        );
        for bundle in &required {
            let path = layout.bundle_path(&self.patch, &cdn_filename(bundle));
            if !path.exists() && !layout.bundle_path(&self.patch, bundle).exists() {
                warn!(bundle = %bundle, "required bundle is not cached");
            }
        }
        info!(count = required.len(), "bundles required for selection");

        let reader = TableReader::new(manager, schema, &self.patch)?;
        let table_names: Vec<String> = if self.tables.is_empty() {
            reader
                .schema()
                .valid_tables(reader.game_version())
                .iter()
                .map(|t| t.name.clone())
                .collect()
        } else {
            self.tables.clone()
        };

        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .into_diagnostic()
                    .context(format!("creating {}", path.display()))?,
            )),
            None => Box::new(std::io::stdout().lock()),
        };

        let mut processed = 0usize;
        let mut rows_written = 0usize;
        let mut errors = 0usize;
        for table in &table_names {
            for language in &self.languages {
                let base_path = format!("data/{}.datc64", table.to_lowercase());
                if !reader.file_exists(&base_path) {
                    debug!(table = %table, "no DAT file for table");
                    continue;
                }

                let parsed = match reader.read_table(table, language) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        error!(table = %table, language = %language, error = %e, "failed to decode table");
                        errors += 1;
                        continue;
                    }
                };

                for row in &parsed.rows {
                    let fields: serde_json::Map<String, serde_json::Value> = row
                        .fields
                        .iter()
                        .map(|(name, value)| (name.clone(), value_to_json(value)))
                        .collect();
                    let line = json!({
                        "table": parsed.name,
                        "language": language,
                        "index": row.index,
                        "fields": fields,
                    });
                    writeln!(out, "{line}").into_diagnostic()?;
                    rows_written += 1;
                }
            }
            processed += 1;
        }
        out.flush().into_diagnostic()?;

        info!(
            tables = processed,
            rows = rows_written,
            errors,
            "extraction finished"
        );
        Ok(())
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(v) => json!(v),
        Value::I16(v) => json!(v),
        Value::U16(v) => json!(v),
        Value::I32(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::I64(v) => json!(v),
        Value::U64(v) => json!(v),
        Value::F32(v) => json!(v),
        Value::F64(v) => json!(v),
        Value::String(v) => json!(v),
        Value::Row(v) => json!(v),
        Value::LongId(v) => json!(v),
        Value::Array { values, .. } => {
            serde_json::Value::Array(values.iter().map(value_to_json).collect())
        }
    }
}
