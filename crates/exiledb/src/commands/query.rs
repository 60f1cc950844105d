use std::path::PathBuf;

use clap::Args;
use miette::Result;
use tracing::info;

use exile_bundle::{cache::CacheLayout, discovery::required_bundles, BundleManager};
use exile_dat::filter;

#[derive(Args)]
pub struct QueryArgs {
    /// Patch version, e.g. 3.25.1.1
    #[arg(short, long)]
    patch: String,

    /// Cache root directory (defaults to ~/.exiledb/cache)
    #[arg(long, value_name = "DIR")]
    cache: Option<PathBuf>,

    /// List all bundle names in the index
    #[arg(long)]
    bundles: bool,

    /// List the DAT tables present in the index
    #[arg(long)]
    tables: bool,

    /// List files under a path prefix
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,

    /// Show the bundle location of one file
    #[arg(long, value_name = "PATH")]
    file: Option<String>,

    /// Show the bundles a table selection would require
    #[arg(long)]
    required: bool,

    /// Tables for --required
    #[arg(short, long = "table", value_name = "NAME")]
    table_filter: Vec<String>,

    /// Languages for --tables and --required
    #[arg(short, long = "language", default_values_t = [String::from("English")])]
    languages: Vec<String>,
}

impl QueryArgs {
    pub fn handle(&self) -> Result<()> {
        let layout = self
            .cache
            .clone()
            .map(CacheLayout::new)
            .unwrap_or_default();
        let manager = BundleManager::open(layout.root(), &self.patch)?;
        let index = manager.index();
        info!(
            bundles = index.bundles().len(),
            files = index.files().len(),
            "index loaded"
        );

        if self.bundles {
            for name in index.bundles() {
                println!("{name}");
            }
        }

        if self.tables {
            let paths: Vec<String> =
                index.files().iter().map(|f| f.path.clone()).collect();
            for path in filter::filter_dat_paths(&paths, &self.languages, &self.table_filter) {
                println!("{}\t{path}", filter::table_name_from_path(&path));
            }
        }

        if let Some(prefix) = &self.prefix {
            for file in index.files() {
                if file.path.starts_with(prefix.as_str()) {
                    println!("{}\t{} bytes", file.path, file.size);
                }
            }
        }

        if let Some(path) = &self.file {
            match index.location(path) {
                Some(location) => println!(
                    "{path}: bundle={} offset={} size={}",
                    location.bundle, location.offset, location.size
                ),
                None => println!("{path}: not found"),
            }
        }

        if self.required {
            for bundle in required_bundles(index, &self.table_filter, &self.languages, &[]) {
                println!("{bundle}");
            }
        }

        Ok(())
    }
}
