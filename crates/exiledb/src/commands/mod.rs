pub mod extract;
pub mod query;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Decode DAT tables from the cached bundle tree
    Extract(extract::ExtractArgs),
    /// Inspect the bundle index and schema
    Query(query::QueryArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Extract(extract) => extract.handle(),
            Commands::Query(query) => query.handle(),
        }
    }
}
