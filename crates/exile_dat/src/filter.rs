//! Filters over index path lists for DAT files.

const DAT_EXT: &str = ".datc64";

/// Whether a path names a `.datc64` file, case-insensitively.
pub fn is_dat_file(path: &str) -> bool {
    path.to_lowercase().ends_with(DAT_EXT)
}

/// Extract the table name from a DAT file path: the base file name without
/// its extension.
pub fn table_name_from_path(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.to_lowercase().strip_suffix(DAT_EXT) {
        Some(_) => &base[..base.len() - DAT_EXT.len()],
        None => base,
    }
}

/// Whether a DAT file path belongs to one of the given languages. Files
/// directly under `data/` are English; files under `data/<language>/` belong
/// to that language.
pub fn matches_language(path: &str, languages: &[String]) -> bool {
    if languages.is_empty() {
        return false;
    }

    let lower = path.to_lowercase();
    let Some(rest) = lower.strip_prefix("data/") else {
        return false;
    };

    if !rest.contains('/') {
        return languages.iter().any(|l| l.eq_ignore_ascii_case("English"));
    }

    languages
        .iter()
        .any(|language| rest.starts_with(&format!("{}/", language.to_lowercase())))
}

/// Whether a DAT file path names one of the given tables, case-insensitively.
pub fn matches_table(path: &str, tables: &[String]) -> bool {
    let name = table_name_from_path(path).to_lowercase();
    tables.iter().any(|table| table.to_lowercase() == name)
}

/// Narrow a path list down to the DAT files matching a language and table
/// selection. An empty table list keeps every table.
pub fn filter_dat_paths(paths: &[String], languages: &[String], tables: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter(|path| is_dat_file(path))
        .filter(|path| matches_language(path, languages))
        .filter(|path| tables.is_empty() || matches_table(path, tables))
        .cloned()
        .collect()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{filter_dat_paths, is_dat_file, matches_language, table_name_from_path};

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dat_extension() {
        assert!(is_dat_file("data/baseitemtypes.datc64"));
        assert!(is_dat_file("data/BaseItemTypes.DATC64"));
        assert!(!is_dat_file("data/baseitemtypes.txt"));
    }

    #[test]
    fn table_names() {
        assert_eq!(
            table_name_from_path("data/baseitemtypes.datc64"),
            "baseitemtypes"
        );
        assert_eq!(
            table_name_from_path("Data/Simplified Chinese/BaseItemTypes.datc64"),
            "BaseItemTypes"
        );
        assert_eq!(table_name_from_path("mods.datc64"), "mods");
    }

    #[test]
    fn language_matching() {
        let english = strings(&["English"]);
        let french = strings(&["French"]);

        assert!(matches_language("data/mods.datc64", &english));
        assert!(!matches_language("data/mods.datc64", &french));
        assert!(matches_language("data/french/mods.datc64", &french));
        assert!(!matches_language("data/french/mods.datc64", &english));
        assert!(!matches_language("data/mods.datc64", &[]));
    }

    #[test]
    fn path_filtering() {
        let paths = strings(&[
            "data/mods.datc64",
            "data/baseitemtypes.datc64",
            "data/french/mods.datc64",
            "art/logo.dds",
        ]);

        let filtered = filter_dat_paths(&paths, &strings(&["English"]), &strings(&["Mods"]));
        assert_eq!(filtered, strings(&["data/mods.datc64"]));

        let all_tables = filter_dat_paths(&paths, &strings(&["English"]), &[]);
        assert_eq!(
            all_tables,
            strings(&["data/mods.datc64", "data/baseitemtypes.datc64"])
        );
    }
}
