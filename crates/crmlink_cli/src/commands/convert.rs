//! Convert command implementation.

use crmlink_table::{load, save};
use std::path::Path;
use tracing::info;

/// Runs the convert command and returns the number of rows written.
pub fn run(
    input: &Path,
    output: &Path,
    name: Option<String>,
) -> Result<usize, Box<dyn std::error::Error>> {
    info!(input = %input.display(), output = %output.display(), "converting table");

    let mut table = load(input)?;
    if name.is_some() {
        table.set_name(name);
    }
    save(&table, output)?;

    println!("Converted {} rows to {}", table.len(), output.display());
    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmlink_codec::Map;
    use crmlink_table::TabularData;

    #[test]
    fn json_to_markup() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.xml");
        let mut table = TabularData::named("account");
        table.push(Map::new().with("name", "Contoso").with("employees", 10));
        save(&table, &input).unwrap();

        assert_eq!(run(&input, &output, Some("company".into())).unwrap(), 1);
        let converted = load(&output).unwrap();
        assert_eq!(converted.name(), Some("company"));
        assert_eq!(converted.rows(), table.rows());
    }

    #[test]
    fn unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        save(&TabularData::named("a"), &input).unwrap();
        assert!(run(&input, &dir.path().join("out.csv"), None).is_err());
    }
}
