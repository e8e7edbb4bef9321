//! Serializer trait and extension-keyed registry.

use crate::error::{TableError, TableResult};
use crate::json::JsonFormat;
use crate::table::TabularData;
use crate::xlsx::XlsxFormat;
use crate::xml::XmlFormat;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A file format that can hold a [`TabularData`].
///
/// Implementations are stateless: every call produces a new buffer or a
/// new table.
pub trait TableFormat: Send + Sync {
    /// File extension handled by this format, lower-case and without a dot.
    fn extension(&self) -> &'static str;

    /// Serialize a table to bytes.
    fn serialize(&self, table: &TabularData) -> TableResult<Vec<u8>>;

    /// Deserialize a table from bytes.
    fn deserialize(&self, bytes: &[u8]) -> TableResult<TabularData>;
}

/// Registered formats, looked up by file extension.
pub struct FormatRegistry {
    formats: Vec<Box<dyn TableFormat>>,
}

impl FormatRegistry {
    /// Creates a registry with no formats.
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Creates a registry with the JSON, XLSX and XML formats.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(JsonFormat);
        registry.register(XlsxFormat);
        registry.register(XmlFormat);
        registry
    }

    /// Adds a format. A later format never shadows an earlier one with the
    /// same extension.
    pub fn register(&mut self, format: impl TableFormat + 'static) {
        self.formats.push(Box::new(format));
    }

    /// Extensions of all registered formats.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.extension()).collect()
    }

    /// Looks up a format by extension. A leading dot is ignored and the
    /// match is case-insensitive.
    pub fn get(&self, extension: &str) -> TableResult<&dyn TableFormat> {
        let wanted = extension.strip_prefix('.').unwrap_or(extension);
        self.formats
            .iter()
            .find(|f| !wanted.is_empty() && f.extension().eq_ignore_ascii_case(wanted))
            .map(|f| f.as_ref())
            .ok_or_else(|| TableError::format_not_supported(wanted))
    }

    /// Looks up the format for a file path.
    pub fn for_path(&self, path: &Path) -> TableResult<&dyn TableFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.get(extension)
    }

    /// Serializes `table` with the format matching `path` and writes it.
    pub fn save(&self, table: &TabularData, path: &Path) -> TableResult<()> {
        let format = self.for_path(path)?;
        debug!(
            path = %path.display(),
            format = format.extension(),
            rows = table.len(),
            "saving table"
        );
        let bytes = format.serialize(table)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Reads `path` and deserializes it with the matching format.
    pub fn load(&self, path: &Path) -> TableResult<TabularData> {
        let format = self.for_path(path)?;
        debug!(path = %path.display(), format = format.extension(), "loading table");
        let bytes = fs::read(path)?;
        format.deserialize(&bytes)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

/// Saves a table using the default formats.
///
/// # Errors
///
/// Fails with [`TableError::FormatNotSupported`] for unknown extensions, or
/// with the serializer's or file system's error.
pub fn save(table: &TabularData, path: impl AsRef<Path>) -> TableResult<()> {
    FormatRegistry::new().save(table, path.as_ref())
}

/// Loads a table using the default formats.
///
/// # Errors
///
/// Fails with [`TableError::FormatNotSupported`] for unknown extensions, or
/// with the deserializer's or file system's error.
pub fn load(path: impl AsRef<Path>) -> TableResult<TabularData> {
    FormatRegistry::new().load(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmlink_codec::Map;

    #[test]
    fn lookup_by_extension() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.get("json").unwrap().extension(), "json");
        assert_eq!(registry.get(".XML").unwrap().extension(), "xml");
        assert_eq!(registry.get("Xlsx").unwrap().extension(), "xlsx");
        assert_eq!(registry.extensions(), vec!["json", "xlsx", "xml"]);
    }

    #[test]
    fn unsupported_extension() {
        let registry = FormatRegistry::new();
        let err = registry.get(".csv").err().unwrap();
        assert!(matches!(err, TableError::FormatNotSupported { ref extension } if extension == "csv"));
        assert!(registry.get("").is_err());
    }

    #[test]
    fn unsupported_on_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let table = TabularData::from_rows(None, vec![Map::new().with("a", 1)]);

        assert!(matches!(
            save(&table, &path),
            Err(TableError::FormatNotSupported { .. })
        ));
        assert!(matches!(
            load(&path),
            Err(TableError::FormatNotSupported { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn missing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("table")).unwrap_err();
        assert!(matches!(err, TableError::FormatNotSupported { .. }));
    }
}
