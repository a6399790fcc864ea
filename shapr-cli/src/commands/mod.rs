pub mod generate;
pub mod schema;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use shapr_core::dsl::parser;
use shapr_core::schema::ShaprConfig;

/// Parse one `.shapr` file or every `.shapr` file in a directory, merging the
/// results with cross-file slug validation.
pub fn load_config(input: &Path) -> Result<ShaprConfig> {
    let mut sources = Vec::new();

    if input.is_file() {
        sources.push(input.to_path_buf());
    } else if input.is_dir() {
        let mut entries: Vec<_> = fs::read_dir(input)
            .with_context(|| format!("failed to read {}", input.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "shapr"))
            .collect();
        entries.sort();
        sources.extend(entries);
    } else {
        bail!("input path {} does not exist", input.display());
    }

    if sources.is_empty() {
        bail!("no .shapr sources found under {}", input.display());
    }

    let mut parts = Vec::new();
    for source in &sources {
        let text = fs::read_to_string(source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let config = parser::parse(&text);
        if config.collections.is_empty() {
            bail!("no collection produced from {}", source.display());
        }
        parts.push(config);
    }

    ShaprConfig::merge(parts).map_err(Into::into)
}
