use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use shapr_core::codegen::Generator;

use super::load_config;

/// Parse the DSL sources under `input` and write generated source files to
/// `out`.
pub fn run(input: &Path, out: &Path) -> Result<()> {
    let config = load_config(input)?;
    let files = Generator::new().generate_config(&config);

    for file in &files {
        let dest = out.join(&file.path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&dest, &file.content)
            .with_context(|| format!("failed to write {}", dest.display()))?;
    }

    println!(
        "Generated {} files for {} collections into {}",
        files.len(),
        config.collections.len(),
        out.display()
    );

    Ok(())
}
