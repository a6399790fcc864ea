use std::path::Path;

use anyhow::Result;
use shapr_core::schema::{ClientCollectionSchema, SchemaResponse};

use super::load_config;

/// Print the client-facing schema JSON for the parsed collections.
pub fn run(input: &Path) -> Result<()> {
    let config = load_config(input)?;
    let response = SchemaResponse {
        collections: config
            .collections
            .iter()
            .map(ClientCollectionSchema::from_definition)
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn schema_projection_from_parsed_source() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("cms.shapr");
        fs::write(
            &source,
            r#"
            collection("Category") {
                access {
                    read = public()
                }
                fields {
                    text("name") { required = true unique = true }
                }
            }
            "#,
        )
        .unwrap();

        let config = load_config(&source).unwrap();
        let schema = ClientCollectionSchema::from_definition(&config.collections[0]);
        assert_eq!(schema.slug, "categories");
        assert_eq!(schema.access.read, "public");
        assert!(schema.fields[0].unique);
    }
}
