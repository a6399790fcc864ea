//! Text front-end for the collection DSL.
//!
//! Extracts [`ShaprConfig`] from raw source containing
//! `collection("Name") { ... }` blocks. Block bodies are isolated with
//! depth-counting over matched `{`/`}` pairs, so nested blocks of arbitrary
//! depth parse correctly; sub-patterns for slugs, access rules, fields and
//! option values are then applied only within the already-isolated text. A
//! truncated or unbalanced block produces no collection rather than a
//! partial one.

use lazy_static::lazy_static;
use regex::Regex;

use crate::access::{AccessControl, AccessRule};
use crate::schema::{
    pluralize, CollectionDefinition, FieldDefinition, FieldType, Labels, ShaprConfig,
};

lazy_static! {
    static ref COLLECTION_START: Regex =
        Regex::new(r#"collection\s*\(\s*"([^"]+)"\s*\)\s*\{"#).unwrap();
    static ref SLUG: Regex = Regex::new(r#"slug\s*=\s*"([^"]+)""#).unwrap();
    static ref TIMESTAMPS: Regex = Regex::new(r"timestamps\s*=\s*(true|false)").unwrap();
    static ref ACCESS_START: Regex = Regex::new(r"access\s*\{").unwrap();
    static ref ACCESS_RULE: Regex =
        Regex::new(r"(create|read|update|delete)\s*=\s*(\w+)\s*\(([^)]*)\)").unwrap();
    static ref QUOTED: Regex = Regex::new(r#""([^"]+)""#).unwrap();
    static ref FIELDS_START: Regex = Regex::new(r"fields\s*\{").unwrap();
    static ref FIELD_START: Regex = Regex::new(
        r#"(text|textarea|number|checkbox|email|date|relationship)\s*\(\s*"([^"]+)"\s*\)(\s*\{)?"#
    )
    .unwrap();
    static ref MAX_LENGTH: Regex = Regex::new(r"maxLength\s*=\s*(\d+)").unwrap();
    static ref RELATION_TO: Regex = Regex::new(r#"relationTo\s*=\s*"([^"]+)""#).unwrap();
    static ref DEFAULT_BOOL: Regex = Regex::new(r"defaultValue\s*=\s*(true|false)").unwrap();
}

/// Parse all collection blocks found in the source.
pub fn parse(source: &str) -> ShaprConfig {
    let mut collections = Vec::new();

    for start in COLLECTION_START.captures_iter(source) {
        let name = &start[1];
        let body_start = start.get(0).unwrap().end();
        if let Some(body) = extract_balanced_block(source, body_start) {
            collections.push(parse_collection(name, body));
        } else {
            log::warn!("unbalanced collection block for '{}'; no collection produced", name);
        }
    }

    ShaprConfig::new(collections)
}

/// Returns the substring between the brace opened just before `start` and its
/// matching close brace, or `None` when the input ends before depth returns
/// to zero.
fn extract_balanced_block(source: &str, start: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    let mut depth = 1usize;
    let mut pos = start;

    while pos < bytes.len() && depth > 0 {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        pos += 1;
    }

    if depth == 0 {
        Some(&source[start..pos - 1])
    } else {
        None
    }
}

fn parse_collection(name: &str, body: &str) -> CollectionDefinition {
    let slug = SLUG
        .captures(body)
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| pluralize(name).to_lowercase());

    let timestamps = TIMESTAMPS
        .captures(body)
        .map(|captures| &captures[1] == "true")
        .unwrap_or(true);

    let mut definition = CollectionDefinition::new(name);
    definition.slug = slug;
    definition.labels = Labels { singular: name.to_string(), plural: pluralize(name) };
    definition.timestamps = timestamps;
    definition.access = parse_access(body);
    definition.fields = parse_fields(body);
    definition
}

fn parse_access(body: &str) -> AccessControl {
    let Some(start) = ACCESS_START.find(body) else {
        return AccessControl::default();
    };
    let Some(access_body) = extract_balanced_block(body, start.end()) else {
        return AccessControl::default();
    };

    let mut access = AccessControl::default();
    for captures in ACCESS_RULE.captures_iter(access_body) {
        let rule = parse_access_rule(&captures[2], &captures[3]);
        match &captures[1] {
            "create" => access.create = rule,
            "read" => access.read = rule,
            "update" => access.update = rule,
            "delete" => access.delete = rule,
            _ => unreachable!(),
        }
    }
    access
}

fn parse_access_rule(kind: &str, args: &str) -> AccessRule {
    match kind {
        "public" => AccessRule::Public,
        "authenticated" => AccessRule::Authenticated,
        "deny" => AccessRule::Deny,
        "roles" => {
            let roles: Vec<String> =
                QUOTED.captures_iter(args).map(|captures| captures[1].to_string()).collect();
            if roles.is_empty() {
                AccessRule::Roles(vec!["admin".to_string()])
            } else {
                AccessRule::Roles(roles)
            }
        }
        _ => AccessRule::Roles(vec!["admin".to_string()]),
    }
}

fn parse_fields(body: &str) -> Vec<FieldDefinition> {
    let Some(start) = FIELDS_START.find(body) else {
        return Vec::new();
    };
    let Some(fields_body) = extract_balanced_block(body, start.end()) else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for captures in FIELD_START.captures_iter(fields_body) {
        let kind = &captures[1];
        let name = &captures[2];
        let has_block = captures.get(3).is_some();

        let config = if has_block {
            extract_balanced_block(fields_body, captures.get(0).unwrap().end()).unwrap_or("")
        } else {
            ""
        };

        fields.push(parse_field(kind, name, config));
    }
    fields
}

fn flag(config: &str, name: &str) -> bool {
    config.contains(&format!("{} = true", name)) || config.contains(&format!("{}=true", name))
}

fn parse_field(kind: &str, name: &str, config: &str) -> FieldDefinition {
    let required = flag(config, "required");
    let unique = flag(config, "unique");
    let max_length = MAX_LENGTH
        .captures(config)
        .and_then(|captures| captures[1].parse::<u32>().ok())
        .unwrap_or(255);
    let has_many = flag(config, "hasMany");
    let relation_to = RELATION_TO
        .captures(config)
        .map(|captures| captures[1].to_string())
        .unwrap_or_default();
    let integer_only = flag(config, "integerOnly");
    let default_now = flag(config, "defaultNow");
    let default_bool = DEFAULT_BOOL
        .captures(config)
        .map(|captures| &captures[1] == "true")
        .unwrap_or(false);

    let field_type = match kind {
        "text" => FieldType::Text {
            max_length,
            min_length: 0,
            required,
            unique,
            default_value: None,
        },
        "textarea" => FieldType::Textarea { required, default_value: None },
        "number" => FieldType::Number {
            integer_only,
            min: None,
            max: None,
            required,
            default_value: None,
        },
        "checkbox" => FieldType::Checkbox { default_value: default_bool },
        "email" => FieldType::Email { required, unique },
        "date" => FieldType::Date { required, default_now, date_only: false },
        "relationship" => FieldType::Relationship { relation_to, has_many, required },
        _ => FieldType::Text {
            max_length: 255,
            min_length: 0,
            required: false,
            unique: false,
            default_value: None,
        },
    };

    FieldDefinition::new(name, field_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{self, CollectionBuilder};
    use crate::schema::ShaprConfig as Config;

    const BLOG_SOURCE: &str = r#"
        collection("Post") {
            slug = "posts"

            access {
                create = public()
                read = public()
                update = roles("admin", "editor")
                delete = deny()
            }

            fields {
                text("title") {
                    required = true
                    maxLength = 200
                }
                textarea("content")
                date("publishedAt") {
                    defaultNow = true
                }
                number("views") {
                    integerOnly = true
                }
                relationship("category") {
                    relationTo = "categories"
                }
            }
        }

        collection("Category") {
            fields {
                text("name") {
                    required = true
                    unique = true
                }
            }
        }
    "#;

    #[test]
    fn parses_collections_with_fields_and_access() {
        let config = parse(BLOG_SOURCE);
        assert_eq!(config.collections.len(), 2);

        let post = &config.collections[0];
        assert_eq!(post.name, "Post");
        assert_eq!(post.slug, "posts");
        assert_eq!(post.access.create, AccessRule::Public);
        assert_eq!(
            post.access.update,
            AccessRule::Roles(vec!["admin".to_string(), "editor".to_string()])
        );
        assert_eq!(post.access.delete, AccessRule::Deny);
        assert_eq!(post.fields.len(), 5);

        let title = post.field("title").unwrap();
        assert!(matches!(
            title.field_type,
            FieldType::Text { max_length: 200, required: true, .. }
        ));
        let views = post.field("views").unwrap();
        assert!(matches!(views.field_type, FieldType::Number { integer_only: true, .. }));
        let category = post.field("category").unwrap();
        assert_eq!(category.field_type.relation_target(), Some("categories"));

        let category_collection = &config.collections[1];
        assert_eq!(category_collection.slug, "categories");
        // No access block: every slot stays admin-only
        assert_eq!(
            category_collection.access.read,
            AccessRule::Roles(vec!["admin".to_string()])
        );
    }

    #[test]
    fn nested_braces_inside_field_blocks_do_not_truncate() {
        // The config block contains literal braces; depth counting must not
        // stop at the first inner close brace.
        let source = r#"
            collection("Widget") {
                fields {
                    text("payload") {
                        required = true
                        maxLength = 90
                    }
                    text("template") {
                        description = "renders {} placeholders like {value}"
                        maxLength = 64
                    }
                    checkbox("active") {
                        defaultValue = true
                    }
                }
            }
        "#;

        let config = parse(source);
        assert_eq!(config.collections.len(), 1);
        let widget = &config.collections[0];
        assert_eq!(widget.fields.len(), 3);
        let template = widget.field("template").unwrap();
        assert!(matches!(template.field_type, FieldType::Text { max_length: 64, .. }));
        let active = widget.field("active").unwrap();
        assert!(matches!(active.field_type, FieldType::Checkbox { default_value: true }));
    }

    #[test]
    fn unbalanced_block_produces_no_collection() {
        let source = r#"collection("Broken") { fields { text("a") "#;
        let config = parse(source);
        assert!(config.collections.is_empty());
    }

    #[test]
    fn derived_slug_when_none_given() {
        let config = parse(r#"collection("Category") { }"#);
        assert_eq!(config.collections[0].slug, "categories");
    }

    #[test]
    fn timestamps_flag_is_parsed() {
        let config = parse(r#"collection("Log") { timestamps = false }"#);
        assert!(!config.collections[0].timestamps);
    }

    #[test]
    fn parser_matches_builder_output() {
        // Both front-ends must produce the identical schema model for
        // equivalent input.
        let parsed = parse(BLOG_SOURCE);

        let built = Config::builder()
            .collection(
                CollectionBuilder::new("Post")
                    .slug("posts")
                    .access(AccessControl {
                        create: AccessRule::Public,
                        read: AccessRule::Public,
                        update: AccessRule::roles(["admin", "editor"]),
                        delete: AccessRule::Deny,
                    })
                    .field(dsl::text("title").required(true).max_length(200))
                    .field(dsl::textarea("content"))
                    .field(dsl::date("publishedAt").default_now(true))
                    .field(dsl::number("views").integer_only(true))
                    .field(dsl::relationship("category").relation_to("categories")),
            )
            .collection(
                CollectionBuilder::new("Category")
                    .field(dsl::text("name").required(true).unique(true)),
            )
            .build()
            .unwrap();

        assert_eq!(parsed.collections.len(), built.collections.len());
        for (parsed_collection, built_collection) in
            parsed.collections.iter().zip(built.collections.iter())
        {
            assert_eq!(parsed_collection.name, built_collection.name);
            assert_eq!(parsed_collection.slug, built_collection.slug);
            assert_eq!(parsed_collection.access, built_collection.access);
            assert_eq!(parsed_collection.fields, built_collection.fields);
            assert_eq!(parsed_collection.timestamps, built_collection.timestamps);
        }
    }
}
