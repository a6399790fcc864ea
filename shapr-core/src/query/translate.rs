//! Translation from the `Where` AST to the store's predicate tree.
//!
//! Field paths are validated against the collection definition before any
//! predicate is produced: every segment must name a declared field, and
//! every non-terminal segment must be a relationship. When the relationship
//! target is itself a known collection, validation continues against the
//! target's fields.

use chrono::{DateTime, Utc};

use super::predicate::{escape_like, CmpOp, Predicate};
use super::{Where, WhereField};
use crate::error::{Result, ShaprError};
use crate::schema::{CollectionDefinition, FieldDefinition, ShaprConfig};

pub struct WhereTranslator<'a> {
    collection: &'a CollectionDefinition,
    config: &'a ShaprConfig,
}

impl<'a> WhereTranslator<'a> {
    pub fn new(collection: &'a CollectionDefinition, config: &'a ShaprConfig) -> Self {
        Self { collection, config }
    }

    /// Translate a clause into a predicate tree. An absent or empty clause
    /// yields no predicate (match all).
    pub fn translate(&self, clause: Option<&Where>) -> Result<Option<Predicate>> {
        match clause {
            Some(clause) if clause.has_conditions() => self.build(clause),
            _ => Ok(None),
        }
    }

    fn build(&self, clause: &Where) -> Result<Option<Predicate>> {
        let mut predicates = Vec::new();

        if let Some(and) = &clause.and {
            let children: Vec<Predicate> = and
                .iter()
                .map(|child| self.build(child))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect();
            if !children.is_empty() {
                predicates.push(Predicate::And(children));
            }
        }

        if let Some(or) = &clause.or {
            let children: Vec<Predicate> = or
                .iter()
                .map(|child| self.build(child))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect();
            if !children.is_empty() {
                predicates.push(Predicate::Or(children));
            }
        }

        for (path, condition) in &clause.fields {
            if !condition.has_operators() {
                continue;
            }
            let (segments, terminal) = self.resolve_path(path)?;
            predicates.extend(apply_operators(condition, &segments, terminal, path));
        }

        Ok(match predicates.len() {
            0 => None,
            1 => Some(predicates.into_iter().next().unwrap()),
            _ => Some(Predicate::And(predicates)),
        })
    }

    /// Validate a (possibly dotted) field path. Returns the split segments
    /// and the terminal field definition when it could be resolved; a
    /// relationship into a collection this configuration does not know stops
    /// validation at that boundary.
    fn resolve_path(&self, path: &str) -> Result<(Vec<String>, Option<&'a FieldDefinition>)> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ShaprError::invalid_query(format!("empty segment in path '{}'", path)));
        }

        let mut current = Some(self.collection);
        let mut terminal = None;

        for (index, segment) in segments.iter().enumerate() {
            let Some(collection) = current else {
                // Unknown target collection: accept the remainder unchecked.
                terminal = None;
                break;
            };

            let field = collection.field(segment).ok_or_else(|| {
                ShaprError::invalid_query(format!(
                    "field '{}' not found in collection '{}' (path: '{}')",
                    segment, collection.name, path
                ))
            })?;

            let is_last = index == segments.len() - 1;
            if is_last {
                terminal = Some(field);
            } else {
                let Some(target) = field.field_type.relation_target() else {
                    return Err(ShaprError::invalid_query(format!(
                        "field '{}' in path '{}' is not a relationship field and cannot be \
                         traversed",
                        segment, path
                    )));
                };
                current = self.config.collection_by_slug(target);
            }
        }

        Ok((segments, terminal))
    }
}

/// Lower one field's operator set onto a resolved path. All produced
/// predicates combine by AND with their siblings.
fn apply_operators(
    condition: &WhereField,
    segments: &[String],
    terminal: Option<&FieldDefinition>,
    display_path: &str,
) -> Vec<Predicate> {
    let path = || segments.to_vec();
    let numeric = terminal.map(|field| field.field_type.is_numeric()).unwrap_or(false);
    let mut predicates = Vec::new();

    if let Some(value) = &condition.equals {
        predicates.push(Predicate::Eq { path: path(), value: value.clone() });
    }

    if let Some(value) = &condition.not_equals {
        predicates.push(Predicate::Not(Box::new(Predicate::Eq {
            path: path(),
            value: value.clone(),
        })));
    }

    if let Some(literal) = &condition.contains {
        predicates.push(like_predicate(path(), literal));
    }

    if let Some(literal) = &condition.like {
        predicates.push(like_predicate(path(), literal));
    }

    if let Some(literal) = &condition.not_like {
        predicates.push(Predicate::Not(Box::new(like_predicate(path(), literal))));
    }

    let mut comparison = |op: CmpOp, operand: f64| {
        // Numeric fields compare as numbers; anything else reinterprets the
        // operand as an epoch-millisecond timestamp. Deliberate type-directed
        // dispatch inherited from the original query engine.
        if numeric {
            predicates.push(Predicate::NumberCmp { path: path(), op, operand });
        } else if let Some(instant) = DateTime::<Utc>::from_timestamp_millis(operand as i64) {
            predicates.push(Predicate::InstantCmp { path: path(), op, operand: instant });
        }
    };
    if let Some(operand) = condition.greater_than {
        comparison(CmpOp::Gt, operand);
    }
    if let Some(operand) = condition.greater_than_equal {
        comparison(CmpOp::Ge, operand);
    }
    if let Some(operand) = condition.less_than {
        comparison(CmpOp::Lt, operand);
    }
    if let Some(operand) = condition.less_than_equal {
        comparison(CmpOp::Le, operand);
    }

    if let Some(values) = &condition.is_in {
        // Empty list contributes no predicate
        if !values.is_empty() {
            predicates.push(Predicate::In { path: path(), values: values.clone() });
        }
    }

    if let Some(values) = &condition.not_in {
        if !values.is_empty() {
            predicates.push(Predicate::Not(Box::new(Predicate::In {
                path: path(),
                values: values.clone(),
            })));
        }
    }

    if let Some(values) = &condition.all {
        // Simplified: a conjunction of per-value equality predicates, not a
        // true array-containment check on multi-valued fields.
        if !values.is_empty() {
            let all_equal: Vec<Predicate> = values
                .iter()
                .map(|value| Predicate::Eq { path: path(), value: value.clone() })
                .collect();
            predicates.push(Predicate::And(all_equal));
        }
    }

    if let Some(exists) = condition.exists {
        predicates.push(if exists {
            Predicate::NotNull { path: path() }
        } else {
            Predicate::IsNull { path: path() }
        });
    }

    // Geo operators are accepted but inert; surface the omission instead of
    // silently pretending the filter applied.
    for (name, value) in [
        ("near", &condition.near),
        ("within", &condition.within),
        ("intersects", &condition.intersects),
    ] {
        if value.is_some() {
            log::warn!(
                "geo operator '{}' on '{}' is not implemented and produces no predicate",
                name,
                display_path
            );
        }
    }

    predicates
}

fn like_predicate(path: Vec<String>, literal: &str) -> Predicate {
    Predicate::Like { path, pattern: format!("%{}%", escape_like(literal)) }
}
