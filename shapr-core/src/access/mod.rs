//! Access control rules and their evaluation.
//!
//! Every CRUD verb on a collection is gated by one [`AccessRule`]. The check
//! is synchronous and side-effect-free; it runs as the very first step of
//! every reading or mutating operation, before any data is touched.

use crate::error::{Result, ShaprError};

/// Access rule for a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// No authentication required
    Public,
    /// Any authenticated principal
    Authenticated,
    /// One of the listed roles is required. The literal `"*"` entry grants
    /// unconditional access.
    Roles(Vec<String>),
    /// Nobody passes
    Deny,
}

impl AccessRule {
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessRule::Roles(roles.into_iter().map(Into::into).collect())
    }
}

/// Per-verb access rules for a collection. Every slot defaults to
/// `Roles(["admin"])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    pub create: AccessRule,
    pub read: AccessRule,
    pub update: AccessRule,
    pub delete: AccessRule,
}

impl Default for AccessControl {
    fn default() -> Self {
        let admin_only = || AccessRule::Roles(vec!["admin".to_string()]);
        Self { create: admin_only(), read: admin_only(), update: admin_only(), delete: admin_only() }
    }
}

/// The caller's identity as resolved by the surrounding security context.
/// This layer only consumes the result of authentication, never performs it.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    /// Principal identifier, if any
    pub user: Option<String>,
    /// Roles granted to the caller, raw as the provider reported them
    pub roles: Vec<String>,
    /// Whether the caller is a real, non-anonymous authenticated principal
    pub authenticated: bool,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: impl Into<String>, roles: Vec<String>) -> Self {
        Self { user: Some(user.into()), roles, authenticated: true }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Evaluate an access rule against the caller. Returns `AccessDenied` on
/// failure, unit on success.
pub fn check_access(rule: &AccessRule, caller: &Caller) -> Result<()> {
    match rule {
        AccessRule::Public => Ok(()),
        AccessRule::Authenticated => require_authenticated(caller),
        AccessRule::Roles(roles) => require_role(roles, caller),
        AccessRule::Deny => Err(ShaprError::access_denied("access denied")),
    }
}

fn require_authenticated(caller: &Caller) -> Result<()> {
    if caller.authenticated {
        Ok(())
    } else {
        Err(ShaprError::access_denied("authentication required"))
    }
}

/// Role check with the wildcard short-circuit and tri-form matching: a caller
/// role matches an allowed role raw, with a `ROLE_` prefix added, or with the
/// prefix stripped. Matching is case-sensitive; the three forms only bridge
/// differing prefix conventions between caller and rule.
fn require_role(allowed: &[String], caller: &Caller) -> Result<()> {
    if allowed.iter().any(|role| role == "*") {
        return Ok(());
    }

    require_authenticated(caller)?;

    let satisfied = caller.roles.iter().any(|held| {
        allowed.iter().any(|rule_role| {
            held == rule_role
                || format!("ROLE_{}", held) == *rule_role
                || held.strip_prefix("ROLE_").is_some_and(|stripped| stripped == rule_role)
        })
    });

    if satisfied {
        Ok(())
    } else {
        Err(ShaprError::access_denied(format!("missing required role: {:?}", allowed)))
    }
}
