//! The language-description model and its derived queries.
//!
//! One immutable record describes everything the analyzer knows about
//! built-in VCL: the lifecycle methods with their contexts and permitted
//! return actions, the variables with their per-method access rules and
//! supported version ranges, plus the canonical type and token
//! vocabularies. The record deserializes from a JSON document; a bundled
//! payload ships with the crate.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The method context a built-in subroutine runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodContext {
    /// Client-side request handling (`vcl_recv` through `vcl_synth`)
    Client,
    /// Backend-side fetch handling (`vcl_backend_*`)
    Backend,
    /// Load/discard lifecycle (`vcl_init`, `vcl_fini`)
    Housekeeping,
}

/// One built-in subroutine: its context and the return actions it admits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub context: MethodContext,
    #[serde(default)]
    pub allowed_returns: Vec<String>,
}

/// Access rules and version range for one variable or variable pattern.
///
/// Patterns ending in `.` match any suffix (`req.http.` covers every
/// request header); the pattern `storage.<name>.*` covers the dynamic
/// per-storage namespace. Permission lists may name methods directly
/// (either spelling: `recv` or `vcl_recv`), context tags, `both`
/// (client + backend), or `all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Canonical VCL type name, e.g. `STRING`, `DURATION`
    #[serde(rename = "type")]
    pub vtype: String,
    #[serde(default)]
    pub readable_from: Vec<String>,
    #[serde(default)]
    pub writable_from: Vec<String>,
    #[serde(default)]
    pub unsetable_from: Vec<String>,
    /// Lowest VCL version the variable exists in, as `major*10 + minor`
    #[serde(default = "default_version_low")]
    pub version_low: u32,
    /// Highest VCL version the variable exists in
    #[serde(default = "default_version_high")]
    pub version_high: u32,
}

fn default_version_low() -> u32 {
    40
}

fn default_version_high() -> u32 {
    99
}

/// The kind of variable access being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Unset,
}

impl AccessKind {
    /// Adjective form for diagnostics ("not readable in ...").
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Read => "readable",
            AccessKind::Write => "writable",
            AccessKind::Unset => "unsetable",
        }
    }
}

/// Outcome of an access-predicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The access is permitted in the given method
    Allowed,
    /// The variable exists but the access is not permitted there
    Denied,
    /// No variable or pattern matches the name
    UnknownVariable,
}

/// The immutable language description, loaded once and shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageMetadata {
    /// Built-in subroutines keyed by full name (`vcl_recv`)
    pub methods: FxHashMap<String, MethodInfo>,
    /// Variables and variable patterns keyed by qualified name
    pub variables: FxHashMap<String, VariableInfo>,
    /// Canonical type names
    #[serde(default)]
    pub types: Vec<String>,
    /// The token vocabulary
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl LanguageMetadata {
    /// Look up a built-in method under either its full or short name.
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        if let Some(info) = self.methods.get(name) {
            return Some(info);
        }
        self.methods.get(&format!("vcl_{name}"))
    }

    /// Whether `action` is a permitted return action of `method`.
    /// Comparison is case-sensitive.
    pub fn valid_return_action(&self, method: &str, action: &str) -> bool {
        self.method(method)
            .is_some_and(|info| info.allowed_returns.iter().any(|allowed| allowed == action))
    }

    /// Resolve a variable name to its record, falling back to dynamic
    /// patterns when no exact entry matches:
    ///
    /// - a name containing `.http.` normalizes to the `<prefix>.http.`
    ///   header pattern;
    /// - `storage.<name>.<anything>` normalizes to `storage.<name>.*`.
    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        if let Some(info) = self.variables.get(name) {
            return Some(info);
        }
        if let Some(idx) = name.find(".http.") {
            let pattern = &name[..idx + ".http.".len()];
            if let Some(info) = self.variables.get(pattern) {
                return Some(info);
            }
        }
        if name.starts_with("storage.") && name.split('.').count() >= 3 {
            if let Some(info) = self.variables.get("storage.<name>.*") {
                return Some(info);
            }
        }
        None
    }

    /// The access predicate: is `kind` access to `name` permitted from
    /// `method`?
    pub fn variable_access(&self, name: &str, method: &str, kind: AccessKind) -> AccessOutcome {
        let Some(info) = self.variable(name) else {
            return AccessOutcome::UnknownVariable;
        };
        let list = match kind {
            AccessKind::Read => &info.readable_from,
            AccessKind::Write => &info.writable_from,
            AccessKind::Unset => &info.unsetable_from,
        };
        if self.list_matches(list, method) {
            AccessOutcome::Allowed
        } else {
            AccessOutcome::Denied
        }
    }

    /// Match one permission list against a method. Entries may be the
    /// method's own name (either spelling), a context tag, `both`, or
    /// `all`; `both` covers the client and backend contexts but not
    /// housekeeping.
    fn list_matches(&self, list: &[String], method: &str) -> bool {
        let short = method.strip_prefix("vcl_").unwrap_or(method);
        let context = self.method(method).map(|info| info.context);
        list.iter().any(|entry| match entry.as_str() {
            "all" => true,
            "both" => matches!(context, Some(MethodContext::Client | MethodContext::Backend)),
            "client" => context == Some(MethodContext::Client),
            "backend" => context == Some(MethodContext::Backend),
            "housekeeping" => context == Some(MethodContext::Housekeeping),
            other => other.strip_prefix("vcl_").unwrap_or(other) == short,
        })
    }
}
