//! Registry of VMOD descriptors.
//!
//! Holds parsed [`VccModule`] records keyed by module name and answers the
//! analyzer's questions: does this module exist, does it have this
//! function or object type, and does a concrete argument list fit a
//! signature. The registry owns the type-compatibility relation; the
//! analyzer owns the named-argument-to-slot mapping and type inference.
//!
//! Descriptors load from strings, files, or whole directories (filtered
//! by the `.vcc` suffix). Loading the same module name twice replaces the
//! earlier record.

use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use vcl_vcc::{VccError, VccFunction, VccModule, VccObject, VccParam, VccType};

/// Lookup and validation failures, phrased for direct use in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("module '{name}' not found in registry")]
    UnknownModule { name: String },

    #[error("module '{module}' has no function '{name}'")]
    UnknownFunction { module: String, name: String },

    #[error("module '{module}' has no object type '{name}'")]
    UnknownObject { module: String, name: String },

    #[error("object type '{module}.{object}' has no method '{name}'")]
    UnknownMethod {
        module: String,
        object: String,
        name: String,
    },

    #[error("{callable} takes {expected_min} to {expected_max} arguments, got {got}")]
    ArityMismatch {
        callable: String,
        expected_min: usize,
        expected_max: usize,
        got: usize,
    },

    #[error("argument '{param}' of {callable}: expected {expected}, got {got}")]
    TypeMismatch {
        callable: String,
        param: String,
        expected: String,
        got: String,
    },

    #[error("missing required argument '{param}' of {callable}")]
    MissingArgument { callable: String, param: String },
}

/// A snapshot of one module's headline numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStats {
    pub name: String,
    pub version: u32,
    pub functions: usize,
    pub objects: usize,
    pub events: usize,
    pub abi: Option<String>,
}

/// Result of loading a directory: how many descriptors made it, and which
/// files were skipped with what problem.
#[derive(Debug, Default)]
pub struct DirectoryLoad {
    pub loaded: usize,
    pub failures: Vec<(String, String)>,
}

/// One-way type compatibility: may a value of `got` flow into a slot of
/// type `expected`?
///
/// - identical types match (the relation is reflexive);
/// - INT coerces to REAL and to BOOL;
/// - the generic HTTP handle matches the four specific handles;
/// - a single STRING feeds STRING_LIST and STRANDS;
/// - STRING_LIST feeds STRANDS.
pub fn compatible(got: VccType, expected: VccType) -> bool {
    if got == expected {
        return true;
    }
    matches!(
        (got, expected),
        (VccType::Int, VccType::Real)
            | (VccType::Int, VccType::Bool)
            | (
                VccType::Http,
                VccType::HttpReq | VccType::HttpResp | VccType::HttpBereq | VccType::HttpBeresp
            )
            | (VccType::String, VccType::StringList | VccType::Strands)
            | (VccType::StringList, VccType::Strands)
    )
}

/// Mapping from module name to descriptor.
#[derive(Debug, Default)]
pub struct VmodRegistry {
    modules: FxHashMap<String, Arc<VccModule>>,
}

impl VmodRegistry {
    pub fn new() -> Self {
        VmodRegistry::default()
    }

    /// Parse one descriptor source and insert it, replacing any earlier
    /// module of the same name. Per-entity problems inside the descriptor
    /// are returned, not fatal.
    pub fn load_source(&mut self, source: &str) -> Result<Vec<VccError>, VccError> {
        let parsed = vcl_vcc::parse(source)?;
        debug!(
            module = %parsed.module.name,
            functions = parsed.module.functions.len(),
            objects = parsed.module.objects.len(),
            "loaded vmod descriptor"
        );
        self.modules
            .insert(parsed.module.name.clone(), Arc::new(parsed.module));
        Ok(parsed.diagnostics)
    }

    /// Load a descriptor from a file.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<Vec<VccError>, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.load_source(&text)?)
    }

    /// Walk `dir` and load every file with the `.vcc` suffix. Individual
    /// failures are collected; the walk itself keeps going.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> DirectoryLoad {
        let mut report = DirectoryLoad::default();
        for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("vcc") {
                continue;
            }
            let display = entry.path().display().to_string();
            match self.load_path(entry.path()) {
                Ok(_) => report.loaded += 1,
                Err(error) => report.failures.push((display, error.to_string())),
            }
        }
        report
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    // --- lookups ----------------------------------------------------------

    pub fn module(&self, name: &str) -> Result<&Arc<VccModule>, RegistryError> {
        self.modules.get(name).ok_or_else(|| RegistryError::UnknownModule {
            name: name.to_string(),
        })
    }

    pub fn function(&self, module: &str, name: &str) -> Result<&VccFunction, RegistryError> {
        self.module(module)?
            .function(name)
            .ok_or_else(|| RegistryError::UnknownFunction {
                module: module.to_string(),
                name: name.to_string(),
            })
    }

    pub fn object(&self, module: &str, name: &str) -> Result<&VccObject, RegistryError> {
        self.module(module)?
            .object(name)
            .ok_or_else(|| RegistryError::UnknownObject {
                module: module.to_string(),
                name: name.to_string(),
            })
    }

    pub fn method(
        &self,
        module: &str,
        object: &str,
        name: &str,
    ) -> Result<&VccFunction, RegistryError> {
        self.object(module, object)?
            .method(name)
            .ok_or_else(|| RegistryError::UnknownMethod {
                module: module.to_string(),
                object: object.to_string(),
                name: name.to_string(),
            })
    }

    // --- validation -------------------------------------------------------

    /// Import validity: the module must exist.
    pub fn validate_import(&self, name: &str) -> Result<(), RegistryError> {
        self.module(name).map(|_| ())
    }

    /// Check a dense argument-slot array against a signature. The slots
    /// align with the signature's caller-visible (non-private) parameters;
    /// `None` marks an omitted slot, and `Some(None)` an argument whose
    /// type could not be inferred (which passes).
    pub fn check_signature(
        callable: &str,
        params: &[VccParam],
        slots: &[Option<Option<VccType>>],
    ) -> Result<(), RegistryError> {
        let visible: Vec<&VccParam> = params.iter().filter(|p| !p.ptype.is_private()).collect();
        let min = visible.iter().filter(|p| !p.optional && p.default.is_none()).count();

        if slots.len() > visible.len() {
            return Err(RegistryError::ArityMismatch {
                callable: callable.to_string(),
                expected_min: min,
                expected_max: visible.len(),
                got: slots.len(),
            });
        }

        for (index, param) in visible.iter().enumerate() {
            match slots.get(index).copied().flatten() {
                // Slot filled with an inferred type: check compatibility.
                Some(Some(got)) => {
                    if !argument_fits(param, got) {
                        return Err(RegistryError::TypeMismatch {
                            callable: callable.to_string(),
                            param: display_param_name(param, index),
                            expected: param.ptype.to_string(),
                            got: got.to_string(),
                        });
                    }
                }
                // Slot filled but the type could not be inferred: passes.
                Some(None) => {}
                // Slot omitted: fine only for omittable parameters.
                None => {
                    if !param.is_omittable() {
                        return Err(RegistryError::MissingArgument {
                            callable: callable.to_string(),
                            param: display_param_name(param, index),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Function call validity: arity plus per-slot type compatibility.
    pub fn validate_call(
        &self,
        module: &str,
        function: &str,
        slots: &[Option<Option<VccType>>],
    ) -> Result<(), RegistryError> {
        let descriptor = self.function(module, function)?;
        Self::check_signature(
            &format!("{module}.{function}"),
            &descriptor.params,
            slots,
        )
    }

    /// Object-method call validity.
    pub fn validate_method_call(
        &self,
        module: &str,
        object: &str,
        method: &str,
        slots: &[Option<Option<VccType>>],
    ) -> Result<(), RegistryError> {
        let descriptor = self.method(module, object, method)?;
        Self::check_signature(
            &format!("{module}.{object}.{method}"),
            &descriptor.params,
            slots,
        )
    }

    /// Object-construction validity.
    pub fn validate_construction(
        &self,
        module: &str,
        object: &str,
        slots: &[Option<Option<VccType>>],
    ) -> Result<(), RegistryError> {
        let descriptor = self.object(module, object)?;
        Self::check_signature(
            &format!("{module}.{object}"),
            &descriptor.constructor,
            slots,
        )
    }

    /// Snapshot of every module's statistics, sorted by name.
    pub fn stats(&self) -> Vec<ModuleStats> {
        let mut stats: Vec<ModuleStats> = self
            .modules
            .values()
            .map(|module| ModuleStats {
                name: module.name.clone(),
                version: module.version,
                functions: module.functions.len(),
                objects: module.objects.len(),
                events: module.events.len(),
                abi: module.abi.clone(),
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}

/// Whether an argument of type `got` fits `param`. Enum slots also accept
/// string-shaped arguments; the analyzer has already recognized bare
/// identifiers as enum tokens by then.
fn argument_fits(param: &VccParam, got: VccType) -> bool {
    compatible(got, param.ptype) || (param.ptype == VccType::Enum && got == VccType::String)
}

fn display_param_name(param: &VccParam, index: usize) -> String {
    if param.name.is_empty() {
        format!("#{}", index + 1)
    } else {
        param.name.clone()
    }
}

/// Errors from loading descriptor files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read descriptor: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vcc(#[from] VccError),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use pretty_assertions::assert_eq;

    const STD: &str = r#"
$Module std 3 "Standard library"
$Function VOID log(STRING_LIST s)
$Function TIME real2time(REAL r, TIME t)
$Function REAL random(REAL lo, REAL hi)
"#;

    const DIRECTORS: &str = r#"
$Module directors 2 "Backend selection"
$ABI strict
$Object round_robin()
$Method VOID .add_backend(BACKEND be)
$Method BACKEND .backend()
$Event vmod_event
"#;

    fn registry() -> VmodRegistry {
        let mut registry = VmodRegistry::new();
        registry.load_source(STD).unwrap();
        registry.load_source(DIRECTORS).unwrap();
        registry
    }

    #[test]
    fn lookups_find_what_exists() {
        let registry = registry();
        assert!(registry.module("std").is_ok());
        assert!(registry.function("std", "log").is_ok());
        assert!(registry.object("directors", "round_robin").is_ok());
        assert!(registry.method("directors", "round_robin", "add_backend").is_ok());
    }

    #[test]
    fn lookups_report_what_is_missing() {
        let registry = registry();
        assert!(matches!(
            registry.module("nonexistent"),
            Err(RegistryError::UnknownModule { .. })
        ));
        assert!(matches!(
            registry.function("std", "nope"),
            Err(RegistryError::UnknownFunction { .. })
        ));
        assert!(matches!(
            registry.object("std", "nope"),
            Err(RegistryError::UnknownObject { .. })
        ));
        assert!(matches!(
            registry.method("directors", "round_robin", "nope"),
            Err(RegistryError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn compatibility_is_reflexive_over_the_whole_vocabulary() {
        let all = [
            VccType::String,
            VccType::StringList,
            VccType::Strands,
            VccType::Int,
            VccType::Real,
            VccType::Bool,
            VccType::Time,
            VccType::Duration,
            VccType::Bytes,
            VccType::Blob,
            VccType::Ip,
            VccType::Backend,
            VccType::Probe,
            VccType::Acl,
            VccType::Header,
            VccType::Http,
            VccType::HttpReq,
            VccType::HttpResp,
            VccType::HttpBereq,
            VccType::HttpBeresp,
            VccType::PrivTask,
            VccType::PrivVcl,
            VccType::PrivTop,
            VccType::PrivCall,
            VccType::Stevedore,
            VccType::Sub,
            VccType::Enum,
            VccType::Void,
        ];
        for vtype in all {
            assert!(compatible(vtype, vtype), "{vtype} must match itself");
        }
    }

    #[test]
    fn coercions_are_one_way() {
        assert!(compatible(VccType::Int, VccType::Real));
        assert!(compatible(VccType::Int, VccType::Bool));
        assert!(compatible(VccType::String, VccType::StringList));
        assert!(compatible(VccType::String, VccType::Strands));
        assert!(compatible(VccType::StringList, VccType::Strands));
        assert!(compatible(VccType::Http, VccType::HttpReq));

        assert!(!compatible(VccType::Real, VccType::Int));
        assert!(!compatible(VccType::Bool, VccType::Int));
        assert!(!compatible(VccType::Strands, VccType::String));
        assert!(!compatible(VccType::HttpReq, VccType::Http));
        assert!(!compatible(VccType::String, VccType::Time));
    }

    #[test]
    fn call_validation_checks_arity_and_types() {
        let registry = registry();

        // std.real2time(REAL, TIME)
        let ok = [Some(Some(VccType::Real)), Some(Some(VccType::Time))];
        assert!(registry.validate_call("std", "real2time", &ok).is_ok());

        // INT coerces into the REAL slot.
        let coerced = [Some(Some(VccType::Int)), Some(Some(VccType::Time))];
        assert!(registry.validate_call("std", "real2time", &coerced).is_ok());

        // Too many arguments.
        let extra = [Some(Some(VccType::Real)), Some(Some(VccType::Time)), Some(Some(VccType::Int))];
        assert!(matches!(
            registry.validate_call("std", "real2time", &extra),
            Err(RegistryError::ArityMismatch { .. })
        ));

        // Wrong type in the TIME slot.
        let wrong = [Some(Some(VccType::Real)), Some(Some(VccType::String))];
        let error = registry.validate_call("std", "real2time", &wrong).unwrap_err();
        assert_eq!(
            error.to_string(),
            "argument 't' of std.real2time: expected TIME, got STRING"
        );
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let registry = registry();
        let slots = [Some(Some(VccType::Real)), None];
        let error = registry.validate_call("std", "real2time", &slots).unwrap_err();
        assert!(matches!(error, RegistryError::MissingArgument { .. }));
        assert!(error.to_string().contains("'t'"));
    }

    #[test]
    fn uninferable_arguments_pass() {
        let registry = registry();
        // `Some(None)`: present but type unknown — give it the benefit of
        // the doubt.
        let slots = [Some(None), Some(Some(VccType::Time))];
        assert!(registry.validate_call("std", "real2time", &slots).is_ok());
    }

    #[test]
    fn construction_and_method_calls_validate() {
        let registry = registry();
        assert!(registry.validate_construction("directors", "round_robin", &[]).is_ok());
        assert!(
            registry
                .validate_method_call(
                    "directors",
                    "round_robin",
                    "add_backend",
                    &[Some(Some(VccType::Backend))],
                )
                .is_ok()
        );
        assert!(matches!(
            registry.validate_method_call(
                "directors",
                "round_robin",
                "add_backend",
                &[Some(Some(VccType::String))],
            ),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn reloading_a_module_replaces_it() {
        let mut registry = registry();
        registry
            .load_source("$Module std 4 \"newer\"\n$Function VOID log(STRING_LIST s)\n")
            .unwrap();
        assert_eq!(registry.module("std").unwrap().version, 4);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn stats_snapshot() {
        let registry = registry();
        let stats = registry.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "directors");
        assert_eq!(stats[0].objects, 1);
        assert_eq!(stats[0].events, 1);
        assert_eq!(stats[0].abi.as_deref(), Some("strict"));
        assert_eq!(stats[1].name, "std");
        assert_eq!(stats[1].functions, 3);
    }

    #[test]
    fn directory_loading_filters_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("std.vcc"), STD).unwrap();
        std::fs::write(dir.path().join("directors.vcc"), DIRECTORS).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a descriptor").unwrap();
        std::fs::write(dir.path().join("broken.vcc"), "$Function no_header()").unwrap();

        let mut registry = VmodRegistry::new();
        let report = registry.load_dir(dir.path());
        assert_eq!(report.loaded, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].0.ends_with("broken.vcc"));
        assert_eq!(registry.len(), 2);
    }
}
