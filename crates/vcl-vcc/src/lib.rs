//! Parser for the VCC module-descriptor mini-language.
//!
//! A VCC descriptor declares the surface of one extension module
//! ("VMOD"): its functions, object types with constructors and methods,
//! and lifecycle events. The registry layer consumes the typed records
//! this crate produces; this crate knows nothing about VCL itself.
//!
//! # Usage
//!
//! ```
//! let descriptor = r#"
//! $Module std 3 "Standard library"
//! $Function STRING toupper(STRING_LIST s)
//! "#;
//! let parsed = vcl_vcc::parse(descriptor).unwrap();
//! assert_eq!(parsed.module.name, "std");
//! assert_eq!(parsed.module.functions.len(), 1);
//! ```

mod parser;
mod types;

pub use parser::{VccError, VccParse, parse};
pub use types::VccType;

/// One module descriptor: header data plus the declared entities in
/// source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VccModule {
    pub name: String,
    pub version: u32,
    pub description: Option<String>,
    /// ABI tag (`$ABI strict` / `$ABI vrt`)
    pub abi: Option<String>,
    pub functions: Vec<VccFunction>,
    pub objects: Vec<VccObject>,
    pub events: Vec<String>,
}

impl VccModule {
    /// Find a module-level function by name.
    pub fn function(&self, name: &str) -> Option<&VccFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Find an object type by name.
    pub fn object(&self, name: &str) -> Option<&VccObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

/// A function or method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VccFunction {
    pub name: String,
    pub return_type: VccType,
    pub params: Vec<VccParam>,
    /// Methods the call is permitted in; empty means unrestricted
    pub restrictions: Vec<String>,
    pub description: Option<String>,
}

impl VccFunction {
    /// Parameters the caller must supply: everything that is neither
    /// explicitly optional nor carries a default, excluding private slots.
    pub fn required_params(&self) -> impl Iterator<Item = &VccParam> {
        self.params
            .iter()
            .filter(|p| !p.optional && p.default.is_none() && !p.ptype.is_private())
    }
}

/// An object type: constructor parameters plus methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VccObject {
    pub name: String,
    pub constructor: Vec<VccParam>,
    pub methods: Vec<VccFunction>,
    pub description: Option<String>,
}

impl VccObject {
    /// Find a method by name.
    pub fn method(&self, name: &str) -> Option<&VccFunction> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// One parameter of a function, method, or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VccParam {
    /// Parameter name; may be empty for `PRIV_*` slots
    pub name: String,
    pub ptype: VccType,
    /// Admissible tokens when `ptype` is `ENUM`
    pub enum_values: Vec<String>,
    /// Textual default value, when declared
    pub default: Option<String>,
    /// Marked optional with square brackets
    pub optional: bool,
}

impl VccParam {
    /// Whether a call may omit this parameter.
    pub fn is_omittable(&self) -> bool {
        self.optional || self.default.is_some() || self.ptype.is_private()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use pretty_assertions::assert_eq;

    const UTILS: &str = r#"
# Example descriptor exercising the whole directive set.
$Module utils 1 "Small helpers"
$ABI strict

Utility functions for tests.

$Function STRING time_format(STRING format, BOOL local_time = 0, [TIME time])

Formats a timestamp.

$Function VOID log_line(PRIV_VCL, STRING message)
$Restrict recv deliver

$Function STRING pick(ENUM { FIRST, LAST, RANDOM } which = FIRST, STRING_LIST values)

$Object counter(INT initial = 0)

A counting object.

$Method VOID .increment(INT amount = 1)
$Method INT .value()

$Event evt_warmup
"#;

    #[test]
    fn full_descriptor_parses() {
        let parsed = parse(UTILS).unwrap();
        assert_eq!(parsed.diagnostics, vec![]);
        let module = parsed.module;

        assert_eq!(module.name, "utils");
        assert_eq!(module.version, 1);
        assert_eq!(module.abi.as_deref(), Some("strict"));
        assert_eq!(module.functions.len(), 3);
        assert_eq!(module.objects.len(), 1);
        assert_eq!(module.events, vec!["evt_warmup"]);
    }

    #[test]
    fn header_description_and_paragraphs_attach() {
        let module = parse(UTILS).unwrap().module;
        let time_format = module.function("time_format").unwrap();
        assert_eq!(time_format.description.as_deref(), Some("Formats a timestamp."));

        let description = module.description.unwrap();
        assert!(description.starts_with("Small helpers"));
        assert!(description.contains("Utility functions"));
    }

    #[test]
    fn parameter_shapes() {
        let module = parse(UTILS).unwrap().module;
        let function = module.function("time_format").unwrap();
        assert_eq!(function.return_type, VccType::String);
        assert_eq!(function.params.len(), 3);

        let format = &function.params[0];
        assert_eq!((format.name.as_str(), format.ptype), ("format", VccType::String));
        assert!(!format.is_omittable());

        let local_time = &function.params[1];
        assert_eq!(local_time.default.as_deref(), Some("0"));
        assert!(local_time.is_omittable());

        let time = &function.params[2];
        assert!(time.optional);
        assert_eq!(time.ptype, VccType::Time);
        assert!(time.is_omittable());

        // Only `format` is required.
        let required: Vec<&str> = function.required_params().map(|p| p.name.as_str()).collect();
        assert_eq!(required, vec!["format"]);
    }

    #[test]
    fn private_slots_may_be_anonymous() {
        let module = parse(UTILS).unwrap().module;
        let log_line = module.function("log_line").unwrap();
        assert_eq!(log_line.params[0].ptype, VccType::PrivVcl);
        assert_eq!(log_line.params[0].name, "");
        assert!(log_line.params[0].is_omittable());
        assert_eq!(log_line.restrictions, vec!["recv", "deliver"]);
    }

    #[test]
    fn inline_enums_keep_values_and_default() {
        let module = parse(UTILS).unwrap().module;
        let pick = module.function("pick").unwrap();
        let which = &pick.params[0];
        assert_eq!(which.ptype, VccType::Enum);
        assert_eq!(which.enum_values, vec!["FIRST", "LAST", "RANDOM"]);
        assert_eq!(which.default.as_deref(), Some("FIRST"));
        assert_eq!(which.name, "which");
    }

    #[test]
    fn methods_attach_to_their_object() {
        let module = parse(UTILS).unwrap().module;
        let counter = module.object("counter").unwrap();
        assert_eq!(counter.constructor.len(), 1);
        assert_eq!(counter.methods.len(), 2);
        assert_eq!(counter.method("increment").unwrap().params[0].default.as_deref(), Some("1"));
        assert_eq!(counter.method("value").unwrap().return_type, VccType::Int);
    }

    #[test]
    fn missing_header_rejects_the_module() {
        let error = parse("$Function STRING f()").unwrap_err();
        assert!(matches!(error, VccError::Header { .. }));

        let error = parse("# nothing here\n").unwrap_err();
        assert!(matches!(error, VccError::Header { .. }));
    }

    #[test]
    fn malformed_version_rejects_the_module() {
        let error = parse("$Module broken x \"desc\"").unwrap_err();
        assert!(matches!(error, VccError::Header { .. }));
    }

    #[test]
    fn broken_entity_is_skipped_not_fatal() {
        let source = r#"
$Module tolerant 1 "keeps going"
$Function STRING good()
$Function NOPE bad()
$Function broken_no_parens
$Function INT also_good()
"#;
        let parsed = parse(source).unwrap();
        assert_eq!(parsed.diagnostics.len(), 2);
        let names: Vec<&str> = parsed.module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["good", "also_good"]);
        assert!(matches!(parsed.diagnostics[0], VccError::UnknownType { .. }));
        assert!(matches!(parsed.diagnostics[1], VccError::Entity { .. }));
    }

    #[test]
    fn method_before_object_is_a_diagnostic() {
        let source = "$Module m 1 \"d\"\n$Method VOID .orphan()\n";
        let parsed = parse(source).unwrap();
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(parsed.module.objects.is_empty());
    }
}
