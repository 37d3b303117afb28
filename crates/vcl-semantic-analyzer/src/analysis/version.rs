//! VCL version validation.
//!
//! The program's version declaration parses into `major*10 + minor`
//! (absent declarations default to 40 for compatibility — the parser has
//! already complained about the absence itself). Every variable reference
//! is then checked against the referenced variable's supported range, with
//! the same dynamic-pattern normalization the other passes use.

use crate::analysis::variables::VariableAccess;
use vcl_ast::Program;
use vcl_error::{Diagnostic, Stage};
use vcl_metadata::LanguageMetadata;

/// Human-readable form of an encoded version: 41 renders as "4.1".
fn render(version: u32) -> String {
    format!("{}.{}", version / 10, version % 10)
}

/// Parse `4.1` into 41.
fn parse_version(text: &str) -> Option<u32> {
    let (major, minor) = text.split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor: u32 = minor.parse().ok()?;
    if minor >= 10 {
        return None;
    }
    Some(major * 10 + minor)
}

pub fn validate_versions(
    program: &Program,
    accesses: &[VariableAccess],
    metadata: &LanguageMetadata,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let version = match &program.version {
        Some(declaration) => match parse_version(&declaration.version) {
            Some(version) => version,
            None => {
                diagnostics.push(Diagnostic::error(
                    Stage::Version,
                    format!("malformed version declaration '{}'", declaration.version),
                    &declaration.span.start,
                    &*declaration.version,
                ));
                return diagnostics;
            }
        },
        None => 40,
    };

    for access in accesses {
        let Some(info) = metadata.variable(&access.path) else {
            // Unknown variables are the access validator's finding.
            continue;
        };
        if version < info.version_low {
            diagnostics.push(Diagnostic::error(
                Stage::Version,
                format!(
                    "variable '{}' requires VCL {} or newer, current version is {}",
                    access.path,
                    render(info.version_low),
                    render(version)
                ),
                &access.span.start,
                access.path.as_str(),
            ));
        } else if version > info.version_high {
            diagnostics.push(Diagnostic::error(
                Stage::Version,
                format!(
                    "variable '{}' is not available after VCL {}, current version is {}",
                    access.path,
                    render(info.version_high),
                    render(version)
                ),
                &access.span.start,
                access.path.as_str(),
            ));
        }
    }

    diagnostics
}
