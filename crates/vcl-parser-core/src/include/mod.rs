//! Include resolution: recursively parse and splice referenced files.
//!
//! The resolver is the only component of the front-end that touches the
//! filesystem, and it does so through an injected [`FileReader`]
//! capability — the production [`FsReader`] reads from disk relative to an
//! optional base path, [`MemoryReader`] backs tests. Reads are scoped to
//! the read step, so no file handle outlives a resolution attempt.
//!
//! Each resolver owns its visited-set and depth counter for the duration
//! of one resolution; a fresh call starts from a clean slate. Failures are
//! fatal for the current resolution: the caller receives an error instead
//! of a partially spliced tree.

use crate::parser::{ParseOutcome, Parser, ParserConfig};
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use vcl_ast::{Declaration, Program};
use vcl_error::Diagnostic;

/// Failure taxonomy of include resolution.
#[derive(Debug, Error)]
pub enum IncludeError {
    /// A file is already on the resolution stack.
    #[error("circular include: {}", chain.join(" -> "))]
    Circular {
        /// The resolution stack, root first, ending with the repeated path
        chain: Vec<String>,
    },

    /// The nesting bound was exceeded.
    #[error("include depth {depth} exceeds limit {limit}")]
    DepthExceeded { depth: usize, limit: usize },

    /// The referenced file could not be read.
    #[error("include file not found: {path}{}", base.as_deref().map(|b| format!(" (base path {b})")).unwrap_or_default())]
    NotFound {
        path: String,
        base: Option<String>,
        #[source]
        source: io::Error,
    },

    /// The referenced file failed to parse.
    #[error("parse failure in included file {path}: {}", first_message(diagnostics))]
    Parse {
        path: String,
        diagnostics: Vec<Diagnostic>,
    },
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Resolution limits.
#[derive(Debug, Clone)]
pub struct IncludeConfig {
    /// Maximum include nesting depth.
    pub max_depth: usize,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        IncludeConfig { max_depth: 10 }
    }
}

/// The capability the resolver reads files through.
pub trait FileReader {
    /// Read the full contents of `path`.
    fn read(&self, path: &str) -> io::Result<String>;

    /// Map `path` to the canonical form used for cycle detection. The
    /// default is the identity; filesystem readers resolve symlinks and
    /// relative segments so the same file under two spellings is still
    /// caught.
    fn canonicalize(&self, path: &str) -> String {
        path.to_string()
    }

    /// The base path reads are relative to, for error reporting.
    fn base(&self) -> Option<String> {
        None
    }
}

/// Filesystem-backed reader with an optional base path.
#[derive(Debug, Default)]
pub struct FsReader {
    base: Option<PathBuf>,
}

impl FsReader {
    pub fn new() -> Self {
        FsReader { base: None }
    }

    /// Resolve relative include paths against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        FsReader { base: Some(base.into()) }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match (&self.base, path.is_absolute()) {
            (Some(base), false) => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileReader for FsReader {
    fn read(&self, path: &str) -> io::Result<String> {
        // The handle opened here is closed before this returns, on every
        // path out.
        std::fs::read_to_string(self.full_path(path))
    }

    fn canonicalize(&self, path: &str) -> String {
        let full = self.full_path(path);
        match std::fs::canonicalize(&full) {
            Ok(canonical) => canonical.to_string_lossy().into_owned(),
            Err(_) => full.to_string_lossy().into_owned(),
        }
    }

    fn base(&self) -> Option<String> {
        self.base.as_ref().map(|b| b.to_string_lossy().into_owned())
    }
}

/// In-memory reader for tests: path → contents.
#[derive(Debug, Default)]
pub struct MemoryReader {
    files: FxHashMap<String, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        MemoryReader::default()
    }

    /// Register a file under `path`.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileReader for MemoryReader {
    fn read(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}")))
    }
}

/// Splices included programs into their referencing position.
pub struct IncludeResolver<R: FileReader> {
    reader: R,
    config: IncludeConfig,
    parser_config: ParserConfig,
    /// Canonical paths currently being resolved, root first.
    stack: Vec<String>,
}

impl<R: FileReader> IncludeResolver<R> {
    pub fn new(reader: R, config: IncludeConfig) -> Self {
        IncludeResolver {
            reader,
            config,
            parser_config: ParserConfig::default(),
            stack: Vec::new(),
        }
    }

    /// Parse included files with this configuration instead of the default.
    pub fn with_parser_config(mut self, parser_config: ParserConfig) -> Self {
        self.parser_config = parser_config;
        self
    }

    /// Replace every include declaration in `program` with the top-level
    /// declarations of the referenced file, recursively, preserving order.
    /// The root program's version declaration is kept; versions of
    /// included files are dropped during splicing.
    pub fn resolve(&mut self, program: Program) -> Result<Program, IncludeError> {
        self.stack.clear();
        self.resolve_at_depth(program, 0)
    }

    fn resolve_at_depth(&mut self, program: Program, depth: usize) -> Result<Program, IncludeError> {
        let mut declarations = Vec::with_capacity(program.declarations.len());

        for declaration in program.declarations {
            match declaration {
                Declaration::Include { path, .. } => {
                    let spliced = self.resolve_include(&path, depth)?;
                    declarations.extend(spliced);
                }
                other => declarations.push(other),
            }
        }

        Ok(Program {
            version: program.version,
            declarations,
            span: program.span,
        })
    }

    fn resolve_include(&mut self, path: &str, depth: usize) -> Result<Vec<Declaration>, IncludeError> {
        let canonical = self.reader.canonicalize(path);

        if self.stack.contains(&canonical) {
            let mut chain = self.stack.clone();
            chain.push(canonical);
            return Err(IncludeError::Circular { chain });
        }
        if depth + 1 > self.config.max_depth {
            return Err(IncludeError::DepthExceeded {
                depth: depth + 1,
                limit: self.config.max_depth,
            });
        }

        let text = self.reader.read(path).map_err(|source| IncludeError::NotFound {
            path: path.to_string(),
            base: self.reader.base(),
            source,
        })?;

        let file: Arc<str> = Arc::from(path);
        let outcome =
            Parser::with_config(&text, Some(file), self.parser_config.clone()).parse();
        if !outcome.diagnostics.is_empty() {
            return Err(IncludeError::Parse {
                path: path.to_string(),
                diagnostics: outcome.diagnostics,
            });
        }

        self.stack.push(canonical);
        let resolved = self.resolve_at_depth(outcome.program, depth + 1);
        self.stack.pop();
        let resolved = resolved?;

        debug!(path, declarations = resolved.declarations.len(), "spliced include");
        Ok(resolved.declarations)
    }
}

/// Parse `path` through `reader` and resolve its includes in one call.
///
/// Parse diagnostics of the root file are returned in the outcome, not as
/// an error; include failures abort resolution so the caller never sees a
/// partially spliced tree.
pub fn parse_file_with_includes<R: FileReader>(
    path: &str,
    reader: R,
    parser_config: ParserConfig,
    include_config: IncludeConfig,
) -> Result<ParseOutcome, IncludeError> {
    let text = reader.read(path).map_err(|source| IncludeError::NotFound {
        path: path.to_string(),
        base: reader.base(),
        source,
    })?;

    let file: Arc<str> = Arc::from(path);
    let outcome = Parser::with_config(&text, Some(file), parser_config.clone()).parse();

    let mut resolver = IncludeResolver::new(reader, include_config).with_parser_config(parser_config);
    // The root is on the stack for cycle purposes: a file including itself
    // is circular, not infinitely deep.
    resolver.stack.push(resolver.reader.canonicalize(path));
    let program = resolver.resolve_at_depth(outcome.program, 0)?;

    Ok(ParseOutcome {
        program,
        diagnostics: outcome.diagnostics,
    })
}
