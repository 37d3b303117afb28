//! Parser for the VCC descriptor mini-language.
//!
//! The format is line-oriented: dollar-prefixed directives declare the
//! module header, functions, object types, methods, and events; lines
//! starting with `#` are comments; any other non-empty text attaches as
//! description to the most recently declared entity.
//!
//! The parser is tolerant. A broken function or method costs a diagnostic
//! and is skipped; only an unparseable `$Module` header rejects the whole
//! descriptor.

use crate::types::VccType;
use crate::{VccFunction, VccModule, VccObject, VccParam};
use thiserror::Error;

/// Problems found while parsing a descriptor. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VccError {
    /// The `$Module` header is missing or malformed; the descriptor is
    /// rejected entirely.
    #[error("line {line}: invalid module header: {reason}")]
    Header { line: usize, reason: String },

    /// One entity failed to parse and was skipped.
    #[error("line {line}: invalid {directive} declaration: {reason}")]
    Entity {
        line: usize,
        directive: String,
        reason: String,
    },

    /// A signature referenced an unknown type name.
    #[error("line {line}: unknown type '{name}'")]
    UnknownType { line: usize, name: String },
}

/// A parsed descriptor plus the per-entity problems that were skipped
/// over.
#[derive(Debug)]
pub struct VccParse {
    pub module: VccModule,
    pub diagnostics: Vec<VccError>,
}

/// What description paragraphs currently attach to.
enum Attach {
    Module,
    Function,
    Object,
    Method,
    Event,
}

/// Parse one descriptor source. Returns `Err` only when the module header
/// is missing or malformed.
pub fn parse(source: &str) -> Result<VccParse, VccError> {
    let mut module: Option<VccModule> = None;
    let mut diagnostics = Vec::new();
    let mut attach = Attach::Module;

    for (index, raw_line) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('$') {
            let (directive, payload) = match rest.split_once(char::is_whitespace) {
                Some((directive, payload)) => (directive, payload.trim()),
                None => (rest, ""),
            };

            match directive {
                "Module" => match parse_module_header(payload, line_no) {
                    Ok(parsed) => {
                        module = Some(parsed);
                        attach = Attach::Module;
                    }
                    Err(error) => return Err(error),
                },
                _ => {
                    let Some(module) = module.as_mut() else {
                        return Err(VccError::Header {
                            line: line_no,
                            reason: format!("'${directive}' before '$Module'"),
                        });
                    };
                    match apply_directive(module, directive, payload, line_no, &mut attach) {
                        Ok(()) => {}
                        Err(error) => diagnostics.push(error),
                    }
                }
            }
        } else if let Some(module) = module.as_mut() {
            attach_description(module, &attach, line);
        }
    }

    match module {
        Some(module) => Ok(VccParse { module, diagnostics }),
        None => Err(VccError::Header {
            line: source.lines().count().max(1),
            reason: "missing '$Module' header".to_string(),
        }),
    }
}

/// `$Module <name> <version> "<description>"`
fn parse_module_header(payload: &str, line: usize) -> Result<VccModule, VccError> {
    let mut parts = payload.splitn(3, char::is_whitespace);
    let name = parts.next().unwrap_or("").trim();
    if name.is_empty() {
        return Err(VccError::Header {
            line,
            reason: "missing module name".to_string(),
        });
    }

    let version = parts
        .next()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .ok_or_else(|| VccError::Header {
            line,
            reason: "missing or non-numeric module version".to_string(),
        })?;

    let description = parts
        .next()
        .map(|d| d.trim().trim_matches('"').to_string())
        .filter(|d| !d.is_empty());

    Ok(VccModule {
        name: name.to_string(),
        version,
        description,
        abi: None,
        functions: Vec::new(),
        objects: Vec::new(),
        events: Vec::new(),
    })
}

fn apply_directive(
    module: &mut VccModule,
    directive: &str,
    payload: &str,
    line: usize,
    attach: &mut Attach,
) -> Result<(), VccError> {
    match directive {
        "ABI" => {
            module.abi = Some(payload.to_string());
            Ok(())
        }
        "Event" => {
            if payload.is_empty() {
                return Err(VccError::Entity {
                    line,
                    directive: "$Event".to_string(),
                    reason: "missing event name".to_string(),
                });
            }
            module.events.push(payload.to_string());
            *attach = Attach::Event;
            Ok(())
        }
        "Function" => {
            let function = parse_signature(payload, line, "$Function")?;
            if function.name.starts_with('.') {
                return Err(VccError::Entity {
                    line,
                    directive: "$Function".to_string(),
                    reason: "function names do not start with '.'".to_string(),
                });
            }
            module.functions.push(function);
            *attach = Attach::Function;
            Ok(())
        }
        "Object" => {
            let object = parse_object_signature(payload, line)?;
            module.objects.push(object);
            *attach = Attach::Object;
            Ok(())
        }
        "Method" => {
            let Some(object) = module.objects.last_mut() else {
                return Err(VccError::Entity {
                    line,
                    directive: "$Method".to_string(),
                    reason: "'$Method' before any '$Object'".to_string(),
                });
            };
            let mut method = parse_signature(payload, line, "$Method")?;
            let Some(name) = method.name.strip_prefix('.') else {
                return Err(VccError::Entity {
                    line,
                    directive: "$Method".to_string(),
                    reason: "method names start with '.'".to_string(),
                });
            };
            method.name = name.to_string();
            object.methods.push(method);
            *attach = Attach::Method;
            Ok(())
        }
        "Restrict" => {
            // Attaches a usage restriction to the entity declared last.
            let methods: Vec<String> = payload.split_whitespace().map(str::to_string).collect();
            if methods.is_empty() {
                return Err(VccError::Entity {
                    line,
                    directive: "$Restrict".to_string(),
                    reason: "missing method list".to_string(),
                });
            }
            let target = match attach {
                Attach::Function => module.functions.last_mut(),
                Attach::Method => module.objects.last_mut().and_then(|o| o.methods.last_mut()),
                _ => None,
            };
            match target {
                Some(function) => {
                    function.restrictions = methods;
                    Ok(())
                }
                None => Err(VccError::Entity {
                    line,
                    directive: "$Restrict".to_string(),
                    reason: "no preceding function or method".to_string(),
                }),
            }
        }
        other => Err(VccError::Entity {
            line,
            directive: format!("${other}"),
            reason: "unknown directive".to_string(),
        }),
    }
}

fn attach_description(module: &mut VccModule, attach: &Attach, line: &str) {
    let slot = match attach {
        Attach::Module => &mut module.description,
        Attach::Function => match module.functions.last_mut() {
            Some(function) => &mut function.description,
            None => return,
        },
        Attach::Object => match module.objects.last_mut() {
            Some(object) => &mut object.description,
            None => return,
        },
        Attach::Method => match module.objects.last_mut().and_then(|o| o.methods.last_mut()) {
            Some(method) => &mut method.description,
            None => return,
        },
        // Events carry no description of their own; paragraphs after an
        // event read as module documentation.
        Attach::Event => &mut module.description,
    };
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(line);
        }
        None => *slot = Some(line.to_string()),
    }
}

/// `RETURN_TYPE name(PARAM, PARAM, ...)`
fn parse_signature(payload: &str, line: usize, directive: &str) -> Result<VccFunction, VccError> {
    let open = payload.find('(').ok_or_else(|| VccError::Entity {
        line,
        directive: directive.to_string(),
        reason: "missing '(' in signature".to_string(),
    })?;
    let close = payload.rfind(')').ok_or_else(|| VccError::Entity {
        line,
        directive: directive.to_string(),
        reason: "missing ')' in signature".to_string(),
    })?;
    if close < open {
        return Err(VccError::Entity {
            line,
            directive: directive.to_string(),
            reason: "mismatched parentheses in signature".to_string(),
        });
    }

    let head = payload[..open].trim();
    let mut head_parts = head.split_whitespace();
    let return_name = head_parts.next().ok_or_else(|| VccError::Entity {
        line,
        directive: directive.to_string(),
        reason: "missing return type".to_string(),
    })?;
    let name = head_parts.next().ok_or_else(|| VccError::Entity {
        line,
        directive: directive.to_string(),
        reason: "missing name".to_string(),
    })?;
    let return_type = VccType::lookup(return_name).ok_or_else(|| VccError::UnknownType {
        line,
        name: return_name.to_string(),
    })?;

    let params = parse_params(&payload[open + 1..close], line)?;

    Ok(VccFunction {
        name: name.to_string(),
        return_type,
        params,
        restrictions: Vec::new(),
        description: None,
    })
}

/// `$Object name(PARAMS)` — constructors have no return type; the object
/// type itself is the result.
fn parse_object_signature(payload: &str, line: usize) -> Result<VccObject, VccError> {
    let open = payload.find('(').ok_or_else(|| VccError::Entity {
        line,
        directive: "$Object".to_string(),
        reason: "missing '(' in constructor signature".to_string(),
    })?;
    let close = payload.rfind(')').ok_or_else(|| VccError::Entity {
        line,
        directive: "$Object".to_string(),
        reason: "missing ')' in constructor signature".to_string(),
    })?;

    let name = payload[..open].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(VccError::Entity {
            line,
            directive: "$Object".to_string(),
            reason: "invalid object name".to_string(),
        });
    }

    let constructor = parse_params(&payload[open + 1..close], line)?;

    Ok(VccObject {
        name: name.to_string(),
        constructor,
        methods: Vec::new(),
        description: None,
    })
}

/// Split a parameter list on commas, ignoring commas inside enum braces.
fn split_params(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in list.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// One parameter: `TYPE name`, with optional `[...]` marking, `= default`
/// suffix, and `ENUM { A, B, C }` inline enums. `PRIV_*` slots may omit
/// the name.
fn parse_params(list: &str, line: usize) -> Result<Vec<VccParam>, VccError> {
    let mut params = Vec::new();

    for raw in split_params(list) {
        let mut part = raw.trim();
        if part.is_empty() {
            continue;
        }

        let optional = part.starts_with('[') && part.ends_with(']');
        if optional {
            part = part[1..part.len() - 1].trim();
        }

        // Split off a default value outside enum braces.
        let (spec, default) = match split_default(part) {
            Some((spec, default)) => (spec.trim(), Some(default.trim().to_string())),
            None => (part, None),
        };

        let param = if let Some(rest) = spec.strip_prefix("ENUM") {
            let rest = rest.trim();
            let open = rest.find('{').ok_or_else(|| VccError::Entity {
                line,
                directive: "parameter".to_string(),
                reason: "ENUM without value list".to_string(),
            })?;
            let close = rest.find('}').ok_or_else(|| VccError::Entity {
                line,
                directive: "parameter".to_string(),
                reason: "unterminated ENUM value list".to_string(),
            })?;
            let values: Vec<String> = rest[open + 1..close]
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            let name = rest[close + 1..].trim();
            VccParam {
                name: name.to_string(),
                ptype: VccType::Enum,
                enum_values: values,
                default,
                optional,
            }
        } else {
            let mut words = spec.split_whitespace();
            let type_name = words.next().ok_or_else(|| VccError::Entity {
                line,
                directive: "parameter".to_string(),
                reason: "empty parameter".to_string(),
            })?;
            let ptype = VccType::lookup(type_name).ok_or_else(|| VccError::UnknownType {
                line,
                name: type_name.to_string(),
            })?;
            let name = words.next().unwrap_or("");
            VccParam {
                name: name.to_string(),
                ptype,
                enum_values: Vec::new(),
                default,
                optional,
            }
        };

        params.push(param);
    }

    Ok(params)
}

/// Find a top-level `=` (outside enum braces) and split there.
fn split_default(part: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, ch) in part.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                return Some((&part[..idx], &part[idx + 1..]));
            }
            _ => {}
        }
    }
    None
}
