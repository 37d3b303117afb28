//! VMOD validation: imports, calls, object construction.
//!
//! This is the pass that populates the symbol table — modules on import,
//! backends on declaration, object instances on `new` — and checks every
//! `module.function(...)` and `instance.method(...)` call against the
//! registry: the module must be imported, the callee must exist, named
//! arguments must map onto real parameter slots, required parameters must
//! be supplied, and every argument's inferred type must be compatible
//! with its slot.
//!
//! With no registry configured there is nothing to validate against; the
//! pass still registers backends so the later passes can classify names,
//! and leaves imports and calls alone.

use crate::analysis::type_inference::infer;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use vcl_ast::{Block, Declaration, Expression, Ident, NamedArg, Program, Statement};
use vcl_error::{Diagnostic, Stage};
use vcl_lexer::Span;
use vcl_metadata::LanguageMetadata;
use vcl_symbol_table::SymbolTable;
use vcl_vcc::{VccFunction, VccParam, VccType};
use vcl_vmod_registry::{RegistryError, VmodRegistry};

pub struct VmodValidator<'a> {
    registry: Option<&'a VmodRegistry>,
    metadata: &'a LanguageMetadata,
    symbols: &'a mut SymbolTable,
    diagnostics: Vec<Diagnostic>,
    current_sub: Option<Arc<str>>,
    /// Module bindings whose functions or objects were referenced.
    used_modules: FxHashSet<String>,
    /// Import sites, for the unused-import warning: (binding, span).
    imports: Vec<(String, Span)>,
}

impl<'a> VmodValidator<'a> {
    pub fn run(
        program: &Program,
        registry: Option<&'a VmodRegistry>,
        metadata: &'a LanguageMetadata,
        symbols: &'a mut SymbolTable,
    ) -> Vec<Diagnostic> {
        let mut validator = VmodValidator {
            registry,
            metadata,
            symbols,
            diagnostics: Vec::new(),
            current_sub: None,
            used_modules: FxHashSet::default(),
            imports: Vec::new(),
        };
        validator.visit_program(program);
        validator.report_unused_imports();
        validator.diagnostics
    }

    fn visit_program(&mut self, program: &Program) {
        for declaration in &program.declarations {
            match declaration {
                Declaration::Import { name, alias, span } => self.handle_import(name, alias, span),
                Declaration::Backend { name, properties, .. } => {
                    let property_names =
                        properties.iter().map(|p| p.name.name.to_string()).collect();
                    self.symbols.insert_backend(name.name.to_string(), property_names);
                }
                Declaration::Sub { name, body, .. } => {
                    self.current_sub = Some(name.name.clone());
                    self.visit_block(body);
                    self.current_sub = None;
                }
                Declaration::Probe { .. }
                | Declaration::Acl { .. }
                | Declaration::Include { .. } => {}
            }
        }
    }

    fn handle_import(&mut self, name: &Ident, alias: &Option<Ident>, span: &Span) {
        let Some(registry) = self.registry else {
            return;
        };
        let binding = alias.as_ref().unwrap_or(name);
        match registry.module(&name.name) {
            Ok(descriptor) => {
                // Registering the descriptor also registers its functions:
                // later reads of `binding.function` resolve through it.
                self.symbols
                    .insert_module(binding.name.to_string(), Arc::clone(descriptor));
                self.imports.push((binding.name.to_string(), span.clone()));
            }
            Err(error) => self.report(error.to_string(), span, &name.name),
        }
    }

    fn visit_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.visit_statement(statement);
        }
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => self.visit_block(block),
            Statement::If { condition, then_branch, else_branch, .. } => {
                self.visit_expression(condition);
                self.visit_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_statement(else_branch);
                }
            }
            Statement::Set { target: _, value, .. } => self.visit_expression(value),
            Statement::Unset { .. } | Statement::Call { .. } | Statement::Restart { .. } => {}
            Statement::Return { action, .. } => {
                // Call-form actions (synth(...)) carry argument
                // expressions worth walking; the action name itself is
                // not a VMOD reference.
                if let Some(Expression::Call { args, named_args, .. }) = action {
                    for arg in args {
                        self.visit_expression(arg);
                    }
                    for named in named_args {
                        self.visit_expression(&named.value);
                    }
                }
            }
            Statement::Synthetic { value, .. } => self.visit_expression(value),
            Statement::Error { status, body, .. } => {
                if let Some(status) = status {
                    self.visit_expression(status);
                }
                if let Some(body) = body {
                    self.visit_expression(body);
                }
            }
            Statement::New { name, constructor, span } => {
                self.handle_new(name, constructor, span);
            }
            Statement::Expression { expression, .. } => self.visit_expression(expression),
            Statement::InlineSource { .. } => {}
        }
    }

    fn visit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Call { callee, args, named_args, span } => {
                self.handle_call(callee, args, named_args, span);
                for arg in args {
                    self.visit_expression(arg);
                }
                for named in named_args {
                    self.visit_expression(&named.value);
                }
            }
            Expression::Unary { operand, .. } => self.visit_expression(operand),
            Expression::Binary { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            Expression::Grouping { inner, .. } => self.visit_expression(inner),
            Expression::Member { .. }
            | Expression::Identifier(_)
            | Expression::Integer { .. }
            | Expression::Float { .. }
            | Expression::StringLiteral { .. }
            | Expression::Boolean { .. }
            | Expression::Duration { .. }
            | Expression::Ip { .. } => {}
            Expression::ObjectLiteral { properties, .. } => {
                for property in properties {
                    self.visit_expression(&property.value);
                }
            }
        }
    }

    /// A call whose target is `base.name`: an object-method invocation
    /// when `base` is a known instance, a module function call otherwise.
    fn handle_call(
        &mut self,
        callee: &Expression,
        args: &[Expression],
        named_args: &[NamedArg],
        span: &Span,
    ) {
        if self.registry.is_none() {
            return;
        }
        let Expression::Member { object, property, .. } = callee else {
            return;
        };
        let Expression::Identifier(base) = &**object else {
            return;
        };

        if let Some((module, type_name)) = self.symbols.object_instance(&base.name) {
            let module = module.to_string();
            let type_name = type_name.to_string();
            self.used_modules.insert(module.clone());
            let descriptor = self
                .symbols
                .module(&module)
                .and_then(|m| m.object(&type_name))
                .and_then(|o| o.method(&property.name))
                .cloned();
            match descriptor {
                Some(method) => {
                    let callable = format!("{}.{}", base.name, property.name);
                    self.check_call(&callable, &method, args, named_args, span);
                    self.check_restrictions(&callable, &method, span);
                }
                None => self.report(
                    format!(
                        "object type '{module}.{type_name}' has no method '{}'",
                        property.name
                    ),
                    span,
                    &property.name,
                ),
            }
            return;
        }

        if self.symbols.is_backend(&base.name) {
            return;
        }

        let Some(descriptor) = self.symbols.module(&base.name).cloned() else {
            self.report(
                format!("module '{}' not imported", base.name),
                span,
                &base.name,
            );
            return;
        };

        self.used_modules.insert(base.name.to_string());
        match descriptor.function(&property.name) {
            Some(function) => {
                let callable = format!("{}.{}", base.name, property.name);
                let function = function.clone();
                self.check_call(&callable, &function, args, named_args, span);
                self.check_restrictions(&callable, &function, span);
            }
            None => self.report(
                format!("module '{}' has no function '{}'", descriptor.name, property.name),
                span,
                &property.name,
            ),
        }
    }

    /// `new x = module.type(args);` — verify the module is imported, the
    /// object type exists, the constructor arguments fit, then register
    /// the instance.
    fn handle_new(&mut self, name: &Ident, constructor: &Expression, span: &Span) {
        if self.registry.is_none() {
            return;
        }
        let Expression::Call { callee, args, named_args, .. } = constructor else {
            return;
        };
        let Expression::Member { object, property, .. } = &**callee else {
            return;
        };
        let Expression::Identifier(base) = &**object else {
            return;
        };

        let Some(descriptor) = self.symbols.module(&base.name).cloned() else {
            self.report(
                format!("module '{}' not imported", base.name),
                span,
                &base.name,
            );
            return;
        };
        self.used_modules.insert(base.name.to_string());

        let Some(object_type) = descriptor.object(&property.name) else {
            self.report(
                format!(
                    "module '{}' has no object type '{}'",
                    descriptor.name, property.name
                ),
                span,
                &property.name,
            );
            return;
        };

        let callable = format!("{}.{}", base.name, property.name);
        let constructor_fn = VccFunction {
            name: property.name.to_string(),
            return_type: VccType::Void,
            params: object_type.constructor.clone(),
            restrictions: Vec::new(),
            description: None,
        };
        self.check_call(&callable, &constructor_fn, args, named_args, span);

        self.symbols.insert_object_instance(
            name.name.to_string(),
            base.name.to_string(),
            property.name.to_string(),
        );
    }

    /// The named-argument builder: fill a dense slot array from positional
    /// arguments, map each named argument onto the parameter with the
    /// matching name, then hand the typed slots to the registry's
    /// signature check.
    fn check_call(
        &mut self,
        callable: &str,
        function: &VccFunction,
        args: &[Expression],
        named_args: &[NamedArg],
        span: &Span,
    ) {
        let visible: Vec<&VccParam> =
            function.params.iter().filter(|p| !p.ptype.is_private()).collect();

        // Phase 1: positional arguments claim slots left to right.
        if args.len() > visible.len() {
            let minimum = visible.iter().filter(|p| !p.is_omittable()).count();
            let error = RegistryError::ArityMismatch {
                callable: callable.to_string(),
                expected_min: minimum,
                expected_max: visible.len(),
                got: args.len() + named_args.len(),
            };
            self.report(error.to_string(), span, callable);
            return;
        }
        let mut slot_exprs: Vec<Option<&Expression>> = vec![None; visible.len()];
        for (index, arg) in args.iter().enumerate() {
            slot_exprs[index] = Some(arg);
        }

        // Phase 2: named arguments map by parameter name; unknown names
        // and collisions with positional slots are diagnostics.
        for named in named_args {
            let Some(position) = visible.iter().position(|p| p.name == *named.name.name) else {
                self.report(
                    format!("unknown named argument '{}' for {callable}", named.name.name),
                    &named.name.span,
                    &named.name.name,
                );
                continue;
            };
            if slot_exprs[position].is_some() {
                self.report(
                    format!(
                        "argument '{}' of {callable} given both positionally and by name",
                        named.name.name
                    ),
                    &named.name.span,
                    &named.name.name,
                );
                continue;
            }
            slot_exprs[position] = Some(&named.value);
        }

        // Phase 3: infer each filled slot under its parameter-type hint
        // and let the registry check the result.
        let slots: Vec<Option<Option<VccType>>> = slot_exprs
            .iter()
            .zip(&visible)
            .map(|(expr, param)| {
                expr.map(|e| infer(e, Some(param.ptype), self.symbols, self.metadata))
            })
            .collect();

        if let Err(error) = VmodRegistry::check_signature(callable, &function.params, &slots) {
            self.report(error.to_string(), span, callable);
        }

        // Enum slots additionally check the token against the admissible
        // values.
        for (expr, param) in slot_exprs.iter().zip(&visible) {
            if param.ptype != VccType::Enum || param.enum_values.is_empty() {
                continue;
            }
            if let Some(Expression::Identifier(token)) = expr {
                if !param.enum_values.iter().any(|v| **v == *token.name) {
                    self.report(
                        format!(
                            "'{}' is not one of {{{}}} for argument '{}' of {callable}",
                            token.name,
                            param.enum_values.join(", "),
                            param.name
                        ),
                        &token.span,
                        &token.name,
                    );
                }
            }
        }
    }

    /// Usage restrictions: a restricted function or object method may
    /// only be called from the listed methods. Comparison is
    /// case-insensitive over the short method names.
    fn check_restrictions(&mut self, callable: &str, function: &VccFunction, span: &Span) {
        if function.restrictions.is_empty() {
            return;
        }
        let Some(current) = self.current_sub.clone() else {
            return;
        };
        let current_short = current
            .strip_prefix("vcl_")
            .unwrap_or(&current)
            .to_ascii_lowercase();
        let permitted = function.restrictions.iter().any(|entry| {
            entry
                .strip_prefix("vcl_")
                .unwrap_or(entry)
                .eq_ignore_ascii_case(&current_short)
        });
        if !permitted {
            self.report(
                format!("call to {callable} not permitted in '{current}'"),
                span,
                callable,
            );
        }
    }

    fn report_unused_imports(&mut self) {
        let unused: Vec<(String, Span)> = self
            .imports
            .iter()
            .filter(|(binding, _)| !self.used_modules.contains(binding))
            .cloned()
            .collect();
        for (binding, span) in unused {
            self.diagnostics.push(Diagnostic::warning(
                Stage::Vmod,
                format!("imported module '{binding}' is never used"),
                &span.start,
                binding.as_str(),
            ));
        }
    }

    fn report(&mut self, message: String, span: &Span, token: &str) {
        self.diagnostics
            .push(Diagnostic::error(Stage::Vmod, message, &span.start, token));
    }
}
