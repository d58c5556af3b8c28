// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The declarations and background theory of a session, kept in sync with
//! the backend.

use itertools::Itertools;
use smtlib::sexp;

use crate::backend::Backend;
use crate::decl::{Constant, Function, GlobalVariable, Type};
use crate::error::SessionError;
use crate::registry::DeclRegistry;
use crate::Sexp;

/// Owns a session's backend along with everything declared to it and the
/// axioms of its background theory.
///
/// Every declaration is validated against the registry before it reaches the
/// backend, so a rejected declaration leaves the solver untouched.
#[derive(Debug)]
pub struct ProverContext<B> {
    backend: B,
    registry: DeclRegistry,
    axioms: Vec<Sexp>,
}

impl<B: Backend> ProverContext<B> {
    /// A context with nothing declared.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry: DeclRegistry::new(),
            axioms: vec![],
        }
    }

    /// Declare an uninterpreted type.
    pub fn declare_type(&mut self, name: &str) -> Result<(), SessionError> {
        self.registry.declare_type(name)?;
        log::debug!("declare type {name}");
        self.backend.declare_type(name)?;
        Ok(())
    }

    /// Declare a constant.
    pub fn declare_constant(&mut self, c: &Constant) -> Result<(), SessionError> {
        self.registry.declare_constant(c)?;
        log::debug!("declare constant {}: {}", c.name, c.ty);
        self.backend.declare_constant(&c.name, &c.ty)?;
        Ok(())
    }

    /// Declare a function. Functions without exactly one output are rejected
    /// here, before the backend sees anything.
    pub fn declare_function(&mut self, f: &Function) -> Result<(), SessionError> {
        let range = self.registry.check_function(f)?.clone();
        self.registry.declare_function(f)?;
        log::debug!(
            "declare function {}: ({}) -> {range}",
            f.name,
            f.inputs.iter().join(", ")
        );
        self.backend.declare_function(&f.name, &f.inputs, &range)?;
        Ok(())
    }

    /// Declare a global variable, which the backend sees as a constant.
    pub fn declare_global_variable(&mut self, v: &GlobalVariable) -> Result<(), SessionError> {
        self.registry.declare_global_variable(v)?;
        log::debug!("declare global variable {}: {}", v.name, v.ty);
        self.backend.declare_constant(&v.name, &v.ty)?;
        Ok(())
    }

    /// Add an axiom to the background theory. Nothing is sent to the backend
    /// until the theory is asserted.
    pub fn add_axiom(&mut self, formula: Sexp) {
        self.axioms.push(formula);
    }

    /// The background theory as a single formula.
    pub fn axioms(&self) -> Sexp {
        sexp::and(self.axioms.iter().cloned())
    }

    /// Number of axioms in the background theory.
    pub fn num_axioms(&self) -> usize {
        self.axioms.len()
    }

    /// Whether a type has been declared.
    pub fn is_declared_type(&self, name: &str) -> bool {
        self.registry.is_declared_type(name)
    }

    /// Whether a constant or global variable has been declared under `name`.
    pub fn is_declared_symbol(&self, name: &str) -> bool {
        self.registry.is_declared_symbol(name)
    }

    /// Whether a function has been declared.
    pub fn is_declared_function(&self, name: &str) -> bool {
        self.registry.is_declared_function(name)
    }

    /// The unique constants declared for `ty`.
    pub fn unique_constants<'a>(&'a self, ty: &'a Type) -> impl Iterator<Item = &'a Constant> {
        self.registry.unique_constants(ty)
    }

    #[allow(missing_docs)]
    pub fn registry(&self) -> &DeclRegistry {
        &self.registry
    }

    #[allow(missing_docs)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[allow(missing_docs)]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::ProverContext;
    use crate::decl::{Constant, Function, GlobalVariable, Type};
    use crate::error::{DeclError, SessionError};
    use crate::testing::{Event, ScriptedBackend};
    use smtlib::sexp::{app, atom_s, parse};

    #[test]
    fn test_declarations_reach_backend() {
        let mut ctx = ProverContext::new(ScriptedBackend::new());
        ctx.declare_type("ref").unwrap();
        ctx.declare_constant(&Constant::unique("null", Type::ctor("ref")))
            .unwrap();
        ctx.declare_global_variable(&GlobalVariable::new("g", Type::Int))
            .unwrap();
        ctx.declare_function(&Function::new("f", [Type::ctor("ref")], Type::Bool))
            .unwrap();
        assert_eq!(
            ctx.backend().events(),
            &[
                Event::DeclareType("ref".to_string()),
                Event::DeclareConstant("null".to_string(), Type::ctor("ref")),
                Event::DeclareConstant("g".to_string(), Type::Int),
                Event::DeclareFunction(
                    "f".to_string(),
                    vec![Type::ctor("ref")],
                    Type::Bool
                ),
            ]
        );
        assert!(ctx.is_declared_symbol("g"));
        assert!(ctx.is_declared_function("f"));
        assert!(!ctx.is_declared_symbol("f"));
        assert_eq!(ctx.unique_constants(&Type::ctor("ref")).count(), 1);
    }

    #[test]
    fn test_rejected_before_backend() {
        let mut ctx = ProverContext::new(ScriptedBackend::new());
        ctx.declare_constant(&Constant::new("x", Type::Int)).unwrap();
        let err = ctx
            .declare_constant(&Constant::new("x", Type::Int))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Declaration(DeclError::Duplicate { .. })
        ));

        let mut f = Function::new("f", [Type::Int], Type::Int);
        f.outputs.push(Type::Int);
        let err = ctx.declare_function(&f).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Declaration(DeclError::Arity { outputs: 2, .. })
        ));
        // only the first declaration got through
        assert_eq!(ctx.backend().events().len(), 1);
    }

    #[test]
    fn test_axioms() {
        let mut ctx = ProverContext::new(ScriptedBackend::new());
        assert_eq!(ctx.axioms(), atom_s("true"));
        let a = parse("(> x 0)").unwrap();
        ctx.add_axiom(a.clone());
        assert_eq!(ctx.axioms(), a);
        ctx.add_axiom(parse("(> y 0)").unwrap());
        insta::assert_snapshot!(ctx.axioms(), @"(and (> x 0) (> y 0))");
        assert_eq!(ctx.num_axioms(), 2);
        assert_eq!(ctx.axioms(), app("and", [a, parse("(> y 0)").unwrap()]));
        // axioms are held back until the theory is asserted
        assert!(ctx.backend().events().is_empty());
    }
}
