// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Bookkeeping of what has been declared in a session.
//!
//! The registry is append-only and is the authority on whether a symbol is
//! already declared; it never talks to the solver itself (that is
//! [`ProverContext`](crate::context::ProverContext)'s job).

use std::collections::{HashMap, HashSet};

use crate::decl::{Constant, DeclKind, Declaration, Function, GlobalVariable, Type};
use crate::error::DeclError;

/// Declarations made so far, in order, with one namespace for types, one for
/// 0-ary symbols (constants and global variables look the same to the
/// solver), and one for functions.
#[derive(Debug, Clone, Default)]
pub struct DeclRegistry {
    decls: Vec<Declaration>,
    types: HashSet<String>,
    symbols: HashMap<String, DeclKind>,
    functions: HashSet<String>,
}

impl DeclRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_types<'a, I>(&self, name: &str, tys: I) -> Result<(), DeclError>
    where
        I: IntoIterator<Item = &'a Type>,
    {
        for ty in tys {
            if let Some(ctor) = ty.ctors().into_iter().find(|c| !self.types.contains(*c)) {
                return Err(DeclError::UndeclaredType {
                    name: name.to_string(),
                    ty: Type::ctor(ctor),
                });
            }
        }
        Ok(())
    }

    fn check_symbol(&self, kind: DeclKind, name: &str, ty: &Type) -> Result<(), DeclError> {
        if self.symbols.contains_key(name) {
            return Err(DeclError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
        self.check_types(name, [ty])
    }

    /// Record a type constructor.
    pub fn declare_type(&mut self, name: &str) -> Result<(), DeclError> {
        if !self.types.insert(name.to_string()) {
            return Err(DeclError::Duplicate {
                kind: DeclKind::Type,
                name: name.to_string(),
            });
        }
        self.decls.push(Declaration::Type(name.to_string()));
        Ok(())
    }

    /// Record a constant.
    pub fn declare_constant(&mut self, c: &Constant) -> Result<(), DeclError> {
        self.check_symbol(DeclKind::Constant, &c.name, &c.ty)?;
        self.symbols.insert(c.name.clone(), DeclKind::Constant);
        self.decls.push(Declaration::Constant(c.clone()));
        Ok(())
    }

    /// Check that a function can be declared at all, returning its single
    /// output type. Nothing is recorded.
    pub fn check_function<'f>(&self, f: &'f Function) -> Result<&'f Type, DeclError> {
        let [range] = f.outputs.as_slice() else {
            return Err(DeclError::Arity {
                name: f.name.clone(),
                outputs: f.outputs.len(),
            });
        };
        if self.functions.contains(&f.name) {
            return Err(DeclError::Duplicate {
                kind: DeclKind::Function,
                name: f.name.clone(),
            });
        }
        self.check_types(&f.name, f.inputs.iter().chain([range]))?;
        Ok(range)
    }

    /// Record a function.
    pub fn declare_function(&mut self, f: &Function) -> Result<(), DeclError> {
        self.check_function(f)?;
        self.functions.insert(f.name.clone());
        self.decls.push(Declaration::Function(f.clone()));
        Ok(())
    }

    /// Record a global variable.
    pub fn declare_global_variable(&mut self, v: &GlobalVariable) -> Result<(), DeclError> {
        self.check_symbol(DeclKind::GlobalVariable, &v.name, &v.ty)?;
        self.symbols.insert(v.name.clone(), DeclKind::GlobalVariable);
        self.decls.push(Declaration::GlobalVariable(v.clone()));
        Ok(())
    }

    /// Whether a type constructor has been declared.
    pub fn is_declared_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    /// Whether a constant or global variable is declared under `name`.
    pub fn is_declared_symbol(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Whether a function has been declared.
    pub fn is_declared_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// All declarations, in the order they were made.
    pub fn declarations(&self) -> &[Declaration] {
        &self.decls
    }

    /// The constants in the disjointness partition of `ty`, in declaration
    /// order.
    pub fn unique_constants<'a>(&'a self, ty: &'a Type) -> impl Iterator<Item = &'a Constant> {
        self.decls.iter().filter_map(move |d| match d {
            Declaration::Constant(c) if c.unique && &c.ty == ty => Some(c),
            _ => None,
        })
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Whether nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
