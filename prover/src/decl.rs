// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Symbols of the logical theory that get declared to the solver.

use itertools::Itertools;
use serde::Serialize;
use std::fmt;

/// The type of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// Booleans
    Bool,
    /// Mathematical integers
    Int,
    /// Mathematical reals
    Real,
    /// Bit vectors of a fixed width
    BitVector(u32),
    /// Total maps from the domain (one or more arguments) to the range
    Map {
        /// argument types, in order
        domain: Vec<Type>,
        /// result type
        range: Box<Type>,
    },
    /// A type constructor introduced by [`Declaration::Type`]
    Ctor(String),
}

impl Type {
    /// Construct a type constructor reference.
    pub fn ctor<S: AsRef<str>>(name: S) -> Self {
        Type::Ctor(name.as_ref().to_string())
    }

    /// Construct a map type.
    pub fn map<I: IntoIterator<Item = Type>>(domain: I, range: Type) -> Self {
        Type::Map {
            domain: domain.into_iter().collect(),
            range: Box::new(range),
        }
    }

    /// All type constructors mentioned in this type.
    pub fn ctors(&self) -> Vec<&str> {
        match self {
            Type::Bool | Type::Int | Type::Real | Type::BitVector(_) => vec![],
            Type::Ctor(name) => vec![name.as_str()],
            Type::Map { domain, range } => domain
                .iter()
                .chain([range.as_ref()])
                .flat_map(|t| t.ctors())
                .collect(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Real => write!(f, "real"),
            Type::BitVector(w) => write!(f, "bv{w}"),
            Type::Map { domain, range } => {
                write!(f, "[{}]{range}", domain.iter().join(", "))
            }
            Type::Ctor(name) => write!(f, "{name}"),
        }
    }
}

/// A 0-ary symbol of the theory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constant {
    /// Symbol name
    pub name: String,
    /// Its type
    pub ty: Type,
    /// Whether the constant is part of a disjointness partition (all unique
    /// constants of a type are pairwise distinct)
    pub unique: bool,
}

impl Constant {
    /// A constant that is not part of any partition.
    pub fn new<S: AsRef<str>>(name: S, ty: Type) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ty,
            unique: false,
        }
    }

    /// A constant that is part of its type's disjointness partition.
    pub fn unique<S: AsRef<str>>(name: S, ty: Type) -> Self {
        Self {
            unique: true,
            ..Self::new(name, ty)
        }
    }
}

/// An n-ary function symbol of the theory.
///
/// The theory allows any number of outputs, but only functions with exactly
/// one output can be declared to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    /// Symbol name
    pub name: String,
    /// Argument types, in order
    pub inputs: Vec<Type>,
    /// Result types
    pub outputs: Vec<Type>,
}

impl Function {
    /// A function with a single output.
    pub fn new<S, I>(name: S, inputs: I, output: Type) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = Type>,
    {
        Self {
            name: name.as_ref().to_string(),
            inputs: inputs.into_iter().collect(),
            outputs: vec![output],
        }
    }
}

/// A mutable 0-ary symbol; the solver sees it as a constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalVariable {
    /// Symbol name
    pub name: String,
    /// Its type
    pub ty: Type,
}

impl GlobalVariable {
    #[allow(missing_docs)]
    pub fn new<S: AsRef<str>>(name: S, ty: Type) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ty,
        }
    }
}

/// Something that was declared, in the order it was declared.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Declaration {
    Type(String),
    Constant(Constant),
    Function(Function),
    GlobalVariable(GlobalVariable),
}

impl Declaration {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Type(name) => name,
            Declaration::Constant(c) => &c.name,
            Declaration::Function(f) => &f.name,
            Declaration::GlobalVariable(v) => &v.name,
        }
    }

    /// The kind of declaration.
    pub fn kind(&self) -> DeclKind {
        match self {
            Declaration::Type(_) => DeclKind::Type,
            Declaration::Constant(_) => DeclKind::Constant,
            Declaration::Function(_) => DeclKind::Function,
            Declaration::GlobalVariable(_) => DeclKind::GlobalVariable,
        }
    }
}

/// The kinds of [`Declaration`].
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Type,
    Constant,
    Function,
    GlobalVariable,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclKind::Type => "type",
            DeclKind::Constant => "constant",
            DeclKind::Function => "function",
            DeclKind::GlobalVariable => "global variable",
        };
        write!(f, "{s}")
    }
}
