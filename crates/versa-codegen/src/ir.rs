//! Statements and expressions of generated method bodies.
//!
//! Bodies are straight-line delegations: read a variable or field, cast,
//! call, construct, assign, return.

use versa_classfile::{FieldType, MethodDescriptor};
use versa_core::QualifiedName;

use crate::types::{AnyJavaType, JavaClassType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// Static access through a class.
    Class(JavaClassType),
    Super,
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfConstructor {
    This,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Return(Expression),
    Assignment {
        target: Expression,
        value: Expression,
    },
    /// `this(...)` or `super(...)`; only valid as the first statement of a constructor.
    ConstructorCall {
        kind: SelfConstructor,
        parameter_types: Vec<FieldType>,
        arguments: Vec<Expression>,
    },
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Variable(String),
    Cast {
        target: Box<Expression>,
        cast_to: AnyJavaType,
    },
    Field {
        receiver: Receiver,
        name: String,
        owner: QualifiedName,
        field_type: FieldType,
    },
    /// A `None` receiver calls an instance method on `this`.
    MethodCall {
        receiver: Option<Receiver>,
        name: String,
        owner: QualifiedName,
        descriptor: MethodDescriptor,
        arguments: Vec<Expression>,
    },
    /// `new T(...)`, or `outer.new T(...)` for inner classes.
    ConstructorCall {
        outer: Option<Box<Expression>>,
        constructing: JavaClassType,
        parameter_types: Vec<FieldType>,
        arguments: Vec<Expression>,
    },
    /// `new T[size]`
    ArrayConstructor {
        component: JavaClassType,
        size: Box<Expression>,
    },
    This,
}

impl Expression {
    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn cast(target: Expression, cast_to: AnyJavaType) -> Self {
        Expression::Cast {
            target: Box::new(target),
            cast_to,
        }
    }

    /// `this.name`
    pub fn this_field(owner: &QualifiedName, name: impl Into<String>, field_type: FieldType) -> Self {
        Expression::Field {
            receiver: Receiver::Expression(Box::new(Expression::This)),
            name: name.into(),
            owner: owner.clone(),
            field_type,
        }
    }

    /// `Owner.name`
    pub fn static_field(owner: &QualifiedName, name: impl Into<String>, field_type: FieldType) -> Self {
        Expression::Field {
            receiver: Receiver::Class(JavaClassType::raw(owner)),
            name: name.into(),
            owner: owner.clone(),
            field_type,
        }
    }
}

/// One line of a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Statement(Statement),
    Comment(String),
}
