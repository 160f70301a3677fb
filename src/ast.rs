//! # Thyme Query Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for Thyme queries: small
//! expressions that resolve fields, call methods and functions, and combine
//! values with operators against a dynamic context.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes ([`Node`], [`Literal`], [`ArgumentList`])
//! - **[operators]** - Comparison, arithmetic, logical and unary operators
//!
//! ## Quick Start
//!
//! ```text
//! page.title ?? site.title
//! ```
//!
//! Resolves `title` on the `page` context entry, falling back to the site title.
//!
//! ## Core Concepts
//!
//! ### Member Access
//!
//! ```text
//! user.name            // member
//! user?.name           // null-safe member
//! items[0]             // subscript
//! user.avatar(128)     // method call
//! ```
//!
//! ### Closures
//!
//! Closures take zero or more parameters and have a single expression body:
//!
//! ```text
//! filter(items, (item) => item.price > 100)
//! ```
//!
//! ### Precedence
//!
//! From lowest to highest: `||`, `&&`, comparison, `??`, ternary, additive,
//! multiplicative, unary, postfix. Because the ternary binds tighter than
//! comparison, a comparison used as a condition must be parenthesized:
//!
//! ```text
//! (user.age >= 18) ? "adult" : "minor"
//! ```
//!
//! ## Immutability
//!
//! A tree is built once per query string and never mutated. Identical query
//! text always produces a structurally identical tree, which lets the runner
//! cache trees (and compiled programs) by the raw query string.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{ArgumentList, Literal, Node};
pub use operators::{ArithmeticOp, ComparisonOp, LogicalOp, UnaryOp};
pub use tokens::{Spanned, Token};
