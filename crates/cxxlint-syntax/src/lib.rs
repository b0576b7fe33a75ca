//! # cxxlint-syntax
//!
//! Error-tolerant C++ front end for cxxlint.
//!
//! - [`tokenize`] turns source text into [`Token`]s without ever failing.
//! - [`extract`] builds a [`DeclarationModel`]: the entities a file declares,
//!   the scope tree they live in, and [`ParseNote`]s for regions that could
//!   not be recognized.
//!
//! No preprocessing, overload resolution or type checking is attempted.
//!
//! ## Example
//!
//! ```
//! use cxxlint_syntax::{extract, tokenize, EntityKind};
//!
//! let tokens: Vec<_> = tokenize("constexpr int kLimit = 4;").collect();
//! let model = extract(&tokens);
//! assert_eq!(model.entities()[0].kind, EntityKind::Constant);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extract;
mod lexer;
mod model;

pub use extract::extract;
pub use lexer::{is_keyword, is_type_keyword, tokenize, Lexer, Position, Span, Token, TokenKind};
pub use model::{
    Confidence, DeclarationModel, Entity, EntityFlags, EntityId, EntityKind, Param, ParseNote,
    Scope, ScopeId, ScopeKind, Signature, StorageClass,
};
