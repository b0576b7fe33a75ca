//! Declaration model: declared entities and the scope tree that holds them.
//!
//! Scopes and entities live in flat vectors and refer to each other by index.
//! A scope's parent always has a smaller index than the scope itself, so the
//! scope chain of any entity is acyclic and ends at the file root (index 0).

use std::fmt;
use std::ops::Range;

use crate::lexer::Span;

/// Index of an entity inside a [`DeclarationModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub usize);

/// Index of a scope inside a [`DeclarationModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

/// Syntactic role of a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `class Name`
    Class,
    /// `struct Name` or `union Name`
    Struct,
    /// `enum Name` or `enum class Name`
    Enum,
    /// Enumerator inside an enum body.
    EnumVariant,
    /// Free function.
    Function,
    /// Function whose enclosing scope is a class.
    Method,
    /// Object declaration, members included.
    Variable,
    /// Named function parameter.
    Parameter,
    /// `constexpr` object, or top-level `const` object at namespace scope.
    Constant,
    /// `namespace Name` or a namespace alias.
    Namespace,
    /// Template type or non-type parameter.
    TemplateParameter,
    /// `using Name = ...;` or `typedef ... Name;`
    TypeAlias,
    /// `#define NAME`
    Macro,
}

impl EntityKind {
    /// Returns true for kinds that name a type.
    #[must_use]
    pub fn is_type_like(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Struct | Self::Enum | Self::TypeAlias | Self::TemplateParameter
        )
    }

    /// Returns true for functions and methods.
    #[must_use]
    pub fn is_callable(self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }

    /// Lower-case display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::EnumVariant => "enumerator",
            Self::Function => "function",
            Self::Method => "method",
            Self::Variable => "variable",
            Self::Parameter => "parameter",
            Self::Constant => "constant",
            Self::Namespace => "namespace",
            Self::TemplateParameter => "template parameter",
            Self::TypeAlias => "type alias",
            Self::Macro => "macro",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sure the extractor is about an entity's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    /// Shape matched a known pattern.
    #[default]
    High,
    /// Ambiguous shape resolved by a default; rules should not act on it.
    Low,
}

/// Storage class specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageClass {
    /// No storage specifier.
    #[default]
    Automatic,
    /// `static`
    Static,
    /// `extern`
    Extern,
    /// `thread_local`
    ThreadLocal,
}

/// Declaration flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct EntityFlags {
    /// Top-level `const` on the declared object.
    pub is_const: bool,
    /// `constexpr` or `constinit`.
    pub is_constexpr: bool,
    /// `static` specifier present.
    pub is_static: bool,
    /// `enum class` / `enum struct`.
    pub is_scoped_enum: bool,
    /// Declarator is a pointer (not a pointer inside template arguments).
    pub is_pointer: bool,
    /// Declarator is a pointer or reference to function.
    pub is_function_pointer: bool,
    /// Declared directly inside a class body.
    pub is_member: bool,
    /// Forward declaration without a body.
    pub is_forward_decl: bool,
    /// Constructor, destructor, operator or conversion function.
    pub is_special: bool,
    /// Method marked `override` or `final`.
    pub is_override: bool,
    /// Name was written with a `Scope::` qualifier.
    pub is_qualified: bool,
    /// Declaration has a body or initializer.
    pub is_definition: bool,
    /// Storage class.
    pub storage: StorageClass,
}

/// One parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Normalized type text, without the parameter name.
    pub type_text: String,
    /// Parameter name, when written.
    pub name: Option<String>,
    /// Entity created for a named parameter.
    pub entity: Option<EntityId>,
    /// Span of the whole parameter declaration.
    pub span: Span,
}

/// Parameter list of a function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Declared parameters, in order. `(void)` yields none.
    pub params: Vec<Param>,
    /// Trailing `...`.
    pub variadic: bool,
}

/// A declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Own index.
    pub id: EntityId,
    /// Role.
    pub kind: EntityKind,
    /// Identifier text as written (e.g. `operator==` for operators).
    pub name: String,
    /// Enclosing scope. Non-owning back reference into the same model.
    pub scope: ScopeId,
    /// Span of the name token.
    pub span: Span,
    /// Index of the name token in the token slice given to the extractor.
    pub token: usize,
    /// Index of the introducing keyword (`enum`, `class`, `namespace`, ...).
    pub keyword: Option<usize>,
    /// Normalized declared type, for objects and parameters.
    pub type_text: Option<String>,
    /// Token index range of the initializer expression.
    pub initializer: Option<Range<usize>>,
    /// Scope opened by this entity (class body, function, enum body, ...).
    pub body: Option<ScopeId>,
    /// Parameter list, for functions and methods.
    pub signature: Option<Signature>,
    /// Declaration flags.
    pub flags: EntityFlags,
    /// Classification confidence.
    pub confidence: Confidence,
}

/// Kind of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Whole translation unit.
    File,
    /// Namespace body, named or anonymous.
    Namespace,
    /// Class, struct or union body.
    Class,
    /// Enum body.
    Enum,
    /// Function parameters and body.
    Function,
    /// Compound statement or statement with an init clause.
    Block,
    /// Template parameter list plus the declaration it introduces.
    Template,
}

/// A lexical scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Own index.
    pub id: ScopeId,
    /// Kind.
    pub kind: ScopeKind,
    /// Enclosing scope; `None` only for the file root.
    pub parent: Option<ScopeId>,
    /// Entity that introduced the scope, if named.
    pub owner: Option<EntityId>,
    /// Byte range the scope covers.
    pub span: Span,
}

/// A region the extractor could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNote {
    /// Location of the skipped region.
    pub span: Span,
    /// What went wrong.
    pub message: String,
}

/// Per-file result of declaration extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationModel {
    pub(crate) entities: Vec<Entity>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) notes: Vec<ParseNote>,
}

impl DeclarationModel {
    /// Creates a model containing only the file root scope.
    #[must_use]
    pub fn new(file_span: Span) -> Self {
        Self {
            entities: Vec::new(),
            scopes: vec![Scope {
                id: ScopeId(0),
                kind: ScopeKind::File,
                parent: None,
                owner: None,
                span: file_span,
            }],
            notes: Vec::new(),
        }
    }

    /// The file root scope.
    #[must_use]
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// All entities in extraction order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All scopes; index 0 is the root.
    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Unparsed-region notes.
    #[must_use]
    pub fn notes(&self) -> &[ParseNote] {
        &self.notes
    }

    /// Looks up an entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    /// Looks up a scope.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Iterates from `id` up to and including the root.
    pub fn scope_chain(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(self.scope(id)), move |s| {
            s.parent.map(|p| self.scope(p))
        })
    }

    /// Nearest enclosing scope that is not a template parameter scope.
    #[must_use]
    pub fn semantic_scope(&self, id: ScopeId) -> &Scope {
        self.scope_chain(id)
            .find(|s| s.kind != ScopeKind::Template)
            .unwrap_or_else(|| self.scope(self.root()))
    }

    /// Nearest enclosing function scope, if any.
    #[must_use]
    pub fn enclosing_function(&self, id: ScopeId) -> Option<&Scope> {
        self.scope_chain(id).find(|s| s.kind == ScopeKind::Function)
    }

    /// Returns true if `inner` is `outer` or nested inside it.
    #[must_use]
    pub fn is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
        self.scope_chain(inner).any(|s| s.id == outer)
    }

    /// Entities declared directly in `scope`.
    pub fn entities_in(&self, scope: ScopeId) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |e| e.scope == scope)
    }

    /// Entities visible by unqualified name from `scope`.
    ///
    /// Walks the scope chain; enumerators of an unscoped enum are visible in
    /// the enum's enclosing scope.
    pub fn lookup<'m>(&'m self, scope: ScopeId, name: &'m str) -> impl Iterator<Item = &'m Entity> {
        let chain: Vec<ScopeId> = self.scope_chain(scope).map(|s| s.id).collect();
        self.entities.iter().filter(move |e| {
            if e.name != name {
                return false;
            }
            if chain.contains(&e.scope) {
                return true;
            }
            let home = self.scope(e.scope);
            home.kind == ScopeKind::Enum
                && home.parent.is_some_and(|p| chain.contains(&p))
                && home
                    .owner
                    .map_or(true, |o| !self.entity(o).flags.is_scoped_enum)
        })
    }

    /// Named parameters of a function entity.
    pub fn parameters(&self, function: EntityId) -> impl Iterator<Item = &Entity> + '_ {
        self.entity(function)
            .signature
            .iter()
            .flat_map(|s| s.params.iter())
            .filter_map(move |p| p.entity.map(|id| self.entity(id)))
    }

    /// Entity that owns `scope`, if any.
    #[must_use]
    pub fn owner(&self, scope: ScopeId) -> Option<&Entity> {
        self.scope(scope).owner.map(|id| self.entity(id))
    }

    pub(crate) fn push_scope(
        &mut self,
        kind: ScopeKind,
        parent: ScopeId,
        owner: Option<EntityId>,
        span: Span,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            id,
            kind,
            parent: Some(parent),
            owner,
            span,
        });
        id
    }

    pub(crate) fn push_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        entity.id = id;
        self.entities.push(entity);
        id
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }
}
