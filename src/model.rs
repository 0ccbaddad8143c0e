//! Data model for extracted documentation, independent of any renderer.
//!
//! One [`SourceUnit`] per parsed file. Everything here is built by the
//! parser pipeline and only read afterwards, so fields are crate-visible and
//! consumers go through the accessors.

use crate::diagnostics::Diagnostic;
use serde::Serialize;

/// Complete documentation tree for one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceUnit {
    pub(crate) name: String,
    pub(crate) module: Entity,
    /// Valid blocks that could not be bound to any entity.
    pub(crate) orphans: Vec<DocBlock>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl SourceUnit {
    /// Name the unit was parsed under (usually the file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root entity. Its name is the `@package` target when one was given.
    pub fn module(&self) -> &Entity {
        &self.module
    }

    /// Top-level functions and classes, in declaration order.
    pub fn entities(&self) -> &[Entity] {
        &self.module.children
    }

    pub fn orphans(&self) -> &[DocBlock] {
        &self.orphans
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Look up an entity by dotted path relative to the module,
    /// e.g. `"PyClass.PyMethod"` or `"PyClass._memVar"`.
    pub fn find(&self, path: &str) -> Option<&Entity> {
        path.split('.')
            .try_fold(&self.module, |entity, segment| entity.get(segment))
    }

    /// Number of DocBlocks attached to entities anywhere in the tree.
    pub fn documented_count(&self) -> usize {
        self.module.walk().filter(|e| e.doc.is_some()).count()
    }
}

/// Closed set of documentable constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Module,
    Function,
    Class,
    Method,
    Constructor,
    InstanceMember,
    ClassVariable,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Module => "module",
            EntityKind::Function => "function",
            EntityKind::Class => "class",
            EntityKind::Method => "method",
            EntityKind::Constructor => "constructor",
            EntityKind::InstanceMember => "member",
            EntityKind::ClassVariable => "classvar",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            EntityKind::Function | EntityKind::Method | EntityKind::Constructor
        )
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, EntityKind::InstanceMember | EntityKind::ClassVariable)
    }
}

/// Python naming-convention visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// `__x` is private, `_x` protected; dunder names like `__init__` are public.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("__") && name.ends_with("__") && name.len() > 4 {
            Visibility::Public
        } else if name.starts_with("__") {
            Visibility::Private
        } else if name.starts_with('_') {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// 1-based
    pub line: usize,
    /// 0-based, in columns after tab expansion
    pub column: usize,
}

/// A documented (or documentable) construct in the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub(crate) kind: EntityKind,
    pub(crate) name: String,
    /// Qualified name of the owner; `None` for the module itself.
    pub(crate) scope: Option<String>,
    pub(crate) position: Position,
    pub(crate) visibility: Visibility,
    pub(crate) doc: Option<DocBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) signature: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) params: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) bases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) decorators: Vec<String>,
    /// Declared in this body: functions, classes, methods, class variables.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<Entity>,
    /// Instance members found through `self.x = ...` in method bodies.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) members: Vec<Entity>,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn qualified_name(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}.{}", scope, self.name),
            None => self.name.clone(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn doc(&self) -> Option<&DocBlock> {
        self.doc.as_ref()
    }

    /// Shorthand for the attached block's brief text.
    pub fn brief(&self) -> Option<&str> {
        self.doc.as_ref().map(|d| d.brief.as_str())
    }

    /// Raw parameter list such as `(self, x=1)`, for callables.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    pub fn decorators(&self) -> &[String] {
        &self.decorators
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Find a direct child or instance member by name.
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.children
            .iter()
            .chain(&self.members)
            .find(|e| e.name == name)
    }

    /// Depth-first, pre-order traversal including `self`.
    pub fn walk(&self) -> impl Iterator<Item = &Entity> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let entity = stack.pop()?;
            stack.extend(entity.members.iter().rev());
            stack.extend(entity.children.iter().rev());
            Some(entity)
        })
    }
}

/// Which convention a block was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStyle {
    /// `##` line comments continued with `#`
    StructuredComment,
    /// Triple-quoted string literal as first statement of a body
    DocstringLiteral,
}

/// Normalized documentation unit, independent of the source convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocBlock {
    pub brief: String,
    pub details: String,
    pub style: CommentStyle,
    /// 1-based line where the block starts.
    pub line: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Tags that address their block to a named entity instead of the next
/// declaration.
pub const ASSOCIATION_TAGS: &[&str] = &["package", "namespace", "var", "fn", "class"];

impl DocBlock {
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// First tag naming an explicit target, if any.
    pub fn association(&self) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| ASSOCIATION_TAGS.contains(&t.name.as_str()) && t.target.is_some())
    }

    /// Brief, details and tag texts as one string, for keyword checks.
    pub fn full_text(&self) -> String {
        let mut text = self.brief.clone();
        for part in std::iter::once(&self.details).chain(self.tags.iter().map(|t| &t.text)) {
            if !part.is_empty() {
                text.push('\n');
                text.push_str(part);
            }
        }
        text
    }
}

/// Inline command such as `@param self The object pointer.`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub text: String,
}
