//! Entity associator: indentation scopes, entity drafts, and block claims.
//!
//! Works on the flat token stream. Entities are recorded as drafts in an
//! arena (index 0 is the module); blocks are recorded as claims on drafts.
//! Blocks addressed by an association tag (`@var`, `@fn`, ...) are only
//! collected here and resolved by name in [`build`](crate::parser::build)
//! once every draft exists.

use crate::diagnostics::Diagnostic;
use crate::model::{DocBlock, EntityKind, Position, Tag};
use crate::options::ScanOptions;
use crate::parser::classify;
use crate::parser::scan::{Token, TokenKind};
use tracing::debug;

pub type DraftId = usize;

/// Arena index of the module draft.
pub const MODULE: DraftId = 0;

#[derive(Debug, Clone)]
pub struct Draft {
    pub kind: EntityKind,
    pub name: String,
    pub parent: Option<DraftId>,
    pub position: Position,
    pub signature: Option<String>,
    pub params: Vec<String>,
    pub bases: Vec<String>,
    pub decorators: Vec<String>,
}

impl Draft {
    fn new(kind: EntityKind, name: &str, parent: Option<DraftId>, position: Position) -> Self {
        Self {
            kind,
            name: name.to_string(),
            parent,
            position,
            signature: None,
            params: Vec::new(),
            bases: Vec::new(),
            decorators: Vec::new(),
        }
    }
}

/// How a block was bound, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    /// `##` block right before the declaration
    Preceding,
    /// First statement of the body
    Docstring,
    /// Explicit association tag
    Tagged,
}

#[derive(Debug)]
pub struct Claim {
    pub target: DraftId,
    pub rule: Rule,
    pub block: DocBlock,
}

/// Tag-addressed block waiting for name resolution.
#[derive(Debug)]
pub struct Deferred {
    /// Innermost class (or the module) enclosing the block
    pub scope: DraftId,
    pub tag: Tag,
    pub block: DocBlock,
}

/// Flat result of one association pass.
#[derive(Debug, Default)]
pub struct Associations {
    pub drafts: Vec<Draft>,
    pub claims: Vec<Claim>,
    pub deferred: Vec<Deferred>,
    pub orphans: Vec<DocBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the associator over a token stream.
pub fn associate<I>(unit_name: &str, tokens: I, options: &ScanOptions) -> Associations
where
    I: IntoIterator<Item = Token>,
{
    let mut associator = Associator::new(unit_name, options);
    for token in tokens {
        associator.push(token);
    }
    associator.finish()
}

// -- Scopes -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Class,
    Function,
    Method,
    /// Body whose contents are not documented (nested functions, classes
    /// defined inside functions).
    Opaque,
}

struct Frame {
    scope: Scope,
    entity: Option<DraftId>,
    header_indent: usize,
    /// Set by the first code line of the body.
    body_indent: Option<usize>,
    awaiting_first: bool,
    /// Instance-reference parameter and owning class, for methods.
    receiver: Option<(String, DraftId)>,
}

impl Frame {
    fn body(scope: Scope, entity: Option<DraftId>, header_indent: usize) -> Self {
        Self {
            scope,
            entity,
            header_indent,
            body_indent: None,
            awaiting_first: true,
            receiver: None,
        }
    }
}

struct Associator<'o> {
    options: &'o ScanOptions,
    frames: Vec<Frame>,
    out: Associations,
    /// Untagged `##` block waiting for the next declaration.
    pending: Option<DocBlock>,
    decorators: Vec<String>,
    seen_code: bool,
}

impl<'o> Associator<'o> {
    fn new(unit_name: &str, options: &'o ScanOptions) -> Self {
        let module = Draft::new(EntityKind::Module, unit_name, None, Position { line: 1, column: 0 });
        let mut root = Frame::body(Scope::Module, Some(MODULE), 0);
        root.body_indent = Some(0);
        Self {
            options,
            frames: vec![root],
            out: Associations {
                drafts: vec![module],
                ..Default::default()
            },
            pending: None,
            decorators: Vec::new(),
            seen_code: false,
        }
    }

    fn push(&mut self, token: Token) {
        let Token { line, indent, kind } = token;
        let position = Position { line, column: indent };

        if let TokenKind::Comment(lines) = &kind {
            self.on_comment(lines, line, indent);
            return;
        }

        self.close_frames(indent);
        self.seen_code = true;
        let first = self.take_first_statement();

        if let TokenKind::StringLiteral { .. } = &kind {
            self.drop_pending("string statement");
            self.decorators.clear();
            if let (true, Some(entity)) = (first, self.top().entity) {
                if let Some(block) = classify::classify(&kind, line, self.options) {
                    self.accept(block, entity, Rule::Docstring, indent);
                }
            }
            return;
        }

        match kind {
            TokenKind::Def {
                name,
                params,
                signature,
                inline_body,
            } => {
                let decorators = std::mem::take(&mut self.decorators);
                let (scope, owner) = (self.top().scope, self.top().entity);
                let kind = match scope {
                    Scope::Module => Some(EntityKind::Function),
                    Scope::Class if name == self.options.initializer => Some(EntityKind::Constructor),
                    Scope::Class => Some(EntityKind::Method),
                    _ => None,
                };
                let receiver = match (kind, owner) {
                    (Some(EntityKind::Method | EntityKind::Constructor), Some(class)) => {
                        receiver_param(&params, &decorators).map(|p| (p, class))
                    }
                    _ => None,
                };
                let entity = kind.map(|kind| {
                    let mut draft = Draft::new(kind, &name, owner, position);
                    draft.signature = Some(signature);
                    draft.params = params;
                    draft.decorators = decorators;
                    self.add_draft(draft)
                });
                self.bind_pending(entity);

                if !inline_body {
                    let body_scope = match kind {
                        Some(EntityKind::Function) => Scope::Function,
                        Some(_) => Scope::Method,
                        None => Scope::Opaque,
                    };
                    let mut frame = Frame::body(body_scope, entity, indent);
                    frame.receiver = receiver;
                    self.frames.push(frame);
                }
            }
            TokenKind::Class {
                name,
                bases,
                inline_body,
            } => {
                let decorators = std::mem::take(&mut self.decorators);
                let (scope, owner) = (self.top().scope, self.top().entity);
                let entity = matches!(scope, Scope::Module | Scope::Class).then(|| {
                    let mut draft = Draft::new(EntityKind::Class, &name, owner, position);
                    draft.bases = bases;
                    draft.decorators = decorators;
                    self.add_draft(draft)
                });
                self.bind_pending(entity);

                if !inline_body {
                    let body_scope = if entity.is_some() { Scope::Class } else { Scope::Opaque };
                    self.frames.push(Frame::body(body_scope, entity, indent));
                }
            }
            TokenKind::Assign(targets) => {
                self.decorators.clear();
                self.on_assign(&targets, position);
            }
            TokenKind::Decorator(name) => self.decorators.push(name),
            TokenKind::Statement => {
                self.drop_pending("not followed by a declaration");
                self.decorators.clear();
            }
            TokenKind::Malformed(reason) => {
                self.drop_pending("malformed region follows");
                self.decorators.clear();
                self.out.diagnostics.push(Diagnostic::MalformedBlock { line, reason });
            }
            TokenKind::Comment(_) | TokenKind::StringLiteral { .. } => {}
        }
    }

    fn finish(mut self) -> Associations {
        self.drop_pending("end of input");
        self.out
    }

    // -- Scope tracking ---------------------------------------------------------

    /// Pop the frames a code token at `indent` has left. Only code moves
    /// scopes; comment indentation is not significant.
    fn close_frames(&mut self, indent: usize) {
        loop {
            let Some(top) = self.frames.last() else { break };
            let (scope, body, header) = (top.scope, top.body_indent, top.header_indent);
            if scope == Scope::Module {
                break;
            }
            match body {
                Some(body) if indent >= body => break,
                None if indent > header => {
                    if let Some(top) = self.frames.last_mut() {
                        top.body_indent = Some(indent);
                    }
                    break;
                }
                _ => {
                    self.frames.pop();
                }
            }
        }
    }

    fn top(&self) -> &Frame {
        // The module frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    fn take_first_statement(&mut self) -> bool {
        match self.frames.last_mut() {
            Some(top) => std::mem::replace(&mut top.awaiting_first, false),
            None => false,
        }
    }

    /// Innermost class whose body a line at `indent` would sit in, or the
    /// module. Frames are left untouched.
    fn enclosing_scope(&self, indent: usize) -> DraftId {
        self.frames
            .iter()
            .rev()
            .skip_while(|f| match f.body_indent {
                Some(body) => indent < body,
                None => indent <= f.header_indent,
            })
            .find(|f| f.scope == Scope::Class)
            .and_then(|f| f.entity)
            .unwrap_or(MODULE)
    }

    // -- Blocks -----------------------------------------------------------------

    fn on_comment(&mut self, lines: &[String], line: usize, indent: usize) {
        // A newer block always replaces a waiting one.
        self.drop_pending("superseded by a later block");

        let Some(block) = classify::classify_comment(lines, line) else {
            return;
        };
        if block.association().is_none()
            && self.options.skip_license_header
            && !self.seen_code
            && self.options.is_license_text(&block.full_text())
        {
            debug!(line, "skipping license header block");
            return;
        }
        if block.association().is_some() {
            let scope = self.enclosing_scope(indent);
            self.defer(block, scope);
        } else {
            self.pending = Some(block);
        }
    }

    /// Record a block for `target`, unless it names its own target.
    fn accept(&mut self, block: DocBlock, target: DraftId, rule: Rule, indent: usize) {
        if block.association().is_some() {
            let scope = self.enclosing_scope(indent);
            self.defer(block, scope);
        } else {
            self.out.claims.push(Claim { target, rule, block });
        }
    }

    fn defer(&mut self, block: DocBlock, scope: DraftId) {
        let Some(tag) = block.association().cloned() else {
            return;
        };
        self.out.deferred.push(Deferred { scope, tag, block });
    }

    /// Bind the waiting block to `entity`, or orphan it when the declaration
    /// produced no entity.
    fn bind_pending(&mut self, entity: Option<DraftId>) {
        let Some(block) = self.pending.take() else {
            return;
        };
        match entity {
            Some(target) => self.out.claims.push(Claim {
                target,
                rule: Rule::Preceding,
                block,
            }),
            None => {
                self.out.diagnostics.push(Diagnostic::OrphanedDocBlock {
                    line: block.line,
                    target: None,
                });
                self.out.orphans.push(block);
            }
        }
    }

    fn drop_pending(&mut self, reason: &str) {
        if let Some(block) = self.pending.take() {
            debug!(line = block.line, reason, "dropping documentation block");
        }
    }

    // -- Entities ---------------------------------------------------------------

    fn on_assign(&mut self, targets: &[String], position: Position) {
        let top = self.top();
        let (scope, entity, receiver) = (top.scope, top.entity, top.receiver.clone());
        match (scope, entity, receiver) {
            (Scope::Class, Some(class), _) => {
                let mut first = None;
                for target in targets.iter().filter(|t| !t.contains('.')) {
                    let id = self.variable(class, EntityKind::ClassVariable, target, position);
                    first.get_or_insert(id);
                }
                self.bind_pending(first);
            }
            (Scope::Method, _, Some((receiver, class))) => {
                for target in targets {
                    let attr = target
                        .strip_prefix(receiver.as_str())
                        .and_then(|rest| rest.strip_prefix('.'))
                        .filter(|attr| !attr.contains('.'));
                    if let Some(attr) = attr {
                        self.variable(class, EntityKind::InstanceMember, attr, position);
                    }
                }
                // Instance members are only documented through `@var`.
                self.bind_pending(None);
            }
            _ => self.bind_pending(None),
        }
    }

    /// Existing variable of `class` with this name and kind, or a new one.
    /// A class variable and an instance member may share a name.
    fn variable(&mut self, class: DraftId, kind: EntityKind, name: &str, position: Position) -> DraftId {
        let existing = self
            .out
            .drafts
            .iter()
            .position(|d| d.parent == Some(class) && d.kind == kind && d.name == name);
        match existing {
            Some(id) => id,
            None => self.add_draft(Draft::new(kind, name, Some(class), position)),
        }
    }

    fn add_draft(&mut self, draft: Draft) -> DraftId {
        self.out.drafts.push(draft);
        self.out.drafts.len() - 1
    }
}

/// First parameter of a method, unless it is a static or class method.
fn receiver_param(params: &[String], decorators: &[String]) -> Option<String> {
    let unbound = decorators
        .iter()
        .any(|d| d == "staticmethod" || d == "classmethod");
    if unbound {
        return None;
    }
    params.first().filter(|p| !p.starts_with('*')).cloned()
}
