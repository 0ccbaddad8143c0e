//! Model builder: resolve tag references, settle conflicts, assemble the tree.
//!
//! Runs after association, so a tag may reference an entity declared later
//! in the file.

use crate::diagnostics::Diagnostic;
use crate::model::{DocBlock, Entity, EntityKind, SourceUnit, Visibility};
use crate::parser::associate::{Associations, Claim, Deferred, Draft, DraftId, Rule, MODULE};
use tracing::debug;

/// Turn flat association results into a [`SourceUnit`].
pub fn build(unit_name: &str, assoc: Associations) -> SourceUnit {
    let Associations {
        mut drafts,
        mut claims,
        deferred,
        mut orphans,
        mut diagnostics,
    } = assoc;

    // Second pass: tag-addressed blocks.
    for Deferred { scope, tag, block } in deferred {
        if matches!(tag.name.as_str(), "package" | "namespace") {
            if let Some(name) = &tag.target {
                if drafts[MODULE].name == unit_name {
                    drafts[MODULE].name = name.clone();
                }
            }
        }
        match resolve(&drafts, scope, &tag.name, tag.target.as_deref()) {
            Some(target) => claims.push(Claim {
                target,
                rule: Rule::Tagged,
                block,
            }),
            None => {
                debug!(line = block.line, target = ?tag.target, "unresolved @{}", tag.name);
                diagnostics.push(Diagnostic::OrphanedDocBlock {
                    line: block.line,
                    target: tag.target,
                });
                orphans.push(block);
            }
        }
    }

    // Higher rule wins; among equal rules the later block wins.
    let mut docs: Vec<Option<(Rule, DocBlock)>> = vec![None; drafts.len()];
    for Claim { target, rule, block } in claims {
        let incoming = (rule, block);
        let (kept, dropped) = match docs[target].take() {
            None => (incoming, None),
            Some(current) => {
                if (incoming.0, incoming.1.line) >= (current.0, current.1.line) {
                    (incoming, Some(current))
                } else {
                    (current, Some(incoming))
                }
            }
        };
        if let Some((_, lost)) = dropped {
            diagnostics.push(Diagnostic::DuplicateAssociation {
                entity: qualified_name(&drafts, target),
                kept: kept.1.line,
                dropped: lost.line,
            });
            orphans.push(lost);
        }
        docs[target] = Some(kept);
    }

    diagnostics.sort_by_key(Diagnostic::line);
    orphans.sort_by_key(|b| b.line);

    let mut children: Vec<Vec<DraftId>> = vec![Vec::new(); drafts.len()];
    for (id, draft) in drafts.iter().enumerate() {
        if let Some(parent) = draft.parent {
            children[parent].push(id);
        }
    }

    let mut assembler = Assembler {
        drafts: &drafts,
        children: &children,
        docs,
    };
    let module = assembler.entity(MODULE, None);

    SourceUnit {
        name: unit_name.to_string(),
        module,
        orphans,
        diagnostics,
    }
}

/// Find the draft a tag points at.
fn resolve(drafts: &[Draft], scope: DraftId, tag: &str, target: Option<&str>) -> Option<DraftId> {
    match tag {
        "package" | "namespace" => Some(MODULE),
        "var" => {
            let target = target?;
            lookup(drafts, scope, target, |k| k == EntityKind::InstanceMember)
                .or_else(|| lookup(drafts, scope, target, |k| k == EntityKind::ClassVariable))
        }
        "fn" => {
            let target = target?;
            lookup(drafts, scope, target, |k| k.is_callable())
                .or_else(|| lookup_anywhere(drafts, target, |k| k.is_callable()))
        }
        "class" => {
            let target = target?;
            lookup(drafts, scope, target, |k| k == EntityKind::Class)
                .or_else(|| lookup_anywhere(drafts, target, |k| k == EntityKind::Class))
        }
        _ => None,
    }
}

/// Resolve `name` among the direct children of `scope`. Qualified names
/// (`Outer.Inner.x`, `Outer::x`) are walked from the module instead.
fn lookup(drafts: &[Draft], scope: DraftId, name: &str, accept: impl Fn(EntityKind) -> bool) -> Option<DraftId> {
    let path: Vec<&str> = name.split("::").flat_map(|p| p.split('.')).collect();
    let (last, parents) = path.split_last()?;
    let mut owner = scope;
    if !parents.is_empty() {
        owner = MODULE;
        for segment in parents {
            owner = child(drafts, owner, segment, |k| !k.is_variable())?;
        }
    }
    child(drafts, owner, last, accept)
}

fn lookup_anywhere(drafts: &[Draft], name: &str, accept: impl Fn(EntityKind) -> bool) -> Option<DraftId> {
    drafts
        .iter()
        .position(|d| d.name == name && accept(d.kind))
}

fn child(drafts: &[Draft], parent: DraftId, name: &str, accept: impl Fn(EntityKind) -> bool) -> Option<DraftId> {
    drafts
        .iter()
        .position(|d| d.parent == Some(parent) && d.name == name && accept(d.kind))
}

fn qualified_name(drafts: &[Draft], id: DraftId) -> String {
    let mut parts = vec![drafts[id].name.as_str()];
    let mut current = drafts[id].parent;
    while let Some(parent) = current {
        parts.push(drafts[parent].name.as_str());
        current = drafts[parent].parent;
    }
    parts.reverse();
    parts.join(".")
}

struct Assembler<'a> {
    drafts: &'a [Draft],
    children: &'a [Vec<DraftId>],
    docs: Vec<Option<(Rule, DocBlock)>>,
}

impl Assembler<'_> {
    fn entity(&mut self, id: DraftId, scope: Option<String>) -> Entity {
        let (drafts, tree) = (self.drafts, self.children);
        let draft = &drafts[id];
        let qualified = match &scope {
            Some(scope) => format!("{}.{}", scope, draft.name),
            None => draft.name.clone(),
        };

        let mut children = Vec::new();
        let mut members = Vec::new();
        for &child in &tree[id] {
            let entity = self.entity(child, Some(qualified.clone()));
            if entity.kind == EntityKind::InstanceMember {
                members.push(entity);
            } else {
                children.push(entity);
            }
        }

        Entity {
            kind: draft.kind,
            name: draft.name.clone(),
            scope,
            position: draft.position,
            visibility: Visibility::from_name(&draft.name),
            doc: self.docs[id].take().map(|(_, block)| block),
            signature: draft.signature.clone(),
            params: draft.params.clone(),
            bases: draft.bases.clone(),
            decorators: draft.decorators.clone(),
            children,
            members,
        }
    }
}
