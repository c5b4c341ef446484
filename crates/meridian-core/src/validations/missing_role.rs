// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multipolygon members without a role.
use std::sync::Arc;

use crate::context::RuleContext;
use crate::entity::{Entity, Member, Relation};
use crate::issue::{Fix, FixCommand, Issue, IssueInfo, Severity};
use crate::rule::{entity_subject, Rule, RuleResult, Subject};

/// Rule id.
pub const ID: &str = "missing_role";

fn lacks_role(member: &Member) -> bool {
    member.role.trim().is_empty()
}

/// The missing-role rule.
#[derive(Debug, Default)]
pub struct MissingRole;

fn make_issue(cx: &RuleContext<'_>, relation: &Relation, index: usize) -> Option<Arc<Issue>> {
    let member = relation.members.get(index)?;
    let way = cx.graph.entity(member.id).filter(|e| e.as_way().is_some())?;
    let rel = cx.graph.entity(relation.id)?;
    let issue = Issue::builder(ID, Severity::Warning)
        .message(format!(
            "{} has no role within {}.",
            cx.label(way),
            cx.label(rel)
        ))
        .tooltip("Multipolygon members need an outer or inner role.")
        .entities(vec![Arc::clone(rel), Arc::clone(way)])
        .info(IssueInfo::MissingRole {
            member_index: index,
        })
        .hash(index.to_string())
        .fix(
            Fix::new("Use \"outer\"", FixCommand::SetMemberRole { role: "outer" })
                .icon("outer"),
        )
        .fix(
            Fix::new("Use \"inner\"", FixCommand::SetMemberRole { role: "inner" })
                .icon("inner"),
        )
        .fix(
            Fix::new("Remove from relation", FixCommand::RemoveFromRelation)
                .icon("remove"),
        )
        .build();
    Some(Arc::new(issue))
}

impl Rule for MissingRole {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Missing Roles"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let issues = match entity.as_ref() {
            Entity::Way(way) => cx
                .graph
                .parent_multipolygons(way.id)
                .into_iter()
                .flat_map(|rel| {
                    rel.members
                        .iter()
                        .enumerate()
                        .filter(|(_, m)| m.id == way.id && lacks_role(m))
                        .filter_map(|(i, _)| make_issue(cx, rel, i))
                        .collect::<Vec<_>>()
                })
                .collect(),
            Entity::Relation(rel) if rel.is_multipolygon() => rel
                .members
                .iter()
                .enumerate()
                .filter(|(_, m)| lacks_role(m))
                .filter_map(|(i, _)| make_issue(cx, rel, i))
                .collect(),
            _ => Vec::new(),
        };
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_roles_count_as_missing() {
        let member = |role: &str| Member {
            id: crate::ident::EntityId::way(1),
            role: role.to_owned(),
        };
        assert!(lacks_role(&member("")));
        assert!(lacks_role(&member("  ")));
        assert!(!lacks_role(&member("outer")));
    }
}
