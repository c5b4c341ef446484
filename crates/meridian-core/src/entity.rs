// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity snapshots: nodes, ways and relations.
//!
//! Entities are immutable values. Edits produce a new value under the same
//! [`EntityId`] with the local revision bumped, so an [`EntityKey`] names one
//! exact shape of an entity.
use meridian_geom::Loc;

use crate::ident::{EntityId, EntityKey, EntityKind};
use crate::tags::Tags;

/// A point feature or a vertex of one or more ways.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identifier (`n…`).
    pub id: EntityId,
    /// `[lon, lat]` in degrees.
    pub loc: Loc,
    /// Tag mapping.
    pub tags: Tags,
    /// Server version; `None` for entities never uploaded.
    pub version: Option<u64>,
    /// Local revision, bumped on every edit.
    pub revision: u64,
}

/// An ordered node sequence; closed when the first and last node coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    /// Identifier (`w…`).
    pub id: EntityId,
    /// Ordered node ids.
    pub nodes: Vec<EntityId>,
    /// Tag mapping.
    pub tags: Tags,
    /// Server version; `None` for entities never uploaded.
    pub version: Option<u64>,
    /// Local revision, bumped on every edit.
    pub revision: u64,
}

/// Which end of a way a node sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affix {
    /// The first node.
    Prefix,
    /// The last node.
    Suffix,
}

impl Way {
    /// `true` when the way has at least two nodes and starts where it ends.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }

    /// First node id.
    #[must_use]
    pub fn first(&self) -> Option<EntityId> {
        self.nodes.first().copied()
    }

    /// Last node id.
    #[must_use]
    pub fn last(&self) -> Option<EntityId> {
        self.nodes.last().copied()
    }

    /// `true` when the way has too few distinct nodes to be drawn.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let mut unique = self.nodes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique.len() < if self.is_closed() { 3 } else { 2 }
    }

    /// Returns which end of an open way `node` is, if any.
    #[must_use]
    pub fn affix(&self, node: EntityId) -> Option<Affix> {
        if self.is_closed() {
            return None;
        }
        if self.first() == Some(node) {
            Some(Affix::Prefix)
        } else if self.last() == Some(node) {
            Some(Affix::Suffix)
        } else {
            None
        }
    }

    /// `true` when `node` appears anywhere in the way.
    #[must_use]
    pub fn contains(&self, node: EntityId) -> bool {
        self.nodes.contains(&node)
    }
}

/// One member of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member entity.
    pub id: EntityId,
    /// Role string; may be empty.
    pub role: String,
}

/// An ordered list of role-tagged members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Identifier (`r…`).
    pub id: EntityId,
    /// Ordered members.
    pub members: Vec<Member>,
    /// Tag mapping.
    pub tags: Tags,
    /// Server version; `None` for entities never uploaded.
    pub version: Option<u64>,
    /// Local revision, bumped on every edit.
    pub revision: u64,
}

impl Relation {
    /// `true` for `type=multipolygon`.
    #[must_use]
    pub fn is_multipolygon(&self) -> bool {
        self.tags.get("type").is_some_and(|t| t == "multipolygon")
    }

    /// Members with the given role, in order.
    pub fn members_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Member> {
        self.members.iter().filter(move |m| m.role == role)
    }
}

/// Any entity in the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Node snapshot.
    Node(Node),
    /// Way snapshot.
    Way(Way),
    /// Relation snapshot.
    Relation(Relation),
}

impl Entity {
    /// Identifier.
    #[must_use]
    pub fn id(&self) -> EntityId {
        match self {
            Self::Node(n) => n.id,
            Self::Way(w) => w.id,
            Self::Relation(r) => r.id,
        }
    }

    /// Kind encoded in the id.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.id().kind()
    }

    /// Tag mapping.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        match self {
            Self::Node(n) => &n.tags,
            Self::Way(w) => &w.tags,
            Self::Relation(r) => &r.tags,
        }
    }

    /// Mutable tag mapping.
    pub fn tags_mut(&mut self) -> &mut Tags {
        match self {
            Self::Node(n) => &mut n.tags,
            Self::Way(w) => &mut w.tags,
            Self::Relation(r) => &mut r.tags,
        }
    }

    /// Server version, `None` when never uploaded.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        match self {
            Self::Node(n) => n.version,
            Self::Way(w) => w.version,
            Self::Relation(r) => r.version,
        }
    }

    /// Local revision counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        match self {
            Self::Node(n) => n.revision,
            Self::Way(w) => w.revision,
            Self::Relation(r) => r.revision,
        }
    }

    /// Revision-qualified key (`<id>v<revision>`).
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey {
            id: self.id(),
            revision: self.revision(),
        }
    }

    /// `true` for entities that have never been uploaded.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.version().is_none()
    }

    /// Returns a copy with the local revision bumped.
    #[must_use]
    pub fn touched(&self) -> Self {
        let mut next = self.clone();
        match &mut next {
            Self::Node(n) => n.revision += 1,
            Self::Way(w) => w.revision += 1,
            Self::Relation(r) => r.revision += 1,
        }
        next
    }

    /// Node view.
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Way view.
    #[must_use]
    pub fn as_way(&self) -> Option<&Way> {
        match self {
            Self::Way(w) => Some(w),
            _ => None,
        }
    }

    /// Relation view.
    #[must_use]
    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Self::Relation(r) => Some(r),
            _ => None,
        }
    }

    /// `name`, falling back to `ref`.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        let tags = self.tags();
        tags.get("name")
            .or_else(|| tags.get("ref"))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::tags_from;

    fn way(nodes: &[i64]) -> Way {
        Way {
            id: EntityId::way(1),
            nodes: nodes.iter().map(|n| EntityId::node(*n)).collect(),
            tags: Tags::new(),
            version: Some(1),
            revision: 0,
        }
    }

    #[test]
    fn closed_and_degenerate_ways() {
        assert!(way(&[1, 2, 3, 1]).is_closed());
        assert!(!way(&[1, 2, 3]).is_closed());
        assert!(way(&[1]).is_degenerate());
        assert!(way(&[1, 2, 1]).is_degenerate());
        assert!(!way(&[1, 2]).is_degenerate());
    }

    #[test]
    fn affix_only_for_open_way_ends() {
        let open = way(&[1, 2, 3]);
        assert_eq!(open.affix(EntityId::node(1)), Some(Affix::Prefix));
        assert_eq!(open.affix(EntityId::node(3)), Some(Affix::Suffix));
        assert_eq!(open.affix(EntityId::node(2)), None);
        assert_eq!(way(&[1, 2, 3, 1]).affix(EntityId::node(1)), None);
    }

    #[test]
    fn touched_bumps_key_only() {
        let mut w = way(&[1, 2]);
        w.tags = tags_from([("name", "Main")]);
        let before = Entity::Way(w);
        let after = before.touched();
        assert_eq!(before.id(), after.id());
        assert_ne!(before.key(), after.key());
        assert_eq!(after.display_name(), Some("Main"));
    }
}
