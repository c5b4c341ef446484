// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Terse graph construction for tests.

use meridian_core::{tags_from, Entity, EntityId, Graph, Member, Node, Relation, Tags, Way};
use meridian_geom::Loc;

/// Builds a [`Graph`] from numeric ids.
///
/// Entities default to version 1 (downloaded, unmodified). Call
/// [`GraphBuilder::created`] to add subsequent entities as new, unsaved ones.
///
/// # Example
///
/// ```
/// use meridian_dry_tests::GraphBuilder;
///
/// let graph = GraphBuilder::new()
///     .node(1, [0.0, 0.0])
///     .node(2, [0.001, 0.0])
///     .way(1, &[1, 2], &[("highway", "residential")])
///     .build();
/// assert_eq!(graph.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    entities: Vec<Entity>,
    version: Option<u64>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn tags(pairs: &[(&str, &str)]) -> Tags {
    tags_from(pairs.iter().copied())
}

impl GraphBuilder {
    /// Empty builder producing version-1 entities.
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            version: Some(1),
        }
    }

    /// Subsequent entities are new (no version).
    pub fn created(mut self) -> Self {
        self.version = None;
        self
    }

    /// Untagged node `n<id>`.
    pub fn node(self, id: i64, loc: Loc) -> Self {
        self.tagged_node(id, loc, &[])
    }

    /// Tagged node `n<id>`.
    pub fn tagged_node(mut self, id: i64, loc: Loc, pairs: &[(&str, &str)]) -> Self {
        self.entities.push(Entity::Node(Node {
            id: EntityId::node(id),
            loc,
            tags: tags(pairs),
            version: self.version,
            revision: 0,
        }));
        self
    }

    /// Way `w<id>` over node ids.
    pub fn way(mut self, id: i64, nodes: &[i64], pairs: &[(&str, &str)]) -> Self {
        self.entities.push(Entity::Way(Way {
            id: EntityId::way(id),
            nodes: nodes.iter().copied().map(EntityId::node).collect(),
            tags: tags(pairs),
            version: self.version,
            revision: 0,
        }));
        self
    }

    /// Relation `r<id>` over `(member, role)` pairs.
    pub fn relation(
        mut self,
        id: i64,
        members: &[(EntityId, &str)],
        pairs: &[(&str, &str)],
    ) -> Self {
        self.entities.push(Entity::Relation(Relation {
            id: EntityId::relation(id),
            members: members
                .iter()
                .map(|(member, role)| Member {
                    id: *member,
                    role: (*role).to_owned(),
                })
                .collect(),
            tags: tags(pairs),
            version: self.version,
            revision: 0,
        }));
        self
    }

    /// Finishes the graph.
    pub fn build(self) -> Graph {
        Graph::from_entities(self.entities)
    }
}
