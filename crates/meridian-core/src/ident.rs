// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use core::fmt;
use core::str::FromStr;

use blake3::Hasher;
use meridian_geom::Loc;
use thiserror::Error;

/// Canonical 256-bit hash used for issue identity.
pub type Hash = [u8; 32];

/// The three kinds of map entity.
///
/// Ordering (`Node < Way < Relation`) is part of the canonical ordering of
/// [`EntityId`] and therefore of every deterministic iteration in the graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityKind {
    /// A point with a location.
    Node,
    /// An ordered list of nodes.
    Way,
    /// An ordered list of role-tagged members.
    Relation,
}

impl EntityKind {
    /// Single-letter prefix used in the textual id form (`n`, `w`, `r`).
    #[must_use]
    pub fn prefix(self) -> char {
        match self {
            Self::Node => 'n',
            Self::Way => 'w',
            Self::Relation => 'r',
        }
    }
}

/// Strongly typed identifier for a node, way or relation.
///
/// Negative numbers denote entities created locally that have not been
/// uploaded yet. The textual form is the kind prefix followed by the number,
/// e.g. `n-1` or `w42`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId {
    kind: EntityKind,
    num: i64,
}

impl EntityId {
    /// Node id.
    #[must_use]
    pub const fn node(num: i64) -> Self {
        Self {
            kind: EntityKind::Node,
            num,
        }
    }

    /// Way id.
    #[must_use]
    pub const fn way(num: i64) -> Self {
        Self {
            kind: EntityKind::Way,
            num,
        }
    }

    /// Relation id.
    #[must_use]
    pub const fn relation(num: i64) -> Self {
        Self {
            kind: EntityKind::Relation,
            num,
        }
    }

    /// Builds an id from its parts.
    #[must_use]
    pub const fn new(kind: EntityKind, num: i64) -> Self {
        Self { kind, num }
    }

    /// Entity kind encoded in the id.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Numeric part of the id.
    #[must_use]
    pub const fn num(&self) -> i64 {
        self.num
    }

    /// `true` for locally created ids (negative numbers).
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.num < 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.num)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Error returned when parsing an [`EntityId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEntityIdError {
    /// The first character is not `n`, `w` or `r`.
    #[error("unknown entity kind prefix in {0:?}")]
    UnknownKind(String),
    /// The remainder is not a valid integer.
    #[error("invalid entity number in {0:?}")]
    InvalidNumber(String),
}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('n') => EntityKind::Node,
            Some('w') => EntityKind::Way,
            Some('r') => EntityKind::Relation,
            _ => return Err(ParseEntityIdError::UnknownKind(s.to_owned())),
        };
        let num = chars
            .as_str()
            .parse::<i64>()
            .map_err(|_| ParseEntityIdError::InvalidNumber(s.to_owned()))?;
        Ok(Self { kind, num })
    }
}

/// Identity of one particular revision of an entity: `<id>v<revision>`.
///
/// Two snapshots of the same entity compare unequal once it has been edited,
/// which keeps issue caches from serving results computed for an older shape.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityKey {
    /// Entity identifier.
    pub id: EntityId,
    /// Local revision counter (`0` for unedited entities).
    pub revision: u64,
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id, self.revision)
    }
}

/// Deterministic identity of an issue.
///
/// Derived by [`make_issue_id`]; two issues are the same issue iff their ids
/// are equal.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueId(pub Hash);

impl IssueId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssueId({})", &self.to_hex()[..16])
    }
}

fn update_len_prefixed(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Produces a stable, domain-separated issue identifier (prefix `b"issue:"`).
///
/// Inputs are the rule type, the optional differentiator, the entity keys
/// (sorted by their textual form, so argument order does not matter) and the
/// optional location. Every variable-length field is length-prefixed (8-byte
/// little-endian) and locations are hashed bit-exactly.
pub fn make_issue_id(
    rule: &str,
    hash: Option<&str>,
    keys: &[EntityKey],
    loc: Option<Loc>,
) -> IssueId {
    let mut sorted: Vec<String> = keys.iter().map(ToString::to_string).collect();
    sorted.sort();

    let mut hasher = Hasher::new();
    hasher.update(b"issue:");
    update_len_prefixed(&mut hasher, rule.as_bytes());
    update_len_prefixed(&mut hasher, hash.unwrap_or_default().as_bytes());
    hasher.update(&(sorted.len() as u64).to_le_bytes());
    for key in &sorted {
        update_len_prefixed(&mut hasher, key.as_bytes());
    }
    match loc {
        Some([lon, lat]) => {
            hasher.update(&[1]);
            hasher.update(&lon.to_le_bytes());
            hasher.update(&lat.to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
    IssueId(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: EntityId) -> EntityKey {
        EntityKey { id, revision: 0 }
    }

    #[test]
    fn entity_ids_round_trip_through_text() {
        for id in [EntityId::node(-1), EntityId::way(42), EntityId::relation(7)] {
            let parsed: EntityId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
        assert!(matches!(
            "x1".parse::<EntityId>(),
            Err(ParseEntityIdError::UnknownKind(_))
        ));
        assert!(matches!(
            "wabc".parse::<EntityId>(),
            Err(ParseEntityIdError::InvalidNumber(_))
        ));
    }

    #[test]
    fn issue_id_ignores_entity_order() {
        let a = key(EntityId::way(1));
        let b = key(EntityId::way(2));
        let loc = Some([1.0, 2.0]);
        assert_eq!(
            make_issue_id("crossing_ways", None, &[a, b], loc),
            make_issue_id("crossing_ways", None, &[b, a], loc)
        );
    }

    #[test]
    fn issue_id_separates_every_component() {
        let a = key(EntityId::way(1));
        let base = make_issue_id("t", None, &[a], None);
        assert_ne!(base, make_issue_id("u", None, &[a], None));
        assert_ne!(base, make_issue_id("t", Some("h"), &[a], None));
        assert_ne!(base, make_issue_id("t", None, &[a], Some([0.0, 0.0])));
        let edited = EntityKey {
            id: EntityId::way(1),
            revision: 1,
        };
        assert_ne!(base, make_issue_id("t", None, &[edited], None));
    }
}
