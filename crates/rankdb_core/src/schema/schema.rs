use std::fmt;

use ahash::RandomState;
use indexmap::IndexMap;
use rankdb_error::{ErrorKind, RankError, Result};
use serde::{Deserialize, Serialize};

use crate::schema::Attribute;
use crate::values::DataType;

/// Ordered, name-unique set of attributes.
///
/// Attribute order is significant: records store their values positionally in
/// schema order, and two schemas with the same attributes in a different
/// order are not equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct Schema {
    attrs: IndexMap<String, DataType, RandomState>,
}

impl Schema {
    /// Build a schema from attributes in order. Fails if two attributes share
    /// a name.
    pub fn try_new(attrs: impl IntoIterator<Item = Attribute>) -> Result<Self> {
        let iter = attrs.into_iter();
        let mut map: IndexMap<String, DataType, RandomState> =
            IndexMap::with_capacity_and_hasher(iter.size_hint().0, RandomState::new());

        for attr in iter {
            if map.insert(attr.name.clone(), attr.datatype).is_some() {
                return Err(RankError::new(
                    ErrorKind::DuplicateAttributeName,
                    "schema contains a duplicate attribute name",
                )
                .with_field("name", attr.name));
            }
        }

        Ok(Schema { attrs: map })
    }

    pub fn empty() -> Self {
        Schema {
            attrs: IndexMap::with_hasher(RandomState::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Domain of the named attribute, if present.
    pub fn datatype(&self, name: &str) -> Option<DataType> {
        self.attrs.get(name).copied()
    }

    /// Position of the named attribute in schema (and record) order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attrs.get_index_of(name)
    }

    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        self.attrs
            .get(name)
            .map(|&datatype| Attribute::new(name, datatype))
    }

    pub fn attribute_at(&self, idx: usize) -> Option<Attribute> {
        self.attrs
            .get_index(idx)
            .map(|(name, &datatype)| Attribute::new(name.clone(), datatype))
    }

    pub fn contains(&self, attr: &Attribute) -> bool {
        self.attrs.get(&attr.name) == Some(&attr.datatype)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Iterate attributes in order as (name, domain) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.attrs.iter().map(|(name, &dt)| (name.as_str(), dt))
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.iter()
            .map(|(name, dt)| Attribute::new(name, dt))
            .collect()
    }

    /// Whether every attribute of `self` (name and domain) appears in
    /// `other`, in any order.
    pub fn is_subschema_of(&self, other: &Schema) -> bool {
        self.iter()
            .all(|(name, dt)| other.datatype(name) == Some(dt))
    }

    /// Whether attributes shared by name between the two schemas also share a
    /// domain. Disjoint schemas are trivially joinable.
    pub fn is_joinable_with(&self, other: &Schema) -> bool {
        self.iter().all(|(name, dt)| match other.datatype(name) {
            Some(other_dt) => dt == other_dt,
            None => true,
        })
    }

    /// Output schema of a θ-join: left attributes then right attributes,
    /// with name collisions disambiguated by `left.`/`right.` prefixes.
    ///
    /// Fails with `DuplicateAttributeName` if even the prefixed names collide
    /// (a base attribute literally named `left.a` next to a colliding `a`).
    pub fn join_prefixed(left: &Schema, right: &Schema) -> Result<Schema> {
        let mut attrs = Vec::with_capacity(left.len() + right.len());

        for (name, dt) in left.iter() {
            let name = if right.contains_name(name) {
                format!("left.{name}")
            } else {
                name.to_string()
            };
            attrs.push(Attribute::new(name, dt));
        }
        for (name, dt) in right.iter() {
            let name = if left.contains_name(name) {
                format!("right.{name}")
            } else {
                name.to_string()
            };
            attrs.push(Attribute::new(name, dt));
        }

        Schema::try_new(attrs)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        // Order-sensitive, unlike IndexMap's own equality.
        self.attrs.len() == other.attrs.len() && self.attrs.iter().eq(other.attrs.iter())
    }
}

impl Eq for Schema {}

impl TryFrom<Vec<Attribute>> for Schema {
    type Error = RankError;

    fn try_from(attrs: Vec<Attribute>) -> Result<Self> {
        Schema::try_new(attrs)
    }
}

impl From<Schema> for Vec<Attribute> {
    fn from(schema: Schema) -> Self {
        schema.attributes()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, (name, dt)) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} {dt}")?;
        }
        write!(f, ")")
    }
}
