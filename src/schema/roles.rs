//! Property roles and the filter that derives them from declared policies.

use serde::Serialize;
use std::fmt;

use crate::model::{DefaultPolicy, MemberPolicy};

/// PropertyRole is one of the operations a property can participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyRole {
    Equality,
    Hash,
    String,
}

impl PropertyRole {
    pub const ALL: [PropertyRole; 3] = [PropertyRole::Equality, PropertyRole::Hash, PropertyRole::String];

    fn bit(self) -> u8 {
        match self {
            PropertyRole::Equality => 0b001,
            PropertyRole::Hash => 0b010,
            PropertyRole::String => 0b100,
        }
    }
}

/// RoleSet is a set of [`PropertyRole`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);
    pub const ALL: RoleSet = RoleSet(0b111);

    pub fn of(roles: &[PropertyRole]) -> Self {
        RoleSet(roles.iter().fold(0, |bits, r| bits | r.bit()))
    }

    pub fn contains(&self, role: PropertyRole) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, role: PropertyRole) {
        self.0 |= role.bit();
    }

    pub fn union(&self, other: RoleSet) -> RoleSet {
        RoleSet(self.0 | other.0)
    }

    /// Roles in `self` that are not in `other`.
    pub fn difference(&self, other: RoleSet) -> RoleSet {
        RoleSet(self.0 & !other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = PropertyRole> + '_ {
        PropertyRole::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<DefaultPolicy> for RoleSet {
    fn from(policy: DefaultPolicy) -> Self {
        use PropertyRole::*;
        match policy {
            DefaultPolicy::All => RoleSet::ALL,
            DefaultPolicy::HashCodeEquals => RoleSet::of(&[Equality, Hash]),
            DefaultPolicy::Equals => RoleSet::of(&[Equality]),
            DefaultPolicy::EqualsToString => RoleSet::of(&[Equality, String]),
            DefaultPolicy::ToString => RoleSet::of(&[String]),
            DefaultPolicy::None => RoleSet::EMPTY,
        }
    }
}

/// RoleFilter combines a member policy with its level's default policy.
pub struct RoleFilter;

impl RoleFilter {
    /// Returns the roles of a member, or `None` when it has no policy from
    /// either source and is excluded outright.
    pub fn roles(member: Option<MemberPolicy>, level: Option<DefaultPolicy>) -> Option<RoleSet> {
        use PropertyRole::*;
        match member {
            Some(MemberPolicy::Default) => Some(level.map(RoleSet::from).unwrap_or(RoleSet::ALL)),
            Some(MemberPolicy::All) => Some(RoleSet::ALL),
            Some(MemberPolicy::HashCodeEquals) => Some(RoleSet::of(&[Equality, Hash])),
            Some(MemberPolicy::Equals) => Some(RoleSet::of(&[Equality])),
            Some(MemberPolicy::EqualsToString) => Some(RoleSet::of(&[Equality, String])),
            Some(MemberPolicy::ToString) => Some(RoleSet::of(&[String])),
            Some(MemberPolicy::None) => Some(RoleSet::EMPTY),
            None => level.map(RoleSet::from),
        }
    }
}
