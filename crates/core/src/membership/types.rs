//! Team membership types and invariants.

use serde::{Deserialize, Serialize};
use splitledger_shared::types::UserId;

use super::error::MembershipError;

/// Role of a member within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Regular member.
    Member = 0,
    /// Administrator: may add members, edit any expense note, run maintenance.
    Admin = 1,
}

impl TeamRole {
    /// Parse a role from its storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the storage representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

/// A member of a team, as seen by the invariant checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSnapshot {
    /// The member's user id.
    pub user: UserId,
    /// The member's role.
    pub role: TeamRole,
}

/// Checks whether a member may be removed from the roster.
///
/// A team must keep at least one ADMIN while any member remains, so
/// removing the last administrator is refused unless they are also the last
/// member.
///
/// # Errors
///
/// `UnknownMember` when the user is not on the roster, `LastAdmin` when the
/// removal would leave members without an administrator.
pub fn check_removal(members: &[MemberSnapshot], leaving: UserId) -> Result<(), MembershipError> {
    if !members.iter().any(|m| m.user == leaving) {
        return Err(MembershipError::UnknownMember(leaving));
    }

    let remaining: Vec<_> = members.iter().filter(|m| m.user != leaving).collect();
    if !remaining.is_empty() && !remaining.iter().any(|m| m.role == TeamRole::Admin) {
        return Err(MembershipError::LastAdmin(leaving));
    }

    Ok(())
}
