use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    FoundationUser,
    External,
}

impl Role {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "foundation_user" => Some(Role::FoundationUser),
            "external" => Some(Role::External),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::FoundationUser => "foundation_user",
            Role::External => "external",
        }
    }

    pub fn is_foundation_side(&self) -> bool {
        matches!(self, Role::Admin | Role::FoundationUser)
    }
}

/// The authenticated caller. Always passed explicitly into engine operations;
/// there is no ambient session state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn external(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::External,
        }
    }

    pub fn foundation_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::FoundationUser,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Editor,
    Viewer,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Editor => "editor",
            MemberRole::Viewer => "viewer",
        }
    }

    /// Only owner and editor memberships may act on adoption requests.
    pub fn can_write(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Editor)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: String,
    pub foundation_id: i64,
    pub member_role: MemberRole,
}
