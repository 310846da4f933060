//! Authenticated identity and role.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role carried in the `role` claim.
///
/// Serialized lower-case. Parsing, from a claim or from text, ignores case
/// and surrounding whitespace, so `"Admin"` and `"admin"` name the same role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Judge,
    Supervisor,
    Participant,
    Master,
    Expert,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Judge,
        Role::Supervisor,
        Role::Participant,
        Role::Master,
        Role::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Judge => "judge",
            Role::Supervisor => "supervisor",
            Role::Participant => "participant",
            Role::Master => "master",
            Role::Expert => "expert",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity decoded from a verified credential.
///
/// Built fresh for every request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
            name: name.into(),
            role,
        }
    }

    /// True when the principal's role is one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
