//! Account roles carried in the bearer token.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role granted to an account.
///
/// Roles arrive inside the JWT `roles` claim and gate which screens a
/// consumer renders. The client never enforces authorization itself; the
/// backend re-checks every call, so an unknown role degrades to
/// [`Role::Unknown`] instead of failing the whole token decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular shopper: browsing, cart, own account, own orders.
    Client,
    /// Staff member: product management.
    Employee,
    /// Administrator: account and order management.
    Admin,
    /// A role this client version does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Client => "CLIENT",
            Self::Employee => "EMPLOYEE",
            Self::Admin => "ADMIN",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Self::Client),
            "EMPLOYEE" => Ok(Self::Employee),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_round_trip() {
        let roles: Vec<Role> = serde_json::from_str(r#"["CLIENT", "ADMIN"]"#).expect("roles");
        assert_eq!(roles, vec![Role::Client, Role::Admin]);
    }

    #[test]
    fn unknown_role_does_not_fail_the_decode() {
        let roles: Vec<Role> = serde_json::from_str(r#"["AUDITOR"]"#).expect("roles");
        assert_eq!(roles, vec![Role::Unknown]);
    }
}
