/**
 * Membership Roles
 *
 * `admin` and `staff` are organization members. `partner` is never stored;
 * it is the role of a request authenticated with an organization API key.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Partner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Partner => "partner",
        }
    }

    /// Roles that may be assigned to a stored membership
    pub fn is_member_role(&self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "partner" => Ok(Self::Partner),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("owner".parse::<Role>().is_err());
        assert!(!Role::Partner.is_member_role());
    }
}
