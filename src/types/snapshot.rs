//! Persisted result of a sync run

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Record from the user list endpoint, passed through untouched
pub type UserRecord = Value;

/// Response of the signed settings endpoint
pub type AuthenticatedProfile = Value;

/// Users in server order followed by the authenticated profile.
///
/// Serializes as a flat JSON array whose last element is
/// `{"authenticatedUser": <profile>}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    users: Vec<UserRecord>,
    authenticated_user: AuthenticatedProfile,
}

impl Snapshot {
    pub fn new(users: Vec<UserRecord>, authenticated_user: AuthenticatedProfile) -> Self {
        Self {
            users,
            authenticated_user,
        }
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn authenticated_user(&self) -> &AuthenticatedProfile {
        &self.authenticated_user
    }

    /// Number of elements in the serialized array
    pub fn len(&self) -> usize {
        self.users.len() + 1
    }

    /// Always false; the trailing profile wrapper is always present
    pub fn is_empty(&self) -> bool {
        false
    }
}

struct AuthenticatedUserWrapper<'a>(&'a AuthenticatedProfile);

impl Serialize for AuthenticatedUserWrapper<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("authenticatedUser", self.0)?;
        map.end()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for user in &self.users {
            seq.serialize_element(user)?;
        }
        seq.serialize_element(&AuthenticatedUserWrapper(&self.authenticated_user))?;
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_snapshot_serializes_as_flat_array() {
        let snapshot = Snapshot::new(
            vec![json!({"id": 2, "name": "b"}), json!({"id": 1, "name": "a"})],
            json!({"id": 9, "email": "me@example.org"}),
        );

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!([
                {"id": 2, "name": "b"},
                {"id": 1, "name": "a"},
                {"authenticatedUser": {"id": 9, "email": "me@example.org"}}
            ])
        );
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_snapshot_with_no_users() {
        let snapshot = Snapshot::new(Vec::new(), json!(null));
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value, json!([{"authenticatedUser": null}]));
        assert!(!snapshot.is_empty());
    }
}
