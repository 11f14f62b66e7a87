use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A governance body with binding voting rights. Mirrored from an external
/// directory periodically; never deleted by the core (see the glossary).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Committee {
    pub name: String,
    pub full_name: String,
    pub is_podling: bool,
    pub parent_committee_name: Option<String>,
    pub committee_members: Json<Vec<String>>,
    pub committers: Json<Vec<String>>,
    pub release_managers: Json<Vec<String>>,
}

impl Committee {
    pub fn display_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_member(&self, asf_uid: &str) -> bool {
        self.committee_members.iter().any(|m| m == asf_uid)
    }

    pub fn is_committer(&self, asf_uid: &str) -> bool {
        self.committers.iter().any(|m| m == asf_uid)
    }

    pub fn is_participant(&self, asf_uid: &str) -> bool {
        self.is_member(asf_uid) || self.is_committer(asf_uid)
    }
}
