use rocket::serde::{Deserialize, Serialize};

/// Account behind a provider token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub node_id: String,
    pub username: String,
    pub avatar: String,
}

/// Role a user holds on a repository, as reported by the provider.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipRole {
    Admin,
    Maintainer,
}

impl OwnershipRole {
    pub fn can_publish(&self) -> bool {
        matches!(self, Self::Admin | Self::Maintainer)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for OwnershipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Maintainer => write!(f, "maintainer"),
        }
    }
}

// Subset of the GitHub REST payloads the provider reads
#[derive(Deserialize, Debug)]
pub struct GitHubUser {
    pub node_id: String,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct GitHubPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
}

#[derive(Deserialize, Debug)]
pub struct GitHubRepo {
    pub full_name: String,
    #[serde(default)]
    pub permissions: Option<GitHubPermissions>,
}

impl GitHubPermissions {
    pub fn role(&self) -> Option<OwnershipRole> {
        if self.admin {
            Some(OwnershipRole::Admin)
        } else if self.maintain || self.push {
            Some(OwnershipRole::Maintainer)
        } else {
            None
        }
    }
}
