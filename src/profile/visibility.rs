//! Decides what a viewer may see of another user's profile.

use serde::Serialize;

use crate::{auth::claims::SessionClaims, users::User};

/// Subset shown to non-owners of a public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub is_public: bool,
    pub name: String,
    pub username: String,
    pub bio: String,
    pub location: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivateProfile {
    pub is_public: bool,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProfileVisibility {
    Owner(User),
    Private(PrivateProfile),
    Public(PublicProfile),
}

impl ProfileVisibility {
    /// Only a non-owner looking at a public profile counts as a view.
    pub fn records_view(&self) -> bool {
        matches!(self, ProfileVisibility::Public(_))
    }
}

pub fn decide(target: User, viewer: Option<&SessionClaims>) -> ProfileVisibility {
    if viewer.is_some_and(|c| c.user_id() == target.id) {
        return ProfileVisibility::Owner(target);
    }
    if !target.is_public {
        return ProfileVisibility::Private(PrivateProfile {
            is_public: false,
            username: target.username,
        });
    }
    ProfileVisibility::Public(PublicProfile {
        is_public: true,
        name: target.name,
        username: target.username,
        bio: target.bio,
        location: target.location,
        image: target.image,
    })
}
