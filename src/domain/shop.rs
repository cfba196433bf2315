use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Mobile, UserId};

pub type ShopId = Uuid;

/// A shop run by a user. Other users borrow from it and pay it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub mobile: Option<Mobile>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Shop {
    pub fn new(owner_id: UserId, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description: None,
            mobile: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}
