use crate::domain::ports::IdentityProvider;
use async_trait::async_trait;
use std::sync::RwLock;

/// Identity supplied out of band (environment, CLI flag). Signing out
/// simply forgets the user id.
#[derive(Default)]
pub struct StaticIdentityProvider {
    user_id: RwLock<Option<String>>,
}

impl StaticIdentityProvider {
    pub fn new(user_id: Option<String>) -> Self {
        let user_id = user_id.filter(|id| !id.trim().is_empty());
        Self {
            user_id: RwLock::new(user_id),
        }
    }

    pub fn authenticate(&self, user_id: impl Into<String>) {
        if let Ok(mut current) = self.user_id.write() {
            *current = Some(user_id.into());
        }
    }

    pub fn forget(&self) {
        if let Ok(mut current) = self.user_id.write() {
            *current = None;
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_user(&self) -> Option<String> {
        self.user_id.read().ok().and_then(|id| id.clone())
    }
}
