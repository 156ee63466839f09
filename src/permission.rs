//! Who may force-stop a round

use crate::protocol::{HostEvent, SenderRole};
use async_trait::async_trait;

#[async_trait]
pub trait PermissionCheck: Send + Sync {
    async fn can_force_stop(&self, event: &HostEvent) -> bool;
}

/// Superusers, group owners and group admins may stop rounds
#[derive(Debug, Clone, Default)]
pub struct RolePermission {
    superusers: Vec<String>,
}

impl RolePermission {
    pub fn new(superusers: Vec<String>) -> Self {
        Self { superusers }
    }

    fn is_superuser(&self, event: &HostEvent) -> bool {
        event
            .user_id
            .as_ref()
            .is_some_and(|id| self.superusers.iter().any(|su| su == id))
    }
}

#[async_trait]
impl PermissionCheck for RolePermission {
    async fn can_force_stop(&self, event: &HostEvent) -> bool {
        self.is_superuser(event) || matches!(event.role, SenderRole::Owner | SenderRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(user: &str, role: SenderRole) -> HostEvent {
        HostEvent {
            group_id: Some("g1".to_string()),
            user_id: Some(user.to_string()),
            role,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_role_permission() {
        let perm = RolePermission::new(vec!["42".to_string()]);

        assert!(perm.can_force_stop(&event("1", SenderRole::Owner)).await);
        assert!(perm.can_force_stop(&event("1", SenderRole::Admin)).await);
        assert!(!perm.can_force_stop(&event("1", SenderRole::Member)).await);
        assert!(perm.can_force_stop(&event("42", SenderRole::Member)).await);
    }
}
