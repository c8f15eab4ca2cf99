//! Notification read side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemorySocialStore;
use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationId, UserId};

#[async_trait]
impl NotificationRepository for InMemorySocialStore {
    async fn list_for(
        &self,
        recipient: &UserId,
        limit: u32,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let state = self.lock().map_err(NotificationRepositoryError::query)?;
        let mut rows: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|row| row.recipient == *recipient)
            .filter(|row| !unread_only || row.read_at.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, NotificationRepositoryError> {
        let mut state = self.lock().map_err(NotificationRepositoryError::query)?;
        let row = state
            .notifications
            .iter_mut()
            .find(|row| row.id == id && row.recipient == *recipient);
        Ok(row.map(|row| *row.read_at.get_or_insert(now)))
    }

    async fn mark_all_read(
        &self,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut state = self.lock().map_err(NotificationRepositoryError::query)?;
        let mut changed = 0_u64;
        for row in state
            .notifications
            .iter_mut()
            .filter(|row| row.recipient == *recipient && row.read_at.is_none())
        {
            row.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }
}
