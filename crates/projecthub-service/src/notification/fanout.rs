//! Event notice fan-out.
//!
//! Creating a scheduled event inserts one unread notice per roster member
//! except the creator; deleting one soft-deletes the parent so the
//! notices stop aggregating.

use std::sync::Arc;

use uuid::Uuid;

use projecthub_core::events::ChangeEvent;
use projecthub_core::feed::ChangeFeedPublisher;
use projecthub_core::result::AppResult;
use projecthub_database::store::{NoticeStore, RosterProvider};
use projecthub_entity::event::ProjectEvent;
use projecthub_entity::notification::EventNotice;

/// Fans scheduled-event notices out to project rosters.
pub struct NoticeFanout {
    notices: Arc<dyn NoticeStore>,
    roster: Arc<dyn RosterProvider>,
    feed: Arc<dyn ChangeFeedPublisher>,
}

impl NoticeFanout {
    /// Create a new fan-out service.
    pub fn new(
        notices: Arc<dyn NoticeStore>,
        roster: Arc<dyn RosterProvider>,
        feed: Arc<dyn ChangeFeedPublisher>,
    ) -> Self {
        Self {
            notices,
            roster,
            feed,
        }
    }

    /// Persist a new event and one notice per member except the creator.
    pub async fn event_created(&self, event: &ProjectEvent) -> AppResult<Vec<EventNotice>> {
        self.notices.insert_event(event).await?;

        let members = self.roster.project_members(event.project_id).await?;
        let notices: Vec<EventNotice> = members
            .iter()
            .filter(|m| *m != &event.created_by)
            .map(|recipient| EventNotice {
                id: Uuid::new_v4(),
                project_id: event.project_id,
                event_id: event.id,
                topic: event.topic.clone(),
                created_by: event.created_by.clone(),
                recipient: recipient.clone(),
                event_date: event.event_date,
                created_at: event.created_at,
                read: false,
            })
            .collect();
        self.notices.insert_notices(&notices).await?;

        for notice in &notices {
            self.feed.publish(ChangeEvent::NoticeCreated {
                notice_id: notice.id,
                project_id: notice.project_id,
                event_id: notice.event_id,
                topic: notice.topic.clone(),
                created_by: notice.created_by.clone(),
                recipient: notice.recipient.clone(),
                event_date: notice.event_date,
                created_at: notice.created_at,
            });
        }
        Ok(notices)
    }

    /// Soft-delete an event; its notices disappear from aggregation.
    pub async fn event_deleted(&self, event_id: Uuid) -> AppResult<()> {
        self.notices.soft_delete_event(event_id).await
    }
}
