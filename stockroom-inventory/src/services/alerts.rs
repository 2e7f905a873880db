use serde::Serialize;
use stockroom::collection::RecordId;
use stockroom::doc;
use stockroom::errors::StockroomResult;
use stockroom::model::Repository;
use stockroom::stockroom::Stockroom;

use super::{paginate, require_text, Page, PageRequest};
use crate::entities::{Alert, AlertType, Severity};
use crate::timestamp;

const SUMMARY_RECENT: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub alert_type: Option<AlertType>,
    pub severity: Option<Severity>,
    pub is_read: Option<bool>,
    pub is_resolved: Option<bool>,
    /// Restricts to alerts addressed to this user or to everyone.
    pub user: Option<RecordId>,
    pub page: PageRequest,
}

/// Unread alerts by severity, plus the most recent of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub recent: Vec<Alert>,
}

#[derive(Clone)]
pub struct AlertService {
    alerts: Repository<Alert>,
}

impl AlertService {
    pub fn new(db: &Stockroom) -> StockroomResult<Self> {
        Ok(AlertService {
            alerts: db.repository()?,
        })
    }

    pub fn create(&self, mut alert: Alert) -> StockroomResult<Alert> {
        require_text("title", &alert.title)?;
        require_text("message", &alert.message)?;

        let now = timestamp::now();
        alert.id = None;
        alert.created_at = Some(now);
        alert.updated_at = Some(now);
        let created = self.alerts.create(&alert)?;
        log::info!(
            "Raised {} {} alert: {}",
            created.severity.as_str(),
            created.alert_type,
            created.title
        );
        Ok(created)
    }

    pub fn get(&self, id: &RecordId) -> StockroomResult<Option<Alert>> {
        self.alerts.find_by_id(id)
    }

    /// Matching alerts, newest first.
    pub fn list(&self, query: &AlertQuery) -> StockroomResult<Page<Alert>> {
        let mut filter = doc! {};
        if let Some(alert_type) = query.alert_type {
            filter.put("type", alert_type.as_str())?;
        }
        if let Some(severity) = query.severity {
            filter.put("severity", severity.as_str())?;
        }
        if let Some(is_read) = query.is_read {
            filter.put("isRead", is_read)?;
        }
        if let Some(is_resolved) = query.is_resolved {
            filter.put("isResolved", is_resolved)?;
        }

        let mut alerts = self.alerts.find(&filter)?;
        alerts.retain(|alert| alert.is_visible_to(query.user.as_ref()));
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(alerts, query.page))
    }

    pub fn mark_read(&self, id: &RecordId) -> StockroomResult<Option<Alert>> {
        let patch = doc! { isRead: true, updatedAt: (timestamp::now()) };
        self.alerts.find_by_id_and_update(id, &patch)
    }

    /// Marks the alert resolved, recording who resolved it and when.
    pub fn resolve(
        &self,
        id: &RecordId,
        resolved_by: Option<&RecordId>,
    ) -> StockroomResult<Option<Alert>> {
        self.alerts.find_by_id_and_modify(id, |alert| {
            let now = timestamp::now();
            alert.is_resolved = true;
            alert.resolved_by = resolved_by.cloned();
            alert.resolved_at = Some(now);
            alert.updated_at = Some(now);
            Ok(())
        })
    }

    pub fn delete(&self, id: &RecordId) -> StockroomResult<bool> {
        self.alerts.find_by_id_and_delete(id)
    }

    pub fn summary(&self, user: Option<&RecordId>) -> StockroomResult<AlertSummary> {
        let mut unread: Vec<Alert> = self
            .alerts
            .find(&doc! { isRead: false })?
            .into_iter()
            .filter(|alert| alert.is_visible_to(user))
            .collect();
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut summary = AlertSummary::default();
        for alert in &unread {
            match alert.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        unread.truncate(SUMMARY_RECENT);
        summary.recent = unread;
        Ok(summary)
    }
}
