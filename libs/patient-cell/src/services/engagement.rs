use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    EngagementStatus, EngagementStatusRecord, EngagementStatusResponse,
    UpdateEngagementStatusRequest,
};

/// What an engagement status update will do, decided before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangePlan {
    pub previous_status: EngagementStatus,
    pub next_status: EngagementStatus,
    pub changed: bool,
}

/// Validate and plan a status transition. Any state may move to any other
/// state; the only guard is that leaving `active` (or landing anywhere but
/// `active`) must carry a reason. An equal status is a no-op.
pub fn plan_status_change(
    current: EngagementStatus,
    request: &UpdateEngagementStatusRequest,
) -> Result<StatusChangePlan> {
    if request.changed_by_email.trim().is_empty() {
        return Err(anyhow!("changed_by_email is required"));
    }

    if request.status == current {
        return Ok(StatusChangePlan {
            previous_status: current,
            next_status: current,
            changed: false,
        });
    }

    if request.status != EngagementStatus::Active {
        let has_reason = request.change_reason.as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false);
        if !has_reason {
            return Err(anyhow!(
                "A change reason is required when setting a non-active status"
            ));
        }
    }

    Ok(StatusChangePlan {
        previous_status: current,
        next_status: request.status,
        changed: true,
    })
}

/// A non-admin moving a patient out of active care is something the admins
/// want to hear about.
pub fn needs_admin_notification(
    previous: EngagementStatus,
    next: EngagementStatus,
    actor_is_admin: bool,
) -> bool {
    !actor_is_admin && previous == EngagementStatus::Active && next != EngagementStatus::Active
}

pub struct EngagementService {
    supabase: SupabaseClient,
}

impl EngagementService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Current status for a patient; the absence of a row means active.
    pub async fn get_current_status(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<EngagementStatus> {
        let path = format!(
            "/rest/v1/engagement_statuses?patient_id=eq.{}&order=changed_at.desc&limit=1",
            patient_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Ok(EngagementStatus::default());
        }

        let record: EngagementStatusRecord = serde_json::from_value(result[0].clone())?;
        Ok(record.status)
    }

    /// Apply a status change: upsert the status row (the history table is
    /// populated by a database trigger), queue an admin notification when a
    /// non-admin pulls a patient out of active care, and refresh the roster
    /// view so list pages reflect the change immediately.
    pub async fn update_status(
        &self,
        patient_id: &str,
        request: UpdateEngagementStatusRequest,
        actor_is_admin: bool,
        auth_token: &str,
    ) -> Result<EngagementStatusResponse> {
        debug!("Engagement status update for patient {}: {:?}", patient_id, request.status);

        let current = self.get_current_status(patient_id, auth_token).await?;
        let plan = plan_status_change(current, &request)?;

        let patient_uuid = uuid::Uuid::parse_str(patient_id)
            .map_err(|_| anyhow!("Invalid patient ID"))?;

        if !plan.changed {
            debug!("Status unchanged for patient {}, skipping write", patient_id);
            return Ok(EngagementStatusResponse {
                patient_id: patient_uuid,
                status: plan.next_status,
                previous_status: plan.previous_status,
                changed: false,
            });
        }

        let status_data = json!({
            "patient_id": patient_id,
            "status": plan.next_status,
            "changed_by_email": request.changed_by_email,
            "change_reason": request.change_reason,
            "changed_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/engagement_statuses?on_conflict=patient_id",
            Some(auth_token),
            Some(status_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update engagement status"));
        }

        if needs_admin_notification(plan.previous_status, plan.next_status, actor_is_admin) {
            if let Err(e) = self.queue_admin_notification(patient_id, &request, auth_token).await {
                // The status change already landed; the notification is
                // advisory and must not roll it back.
                warn!("Failed to queue admin notification for patient {}: {}", patient_id, e);
            }
        }

        if let Err(e) = self.refresh_roster_view(auth_token).await {
            warn!("Roster view refresh failed after status change: {}", e);
        }

        Ok(EngagementStatusResponse {
            patient_id: patient_uuid,
            status: plan.next_status,
            previous_status: plan.previous_status,
            changed: true,
        })
    }

    async fn queue_admin_notification(
        &self,
        patient_id: &str,
        request: &UpdateEngagementStatusRequest,
        auth_token: &str,
    ) -> Result<()> {
        let notification_data = json!({
            "patient_id": patient_id,
            "kind": "engagement_status_change",
            "status": "pending",
            "payload": {
                "new_status": request.status,
                "changed_by_email": request.changed_by_email,
                "change_reason": request.change_reason
            },
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/admin_notifications",
            Some(auth_token),
            Some(notification_data),
            Some(headers),
        ).await?;

        Ok(())
    }

    async fn refresh_roster_view(&self, auth_token: &str) -> Result<()> {
        let _: Value = self.supabase.rpc(
            "refresh_patient_roster",
            json!({}),
            Some(auth_token),
        ).await?;

        Ok(())
    }
}
