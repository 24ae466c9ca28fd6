use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use payer_cell::services::bookability::BookabilityService;
use provider_cell::models::SlotRangeRequest;
use provider_cell::services::availability::AvailabilityService;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingError, FieldError,
    PayerSlotListing, ProviderSlots,
};

pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 120;

/// Field-level validation, independent of any database state.
pub fn validate_booking_request(
    request: &BookAppointmentRequest,
    today: NaiveDate,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if request.appointment_date < today {
        errors.push(FieldError {
            field: "appointment_date".to_string(),
            message: "Appointment date cannot be in the past".to_string(),
        });
    }

    if request.duration_minutes < MIN_DURATION_MINUTES
        || request.duration_minutes > MAX_DURATION_MINUTES {
        errors.push(FieldError {
            field: "duration_minutes".to_string(),
            message: format!(
                "Duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            ),
        });
    } else if request.duration_minutes % 5 != 0 {
        errors.push(FieldError {
            field: "duration_minutes".to_string(),
            message: "Duration must be a multiple of 5 minutes".to_string(),
        });
    }

    if let Some(tz) = &request.timezone {
        if tz.trim().is_empty() {
            errors.push(FieldError {
                field: "timezone".to_string(),
                message: "Timezone must not be blank when provided".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub struct BookingService {
    supabase: SupabaseClient,
    bookability: BookabilityService,
    availability: AvailabilityService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bookability: BookabilityService::new(config),
            availability: AvailabilityService::new(config),
        }
    }

    /// Book an appointment end to end: validate the request, confirm the
    /// patient's policy, confirm the provider is legally bookable under the
    /// payer on that date, confirm the time is an open slot, then insert.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Booking appointment: patient {} with provider {} under payer {} on {}",
            request.patient_id, request.provider_id, request.payer_id, request.appointment_date
        );

        validate_booking_request(&request, Utc::now().date_naive())
            .map_err(BookingError::Validation)?;

        self.check_active_policy(&request, auth_token).await?;
        self.check_intake_instance(&request, auth_token).await?;

        // Payer-side legality, including the billing path
        let (_, resolution) = self.bookability
            .resolve_for_payer(
                &request.payer_id.to_string(),
                request.appointment_date,
                auth_token,
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    BookingError::NotFound("Payer".to_string())
                } else {
                    BookingError::Upstream(e)
                }
            })?;

        let bookable = resolution.bookable.iter()
            .find(|b| b.provider_id == request.provider_id)
            .ok_or(BookingError::ProviderNotBookable)?;

        // Schedule-side availability
        let slot_request = SlotRangeRequest {
            start_date: request.appointment_date,
            end_date: request.appointment_date,
            duration_minutes: Some(request.duration_minutes),
            buffer_minutes: None,
        };
        let slots = self.availability
            .get_available_slots(&request.provider_id.to_string(), slot_request, auth_token)
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    BookingError::NotFound("Provider".to_string())
                } else {
                    BookingError::Upstream(e)
                }
            })?;

        if !slots.iter().any(|s| s.time == request.start_time) {
            return Err(BookingError::SlotUnavailable);
        }

        let appointment_data = json!({
            "patient_id": request.patient_id,
            "provider_id": request.provider_id,
            "payer_id": request.payer_id,
            "billing_provider_id": bookable.billing_provider_id,
            "appointment_date": request.appointment_date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "duration_minutes": request.duration_minutes,
            "status": AppointmentStatus::Scheduled,
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(BookingError::Upstream)?;

        if result.is_empty() {
            return Err(BookingError::Upstream(anyhow!("Failed to create appointment")));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::Upstream(e.into()))?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        reason: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let update = json!({
            "status": AppointmentStatus::Cancelled,
            "notes": reason,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update),
            Some(headers),
        ).await.map_err(BookingError::Upstream)?;

        if result.is_empty() {
            return Err(BookingError::NotFound("Appointment".to_string()));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::Upstream(e.into()))?;

        Ok(appointment)
    }

    /// Union of bookable providers and their open slots for one payer and
    /// date: the "who can this patient actually see" answer.
    pub async fn list_bookable_slots_for_payer(
        &self,
        payer_id: &str,
        date: NaiveDate,
        duration_minutes: Option<i32>,
        auth_token: &str,
    ) -> Result<PayerSlotListing, BookingError> {
        let (payer, resolution) = self.bookability
            .resolve_for_payer(payer_id, date, auth_token)
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    BookingError::NotFound("Payer".to_string())
                } else {
                    BookingError::Upstream(e)
                }
            })?;

        let mut providers = Vec::new();
        let mut total_slots = 0;

        for bookable in resolution.bookable {
            let slot_request = SlotRangeRequest {
                start_date: date,
                end_date: date,
                duration_minutes,
                buffer_minutes: None,
            };

            let slots = match self.availability
                .get_available_slots(&bookable.provider_id.to_string(), slot_request, auth_token)
                .await
            {
                Ok(slots) => slots,
                Err(e) => {
                    // One provider's broken schedule shouldn't empty the
                    // whole listing.
                    tracing::warn!(
                        "Slot fetch failed for provider {}: {}",
                        bookable.provider_id, e
                    );
                    Vec::new()
                }
            };

            total_slots += slots.len();
            providers.push(ProviderSlots { provider: bookable, slots });
        }

        Ok(PayerSlotListing {
            payer_id: payer.id,
            date,
            providers,
            total_slots,
        })
    }

    async fn check_active_policy(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let path = format!(
            "/rest/v1/patient_policies?patient_id=eq.{}&payer_id=eq.{}&is_active=eq.true",
            request.patient_id, request.payer_id
        );
        let policies: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(BookingError::Upstream)?;

        if policies.is_empty() {
            return Err(BookingError::NoActivePolicy);
        }

        Ok(())
    }

    async fn check_intake_instance(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let path = format!(
            "/rest/v1/payer_intake_instances?payer_id=eq.{}",
            request.payer_id
        );
        let instances: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(BookingError::Upstream)?;

        if instances.is_empty() {
            return Err(BookingError::NoIntakeInstance);
        }

        Ok(())
    }
}
