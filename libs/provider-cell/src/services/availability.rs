use anyhow::{Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AvailabilityException, AvailableSlot, BookedTime, CreateExceptionRequest,
    CreateWeeklyAvailabilityRequest, Provider, SlotRangeRequest,
    UpdateWeeklyAvailabilityRequest, WeeklyAvailability,
};
use crate::services::provider::ProviderService;

pub const DEFAULT_SLOT_DURATION_MINUTES: i32 = 45;
pub const DEFAULT_BUFFER_MINUTES: i32 = 15;

pub fn day_of_week_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Step through [start, end) emitting slot start times every
/// `duration + buffer` minutes. A slot is emitted only when its end still
/// fits inside the window.
pub fn slot_starts_in_window(
    start: NaiveTime,
    end: NaiveTime,
    duration_minutes: i32,
    buffer_minutes: i32,
) -> Vec<NaiveTime> {
    let mut starts = Vec::new();
    if duration_minutes <= 0 || start >= end {
        return starts;
    }

    let step = Duration::minutes((duration_minutes + buffer_minutes.max(0)) as i64);
    let span = Duration::minutes(duration_minutes as i64);

    let mut current = start;
    loop {
        let (slot_end, wrapped) = current.overflowing_add_signed(span);
        if wrapped != 0 || slot_end > end {
            break;
        }
        starts.push(current);

        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || next <= current {
            break;
        }
        current = next;
    }

    starts
}

/// Resolve the working windows for one calendar day: a day-suppressing
/// exception wins outright, replacement hours override the weekly template,
/// otherwise the template rows for that weekday apply.
pub fn windows_for_day(
    date: NaiveDate,
    weekly: &[WeeklyAvailability],
    exceptions: &[AvailabilityException],
) -> Vec<(NaiveTime, NaiveTime)> {
    let todays: Vec<&AvailabilityException> = exceptions.iter()
        .filter(|e| e.exception_date == date)
        .collect();

    if todays.iter().any(|e| e.exception_type.suppresses_day()) {
        return Vec::new();
    }

    let replacements: Vec<(NaiveTime, NaiveTime)> = todays.iter()
        .filter(|e| e.exception_type.replaces_hours())
        .filter_map(|e| match (e.start_time, e.end_time) {
            (Some(s), Some(end)) if s < end => Some((s, end)),
            _ => None,
        })
        .collect();

    if !replacements.is_empty() {
        return replacements;
    }

    let dow = day_of_week_index(date);
    weekly.iter()
        .filter(|w| w.day_of_week == dow)
        .map(|w| (w.start_time, w.end_time))
        .collect()
}

/// Generate the bookable slots for one calendar day.
///
/// Partial blocks drop any slot whose start falls inside [block_start,
/// block_end). Booked times remove only the slot with the exact same start
/// time; an overlapping slot one minute later survives, which mirrors how
/// the booking flow has always behaved.
pub fn generate_slots_for_day(
    provider: &Provider,
    date: NaiveDate,
    weekly: &[WeeklyAvailability],
    exceptions: &[AvailabilityException],
    booked: &[BookedTime],
    duration_minutes: i32,
    buffer_minutes: i32,
) -> Vec<AvailableSlot> {
    let windows = windows_for_day(date, weekly, exceptions);
    if windows.is_empty() {
        return Vec::new();
    }

    let blocks: Vec<(NaiveTime, NaiveTime)> = exceptions.iter()
        .filter(|e| e.exception_date == date)
        .filter(|e| matches!(e.exception_type, crate::models::ExceptionType::PartialBlock))
        .filter_map(|e| match (e.start_time, e.end_time) {
            (Some(s), Some(end)) => Some((s, end)),
            _ => None,
        })
        .collect();

    let booked_today: Vec<NaiveTime> = booked.iter()
        .filter(|b| b.appointment_date == date)
        .map(|b| b.start_time)
        .collect();

    let mut slots = Vec::new();
    for (start, end) in windows {
        for slot_start in slot_starts_in_window(start, end, duration_minutes, buffer_minutes) {
            if blocks.iter().any(|(bs, be)| slot_start >= *bs && slot_start < *be) {
                continue;
            }
            if booked_today.contains(&slot_start) {
                continue;
            }
            slots.push(AvailableSlot {
                date,
                time: slot_start,
                provider_id: provider.id,
                provider_name: provider.full_name(),
                duration_minutes,
                is_available: true,
            });
        }
    }

    slots.sort_by(|a, b| a.time.cmp(&b.time));
    slots
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
    provider_service: ProviderService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            provider_service: ProviderService::new(config),
        }
    }

    /// Create a weekly availability block for a provider
    pub async fn create_weekly_availability(
        &self,
        provider_id: &str,
        request: CreateWeeklyAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailability> {
        debug!("Creating weekly availability for provider: {}", provider_id);

        if request.start_time >= request.end_time {
            return Err(anyhow!("Start time must be before end time"));
        }

        if request.day_of_week < 0 || request.day_of_week > 6 {
            return Err(anyhow!("Day of week must be between 0 (Sunday) and 6 (Saturday)"));
        }

        self.check_schedule_conflicts(
            provider_id,
            request.day_of_week,
            request.start_time,
            request.end_time,
            None,
            auth_token,
        ).await?;

        let availability_data = json!({
            "provider_id": provider_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "is_recurring": request.is_recurring.unwrap_or(true),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/provider_availability",
            Some(auth_token),
            Some(availability_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create availability"));
        }

        let availability: WeeklyAvailability = serde_json::from_value(result[0].clone())?;
        debug!("Availability created with ID: {}", availability.id);

        Ok(availability)
    }

    pub async fn update_weekly_availability(
        &self,
        availability_id: &str,
        request: UpdateWeeklyAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailability> {
        debug!("Updating weekly availability: {}", availability_id);

        let existing = self.get_weekly_availability_by_id(availability_id, auth_token).await?;

        let start_time = request.start_time.unwrap_or(existing.start_time);
        let end_time = request.end_time.unwrap_or(existing.end_time);

        if start_time >= end_time {
            return Err(anyhow!("Start time must be before end time"));
        }

        self.check_schedule_conflicts(
            &existing.provider_id.to_string(),
            request.day_of_week.unwrap_or(existing.day_of_week),
            start_time,
            end_time,
            Some(availability_id),
            auth_token,
        ).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(day) = request.day_of_week {
            update_data.insert("day_of_week".to_string(), json!(day));
        }
        if let Some(start) = request.start_time {
            update_data.insert("start_time".to_string(), json!(start.format("%H:%M:%S").to_string()));
        }
        if let Some(end) = request.end_time {
            update_data.insert("end_time".to_string(), json!(end.format("%H:%M:%S").to_string()));
        }
        if let Some(recurring) = request.is_recurring {
            update_data.insert("is_recurring".to_string(), json!(recurring));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/provider_availability?id=eq.{}", availability_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update availability"));
        }

        let updated: WeeklyAvailability = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    pub async fn delete_weekly_availability(
        &self,
        availability_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Deleting weekly availability: {}", availability_id);

        let path = format!("/rest/v1/provider_availability?id=eq.{}", availability_id);
        self.supabase.execute(Method::DELETE, &path, Some(auth_token), None).await?;

        Ok(())
    }

    /// Get a provider's full weekly template
    pub async fn get_weekly_availability(
        &self,
        provider_id: &str,
        auth_token: &str,
    ) -> Result<Vec<WeeklyAvailability>> {
        debug!("Fetching weekly availability for provider: {}", provider_id);

        let path = format!(
            "/rest/v1/provider_availability?provider_id=eq.{}&order=day_of_week.asc,start_time.asc",
            provider_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let availabilities: Vec<WeeklyAvailability> = result.into_iter()
            .map(|avail| serde_json::from_value(avail))
            .collect::<std::result::Result<Vec<WeeklyAvailability>, _>>()?;

        Ok(availabilities)
    }

    /// Create an exception for a specific date (vacation, custom hours, etc.)
    pub async fn create_exception(
        &self,
        provider_id: &str,
        request: CreateExceptionRequest,
        auth_token: &str,
    ) -> Result<AvailabilityException> {
        debug!("Creating availability exception for provider {} on {}", provider_id, request.exception_date);

        if request.exception_type.replaces_hours()
            || matches!(request.exception_type, crate::models::ExceptionType::PartialBlock) {
            match (request.start_time, request.end_time) {
                (Some(s), Some(end)) if s < end => {}
                _ => return Err(anyhow!("This exception type requires a valid start/end time window")),
            }
        }

        let exception_data = json!({
            "provider_id": provider_id,
            "exception_date": request.exception_date,
            "exception_type": request.exception_type,
            "start_time": request.start_time.map(|t| t.format("%H:%M:%S").to_string()),
            "end_time": request.end_time.map(|t| t.format("%H:%M:%S").to_string()),
            "note": request.note,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/availability_exceptions",
            Some(auth_token),
            Some(exception_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create availability exception"));
        }

        let exception: AvailabilityException = serde_json::from_value(result[0].clone())?;
        Ok(exception)
    }

    pub async fn delete_exception(
        &self,
        exception_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!("/rest/v1/availability_exceptions?id=eq.{}", exception_id);
        self.supabase.execute(Method::DELETE, &path, Some(auth_token), None).await?;

        Ok(())
    }

    /// Calculate bookable slots for a provider over a date range.
    ///
    /// Missing schedule/exception/appointment reads degrade to empty sets so
    /// the whole request does not fail on one bad fetch; an unknown provider
    /// is still an error.
    pub async fn get_available_slots(
        &self,
        provider_id: &str,
        request: SlotRangeRequest,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>> {
        debug!(
            "Calculating available slots for provider {} between {} and {}",
            provider_id, request.start_date, request.end_date
        );

        if request.end_date < request.start_date {
            return Err(anyhow!("End date must not be before start date"));
        }

        let provider = self.provider_service.get_provider(provider_id, auth_token).await?;

        let duration = request.duration_minutes.unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
        let buffer = request.buffer_minutes.unwrap_or(DEFAULT_BUFFER_MINUTES);

        let weekly = match self.get_weekly_availability(provider_id, auth_token).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to load weekly availability for {}: {}", provider_id, e);
                Vec::new()
            }
        };

        let exceptions = match self.get_exceptions_in_range(
            provider_id, request.start_date, request.end_date, auth_token,
        ).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to load availability exceptions for {}: {}", provider_id, e);
                Vec::new()
            }
        };

        let booked = match self.get_booked_times_in_range(
            provider_id, request.start_date, request.end_date, auth_token,
        ).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to load appointments for {}: {}", provider_id, e);
                Vec::new()
            }
        };

        let mut slots = Vec::new();
        let mut day = request.start_date;
        while day <= request.end_date {
            slots.extend(generate_slots_for_day(
                &provider, day, &weekly, &exceptions, &booked, duration, buffer,
            ));
            day = day.succ_opt().ok_or_else(|| anyhow!("Date range overflow"))?;
        }

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    // Private helper methods

    async fn get_weekly_availability_by_id(
        &self,
        availability_id: &str,
        auth_token: &str,
    ) -> Result<WeeklyAvailability> {
        let path = format!("/rest/v1/provider_availability?id=eq.{}", availability_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Availability not found"));
        }

        let availability: WeeklyAvailability = serde_json::from_value(result[0].clone())?;
        Ok(availability)
    }

    async fn check_schedule_conflicts(
        &self,
        provider_id: &str,
        day_of_week: i32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<&str>,
        auth_token: &str,
    ) -> Result<()> {
        let mut path = format!(
            "/rest/v1/provider_availability?provider_id=eq.{}&day_of_week=eq.{}",
            provider_id,
            day_of_week
        );

        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        for block in existing {
            let existing_start = NaiveTime::parse_from_str(
                block["start_time"].as_str().unwrap_or("00:00:00"),
                "%H:%M:%S"
            )?;
            let existing_end = NaiveTime::parse_from_str(
                block["end_time"].as_str().unwrap_or("23:59:59"),
                "%H:%M:%S"
            )?;

            if start_time < existing_end && end_time > existing_start {
                return Err(anyhow!(
                    "Availability conflicts with existing schedule: {} - {}",
                    existing_start,
                    existing_end
                ));
            }
        }

        Ok(())
    }

    async fn get_exceptions_in_range(
        &self,
        provider_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityException>> {
        let path = format!(
            "/rest/v1/availability_exceptions?provider_id=eq.{}&exception_date=gte.{}&exception_date=lte.{}",
            provider_id, start_date, end_date
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let exceptions: Vec<AvailabilityException> = result.into_iter()
            .map(|e| serde_json::from_value(e))
            .collect::<std::result::Result<Vec<AvailabilityException>, _>>()?;

        Ok(exceptions)
    }

    async fn get_booked_times_in_range(
        &self,
        provider_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedTime>> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&status=eq.scheduled&select=appointment_date,start_time,duration_minutes&order=appointment_date.asc,start_time.asc",
            provider_id, start_date, end_date
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let booked: Vec<BookedTime> = result.into_iter()
            .map(|apt| serde_json::from_value(apt))
            .collect::<std::result::Result<Vec<BookedTime>, _>>()?;

        Ok(booked)
    }
}
