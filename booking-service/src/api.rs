use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::{self, AuthVendor};
use crate::error::BookingError;
use crate::handlers::{BookingListFilter, BookingManager, CreateBookingCommand, DbPool};
use crate::models::*;
use crate::schema::*;
use shared::{generate_vendor_id, BookingStatus, VendorStatus};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub jwt_secret: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register_vendor))
        .route("/api/auth/login", post(login_vendor))
        .route("/api/vendor/profile", get(get_profile).put(update_profile))
        .route(
            "/api/vendor/services",
            get(list_services).post(create_service),
        )
        .route(
            "/api/vendor/services/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route(
            "/api/vendor/availability",
            get(list_slots).post(create_slot),
        )
        .route("/api/vendor/bookings", get(list_vendor_bookings))
        .route(
            "/api/vendor/bookings/:id",
            get(get_vendor_booking).patch(update_booking_status),
        )
        .route("/api/bookings", post(create_booking))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn health_check() -> &'static str {
    "OK"
}

fn validate_email(email: &str) -> Result<(), BookingError> {
    let trimmed = email.trim();
    if trimmed.len() < 3 || !trimmed.contains('@') {
        return Err(BookingError::Validation(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

// --- auth -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub company_name: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone: String,
    #[serde(default)]
    pub website: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub vendor_id: String,
}

pub async fn register_vendor(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), BookingError> {
    validate_email(&request.email)?;
    if request.password.len() < 8 {
        return Err(BookingError::Validation(
            "Ensure password has at least 8 characters".to_string(),
        ));
    }
    if request.company_name.trim().is_empty() {
        return Err(BookingError::Validation(
            "Company name is required".to_string(),
        ));
    }

    let new_vendor = NewVendor {
        id: Uuid::new_v4(),
        vendor_id: generate_vendor_id(Utc::now()),
        email: request.email.trim().to_lowercase(),
        password_hash: auth::hash_password(&request.password)?,
        company_name: request.company_name,
        description: request.description,
        address: request.address,
        city: request.city,
        state: request.state,
        country: request.country,
        zip_code: request.zip_code,
        phone: request.phone,
        website: request.website,
        status: VendorStatus::Pending.to_string(),
    };

    let mut conn = state.pool.get().await?;
    diesel::insert_into(vendors::table)
        .values(&new_vendor)
        .execute(&mut conn)
        .await
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => BookingError::Validation("A vendor with this email already exists".to_string()),
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Vendor registration successful. Awaiting approval.".to_string(),
            vendor_id: new_vendor.vendor_id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub vendor: VendorProfile,
}

pub async fn login_vendor(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, BookingError> {
    let mut conn = state.pool.get().await?;

    let vendor = vendors::table
        .filter(vendors::email.eq(request.email.trim().to_lowercase()))
        .first::<Vendor>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| BookingError::AuthenticationFailed("Invalid credentials".to_string()))?;

    if !auth::verify_password(&request.password, &vendor.password_hash)? {
        return Err(BookingError::AuthenticationFailed(
            "Invalid credentials".to_string(),
        ));
    }
    if !vendor.is_active {
        return Err(BookingError::AuthenticationFailed(
            "Account is disabled".to_string(),
        ));
    }
    if vendor.status != VendorStatus::Approved.as_str() {
        return Err(BookingError::AuthenticationFailed(
            "Vendor account not approved".to_string(),
        ));
    }

    let token = auth::generate_token(&vendor, &state.jwt_secret)?;
    Ok(Json(LoginResponse {
        token,
        vendor: VendorProfile::from(vendor),
    }))
}

// --- vendor profile ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct VendorProfile {
    pub vendor_id: String,
    pub company_name: String,
    pub email: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone: String,
    pub website: String,
    pub rating: f64,
    pub total_reviews: i32,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Vendor> for VendorProfile {
    fn from(vendor: Vendor) -> Self {
        Self {
            vendor_id: vendor.vendor_id,
            company_name: vendor.company_name,
            email: vendor.email,
            description: vendor.description,
            address: vendor.address,
            city: vendor.city,
            state: vendor.state,
            country: vendor.country,
            zip_code: vendor.zip_code,
            phone: vendor.phone,
            website: vendor.website,
            rating: vendor.rating,
            total_reviews: vendor.total_reviews,
            status: vendor.status,
            created_at: vendor.created_at,
        }
    }
}

pub async fn get_profile(AuthVendor(vendor): AuthVendor) -> Json<VendorProfile> {
    Json(VendorProfile::from(vendor))
}

pub async fn update_profile(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Json(update): Json<VendorProfileUpdate>,
) -> Result<Json<VendorProfile>, BookingError> {
    let has_changes = update.company_name.is_some()
        || update.description.is_some()
        || update.address.is_some()
        || update.city.is_some()
        || update.state.is_some()
        || update.country.is_some()
        || update.zip_code.is_some()
        || update.phone.is_some()
        || update.website.is_some();
    if !has_changes {
        return Ok(Json(VendorProfile::from(vendor)));
    }

    let mut conn = state.pool.get().await?;
    let updated = diesel::update(vendors::table.find(vendor.id))
        .set(&update)
        .get_result::<Vendor>(&mut conn)
        .await?;

    Ok(Json(VendorProfile::from(updated)))
}

// --- vendor services --------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub base_price: BigDecimal,
    pub is_active: bool,
    pub pricing_tiers: Vec<PricingTier>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ServiceResponse {
    fn new(service: VendorService, pricing_tiers: Vec<PricingTier>) -> Self {
        Self {
            id: service.id,
            category_id: service.category_id,
            name: service.name,
            description: service.description,
            base_price: service.base_price,
            is_active: service.is_active,
            pricing_tiers,
            created_at: service.created_at,
        }
    }
}

async fn load_tiers(
    conn: &mut diesel_async::AsyncPgConnection,
    service_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<PricingTier>>, BookingError> {
    let tiers = pricing_tiers::table
        .filter(pricing_tiers::service_id.eq_any(service_ids))
        .order(pricing_tiers::min_quantity.asc())
        .load::<PricingTier>(conn)
        .await?;

    let mut by_service: HashMap<Uuid, Vec<PricingTier>> = HashMap::new();
    for tier in tiers {
        by_service.entry(tier.service_id).or_default().push(tier);
    }
    Ok(by_service)
}

pub async fn list_services(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceResponse>>, BookingError> {
    let mut conn = state.pool.get().await?;

    let services = vendor_services::table
        .filter(vendor_services::vendor_id.eq(vendor.id))
        .filter(vendor_services::is_active.eq(true))
        .order(vendor_services::created_at.desc())
        .load::<VendorService>(&mut conn)
        .await?;

    let ids: Vec<Uuid> = services.iter().map(|s| s.id).collect();
    let mut tiers = load_tiers(&mut conn, &ids).await?;

    Ok(Json(
        services
            .into_iter()
            .map(|s| {
                let service_tiers = tiers.remove(&s.id).unwrap_or_default();
                ServiceResponse::new(s, service_tiers)
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub category_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: BigDecimal,
}

/// Categories are seed data; a service may only point at an active one.
async fn check_active_category(
    conn: &mut diesel_async::AsyncPgConnection,
    category_id: Uuid,
) -> Result<(), BookingError> {
    let category = vendor_service_categories::table
        .find(category_id)
        .first::<ServiceCategory>(conn)
        .await
        .optional()?;
    match category {
        Some(c) if c.is_active => Ok(()),
        _ => Err(BookingError::Validation(
            "Invalid service category".to_string(),
        )),
    }
}

pub async fn create_service(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), BookingError> {
    if request.name.trim().is_empty() {
        return Err(BookingError::Validation(
            "Service name is required".to_string(),
        ));
    }
    if request.base_price <= BigDecimal::zero() {
        return Err(BookingError::Validation(
            "Base price must be positive".to_string(),
        ));
    }

    let mut conn = state.pool.get().await?;
    check_active_category(&mut conn, request.category_id).await?;

    let new_service = NewVendorService {
        id: Uuid::new_v4(),
        vendor_id: vendor.id,
        category_id: request.category_id,
        name: request.name,
        description: request.description,
        base_price: request.base_price,
        is_active: true,
    };

    let service = diesel::insert_into(vendor_services::table)
        .values(&new_service)
        .get_result::<VendorService>(&mut conn)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ServiceResponse::new(service, Vec::new())),
    ))
}

async fn vendor_service(
    conn: &mut diesel_async::AsyncPgConnection,
    vendor_id: Uuid,
    service_id: Uuid,
) -> Result<VendorService, BookingError> {
    vendor_services::table
        .find(service_id)
        .filter(vendor_services::vendor_id.eq(vendor_id))
        .first::<VendorService>(conn)
        .await
        .optional()?
        .ok_or(BookingError::ServiceNotFound)
}

pub async fn get_service(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ServiceResponse>, BookingError> {
    let mut conn = state.pool.get().await?;
    let service = vendor_service(&mut conn, vendor.id, service_id).await?;
    let mut tiers = load_tiers(&mut conn, &[service.id]).await?;
    let service_tiers = tiers.remove(&service.id).unwrap_or_default();
    Ok(Json(ServiceResponse::new(service, service_tiers)))
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = crate::schema::vendor_services)]
pub struct ServiceUpdate {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<BigDecimal>,
    pub is_active: Option<bool>,
}

pub async fn update_service(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Json(update): Json<ServiceUpdate>,
) -> Result<Json<ServiceResponse>, BookingError> {
    if let Some(price) = &update.base_price {
        if *price <= BigDecimal::zero() {
            return Err(BookingError::Validation(
                "Base price must be positive".to_string(),
            ));
        }
    }

    let mut conn = state.pool.get().await?;
    let service = vendor_service(&mut conn, vendor.id, service_id).await?;
    if let Some(category_id) = update.category_id {
        check_active_category(&mut conn, category_id).await?;
    }

    let has_changes = update.category_id.is_some()
        || update.name.is_some()
        || update.description.is_some()
        || update.base_price.is_some()
        || update.is_active.is_some();
    let service = if has_changes {
        diesel::update(vendor_services::table.find(service.id))
            .set(&update)
            .get_result::<VendorService>(&mut conn)
            .await?
    } else {
        service
    };

    let mut tiers = load_tiers(&mut conn, &[service.id]).await?;
    let service_tiers = tiers.remove(&service.id).unwrap_or_default();
    Ok(Json(ServiceResponse::new(service, service_tiers)))
}

/// Soft delete: historical bookings keep referencing the row, it just stops
/// appearing in new-booking paths.
pub async fn delete_service(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
) -> Result<StatusCode, BookingError> {
    let mut conn = state.pool.get().await?;
    let service = vendor_service(&mut conn, vendor.id, service_id).await?;

    diesel::update(vendor_services::table.find(service.id))
        .set(vendor_services::is_active.eq(false))
        .execute(&mut conn)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// --- availability slots -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SlotListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub service_id: Option<Uuid>,
}

pub async fn list_slots(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Query(query): Query<SlotListQuery>,
) -> Result<Json<Vec<AvailabilitySlot>>, BookingError> {
    let mut conn = state.pool.get().await?;

    let mut slots = availability_slots::table
        .filter(availability_slots::vendor_id.eq(vendor.id))
        .order((
            availability_slots::date.asc(),
            availability_slots::start_time.asc(),
        ))
        .into_boxed();

    if let Some(from) = query.from {
        slots = slots.filter(availability_slots::date.ge(from));
    }
    if let Some(to) = query.to {
        slots = slots.filter(availability_slots::date.le(to));
    }
    if let Some(service_id) = query.service_id {
        slots = slots.filter(availability_slots::service_id.eq(service_id));
    }

    Ok(Json(slots.load::<AvailabilitySlot>(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_capacity")]
    pub max_capacity: i32,
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> i32 {
    1
}

fn validate_slot_window(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), BookingError> {
    if end_time <= start_time {
        return Err(BookingError::Validation(
            "End time must be after start time".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_slot(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<AvailabilitySlot>), BookingError> {
    validate_slot_window(request.start_time, request.end_time)?;
    if request.max_capacity < 1 {
        return Err(BookingError::Validation(
            "Capacity must be at least 1".to_string(),
        ));
    }

    let mut conn = state.pool.get().await?;
    let service = vendor_service(&mut conn, vendor.id, request.service_id).await?;
    if !service.is_active {
        return Err(BookingError::ServiceNotFound);
    }

    let same_day = availability_slots::table
        .filter(availability_slots::vendor_id.eq(vendor.id))
        .filter(availability_slots::service_id.eq(service.id))
        .filter(availability_slots::date.eq(request.date))
        .load::<AvailabilitySlot>(&mut conn)
        .await?;
    if same_day
        .iter()
        .any(|slot| slot.overlaps_window(request.start_time, request.end_time))
    {
        return Err(BookingError::Validation(
            "Time slot overlaps with existing availability".to_string(),
        ));
    }

    let new_slot = NewAvailabilitySlot {
        id: Uuid::new_v4(),
        vendor_id: vendor.id,
        service_id: service.id,
        date: request.date,
        start_time: request.start_time,
        end_time: request.end_time,
        is_available: request.is_available,
        max_capacity: request.max_capacity,
        booked_capacity: 0,
    };

    let slot = diesel::insert_into(availability_slots::table)
        .values(&new_slot)
        .get_result::<AvailabilitySlot>(&mut conn)
        .await?;

    Ok((StatusCode::CREATED, Json(slot)))
}

// --- bookings ---------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub slot_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub pricing_tier_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub special_requests: String,
}

fn default_quantity() -> i32 {
    1
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), BookingError> {
    if request.quantity < 1 {
        return Err(BookingError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if request.customer_name.trim().is_empty() {
        return Err(BookingError::Validation(
            "Customer name is required".to_string(),
        ));
    }
    validate_email(&request.customer_email)?;

    let manager = BookingManager::new(state.pool.clone());
    let booking = manager
        .create_booking(CreateBookingCommand {
            service_id: request.service_id,
            slot_id: request.slot_id,
            quantity: request.quantity,
            pricing_tier_id: request.pricing_tier_id,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            special_requests: request.special_requests,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn list_vendor_bookings(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>, BookingError> {
    let manager = BookingManager::new(state.pool.clone());
    let bookings = manager
        .list_for_vendor(
            vendor.id,
            BookingListFilter {
                status: query.status,
                date_from: query.from,
                date_to: query.to,
            },
        )
        .await?;
    Ok(Json(bookings))
}

#[derive(Debug, Serialize)]
pub struct BookingDetailResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub history: Vec<BookingHistoryEntry>,
}

pub async fn get_vendor_booking(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetailResponse>, BookingError> {
    let manager = BookingManager::new(state.pool.clone());
    let (booking, history) = manager.get_for_vendor(vendor.id, booking_id).await?;
    Ok(Json(BookingDetailResponse { booking, history }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

pub async fn update_booking_status(
    AuthVendor(vendor): AuthVendor,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<Booking>, BookingError> {
    let new_status: BookingStatus = request
        .status
        .parse()
        .map_err(|_| BookingError::Validation("Valid status required".to_string()))?;

    let manager = BookingManager::new(state.pool.clone());
    let booking = manager
        .update_status(vendor.id, booking_id, new_status, request.notes)
        .await?;
    Ok(Json(booking))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_window_must_end_after_it_starts() {
        let err = validate_slot_window(t(10, 0), t(9, 0)).unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(m) if m == "End time must be after start time"
        ));
    }

    #[test]
    fn zero_length_slot_window_is_rejected() {
        assert!(validate_slot_window(t(9, 0), t(9, 0)).is_err());
    }

    #[test]
    fn forward_slot_window_is_accepted() {
        assert!(validate_slot_window(t(9, 0), t(9, 1)).is_ok());
    }
}
