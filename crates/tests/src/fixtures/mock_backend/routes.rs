use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use servicehub_models::{
    ActivationStatus, AdminData, BookingStatus, NewNotification, Notification, PaymentStatus,
    PaymentSummary, Profile, ReportStatus, UserType,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::{AuthUser, MockError, MockState, MockUser};

type ApiResult = Result<Json<Value>, MockError>;
type Params = Query<HashMap<String, String>>;

fn paginate<T: Serialize>(items: Vec<T>, params: &HashMap<String, String>) -> Json<Value> {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10)
        .max(1);
    let total = items.len();
    let data: Vec<T> = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    Json(json!({
        "data": data,
        "total": total,
        "current_page": page,
        "per_page": per_page,
    }))
}

// ---- Auth ----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    user_type: UserType,
    phone: Option<String>,
    postcode: String,
}

pub async fn register(State(state): State<MockState>, Json(raw): Json<Value>) -> Result<(StatusCode, Json<Value>), MockError> {
    state.inner.registrations.lock().push(raw.clone());
    let body: RegisterBody = serde_json::from_value(raw)
        .map_err(|e| MockError::validation("body", &e.to_string()))?;

    if state.inner.users.iter().any(|u| u.profile.email == body.email) {
        return Err(MockError::validation("email", "The email has already been taken."));
    }

    let profile = Profile {
        id: Uuid::new_v4(),
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        user_type: body.user_type,
        phone: body.phone,
        postcode: (!body.postcode.is_empty()).then_some(body.postcode),
        created_at: Utc::now(),
    };
    state.inner.users.insert(
        profile.id,
        MockUser {
            profile: profile.clone(),
            password: body.password,
        },
    );
    let token = state.issue_token(&profile);
    Ok((StatusCode::CREATED, Json(json!({ "token": token, "user": profile }))))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    email: String,
    password: String,
}

pub async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> ApiResult {
    let profile = state
        .inner
        .users
        .iter()
        .find(|u| u.profile.email == body.email && u.password == body.password)
        .map(|u| u.profile.clone())
        .ok_or_else(|| MockError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
    let token = state.issue_token(&profile);
    Ok(Json(json!({ "token": token, "user": profile })))
}

pub async fn logout(
    State(state): State<MockState>,
    headers: axum::http::HeaderMap,
    _user: AuthUser,
) -> ApiResult {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.revoke(token);
    }
    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn profile(user: AuthUser) -> ApiResult {
    Ok(Json(json!({ "user": user.profile })))
}

// ---- Notifications -------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserParam {
    user_id: Uuid,
}

pub async fn list_notifications(
    State(state): State<MockState>,
    _user: AuthUser,
    Query(q): Query<UserParam>,
) -> ApiResult {
    let mut items: Vec<Notification> = state
        .inner
        .notifications
        .lock()
        .iter()
        .filter(|n| n.user_id == q.user_id)
        .cloned()
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(json!({ "data": items })))
}

pub async fn create_notification(
    State(state): State<MockState>,
    _user: AuthUser,
    Json(body): Json<NewNotification>,
) -> Result<(StatusCode, Json<Value>), MockError> {
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: body.user_id,
        notification_type: body.notification_type,
        title: body.title,
        message: body.message,
        is_read: false,
        related_id: body.related_id,
        related_type: body.related_type,
        created_at: Utc::now(),
    };
    state.inner.notifications.lock().push(notification.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": notification }))))
}

pub async fn mark_read(
    State(state): State<MockState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let mut notifications = state.inner.notifications.lock();
    let notification = notifications
        .iter_mut()
        .find(|n| n.id == id && n.user_id == user.id())
        .ok_or_else(MockError::not_found)?;
    notification.is_read = true;
    Ok(Json(json!({ "data": notification })))
}

pub async fn mark_all_read(
    State(state): State<MockState>,
    _user: AuthUser,
    Json(body): Json<UserParam>,
) -> ApiResult {
    let mut updated = 0;
    for n in state
        .inner
        .notifications
        .lock()
        .iter_mut()
        .filter(|n| n.user_id == body.user_id && !n.is_read)
    {
        n.is_read = true;
        updated += 1;
    }
    Ok(Json(json!({ "message": "All notifications marked as read", "updated": updated })))
}

pub async fn unread_count(
    State(state): State<MockState>,
    _user: AuthUser,
    Query(q): Query<UserParam>,
) -> ApiResult {
    let count = state
        .inner
        .notifications
        .lock()
        .iter()
        .filter(|n| n.user_id == q.user_id && !n.is_read)
        .count();
    Ok(Json(json!({ "count": count })))
}

// ---- Listings ------------------------------------------------------------

fn matches_param(params: &HashMap<String, String>, key: &str, value: Uuid) -> bool {
    params
        .get(key)
        .and_then(|v| Uuid::parse_str(v).ok())
        .is_none_or(|wanted| wanted == value)
}

pub async fn list_bookings(State(state): State<MockState>, _user: AuthUser, Query(params): Params) -> ApiResult {
    let items: Vec<_> = state
        .inner
        .bookings
        .lock()
        .iter()
        .filter(|b| matches_param(&params, "customer_id", b.customer_id))
        .filter(|b| matches_param(&params, "worker_id", b.worker_id))
        .cloned()
        .collect();
    Ok(paginate(items, &params))
}

pub async fn get_booking(State(state): State<MockState>, _user: AuthUser, Path(id): Path<Uuid>) -> ApiResult {
    let booking = state
        .inner
        .bookings
        .lock()
        .iter()
        .find(|b| b.id == id)
        .cloned()
        .ok_or_else(MockError::not_found)?;
    Ok(Json(json!({ "data": booking })))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody<S> {
    status: S,
}

pub async fn update_booking(
    State(state): State<MockState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody<BookingStatus>>,
) -> ApiResult {
    let mut bookings = state.inner.bookings.lock();
    let booking = bookings
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(MockError::not_found)?;
    let involved = booking.customer_id == user.id() || booking.worker_id == user.id();
    if !involved && user.profile.user_type != UserType::Admin {
        return Err(MockError::forbidden());
    }
    booking.status = body.status;
    Ok(Json(json!({ "data": booking })))
}

pub async fn list_services(State(state): State<MockState>, _user: AuthUser, Query(params): Params) -> ApiResult {
    let items = state.inner.services.lock().clone();
    Ok(paginate(items, &params))
}

pub async fn delete_service(State(state): State<MockState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult {
    user.require_admin()?;
    let mut services = state.inner.services.lock();
    let before = services.len();
    services.retain(|s| s.id != id);
    if services.len() == before {
        return Err(MockError::not_found());
    }
    Ok(Json(json!({ "message": "Service deleted" })))
}

pub async fn list_payments(State(state): State<MockState>, _user: AuthUser, Query(params): Params) -> ApiResult {
    let items = state.inner.payments.lock().clone();
    Ok(paginate(items, &params))
}

// ---- Dashboards ----------------------------------------------------------

pub async fn dashboard_payments(State(state): State<MockState>, user: AuthUser) -> ApiResult {
    let own_bookings: Vec<Uuid> = state
        .inner
        .bookings
        .lock()
        .iter()
        .filter(|b| b.customer_id == user.id() || b.worker_id == user.id())
        .map(|b| b.id)
        .collect();
    let items: Vec<_> = state
        .inner
        .payments
        .lock()
        .iter()
        .filter(|p| p.booking_id.is_some_and(|id| own_bookings.contains(&id)))
        .cloned()
        .collect();
    Ok(Json(json!({ "data": items })))
}

pub async fn dashboard_reviews(State(state): State<MockState>, user: AuthUser) -> ApiResult {
    let items: Vec<_> = state
        .inner
        .reviews
        .lock()
        .iter()
        .filter(|r| r.customer_id == user.id() || r.worker_id == user.id())
        .cloned()
        .collect();
    Ok(Json(json!({ "data": items })))
}

// ---- Admin ---------------------------------------------------------------

pub async fn admin_data(State(state): State<MockState>, user: AuthUser) -> ApiResult {
    user.require_admin()?;
    let inner = &state.inner;
    let data = AdminData {
        users: inner.users.iter().map(|u| u.profile.clone()).collect(),
        workers: inner.workers.lock().clone(),
        services: inner.services.lock().clone(),
        bookings: inner.bookings.lock().clone(),
        payments: inner.payments.lock().clone(),
        activation_requests: inner.activation_requests.lock().clone(),
        reports: inner.reports.lock().clone(),
    };
    Ok(Json(json!({ "data": data })))
}

pub async fn list_workers(State(state): State<MockState>, user: AuthUser, Query(params): Params) -> ApiResult {
    user.require_admin()?;
    let items = state.inner.workers.lock().clone();
    Ok(paginate(items, &params))
}

pub async fn verify_worker(State(state): State<MockState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult {
    user.require_admin()?;
    let mut workers = state.inner.workers.lock();
    let worker = workers
        .iter_mut()
        .find(|w| w.id == id)
        .ok_or_else(MockError::not_found)?;
    worker.is_verified = true;
    worker.is_active = true;
    Ok(Json(json!({ "data": worker })))
}

pub async fn set_activation(
    State(state): State<MockState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody<ActivationStatus>>,
) -> ApiResult {
    user.require_admin()?;
    let mut requests = state.inner.activation_requests.lock();
    let request = requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(MockError::not_found)?;
    request.status = body.status;
    Ok(Json(json!({ "data": request })))
}

pub async fn resolve_report(
    State(state): State<MockState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody<ReportStatus>>,
) -> ApiResult {
    user.require_admin()?;
    let mut reports = state.inner.reports.lock();
    let report = reports
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(MockError::not_found)?;
    report.status = body.status;
    Ok(Json(json!({ "data": report })))
}

pub async fn payment_summary(State(state): State<MockState>, user: AuthUser) -> ApiResult {
    user.require_admin()?;
    let payments = state.inner.payments.lock();
    let sum = |status: PaymentStatus| -> f64 {
        payments
            .iter()
            .filter(|p| p.status == status)
            .map(|p| p.amount)
            .sum()
    };
    let summary = PaymentSummary {
        total_paid: sum(PaymentStatus::Paid),
        total_pending: sum(PaymentStatus::Pending),
        total_refunded: sum(PaymentStatus::Refunded),
        payment_count: payments.len() as u64,
    };
    Ok(Json(json!({ "data": summary })))
}

// ---- Payments ------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    offer_id: Uuid,
}

pub async fn create_checkout(
    State(state): State<MockState>,
    _user: AuthUser,
    Json(body): Json<CheckoutBody>,
) -> ApiResult {
    let session_id = format!("cs_test_{}", Uuid::new_v4().simple());
    state.inner.checkouts.insert(session_id.clone(), body.offer_id);
    Ok(Json(json!({
        "url": format!("https://checkout.stripe.test/pay/{session_id}"),
        "session_id": session_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
    session_id: String,
}

pub async fn complete_checkout(
    State(state): State<MockState>,
    _user: AuthUser,
    Json(body): Json<CompleteBody>,
) -> ApiResult {
    let offer_id = state
        .inner
        .checkouts
        .get(&body.session_id)
        .map(|o| *o)
        .ok_or_else(|| MockError::validation("session_id", "Unknown checkout session."))?;

    let mut payments = state.inner.payments.lock();
    if let Some(existing) = payments.iter().find(|p| p.offer_id == Some(offer_id)) {
        return Ok(Json(json!({ "data": existing })));
    }
    let payment = servicehub_models::Payment {
        id: Uuid::new_v4(),
        booking_id: None,
        offer_id: Some(offer_id),
        amount: 75.0,
        status: PaymentStatus::Paid,
        created_at: Utc::now(),
    };
    payments.push(payment.clone());
    Ok(Json(json!({ "data": payment })))
}

#[derive(Debug, Deserialize)]
pub struct SessionParam {
    session_id: String,
}

pub async fn checkout_status(
    State(state): State<MockState>,
    _user: AuthUser,
    Query(q): Query<SessionParam>,
) -> ApiResult {
    let offer_id = state
        .inner
        .checkouts
        .get(&q.session_id)
        .map(|o| *o)
        .ok_or_else(MockError::not_found)?;
    let payment = state
        .inner
        .payments
        .lock()
        .iter()
        .find(|p| p.offer_id == Some(offer_id))
        .cloned();
    let status = payment.as_ref().map_or(PaymentStatus::Pending, |p| p.status);
    Ok(Json(json!({ "status": status, "payment": payment })))
}
