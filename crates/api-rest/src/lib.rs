//! # API REST
//!
//! REST API implementation for wardline.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation (served as JSON at `/api-docs/openapi.json`)
//! - REST-specific concerns (JSON bodies, status mapping, CORS)
//!
//! All domain behaviour lives in `wardline-core`; handlers only parse wire
//! input, call a service, and map the result (or its `WardError`) onto HTTP.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::dto::*;
use wardline_core::constants::OUTBOX_MAX_ATTEMPTS;
use wardline_core::model::{
    AdmissionSource, AdmissionType, BedStatus, BedType, DischargeType, NewAdmission, NewBed,
    NewRoom, RoomType,
};
use wardline_core::{BedFilter, DischargeSync, RecordId, WardError, WardServices};
use wardline_types::{NonEmptyText, SequenceKey};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: WardServices,
    /// Downstream discharge sync gateway drained by the background task.
    pub gateway: Arc<dyn DischargeSync>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_room,
        list_rooms,
        set_room_operational,
        create_bed,
        list_beds,
        change_bed_status,
        bed_history,
        bed_occupant,
        create_admission,
        get_admission,
        request_discharge,
        cancel_discharge_request,
        finalize_discharge,
        transfer_bed,
        current_bed,
        next_sequence_value,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        CreateRoomReq,
        SetRoomOperationalReq,
        RoomRes,
        CreateBedReq,
        BedRes,
        BedStatusChangeReq,
        BedStatusLogRes,
        BedHistoryRes,
        OccupantRes,
        CreateAdmissionReq,
        RequestDischargeReq,
        FinalizeDischargeReq,
        CancelDischargeReq,
        TransferBedReq,
        AdmissionRes,
        AssignmentRes,
        NextSequenceRes,
    ))
)]
pub struct ApiDoc;

/// Build the full wardline REST router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/:id/operational", put(set_room_operational))
        .route("/rooms/:id/beds", post(create_bed))
        .route("/beds", get(list_beds))
        .route("/beds/:id/status", put(change_bed_status))
        .route("/beds/:id/history", get(bed_history))
        .route("/beds/:id/occupant", get(bed_occupant))
        .route("/admissions", post(create_admission))
        .route("/admissions/:id", get(get_admission))
        .route("/admissions/:id/discharge-request", post(request_discharge))
        .route(
            "/admissions/:id/discharge-request/cancel",
            post(cancel_discharge_request),
        )
        .route("/admissions/:id/discharge", post(finalize_discharge))
        .route("/admissions/:id/transfer", post(transfer_bed))
        .route("/admissions/:id/bed", get(current_bed))
        .route("/sequences/:key/next", post(next_sequence_value))
        .route("/api-docs/openapi.json", get(openapi_doc))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the REST API and run the outbox drain in the background.
pub async fn serve(addr: &str, state: AppState, drain_interval: Duration) -> anyhow::Result<()> {
    spawn_outbox_drain(state.clone(), drain_interval);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("wardline REST API listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically deliver staged discharge notices.
///
/// Delivery failures are logged by the drain itself and never affect request
/// handling; this task only reports drain-level errors.
pub fn spawn_outbox_drain(state: AppState, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let services = state.services.clone();
            let gateway = state.gateway.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                wardline_core::drain_outbox(&services.store, gateway.as_ref(), OUTBOX_MAX_ATTEMPTS)
            })
            .await;
            match outcome {
                Ok(Ok(report)) => {
                    if report.delivered > 0 || report.failed > 0 {
                        tracing::info!(
                            delivered = report.delivered,
                            failed = report.failed,
                            exhausted = report.exhausted,
                            "outbox drain pass complete"
                        );
                    }
                }
                Ok(Err(err)) => tracing::error!(error = %err, "outbox drain failed"),
                Err(err) => tracing::error!(error = %err, "outbox drain task panicked"),
            }
        }
    });
}

async fn openapi_doc() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ---------------------------------------------------------------------------
// Error and input mapping
// ---------------------------------------------------------------------------

type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn ward_error(err: WardError) -> ApiError {
    use WardError::*;
    let status = match &err {
        InvalidInput(_) => StatusCode::BAD_REQUEST,
        NotFound { .. } => StatusCode::NOT_FOUND,
        Conflict(_) | BedUnavailable { .. } => StatusCode::CONFLICT,
        InvalidStateTransition { .. } | InvalidBedTransition { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AccessDenied { .. } => StatusCode::FORBIDDEN,
        ConcurrentUpdate => StatusCode::SERVICE_UNAVAILABLE,
        SequenceExhausted { .. }
        | DataDirCreation(_)
        | SnapshotRead(_)
        | SnapshotWrite(_)
        | SnapshotSerialisation(_)
        | SnapshotDeserialisation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "ward operation failed");
    }
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn parse_record_id(value: &str, what: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(value).map_err(|_| bad_request(format!("invalid {what}: '{value}'")))
}

fn parse_optional_record_id(
    value: &Option<String>,
    what: &str,
) -> Result<Option<RecordId>, ApiError> {
    value
        .as_deref()
        .map(|v| parse_record_id(v, what))
        .transpose()
}

fn parse_text(value: &str, what: &str) -> Result<NonEmptyText, ApiError> {
    NonEmptyText::new(value).map_err(|_| bad_request(format!("{what} cannot be empty")))
}

fn parse_datetime(value: &str, what: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| bad_request(format!("invalid {what}: expected RFC 3339, got '{value}'")))
}

fn parse_optional_datetime(
    value: &Option<String>,
    what: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .as_deref()
        .map(|v| parse_datetime(v, what))
        .transpose()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used for monitoring and load balancer probes.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "wardline REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/rooms",
    request_body = CreateRoomReq,
    responses(
        (status = 200, description = "Room created", body = RoomRes),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 409, description = "Room number already exists", body = ErrorBody)
    )
)]
/// Create a room during facility setup.
#[axum::debug_handler]
async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomReq>,
) -> ApiResult<RoomRes> {
    let new = NewRoom {
        room_number: parse_text(&req.room_number, "room_number")?,
        room_type: req
            .room_type
            .parse::<RoomType>()
            .map_err(|e| bad_request(e.to_string()))?,
        floor: req.floor,
        department: parse_text(&req.department, "department")?,
        bed_capacity: req.bed_capacity,
    };
    let room = state.services.registry.create_room(new).map_err(ward_error)?;
    Ok(Json(room.into()))
}

#[utoipa::path(
    get,
    path = "/rooms",
    responses(
        (status = 200, description = "All rooms", body = [RoomRes])
    )
)]
/// List every room.
#[axum::debug_handler]
async fn list_rooms(State(state): State<AppState>) -> ApiResult<Vec<RoomRes>> {
    let rooms = state.services.registry.list_rooms().map_err(ward_error)?;
    Ok(Json(rooms.into_iter().map(RoomRes::from).collect()))
}

#[utoipa::path(
    put,
    path = "/rooms/{id}/operational",
    request_body = SetRoomOperationalReq,
    params(("id" = String, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room updated", body = RoomRes),
        (status = 404, description = "Room not found", body = ErrorBody)
    )
)]
/// Flip a room's operational flag.
#[axum::debug_handler]
async fn set_room_operational(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<SetRoomOperationalReq>,
) -> ApiResult<RoomRes> {
    let room_id = parse_record_id(&id, "room id")?;
    let room = state
        .services
        .registry
        .set_room_operational(&room_id, req.operational)
        .map_err(ward_error)?;
    Ok(Json(room.into()))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/beds",
    request_body = CreateBedReq,
    params(("id" = String, Path, description = "Room id")),
    responses(
        (status = 200, description = "Bed created", body = BedRes),
        (status = 404, description = "Room not found", body = ErrorBody),
        (status = 409, description = "Duplicate bed number or room at capacity", body = ErrorBody)
    )
)]
/// Add a bed to a room.
#[axum::debug_handler]
async fn create_bed(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<CreateBedReq>,
) -> ApiResult<BedRes> {
    let room_id = parse_record_id(&id, "room id")?;
    let new = NewBed {
        bed_number: parse_text(&req.bed_number, "bed_number")?,
        bed_type: req
            .bed_type
            .parse::<BedType>()
            .map_err(|e| bad_request(e.to_string()))?,
        capabilities: req.capabilities,
    };
    let bed = state
        .services
        .registry
        .create_bed(&room_id, new)
        .map_err(ward_error)?;
    Ok(Json(bed.into()))
}

#[utoipa::path(
    get,
    path = "/beds",
    params(
        ("status" = Option<String>, Query, description = "Filter by bed status"),
        ("type" = Option<String>, Query, description = "Filter by bed type"),
        ("department" = Option<String>, Query, description = "Filter by owning department"),
        ("floor" = Option<i16>, Query, description = "Filter by floor")
    ),
    responses(
        (status = 200, description = "Matching beds", body = [BedRes]),
        (status = 400, description = "Bad filter value", body = ErrorBody)
    )
)]
/// List beds by status, type, department, and floor.
#[axum::debug_handler]
async fn list_beds(
    State(state): State<AppState>,
    Query(query): Query<ListBedsQuery>,
) -> ApiResult<Vec<BedRes>> {
    let filter = BedFilter {
        status: query
            .status
            .as_deref()
            .map(|s| s.parse::<BedStatus>())
            .transpose()
            .map_err(|e| bad_request(e.to_string()))?,
        bed_type: query
            .bed_type
            .as_deref()
            .map(|s| s.parse::<BedType>())
            .transpose()
            .map_err(|e| bad_request(e.to_string()))?,
        department: query.department,
        floor: query.floor,
    };
    let beds = state
        .services
        .registry
        .list_beds(&filter)
        .map_err(ward_error)?;
    Ok(Json(beds.into_iter().map(BedRes::from).collect()))
}

#[utoipa::path(
    put,
    path = "/beds/{id}/status",
    request_body = BedStatusChangeReq,
    params(("id" = String, Path, description = "Bed id")),
    responses(
        (status = 200, description = "Bed status changed", body = BedRes),
        (status = 404, description = "Bed not found", body = ErrorBody),
        (status = 422, description = "Transition not allowed as a staff action", body = ErrorBody)
    )
)]
/// Explicit staff-driven status change (reserve, maintenance, return to service).
#[axum::debug_handler]
async fn change_bed_status(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<BedStatusChangeReq>,
) -> ApiResult<BedRes> {
    let bed_id = parse_record_id(&id, "bed id")?;
    let new_status = req
        .status
        .parse::<BedStatus>()
        .map_err(|e| bad_request(e.to_string()))?;
    let actor = parse_record_id(&req.actor_id, "actor id")?;
    let reason = parse_text(&req.reason, "reason")?;
    let related = parse_optional_record_id(&req.related_admission_id, "related admission id")?;

    let bed = state
        .services
        .registry
        .transition_bed_status(&bed_id, new_status, actor, reason, related)
        .map_err(ward_error)?;
    Ok(Json(bed.into()))
}

#[utoipa::path(
    get,
    path = "/beds/{id}/history",
    params(
        ("id" = String, Path, description = "Bed id"),
        ("limit" = Option<usize>, Query, description = "Maximum rows, newest first (default 50)")
    ),
    responses(
        (status = 200, description = "Status audit rows", body = BedHistoryRes),
        (status = 404, description = "Bed not found", body = ErrorBody)
    )
)]
/// Audit history of a bed's status transitions, newest first.
#[axum::debug_handler]
async fn bed_history(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<BedHistoryQuery>,
) -> ApiResult<BedHistoryRes> {
    let bed_id = parse_record_id(&id, "bed id")?;
    let limit = query.limit.unwrap_or(50);
    let entries = state
        .services
        .registry
        .bed_history(&bed_id, limit)
        .map_err(ward_error)?;
    Ok(Json(BedHistoryRes {
        entries: entries.into_iter().map(BedStatusLogRes::from).collect(),
    }))
}

#[derive(serde::Deserialize)]
struct BedHistoryQuery {
    limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/beds/{id}/occupant",
    params(("id" = String, Path, description = "Bed id")),
    responses(
        (status = 200, description = "Current occupant, if any", body = OccupantRes),
        (status = 404, description = "Bed not found", body = ErrorBody)
    )
)]
/// The admission currently occupying a bed, joined through the ledger.
#[axum::debug_handler]
async fn bed_occupant(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<OccupantRes> {
    let bed_id = parse_record_id(&id, "bed id")?;
    let occupant = state
        .services
        .registry
        .occupant(&bed_id)
        .map_err(ward_error)?;
    let res = match occupant {
        Some((admission, assignment)) => {
            let los = state.services.admissions.length_of_stay_days(&admission);
            OccupantRes {
                admission: Some(AdmissionRes::from_admission(admission, los)),
                assignment: Some(assignment.into()),
            }
        }
        None => OccupantRes {
            admission: None,
            assignment: None,
        },
    };
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/admissions",
    request_body = CreateAdmissionReq,
    responses(
        (status = 200, description = "Admission created", body = AdmissionRes),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 409, description = "Requested bed unavailable", body = ErrorBody)
    )
)]
/// Inpatient intake: issues the admission number and, when a bed is supplied,
/// performs the initial placement in the same unit of work.
#[axum::debug_handler]
async fn create_admission(
    State(state): State<AppState>,
    Json(req): Json<CreateAdmissionReq>,
) -> ApiResult<AdmissionRes> {
    let doctor_id = parse_record_id(&req.doctor_id, "doctor id")?;
    let actor = match &req.actor_id {
        Some(actor) => parse_record_id(actor, "actor id")?,
        None => doctor_id,
    };
    let new = NewAdmission {
        patient_id: parse_record_id(&req.patient_id, "patient id")?,
        attending_doctor_id: doctor_id,
        originating_appointment_id: parse_optional_record_id(
            &req.originating_appointment_id,
            "originating appointment id",
        )?,
        admission_type: req
            .admission_type
            .parse::<AdmissionType>()
            .map_err(|e| bad_request(e.to_string()))?,
        source: req
            .source
            .parse::<AdmissionSource>()
            .map_err(|e| bad_request(e.to_string()))?,
        admitting_diagnosis: parse_text(&req.diagnosis, "diagnosis")?,
        expected_discharge_date: parse_optional_datetime(
            &req.expected_discharge_date,
            "expected discharge date",
        )?,
        bed_id: parse_optional_record_id(&req.bed_id, "bed id")?,
    };

    let admission = state
        .services
        .admissions
        .create_admission(new, actor)
        .map_err(ward_error)?;
    let los = state.services.admissions.length_of_stay_days(&admission);
    Ok(Json(AdmissionRes::from_admission(admission, los)))
}

#[utoipa::path(
    get,
    path = "/admissions/{id}",
    params(("id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "The admission", body = AdmissionRes),
        (status = 404, description = "Admission not found", body = ErrorBody)
    )
)]
/// Fetch an admission, including its current length of stay.
#[axum::debug_handler]
async fn get_admission(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<AdmissionRes> {
    let admission_id = parse_record_id(&id, "admission id")?;
    let admission = state
        .services
        .admissions
        .admission(&admission_id)
        .map_err(ward_error)?;
    let los = state.services.admissions.length_of_stay_days(&admission);
    Ok(Json(AdmissionRes::from_admission(admission, los)))
}

#[utoipa::path(
    post,
    path = "/admissions/{id}/discharge-request",
    request_body = RequestDischargeReq,
    params(("id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Discharge requested", body = AdmissionRes),
        (status = 403, description = "Not the attending doctor", body = ErrorBody),
        (status = 422, description = "Admission not active", body = ErrorBody)
    )
)]
/// The attending doctor requests discharge. The bed is not touched.
#[axum::debug_handler]
async fn request_discharge(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<RequestDischargeReq>,
) -> ApiResult<AdmissionRes> {
    let admission_id = parse_record_id(&id, "admission id")?;
    let doctor = parse_record_id(&req.doctor_id, "doctor id")?;
    let summary = parse_text(&req.summary, "summary")?;
    let expected = parse_optional_datetime(&req.expected_discharge_date, "expected discharge date")?;

    let admission = state
        .services
        .admissions
        .request_discharge(&admission_id, doctor, summary, expected)
        .map_err(ward_error)?;
    let los = state.services.admissions.length_of_stay_days(&admission);
    Ok(Json(AdmissionRes::from_admission(admission, los)))
}

#[utoipa::path(
    post,
    path = "/admissions/{id}/discharge-request/cancel",
    request_body = CancelDischargeReq,
    params(("id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Request withdrawn", body = AdmissionRes),
        (status = 422, description = "No pending discharge request", body = ErrorBody)
    )
)]
/// Withdraw a pending discharge request, returning the admission to active.
#[axum::debug_handler]
async fn cancel_discharge_request(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<CancelDischargeReq>,
) -> ApiResult<AdmissionRes> {
    let admission_id = parse_record_id(&id, "admission id")?;
    let actor = parse_record_id(&req.actor_id, "actor id")?;

    let admission = state
        .services
        .admissions
        .cancel_discharge_request(&admission_id, actor)
        .map_err(ward_error)?;
    let los = state.services.admissions.length_of_stay_days(&admission);
    Ok(Json(AdmissionRes::from_admission(admission, los)))
}

#[utoipa::path(
    post,
    path = "/admissions/{id}/discharge",
    request_body = FinalizeDischargeReq,
    params(("id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Discharge finalised", body = AdmissionRes),
        (status = 422, description = "No pending discharge request", body = ErrorBody)
    )
)]
/// Administratively finalise a requested discharge: terminal status, bed
/// released to cleaning, length of stay frozen, downstream notice staged.
#[axum::debug_handler]
async fn finalize_discharge(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<FinalizeDischargeReq>,
) -> ApiResult<AdmissionRes> {
    let admission_id = parse_record_id(&id, "admission id")?;
    let actor = parse_record_id(&req.actor_id, "actor id")?;
    let discharge_type = req
        .discharge_type
        .parse::<DischargeType>()
        .map_err(|e| bad_request(e.to_string()))?;

    let admission = state
        .services
        .admissions
        .finalize_discharge(
            &admission_id,
            actor,
            discharge_type,
            req.condition_on_discharge,
            req.follow_up_instructions,
        )
        .map_err(ward_error)?;
    let los = state.services.admissions.length_of_stay_days(&admission);
    Ok(Json(AdmissionRes::from_admission(admission, los)))
}

#[utoipa::path(
    post,
    path = "/admissions/{id}/transfer",
    request_body = TransferBedReq,
    params(("id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Bed transferred", body = AssignmentRes),
        (status = 404, description = "Admission, bed, or open assignment not found", body = ErrorBody),
        (status = 409, description = "Target bed unavailable", body = ErrorBody)
    )
)]
/// Move an admission to a different bed; the vacated bed goes to cleaning.
#[axum::debug_handler]
async fn transfer_bed(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<TransferBedReq>,
) -> ApiResult<AssignmentRes> {
    let admission_id = parse_record_id(&id, "admission id")?;
    let new_bed_id = parse_record_id(&req.new_bed_id, "bed id")?;
    let actor = parse_record_id(&req.actor_id, "actor id")?;
    let reason = parse_text(&req.reason, "reason")?;

    let assignment = state
        .services
        .allocation
        .transfer_bed(&admission_id, &new_bed_id, actor, reason)
        .map_err(ward_error)?;
    Ok(Json(assignment.into()))
}

#[utoipa::path(
    get,
    path = "/admissions/{id}/bed",
    params(("id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Current bed, or null when unplaced", body = BedRes),
        (status = 404, description = "Admission not found", body = ErrorBody)
    )
)]
/// The bed currently serving an admission. `null` when unplaced.
#[axum::debug_handler]
async fn current_bed(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Option<BedRes>> {
    let admission_id = parse_record_id(&id, "admission id")?;
    let bed = state
        .services
        .allocation
        .current_bed(&admission_id)
        .map_err(ward_error)?;
    Ok(Json(bed.map(BedRes::from)))
}

#[utoipa::path(
    post,
    path = "/sequences/{key}/next",
    params(("key" = String, Path, description = "Sequence family, e.g. `admission` or `mrn`")),
    responses(
        (status = 200, description = "Next formatted identifier", body = NextSequenceRes),
        (status = 404, description = "Unknown sequence family", body = ErrorBody)
    )
)]
/// Issue the next identifier of a sequence family.
#[axum::debug_handler]
async fn next_sequence_value(
    State(state): State<AppState>,
    AxumPath(key): AxumPath<String>,
) -> ApiResult<NextSequenceRes> {
    let key = SequenceKey::new(&key).map_err(|e| bad_request(e.to_string()))?;
    let value = state
        .services
        .sequences
        .next_value(&key)
        .map_err(ward_error)?;
    Ok(Json(NextSequenceRes { value }))
}
