use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Local;
use std::sync::Arc;
use tracing::info;

use shared::{
    BillListResponse, BillResponse, CreateBillRequest, DailyGoalsResponse, EditStartTimeRequest,
    FinalizeShiftResponse, GoalConfigResponse, RecordDistanceRequest, RecordEarningRequest,
    RecordExpenseRequest, ShiftActionResponse, ShiftHistoryResponse, ShiftSnapshot,
    ShiftStatusResponse, UpdateGoalConfigRequest,
};

use crate::domain::commands::bills::CreateBillCommand;
use crate::domain::commands::goals::UpdateGoalConfigCommand;
use crate::domain::commands::shift::{
    EditStartTimeCommand, RecordDistanceCommand, RecordEarningCommand, RecordExpenseCommand,
};
use crate::domain::goal_service::{classify_performance, rate_per_hour, rate_per_km};
use crate::domain::{GoalService, ShiftService, ShiftTicker};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub shift_service: Arc<ShiftService>,
    pub goal_service: GoalService,
    pub ticker: Arc<ShiftTicker>,
}

impl AppState {
    pub fn new(
        shift_service: Arc<ShiftService>,
        goal_service: GoalService,
        ticker: Arc<ShiftTicker>,
    ) -> Self {
        Self {
            shift_service,
            goal_service,
            ticker,
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/shift", get(shift_status))
        .route("/api/shift/start", post(start_shift))
        .route("/api/shift/pause", post(pause_shift))
        .route("/api/shift/resume", post(resume_shift))
        .route("/api/shift/stop", post(stop_shift))
        .route("/api/shift/finalize", post(finalize_shift))
        .route("/api/shift/reset", post(reset_shift))
        .route("/api/shift/reconcile", post(reconcile_shift))
        .route("/api/shift/start-time", put(edit_start_time))
        .route("/api/shift/earnings", post(record_earning))
        .route("/api/shift/expenses", post(record_expense))
        .route("/api/shift/distance", post(record_distance))
        .route("/api/goals/config", get(get_goal_config))
        .route("/api/goals/config", put(update_goal_config))
        .route("/api/goals/today", get(daily_goals))
        .route("/api/bills", get(list_bills))
        .route("/api/bills", post(create_bill))
        .route("/api/bills/:bill_id", delete(delete_bill))
        .route("/api/history", get(shift_history))
        .route("/api/history/:shift_id/expenses", get(shift_history_expenses))
        .with_state(state)
}

fn action_response(snapshot: ShiftSnapshot, message: &str) -> ShiftActionResponse {
    ShiftActionResponse {
        shift: snapshot,
        success_message: message.to_string(),
    }
}

/// Compose the full dashboard status: the snapshot plus all values derived
/// from it at this instant
fn build_status(state: &AppState) -> anyhow::Result<ShiftStatusResponse> {
    let shift = state.shift_service.current();
    let elapsed_minutes = state.shift_service.elapsed_minutes();
    let gross_earnings = shift.earnings.gross();
    let net_earnings = shift.net_earnings();

    let today = Local::now().date_naive();
    let goals = state.goal_service.daily_goals(today)?.goals;
    let performance = classify_performance(net_earnings, &goals);

    Ok(ShiftStatusResponse {
        gross_earnings,
        net_earnings,
        rate_per_hour: rate_per_hour(gross_earnings, elapsed_minutes),
        rate_per_km: rate_per_km(gross_earnings, shift.km),
        elapsed_minutes,
        goals,
        performance,
        shift: ShiftSnapshot::from(&shift),
    })
}

/// Axum handler function for GET /api/shift
pub async fn shift_status(State(state): State<AppState>) -> impl IntoResponse {
    match build_status(&state) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Error building shift status: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error building shift status").into_response()
        }
    }
}

/// Axum handler function for POST /api/shift/start
pub async fn start_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/start");
    let shift = state.shift_service.start();
    Json(action_response(ShiftSnapshot::from(&shift), "Shift started"))
}

/// Axum handler function for POST /api/shift/pause
pub async fn pause_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/pause");
    let shift = state.shift_service.pause();
    Json(action_response(ShiftSnapshot::from(&shift), "Shift paused"))
}

/// Axum handler function for POST /api/shift/resume
pub async fn resume_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/resume");
    let shift = state.shift_service.resume();
    Json(action_response(ShiftSnapshot::from(&shift), "Shift resumed"))
}

/// Axum handler function for POST /api/shift/stop
pub async fn stop_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/stop");
    let shift = state.shift_service.stop();
    Json(action_response(ShiftSnapshot::from(&shift), "Shift stopped"))
}

/// Axum handler function for POST /api/shift/finalize
pub async fn finalize_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/finalize");

    match state.shift_service.finalize() {
        Ok(result) => {
            let response = FinalizeShiftResponse {
                outcome: result.outcome,
                success_message: format!("Shift saved as {}", result.history_id),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error finalizing shift: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for POST /api/shift/reset
pub async fn reset_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/reset");
    let shift = state.shift_service.reset();
    Json(action_response(ShiftSnapshot::from(&shift), "Shift discarded"))
}

/// Axum handler function for POST /api/shift/reconcile.
///
/// Called by the client when it regains focus/visibility: forces the
/// display ticker to re-derive immediately and returns a fresh status.
pub async fn reconcile_shift(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/shift/reconcile");
    state.ticker.reconcile();

    match build_status(&state) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Error building shift status: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error building shift status").into_response()
        }
    }
}

/// Axum handler function for PUT /api/shift/start-time
pub async fn edit_start_time(
    State(state): State<AppState>,
    Json(request): Json<EditStartTimeRequest>,
) -> impl IntoResponse {
    info!("PUT /api/shift/start-time - request: {:?}", request);

    let shift = state.shift_service.edit_start_time(EditStartTimeCommand {
        start_time_ms: request.start_time_ms,
    });
    Json(action_response(
        ShiftSnapshot::from(&shift),
        "Start time updated",
    ))
}

/// Axum handler function for POST /api/shift/earnings
pub async fn record_earning(
    State(state): State<AppState>,
    Json(request): Json<RecordEarningRequest>,
) -> impl IntoResponse {
    info!("POST /api/shift/earnings - request: {:?}", request);

    let command = RecordEarningCommand {
        platform: request.platform,
        amount: request.amount,
    };
    match state.shift_service.record_earning(command) {
        Ok(shift) => Json(action_response(
            ShiftSnapshot::from(&shift),
            "Earnings recorded",
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Error recording earnings: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for POST /api/shift/expenses
pub async fn record_expense(
    State(state): State<AppState>,
    Json(request): Json<RecordExpenseRequest>,
) -> impl IntoResponse {
    info!("POST /api/shift/expenses - request: {:?}", request);

    let command = RecordExpenseCommand {
        amount: request.amount,
        description: request.description,
        category: request.category,
    };
    match state.shift_service.record_expense(command) {
        Ok(shift) => Json(action_response(
            ShiftSnapshot::from(&shift),
            "Expense recorded",
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Error recording expense: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for POST /api/shift/distance
pub async fn record_distance(
    State(state): State<AppState>,
    Json(request): Json<RecordDistanceRequest>,
) -> impl IntoResponse {
    info!("POST /api/shift/distance - request: {:?}", request);

    match state
        .shift_service
        .record_distance(RecordDistanceCommand { km: request.km })
    {
        Ok(shift) => Json(action_response(
            ShiftSnapshot::from(&shift),
            "Distance recorded",
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Error recording distance: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for GET /api/goals/config
pub async fn get_goal_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.goal_service.goal_config() {
        Ok(config) => (
            StatusCode::OK,
            Json(GoalConfigResponse {
                config,
                success_message: "Goal configuration loaded".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error loading goal config: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading goal config").into_response()
        }
    }
}

/// Axum handler function for PUT /api/goals/config
pub async fn update_goal_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateGoalConfigRequest>,
) -> impl IntoResponse {
    info!("PUT /api/goals/config - request: {:?}", request);

    let command = UpdateGoalConfigCommand {
        monthly_salary_goal: request.monthly_salary_goal,
        monthly_working_days: request.monthly_working_days,
    };
    match state.goal_service.update_goal_config(command) {
        Ok(config) => (
            StatusCode::OK,
            Json(GoalConfigResponse {
                config,
                success_message: "Goal configuration updated".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error updating goal config: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for GET /api/goals/today
pub async fn daily_goals(State(state): State<AppState>) -> impl IntoResponse {
    let today = Local::now().date_naive();
    match state.goal_service.daily_goals(today) {
        Ok(result) => (
            StatusCode::OK,
            Json(DailyGoalsResponse {
                goals: result.goals,
                total_monthly_bills: result.total_monthly_bills,
                working_days: result.working_days,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error computing daily goals: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error computing daily goals").into_response()
        }
    }
}

/// Axum handler function for GET /api/bills
pub async fn list_bills(State(state): State<AppState>) -> impl IntoResponse {
    match state.goal_service.list_bills() {
        Ok(bills) => (StatusCode::OK, Json(BillListResponse { bills })).into_response(),
        Err(e) => {
            tracing::error!("Error listing bills: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing bills").into_response()
        }
    }
}

/// Axum handler function for POST /api/bills
pub async fn create_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> impl IntoResponse {
    info!("POST /api/bills - request: {:?}", request);

    let command = CreateBillCommand {
        description: request.description,
        amount: request.amount,
        due_date: request.due_date,
    };
    match state.goal_service.create_bill(command) {
        Ok(bill) => (
            StatusCode::CREATED,
            Json(BillResponse {
                bill,
                success_message: "Bill created".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error creating bill: {:?}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Axum handler function for DELETE /api/bills/:bill_id
pub async fn delete_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/bills/{}", bill_id);

    match state.goal_service.delete_bill(&bill_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Bill not found").into_response(),
        Err(e) => {
            tracing::error!("Error deleting bill: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error deleting bill").into_response()
        }
    }
}

/// Axum handler function for GET /api/history
pub async fn shift_history(State(state): State<AppState>) -> impl IntoResponse {
    match state.shift_service.list_history() {
        Ok(shifts) => (StatusCode::OK, Json(ShiftHistoryResponse { shifts })).into_response(),
        Err(e) => {
            tracing::error!("Error listing shift history: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing shift history").into_response()
        }
    }
}

/// Axum handler function for GET /api/history/:shift_id/expenses
pub async fn shift_history_expenses(
    State(state): State<AppState>,
    Path(shift_id): Path<String>,
) -> impl IntoResponse {
    match state.shift_service.list_history_expenses(&shift_id) {
        Ok(expenses) => (StatusCode::OK, Json(expenses)).into_response(),
        Err(e) => {
            tracing::error!("Error listing shift expenses: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing shift expenses").into_response()
        }
    }
}
