use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::AppError;
use crate::modules::periods::models::CalendarYear;
use crate::modules::periods::services::PeriodService;

/// Request body for starting a new period
#[derive(Debug, Deserialize)]
pub struct StartPeriodRequest {
    pub name: String,
}

/// Request body for updating a period.
///
/// Only `name` is editable. `start_date` and `end_date` are accepted by the
/// deserializer so an edit attempt can be rejected loudly; callers must see
/// "rejected operation", never "silently ignored field".
#[derive(Debug, Deserialize)]
pub struct UpdatePeriodRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Calendar year as returned to the dashboard. Amounts serialize as
/// strings for JSON precision.
#[derive(Debug, Serialize)]
pub struct CalendarYearResponse {
    pub id: Uuid,
    pub hostel_id: Uuid,
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub expected_revenue_at_close: Option<String>,
}

impl From<CalendarYear> for CalendarYearResponse {
    fn from(year: CalendarYear) -> Self {
        Self {
            id: year.id,
            hostel_id: year.hostel_id,
            name: year.name,
            start_date: year.start_date.to_rfc3339(),
            end_date: year.end_date.map(|d| d.to_rfc3339()),
            is_active: year.is_active,
            expected_revenue_at_close: year.expected_revenue_at_close.map(|d| d.to_string()),
        }
    }
}

/// Start a new period for a hostel
/// POST /hostels/{hostel_id}/periods
pub async fn start_period(
    service: web::Data<Arc<PeriodService>>,
    path: web::Path<Uuid>,
    request: web::Json<StartPeriodRequest>,
) -> Result<HttpResponse, AppError> {
    let hostel_id = path.into_inner();
    let year = service.start_period(hostel_id, &request.name).await?;

    Ok(HttpResponse::Created().json(CalendarYearResponse::from(year)))
}

/// List a hostel's periods, oldest first
/// GET /hostels/{hostel_id}/periods
pub async fn list_periods(
    service: web::Data<Arc<PeriodService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let hostel_id = path.into_inner();
    let years = service.list_periods(hostel_id).await?;

    let response: Vec<CalendarYearResponse> =
        years.into_iter().map(CalendarYearResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Close a period, archiving its residents
/// POST /periods/{period_id}/close
pub async fn end_period(
    service: web::Data<Arc<PeriodService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let period_id = path.into_inner();
    let year = service.end_period(period_id).await?;

    Ok(HttpResponse::Ok().json(CalendarYearResponse::from(year)))
}

/// Rename a period
/// PATCH /periods/{period_id}
pub async fn update_period(
    service: web::Data<Arc<PeriodService>>,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePeriodRequest>,
) -> Result<HttpResponse, AppError> {
    let period_id = path.into_inner();
    let request = request.into_inner();

    if request.start_date.is_some() || request.end_date.is_some() {
        return Err(AppError::validation(
            "start_date and end_date are derived from the period lifecycle and cannot be edited",
        ));
    }
    let name = request
        .name
        .ok_or_else(|| AppError::validation("name is required"))?;

    let year = service.rename_period(period_id, &name).await?;
    Ok(HttpResponse::Ok().json(CalendarYearResponse::from(year)))
}

/// Delete a period with no financial history
/// DELETE /hostels/{hostel_id}/periods/{period_id}
pub async fn delete_period(
    service: web::Data<Arc<PeriodService>>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (hostel_id, period_id) = path.into_inner();
    service.delete_period(period_id, hostel_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure period routes. Registered as full-path resources: a scope
/// prefix would also capture the report route that hangs off the same
/// `/hostels/{hostel_id}/periods/{period_id}` path.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/hostels/{hostel_id}/periods")
            .route(web::post().to(start_period))
            .route(web::get().to(list_periods)),
    );
    cfg.service(
        web::resource("/hostels/{hostel_id}/periods/{period_id}")
            .route(web::delete().to(delete_period)),
    );
    cfg.service(
        web::resource("/periods/{period_id}/close").route(web::post().to(end_period)),
    );
    cfg.service(web::resource("/periods/{period_id}").route(web::patch().to(update_period)));
}
