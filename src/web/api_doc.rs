use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::job::JobStarted;
use super::api::passes::PassesResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::satellites::list_satellites,
        super::api::passes::list_passes,
        super::api::views::render,
        super::api::job::start,
        super::api::job::stop,
        super::api::job::status,
    ),
    components(
        schemas(
            ErrorResponse,
            PassesResponse,
            JobStarted,
            crate::predict::Pass,
            crate::predict::BearingPoint,
            crate::predict::GeoPoint,
            crate::predict::Observer,
            crate::predict::SatelliteInfo,
            crate::track::Segment,
            crate::track::PlotPoint,
            crate::track::ViewRequest,
            crate::track::ViewSettings,
            crate::track::ViewSummary,
            crate::job::JobState,
            crate::job::JobStatus,
            crate::job::JobReport,
            crate::job::JobFailure,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Sat-Flyby API",
        description = "Satellite pass prediction and track rendering",
        version = "0.1.0"
    ),
    tags(
        (name = "satellites", description = "Catalog satellites and their current state"),
        (name = "passes", description = "Pass prediction"),
        (name = "views", description = "Map and radar views"),
        (name = "job", description = "Batch rendering job")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
