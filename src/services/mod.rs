/// Branches, theaters, movies and foods.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Scheduled housekeeping jobs.
pub mod maintenance;
/// Payment confirmation and order lookup.
pub mod order_service;
/// Sales reports for staff.
pub mod report_service;
/// Seat map and seat locks.
pub mod seat_service;
/// Showtime scheduling and lifecycle.
pub mod showtime_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervision and degraded mode.
pub mod storage_supervisor;
