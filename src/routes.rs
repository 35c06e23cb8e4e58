use crate::{
    api::{attendance, report, schedule},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("rate limiter period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let clock_limiter = Arc::new(build_limiter(config.rate_clock_per_min));

    // Everything is protected
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/clock
                    .service(
                        web::resource("/clock")
                            .wrap(clock_limiter)
                            .route(web::post().to(attendance::clock_toggle)),
                    )
                    .service(web::resource("/status").route(web::get().to(attendance::today_status)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    // /attendance/users/{id}/report
                    .service(
                        web::resource("/users/{user_id}/report")
                            .route(web::get().to(report::user_report)),
                    ),
            )
            .service(
                web::scope("/teams")
                    .service(web::resource("/{team_id}/today").route(web::get().to(report::team_today)))
                    .service(
                        web::resource("/{team_id}/report").route(web::get().to(report::team_report)),
                    ),
            )
            .service(
                web::scope("/schedules")
                    // /schedules/{user_id}
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(schedule::get_schedules))
                            .route(web::put().to(schedule::put_schedule)),
                    ),
            ),
    );
}
