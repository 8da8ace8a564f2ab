use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

/// Fairing to log one line per HTTP request with timing
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed_ms = request.local_cache(Instant::now).elapsed().as_secs_f64() * 1000.0;
        let method = request.method();
        let uri = request.uri();
        let status = response.status();

        let level = if status.code >= 500 {
            log::Level::Warn
        } else if uri.path().ends_with("/health") {
            log::Level::Debug
        } else {
            log::Level::Info
        };

        log::log!(
            level,
            "{} {} -> {} ({:.2}ms)",
            method,
            uri,
            status.code,
            elapsed_ms
        );
    }
}
