use log::{info, warn};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};

/// Logs every request line and the status it was answered with
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _: &mut Data<'_>) {
        info!(
            "{} {} {}",
            req.method(),
            req.uri(),
            req.headers().get_one("User-Agent").unwrap_or("Unknown")
        );
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let status = res.status();
        if status.code >= 500 {
            warn!("{} {} -> {}", req.method(), req.uri(), status);
        } else {
            info!("{} {} -> {}", req.method(), req.uri(), status);
        }
    }
}
