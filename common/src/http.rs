use actix_web::HttpResponse;
use serde::Serialize;

pub struct Success;
impl Success {
    pub fn ok<T: Serialize>(body: T) -> HttpResponse {
        HttpResponse::Ok().json(body)
    }
}

/// Plain-text 405 for any method the endpoint does not serve.
pub fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .content_type("text/plain; charset=utf-8")
        .body("Method Not Allowed")
}
