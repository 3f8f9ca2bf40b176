use actix_web::web::{self};

pub mod state;

pub mod routes {
    pub mod sub;
}

pub mod services {
    pub mod identity;
    pub mod provider;
    pub mod sub;
}

pub mod dtos {
    pub mod sub;
}

pub use state::{ServiceState, Services};

fn create_subscription_resource() -> actix_web::Resource {
    web::resource("/create-subscription")
        .route(web::post().to(routes::sub::post_create_subscription))
        .default_service(web::to(routes::sub::method_not_allowed))
}

pub fn mount_subs() -> actix_web::Scope {
    web::scope("/api").service(create_subscription_resource())
}

/// Same endpoint under the serverless functions path used by existing front ends.
pub fn mount_netlify() -> actix_web::Scope {
    web::scope("/.netlify/functions").service(create_subscription_resource())
}
