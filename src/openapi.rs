use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BeatVault API",
        description = r#"
Backend for the BeatVault digital beat storefront.

- **Auth**: user/admin registration and JWT login
- **Beats**: public catalog plus admin upload and edits
- **Checkout**: payment-intent creation, gateway fulfillment webhook, and
  entitlement-gated downloads
- **Favorites / Subscriptions**: buyer engagement features
- **Admin**: customer listing and revenue reporting

Authenticated endpoints expect `Authorization: Bearer <token>`. The
fulfillment webhook authenticates with the gateway signature header
instead of a bearer token.
"#
    ),
    paths(
        handlers::auth::register_user,
        handlers::auth::login_user,
        handlers::auth::register_admin,
        handlers::auth::login_admin,
        handlers::auth::reset_password,
        handlers::auth::admin_reset_password,
        handlers::beats::list_beats,
        handlers::beats::get_beat,
        handlers::beats::upload_beat,
        handlers::beats::update_beat,
        handlers::beats::delete_beat,
        handlers::checkout::create_payment_intent,
        handlers::checkout::payment_webhook,
        handlers::checkout::download_beat,
        handlers::favorites::add_favorite,
        handlers::favorites::list_favorites,
        handlers::subscriptions::subscribe,
        handlers::subscriptions::subscription_status,
        handlers::subscriptions::cancel_subscription,
        handlers::subscriptions::change_tier,
        handlers::users::me,
        handlers::admin::list_customers,
        handlers::admin::total_revenue,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration, login, password resets"),
        (name = "Beats", description = "Catalog listing and admin management"),
        (name = "Checkout", description = "Payment intents, fulfillment, downloads"),
        (name = "Favorites", description = "Buyer favorites"),
        (name = "Subscriptions", description = "Subscription plans"),
        (name = "Users", description = "Account profile"),
        (name = "Admin", description = "Reporting"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
