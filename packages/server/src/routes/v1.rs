use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/posts", post_routes())
        .nest("/tags", tag_routes())
        .nest("/categories", category_routes())
        .nest("/uploads", upload_routes(config))
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::post::list_posts,
            handlers::post::create_post
        ))
        .routes(routes!(
            handlers::post::get_post,
            handlers::post::update_post,
            handlers::post::delete_post
        ))
        .routes(routes!(handlers::post::get_post_by_slug))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::tag::list_tags, handlers::tag::create_tag))
        .routes(routes!(
            handlers::tag::get_tag,
            handlers::tag::update_tag,
            handlers::tag::delete_tag
        ))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::category::list_categories,
            handlers::category::create_category
        ))
        .routes(routes!(
            handlers::category::get_category,
            handlers::category::update_category,
            handlers::category::delete_category
        ))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::upload::list_uploads,
            handlers::upload::create_upload
        ))
        .routes(routes!(
            handlers::upload::get_upload,
            handlers::upload::update_upload,
            handlers::upload::delete_upload
        ))
        .routes(routes!(handlers::upload::replace_attachment))
        .layer(handlers::upload::upload_body_limit(
            config.storage.max_file_size,
        ))
}
