use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct RestoreRequestDoc {
    /// Path of the backup file, e.g. `backups/users_20240101_120000.json`
    pub backup_file: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::databases::list_databases,
        crate::routes::databases::get_database,
        crate::routes::databases::replace_database,
        crate::routes::databases::search,
        crate::routes::records::add_record,
        crate::routes::records::get_record,
        crate::routes::records::update_record,
        crate::routes::records::delete_record,
        crate::routes::backups::create_backup,
        crate::routes::backups::list_backups,
        crate::routes::backups::restore_backup,
        crate::routes::files::download,
        crate::routes::files::upload,
    ),
    components(schemas(HealthResponse, LoginRequest, RestoreRequestDoc)),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "databases"),
        (name = "records"),
        (name = "backups"),
        (name = "files")
    )
)]
pub struct ApiDoc;
