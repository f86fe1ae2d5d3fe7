use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use include_dir::{include_dir, Dir};
use tracing::{instrument, warn};

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[instrument]
pub(crate) async fn static_data(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match STATIC_DIR.get_file(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.essence_str().to_string())],
                file.contents(),
            )
                .into_response()
        }
        None => {
            warn!("file not found");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
