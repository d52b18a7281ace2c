// src/handlers/images.rs
// DOCUMENTATION: Serves generated dashboard images and reports
// PURPOSE: Files are only served from inside the uploads root

use crate::errors::DashboardError;
use crate::services::UploadStore;
use actix_files::NamedFile;
use actix_web::web;

/// GET /api/image/{path}
pub async fn serve_image(
    store: web::Data<UploadStore>,
    path: web::Path<String>,
) -> Result<NamedFile, DashboardError> {
    let requested = path.into_inner();
    let file = store.resolve(&requested)?;

    log::debug!("Serving {}", file.display());
    Ok(NamedFile::open_async(&file).await?)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/image/{path:.*}", web::get().to(serve_image));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_serves_files_inside_root_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(root.join("s1/comparison")).unwrap();
        std::fs::write(root.join("s1/comparison/comparison_dashboard.png"), b"png").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UploadStore::new(&root, 1024)))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/image/s1/comparison/comparison_dashboard.png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await.as_ref(), b"png");

        for uri in [
            "/api/image/../secret.txt",
            "/api/image/s1/..%2F..%2Fsecret.txt",
            "/api/image/s1/missing.png",
            "/api/image/s1",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error"]["code"], "NOT_FOUND");
        }
    }
}
