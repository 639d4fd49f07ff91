use crate::config::{Config, DetectionParams};
use crate::error::RectifyError;
use crate::export;
use crate::rectify::steps::color::ChannelOrder;
use crate::rectify::{Pipeline, PipelineResult, StepTiming};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<Config>,
}

/// Detection response
#[derive(Serialize, Deserialize, Debug)]
pub struct DetectResponse {
    pub found: bool,
    pub width: u32,
    pub height: u32,
    pub threshold: u8,
    pub candidates: usize,
    pub tolerance: Option<f64>,
    pub passes: Option<u32>,
    /// `[top-left, top-right, bottom-left, bottom-right]` as `[x, y]`
    pub corners: Option<[[i32; 2]; 4]>,
    pub processing_time_ms: u64,
    pub steps: Vec<StepTimingResponse>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StepTimingResponse {
    pub name: String,
    pub time_ms: u64,
}

impl From<StepTiming> for StepTimingResponse {
    fn from(timing: StepTiming) -> Self {
        Self {
            name: timing.name,
            time_ms: timing.time_ms,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub target_width: u32,
    pub target_height: u32,
    pub detection: DetectionParams,
    pub max_file_size_bytes: usize,
}

/// Which of the three pipeline images to return
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Original,
    Annotated,
    #[default]
    Rectified,
}

#[derive(Debug, Default, Deserialize)]
pub struct RectifyQuery {
    #[serde(default)]
    pub view: View,
}

/// Build the HTTP router
pub fn router(config: Config) -> Result<Router, RectifyError> {
    // Uploads are decoded by `image`, which always yields RGB
    let pipeline = Pipeline::new(DetectionParams {
        channel_order: ChannelOrder::Rgb,
        ..config.detection.clone()
    })?;
    let max_file_size = config.max_file_size;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config),
    };

    Ok(Router::new()
        .route("/detect", post(handle_detect))
        .route("/rectify", post(handle_rectify))
        .route("/pdf", post(handle_pdf))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(config)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle detection requests: corners and stats only
async fn handle_detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, RectifyError> {
    let start = Instant::now();
    let data = read_upload(multipart, state.config.max_file_size).await?;
    let result = run_pipeline(&state, data).await?;

    let (width, height) = result.original.dimensions();
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Detection completed in {}ms, found: {}",
        processing_time_ms,
        result.is_found()
    );

    Ok(Json(DetectResponse {
        found: result.is_found(),
        width,
        height,
        threshold: result.threshold,
        candidates: result.candidates,
        tolerance: result.page.as_ref().map(|page| page.tolerance),
        passes: result.page.as_ref().map(|page| page.passes),
        corners: result.corners().map(|corners| corners.to_pairs()),
        processing_time_ms,
        steps: result.steps.into_iter().map(Into::into).collect(),
    }))
}

/// Handle rectification requests: one of the three images as PNG
async fn handle_rectify(
    State(state): State<AppState>,
    Query(query): Query<RectifyQuery>,
    multipart: Multipart,
) -> Result<Response, RectifyError> {
    let data = read_upload(multipart, state.config.max_file_size).await?;
    let result = run_pipeline(&state, data).await?;

    let image = match query.view {
        View::Original => Some(&result.original),
        View::Annotated => result.annotated(),
        View::Rectified => result.rectified(),
    }
    .ok_or(RectifyError::PageNotFound)?;

    let png = export::encode_png(image)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Handle PDF export of the rectified page
async fn handle_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, RectifyError> {
    let data = read_upload(multipart, state.config.max_file_size).await?;
    let result = run_pipeline(&state, data).await?;

    let page = result.rectified().ok_or(RectifyError::PageNotFound)?;
    let pdf = export::page_to_pdf(page)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"page.pdf\""),
        ],
        pdf,
    )
        .into_response())
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let params = state.pipeline.params();
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target_width: params.target_width,
        target_height: params.target_height(),
        detection: params.clone(),
        max_file_size_bytes: state.config.max_file_size,
    })
}

/// Pull the `file` field out of a multipart form
async fn read_upload(mut multipart: Multipart, max_file_size: usize) -> Result<Bytes, RectifyError> {
    let mut file_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RectifyError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        if field.name() == Some("file") {
            file_data = Some(field.bytes().await.map_err(|e| {
                RectifyError::InvalidRequest(format!("Failed to read file data: {}", e))
            })?);
        }
    }

    let data = file_data.ok_or(RectifyError::MissingFile)?;

    if data.len() > max_file_size {
        tracing::warn!(size = data.len(), max = max_file_size, "Upload rejected");
        return Err(RectifyError::ImageTooLarge {
            size: data.len(),
            max: max_file_size,
        });
    }

    Ok(data)
}

/// Decode the upload and run the pipeline off the async runtime
async fn run_pipeline(state: &AppState, data: Bytes) -> Result<PipelineResult, RectifyError> {
    let pipeline = Arc::clone(&state.pipeline);

    tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&data)
            .map_err(|e| RectifyError::UnsupportedFormat(format!("Failed to decode image: {}", e)))?
            .into_rgb8();
        pipeline.process(&image)
    })
    .await
    .map_err(|e| RectifyError::Internal(format!("Pipeline task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use image::{Rgb, RgbImage};
    use tower::ServiceExt;

    const BOUNDARY: &str = "snapsheets-test-boundary";

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_file_size: 5 * 1024 * 1024,
            detection: DetectionParams::default(),
        }
    }

    fn page_png() -> Vec<u8> {
        let mut img = RgbImage::from_pixel(300, 400, Rgb([20, 20, 20]));
        for y in 60..340 {
            for x in 50..250 {
                img.put_pixel(x, y, Rgb([240, 240, 240]));
            }
        }
        export::encode_png(&img).unwrap()
    }

    fn blank_png() -> Vec<u8> {
        export::encode_png(&RgbImage::from_pixel(100, 100, Rgb([128, 128, 128]))).unwrap()
    }

    fn multipart_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"frame.png\"\r\n",
                field
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let app = router(test_config()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_detect_reports_corners() {
        let (status, body) = send(multipart_request("/detect", "file", &page_png())).await;
        assert_eq!(status, StatusCode::OK);

        let response: DetectResponse = serde_json::from_slice(&body).unwrap();
        assert!(response.found);
        assert_eq!((response.width, response.height), (300, 400));
        assert_eq!(
            response.corners,
            Some([[50, 60], [249, 60], [50, 339], [249, 339]])
        );
    }

    #[tokio::test]
    async fn test_rectify_returns_fixed_size_png() {
        let (status, body) = send(multipart_request("/rectify", "file", &page_png())).await;
        assert_eq!(status, StatusCode::OK);

        let image = image::load_from_memory(&body).unwrap();
        assert_eq!((image.width(), image.height()), (720, 1015));
    }

    #[tokio::test]
    async fn test_rectify_original_view_works_without_page() {
        let (status, body) =
            send(multipart_request("/rectify?view=original", "file", &blank_png())).await;
        assert_eq!(status, StatusCode::OK);
        let image = image::load_from_memory(&body).unwrap();
        assert_eq!((image.width(), image.height()), (100, 100));
    }

    #[tokio::test]
    async fn test_missing_page_is_unprocessable() {
        let (status, body) = send(multipart_request("/pdf", "file", &blank_png())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "PAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_bad_request() {
        let (status, body) = send(multipart_request("/detect", "upload", &page_png())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "MISSING_FILE");
    }

    #[tokio::test]
    async fn test_garbage_upload_is_unsupported() {
        let (status, body) = send(multipart_request("/detect", "file", b"not an image")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_uploads_keep_their_colours_under_bgr_config() {
        let mut config = test_config();
        config.detection.channel_order = ChannelOrder::Bgr;
        let app = router(config).unwrap();

        let red = export::encode_png(&RgbImage::from_pixel(40, 30, Rgb([255, 0, 0]))).unwrap();
        let response = app
            .oneshot(multipart_request("/rectify?view=original", "file", &red))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let image = image::load_from_memory(&body).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[tokio::test]
    async fn test_pdf_is_served() {
        let (status, body) = send(multipart_request("/pdf", "file", &page_png())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with(b"%PDF"));
    }
}
