//! RESTful API接口模块
//!
//! 无状态接口：调用方每次请求都携带完整状态，服务端只负责计算并返回结果。

use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use spine_core::{
    levels_for, ClinicalContext, FindingsStore, FormOptions, LevelKey, Region, SpineError,
};
use spine_report::{apply_normal_study, compose, compose_sections, ReportSection, ReportSession};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::clipboard::{export_report, ClipboardSink};
use crate::refine::{refine_impression, RefinementClient};

/// API错误响应
#[derive(Debug)]
pub struct ApiError(pub SpineError);

impl From<SpineError> for ApiError {
    fn from(err: SpineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SpineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
            SpineError::InvalidRegion(_)
            | SpineError::InvalidOption { .. }
            | SpineError::InvalidRequest(_)
            | SpineError::Serialization(_) => StatusCode::BAD_REQUEST,
            SpineError::RefinementInFlight => StatusCode::CONFLICT,
            SpineError::RefinementUnavailable(_) | SpineError::ClipboardUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.0.is_boundary_error() {
            warn!("API request hit an unavailable collaborator: {}", self.0);
        } else if status.is_server_error() {
            error!("API request failed: {}", self.0);
        } else {
            debug!("API request rejected: {}", self.0);
        }

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// JSON请求体提取器；解析失败以 `ApiError` 的格式返回 400
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(SpineError::InvalidRequest(rejection.body_text()).into()),
        }
    }
}

/// API状态
#[derive(Clone)]
pub struct ApiState {
    pub default_region: Region,
    pub refinement: Option<Arc<dyn RefinementClient>>,
    pub clipboard: Option<Arc<dyn ClipboardSink>>,
}

impl ApiState {
    pub fn new(default_region: Region) -> Self {
        Self {
            default_region,
            refinement: None,
            clipboard: None,
        }
    }

    pub fn with_refinement(mut self, client: Arc<dyn RefinementClient>) -> Self {
        self.refinement = Some(client);
        self
    }

    pub fn with_clipboard(mut self, sink: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = Some(sink);
        self
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(Region::default())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedQuery {
    pub region: Option<Region>,
}

/// 报告生成请求；缺省的所见视为全部正常
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    pub region: Region,
    #[serde(default = "FindingsStore::new")]
    pub findings: FindingsStore,
    #[serde(default)]
    pub context: ClinicalContext,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub report: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub region: Region,
    #[serde(default)]
    pub context: ClinicalContext,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub findings: FindingsStore,
    pub context: ClinicalContext,
}

#[derive(Debug, Serialize)]
pub struct LevelsResponse {
    pub region: Region,
    pub levels: Vec<LevelKey>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub exported: bool,
    pub characters: usize,
}

/// API处理器
pub struct ApiHandler;

impl ApiHandler {
    /// 健康检查
    pub async fn health_check() -> Json<HashMap<String, String>> {
        let mut status = HashMap::new();
        status.insert("status".to_string(), "healthy".to_string());
        status.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());
        status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
        Json(status)
    }

    /// 表单选项
    pub async fn get_options() -> Json<FormOptions> {
        Json(FormOptions::new())
    }

    /// 某部位的节段列表
    pub async fn get_levels(Path(region): Path<String>) -> ApiResult<Json<LevelsResponse>> {
        let region: Region = region.parse()?;
        Ok(Json(LevelsResponse {
            region,
            levels: levels_for(region).to_vec(),
        }))
    }

    /// 新会话（示例所见 + 默认上下文）
    pub async fn seed_session(
        State(state): State<ApiState>,
        Query(query): Query<SeedQuery>,
    ) -> Json<ReportSession> {
        Json(ReportSession::new(query.region.unwrap_or(state.default_region)))
    }

    pub async fn compose_report(ApiJson(request): ApiJson<ComposeRequest>) -> Json<ComposeResponse> {
        debug!("Composing report for {} region", request.region);
        let sections = compose_sections(request.region, &request.findings, &request.context);
        let report = compose(request.region, &request.findings, &request.context);
        Json(ComposeResponse { report, sections })
    }

    pub async fn normalize_study(
        ApiJson(request): ApiJson<NormalizeRequest>,
    ) -> Json<NormalizeResponse> {
        let (findings, context) = apply_normal_study(request.region, &request.context);
        Json(NormalizeResponse { findings, context })
    }

    /// 对传入的会话执行一次AI印象优化，返回更新后的会话
    pub async fn refine_session(
        State(state): State<ApiState>,
        ApiJson(session): ApiJson<ReportSession>,
    ) -> ApiResult<Json<ReportSession>> {
        let client = state.refinement.clone().ok_or_else(|| {
            SpineError::RefinementUnavailable("refinement service is disabled".to_string())
        })?;

        let refined = refine_impression(client.as_ref(), &session).await?;
        Ok(Json(refined))
    }

    /// 把会话的报告文本导出到服务端配置的剪贴板
    pub async fn export_session(
        State(state): State<ApiState>,
        ApiJson(session): ApiJson<ReportSession>,
    ) -> ApiResult<Json<ExportResponse>> {
        let sink = state.clipboard.clone().ok_or_else(|| {
            SpineError::ClipboardUnavailable("clipboard export is disabled".to_string())
        })?;

        let text = export_report(sink.as_ref(), &session).await?;
        Ok(Json(ExportResponse {
            exported: true,
            characters: text.chars().count(),
        }))
    }
}

/// 创建API路由
pub fn create_api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(ApiHandler::health_check))
        .route("/api/options", get(ApiHandler::get_options))
        .route("/api/levels/:region", get(ApiHandler::get_levels))
        .route("/api/session/seed", get(ApiHandler::seed_session))
        .route("/api/session/refine", post(ApiHandler::refine_session))
        .route("/api/report/compose", post(ApiHandler::compose_report))
        .route("/api/report/normalize", post(ApiHandler::normalize_study))
        .route("/api/report/export", post(ApiHandler::export_session))
        .with_state(state)
}

/// API服务器
pub struct ApiServer {
    app: Router,
}

impl ApiServer {
    pub fn new(state: ApiState) -> Self {
        let app = create_api_routes(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());
        Self { app }
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        info!("Starting report API server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::new(ApiState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use crate::clipboard::MemoryClipboard;
    use spine_report::{normal_impression, RefinementRequest, RefinementStatus};
    use tower::ServiceExt;

    struct FixedRefinement(&'static str);

    #[async_trait]
    impl RefinementClient for FixedRefinement {
        async fn refine(&self, _request: &RefinementRequest) -> spine_core::Result<String> {
            Ok(self.0.to_string())
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(ApiServer::default().router(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_levels() {
        let app = ApiServer::default().router();

        let (status, body) = send(app.clone(), get("/api/levels/cervical")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["levels"].as_array().unwrap().len(), 6);
        assert_eq!(body["levels"][0], "C2C3");

        let (status, body) = send(app, get("/api/levels/sacral")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_options() {
        let (status, body) = send(ApiServer::default().router(), get("/api/options")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["regions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_seed_session() {
        let app = ApiServer::new(ApiState::new(Region::Thoracic)).router();

        let (_, body) = send(app.clone(), get("/api/session/seed")).await;
        assert_eq!(body["region"], "thoracic");
        assert_eq!(body["findings"]["L4L5"]["canal"], "Mild");

        let (_, body) = send(app, get("/api/session/seed?region=whole")).await;
        assert_eq!(body["region"], "whole");
    }

    #[tokio::test]
    async fn test_compose_defaults_to_normal_findings() {
        let request = post_json("/api/report/compose", json!({ "region": "lumbar" }));
        let (status, body) = send(ApiServer::default().router(), request).await;

        assert_eq!(status, StatusCode::OK);
        let report = body["report"].as_str().unwrap();
        assert!(report.starts_with("MRI LUMBAR SPINE"));
        assert!(report.contains("L4L5: No significant abnormality."));
        assert!(report.contains("Conus:"));
    }

    #[tokio::test]
    async fn test_compose_with_findings() {
        let findings = serde_json::to_value(FindingsStore::seeded()).unwrap();
        let request = post_json(
            "/api/report/compose",
            json!({ "region": "lumbar", "findings": findings }),
        );
        let (_, body) = send(ApiServer::default().router(), request).await;

        assert!(body["report"]
            .as_str()
            .unwrap()
            .contains("Central canal stenosis: Mild."));
    }

    #[tokio::test]
    async fn test_normalize() {
        let request = post_json("/api/report/normalize", json!({ "region": "cervical" }));
        let (status, body) = send(ApiServer::default().router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context"]["impressionKeyPoints"], normal_impression(Region::Cervical));
        assert_eq!(body["findings"]["L5S1"]["herniation"], "None");
    }

    #[tokio::test]
    async fn test_refine_disabled() {
        let session = serde_json::to_value(ReportSession::default()).unwrap();
        let (status, body) = send(
            ApiServer::default().router(),
            post_json("/api/session/refine", session),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], 503);
    }

    #[tokio::test]
    async fn test_refine_session() {
        let state = ApiState::default().with_refinement(Arc::new(FixedRefinement("Refined.")));
        let app = ApiServer::new(state).router();

        let session = serde_json::to_value(ReportSession::default()).unwrap();
        let (status, body) = send(app.clone(), post_json("/api/session/refine", session)).await;
        assert_eq!(status, StatusCode::OK);

        let refined: ReportSession = serde_json::from_value(body).unwrap();
        assert_eq!(refined.ai_impression, RefinementStatus::Succeeded("Refined.".to_string()));
        assert!(!refined.report_text.is_empty());

        let (pending, _) = ReportSession::default().begin_refinement().unwrap();
        let (status, _) = send(
            app,
            post_json("/api/session/refine", serde_json::to_value(pending).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_region_in_body() {
        let app = ApiServer::default().router();

        let (status, body) = send(
            app.clone(),
            post_json("/api/report/compose", json!({ "region": "sacral" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["status"], 400);
        assert!(body["message"].as_str().unwrap().contains("sacral"));

        let (status, body) = send(
            app,
            post_json("/api/report/normalize", json!({ "region": "sacral" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_invalid_option_in_body() {
        let request = post_json(
            "/api/report/compose",
            json!({ "region": "lumbar", "findings": { "L4L5": { "canal": "Critical" } } }),
        );
        let (status, body) = send(ApiServer::default().router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert!(body["message"].as_str().unwrap().contains("Critical"));
    }

    #[tokio::test]
    async fn test_malformed_session_body() {
        let state = ApiState::default().with_refinement(Arc::new(FixedRefinement("unused")));
        let request = Request::builder()
            .method("POST")
            .uri("/api/session/refine")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(ApiServer::new(state).router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_export_session() {
        let clipboard = MemoryClipboard::new();
        let state = ApiState::default().with_clipboard(Arc::new(clipboard.clone()));
        let session = ReportSession::default().with_report_text("MRI LUMBAR SPINE\n\nEdited");

        let (status, body) = send(
            ApiServer::new(state).router(),
            post_json("/api/report/export", serde_json::to_value(&session).unwrap()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exported"], true);
        assert_eq!(
            clipboard.contents().await.as_deref(),
            Some("MRI LUMBAR SPINE\n\nEdited")
        );
    }

    #[tokio::test]
    async fn test_export_disabled() {
        let session = serde_json::to_value(ReportSession::default()).unwrap();
        let (status, body) = send(
            ApiServer::default().router(),
            post_json("/api/report/export", session),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], true);
    }
}
