//! AI印象优化客户端
//!
//! 把生成的报告发送到外部优化服务（`POST /api/ai-refine`），取回优化后的印象。
//! 调用是一次性的：不重试、不取消；失败只改变会话的AI印象状态，不影响其他任何状态。

use async_trait::async_trait;
use serde::Deserialize;
use spine_core::utils::non_blank_opt;
use spine_core::{Result, SpineError};
use spine_report::{RefinementRequest, ReportSession};
use std::time::Duration;
use tracing::{debug, error, info};

/// 优化服务的默认路径
pub const REFINE_PATH: &str = "/api/ai-refine";

/// 优化服务响应；`text` 为 `impression` 的兼容字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefinementResponse {
    pub impression: Option<String>,
    pub text: Option<String>,
}

impl RefinementResponse {
    pub fn into_impression(self) -> Option<String> {
        non_blank_opt(self.impression.as_deref())
            .or_else(|| non_blank_opt(self.text.as_deref()))
            .map(str::to_string)
    }
}

/// 优化服务接口
#[async_trait]
pub trait RefinementClient: Send + Sync {
    /// 请求优化，成功时返回印象文本
    async fn refine(&self, request: &RefinementRequest) -> Result<String>;
}

/// 基于HTTP的优化服务客户端
#[derive(Debug, Clone)]
pub struct HttpRefinementClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRefinementClient {
    /// 使用完整的端点URL创建客户端
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// 由服务根地址拼出 `/api/ai-refine`
    pub fn from_base_url(base_url: &str) -> Self {
        Self::new(format!("{}{}", base_url.trim_end_matches('/'), REFINE_PATH))
    }

    /// 带请求超时的客户端
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RefinementClient for HttpRefinementClient {
    async fn refine(&self, request: &RefinementRequest) -> Result<String> {
        debug!("Sending refinement request for {} region to {}", request.region, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach refinement service {}: {}", self.endpoint, e);
                SpineError::RefinementUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Refinement service returned status {}", status);
            return Err(SpineError::RefinementUnavailable(format!("status {}", status)));
        }

        let body: RefinementResponse = response.json().await.map_err(|e| {
            SpineError::RefinementUnavailable(format!("invalid response body: {}", e))
        })?;

        body.into_impression().ok_or_else(|| {
            SpineError::RefinementUnavailable("response carried no impression".to_string())
        })
    }
}

/// 驱动一次完整的优化：Pending → Succeeded / Failed
///
/// 已有请求在途时返回 `RefinementInFlight`；服务失败不会返回错误，而是记录在会话的AI印象状态中。
pub async fn refine_impression<C>(client: &C, session: &ReportSession) -> Result<ReportSession>
where
    C: RefinementClient + ?Sized,
{
    let (pending, request) = session.begin_refinement()?;
    let outcome = client.refine(&request).await;
    if outcome.is_ok() {
        info!("Impression refined for session {}", pending.id);
    }
    Ok(pending.complete_refinement(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use spine_report::RefinementStatus;

    async fn spawn_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn echo_impression(Json(body): Json<Value>) -> Json<Value> {
        let region = body["region"].as_str().unwrap_or_default().to_string();
        let has_report = body["baseReport"].as_str().is_some_and(|r| r.starts_with("MRI"));
        Json(json!({ "impression": format!("refined {} {}", region, has_report) }))
    }

    #[test]
    fn test_response_fallback_field() {
        let both = RefinementResponse {
            impression: Some("primary".to_string()),
            text: Some("secondary".to_string()),
        };
        assert_eq!(both.into_impression().as_deref(), Some("primary"));

        let text_only = RefinementResponse {
            impression: Some("  ".to_string()),
            text: Some("secondary".to_string()),
        };
        assert_eq!(text_only.into_impression().as_deref(), Some("secondary"));

        assert_eq!(RefinementResponse::default().into_impression(), None);
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let client = HttpRefinementClient::from_base_url("http://localhost:8080/");
        assert_eq!(client.endpoint(), "http://localhost:8080/api/ai-refine");
    }

    #[tokio::test]
    async fn test_refine_success() {
        let base = spawn_service(Router::new().route(REFINE_PATH, post(echo_impression))).await;
        let client = HttpRefinementClient::from_base_url(&base);

        let session = ReportSession::default();
        let refined = refine_impression(&client, &session).await.unwrap();

        assert_eq!(refined.ai_impression.impression(), Some("refined lumbar true"));
        assert_eq!(refined.findings, session.findings);
        assert_eq!(refined.context, session.context);
    }

    #[tokio::test]
    async fn test_refine_text_field() {
        let router = Router::new().route(
            REFINE_PATH,
            post(|| async { Json(json!({ "text": "from text field" })) }),
        );
        let base = spawn_service(router).await;
        let client = HttpRefinementClient::from_base_url(&base);

        let request = RefinementRequest {
            base_report: "MRI CERVICAL SPINE".to_string(),
            region: spine_core::Region::Cervical,
        };
        assert_eq!(client.refine(&request).await.unwrap(), "from text field");
    }

    #[tokio::test]
    async fn test_refine_failure_status() {
        let router = Router::new().route(
            REFINE_PATH,
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_service(router).await;
        let client = HttpRefinementClient::from_base_url(&base);

        let session = ReportSession::default().generate_report();
        let refined = refine_impression(&client, &session).await.unwrap();

        assert!(matches!(refined.ai_impression, RefinementStatus::Failed(ref reason) if reason.contains("502")));
        assert_eq!(refined.report_text, session.report_text);
        assert_eq!(refined.findings, session.findings);
    }

    #[tokio::test]
    async fn test_refine_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpRefinementClient::from_base_url(&format!("http://{}", addr));
        let request = RefinementRequest {
            base_report: "MRI LUMBAR SPINE".to_string(),
            region: spine_core::Region::Lumbar,
        };
        assert!(matches!(
            client.refine(&request).await,
            Err(SpineError::RefinementUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_single_request_in_flight() {
        let client = HttpRefinementClient::new("http://127.0.0.1:9/unused");
        let (pending, _) = ReportSession::default().begin_refinement().unwrap();

        assert!(matches!(
            refine_impression(&client, &pending).await,
            Err(SpineError::RefinementInFlight)
        ));
    }
}
