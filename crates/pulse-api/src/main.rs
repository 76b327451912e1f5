//! 마켓 펄스 API 서버.
//!
//! 설정을 읽어 업스트림 클라이언트와 스냅샷 캐시를 구성하고
//! Axum 기반 JSON API 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use pulse_api::metrics::setup_metrics_recorder;
use pulse_api::middleware::metrics_layer;
use pulse_api::routes::create_api_router;
use pulse_api::state::AppState;
use pulse_core::{init_logging, AppConfig, LogConfig};
use pulse_data::{
    CoinGeckoClient, HuggingFaceClassifier, MarketAggregator, NewsDataClient, SentimentEnricher,
    SnapshotStore,
};

/// CORS 레이어 생성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 모든 origin을 허용합니다.
///
/// # 환경변수
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록
///   예: `https://dashboard.example.com,https://admin.example.com`
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => AllowOrigin::any(),
    };

    // 읽기 전용 API
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
///
/// `request_timeout`을 넘긴 요청은 408로 끝납니다. 뉴스 갱신은 분류 예산 안에서
/// 끝나므로 설정 검증을 통과한 값이면 타임아웃보다 먼저 응답합니다.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
}

/// 설정으로부터 업스트림 클라이언트와 집계기를 구성합니다.
fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let timeout = config.upstream.timeout();
    let credentials = &config.credentials;

    let market = CoinGeckoClient::new(
        config.upstream.coingecko_base_url.clone(),
        credentials.coingecko_api_key.as_ref(),
        config.upstream.coins.clone(),
        timeout,
    )
    .context("CoinGecko 클라이언트 생성 실패")?;

    if credentials.news_api_key.is_none() {
        warn!("NEWS_API_KEY not set, /api/sentiment will return an empty list");
    }
    let news = NewsDataClient::new(
        config.upstream.newsdata_base_url.clone(),
        credentials.news_api_key.as_ref(),
        config.upstream.news_query.clone(),
        timeout,
    )
    .context("NewsData 클라이언트 생성 실패")?;

    let enricher = match &credentials.hf_token {
        Some(token) => {
            let classifier = HuggingFaceClassifier::new(
                config.sentiment.base_url.clone(),
                config.sentiment.model.clone(),
                token,
                timeout,
            )
            .context("Hugging Face 분류기 생성 실패")?;
            SentimentEnricher::new(Arc::new(classifier))
        }
        None => {
            warn!("HF_TOKEN not set, every headline will be labelled neutral");
            SentimentEnricher::disabled()
        }
    };

    let display_tz = config.display.tz().context("표시 타임존 설정 오류")?;

    let aggregator = MarketAggregator::new(
        Arc::new(market),
        Arc::new(news),
        enricher,
        Arc::new(SnapshotStore::new()),
    )
    .with_ttl(config.cache.ttl())
    .with_enrichment_budget(config.sentiment.budget())
    .with_display_timezone(display_tz);

    let state = AppState::new(aggregator);
    Ok(if credentials.hf_token.is_some() {
        state.with_sentiment_model(config.sentiment.model.clone())
    } else {
        state
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;

    init_logging(LogConfig::from_settings(&config.logging))?;

    info!("Starting Market Pulse API server...");

    let metrics_handle = setup_metrics_recorder();
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "소켓 주소 설정이 유효하지 않습니다. PULSE__SERVER__HOST, PORT 환경변수를 확인하세요."
            );
            e
        })?;

    let state = Arc::new(create_app_state(&config)?);

    info!(version = %state.version, "Application state initialized");
    info!(
        has_coingecko_key = config.credentials.coingecko_api_key.is_some(),
        has_news_key = config.credentials.news_api_key.is_some(),
        has_hf_token = config.credentials.hf_token.is_some(),
        cache_ttl_secs = config.cache.ttl_secs,
        request_timeout_secs = config.server.request_timeout_secs,
        sentiment_budget_secs = config.sentiment.budget_secs,
        coins = config.upstream.coins.len(),
        timezone = %config.display.timezone,
        "Service connections status"
    );

    let shutdown_token = CancellationToken::new();

    let app = create_router(state, metrics_handle, config.server.request_timeout());

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
