//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//!
//! 로드 순서 (뒤의 소스가 앞의 소스를 덮어씀):
//! 1. 코드 기본값
//! 2. `config/default.toml` (선택)
//! 3. `PULSE__` 접두사 환경 변수 (예: `PULSE__CACHE__TTL_SECS=60`)
//! 4. 기존 배포와 호환되는 환경 변수: `PORT`, `COINGECKO_API_KEY`,
//!    `NEWS_API_KEY`, `HF_TOKEN`

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, CoreResult};

/// 기본 조회 코인 목록 (CoinGecko ID).
pub const DEFAULT_COINS: [&str; 10] = [
    "bitcoin",
    "ethereum",
    "tether",
    "solana",
    "ripple",
    "binancecoin",
    "dogecoin",
    "tron",
    "hyperliquid",
    "cardano",
];

/// 기본 감성 분류 모델.
pub const DEFAULT_SENTIMENT_MODEL: &str =
    "mrm8488/distilroberta-finetuned-financial-news-sentiment-analysis";

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 캐시 설정
    #[serde(default)]
    pub cache: CacheConfig,
    /// 업스트림 API 설정
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 감성 분석 설정
    #[serde(default)]
    pub sentiment: SentimentConfig,
    /// API 자격증명
    #[serde(default)]
    pub credentials: Credentials,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 표시 설정
    #[serde(default)]
    pub display: DisplayConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 전체 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// 요청 타임아웃을 `Duration`으로 반환.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 캐시 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 모든 키에 공통 적용되는 TTL (초)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 40 }
    }
}

impl CacheConfig {
    /// TTL을 `Duration`으로 반환.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// 업스트림 API 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// 모든 업스트림 호출의 타임아웃 (초)
    pub timeout_secs: u64,
    /// CoinGecko REST 기본 URL
    pub coingecko_base_url: String,
    /// NewsData REST 기본 URL
    pub newsdata_base_url: String,
    /// 뉴스 검색어
    pub news_query: String,
    /// 시세 조회 대상 코인 ID 목록
    pub coins: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            newsdata_base_url: "https://newsdata.io/api/1".to_string(),
            news_query: "crypto".to_string(),
            coins: DEFAULT_COINS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl UpstreamConfig {
    /// 타임아웃을 `Duration`으로 반환.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 감성 분석 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    /// 추론 API 기본 URL
    pub base_url: String,
    /// 분류 모델 ID
    pub model: String,
    /// 뉴스 한 번 갱신에서 분류에 쓸 수 있는 총 시간 (초).
    ///
    /// 초과하면 남은 헤드라인은 중립으로 채웁니다.
    pub budget_secs: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.huggingface.co/hf-inference".to_string(),
            model: DEFAULT_SENTIMENT_MODEL.to_string(),
            budget_secs: 15,
        }
    }
}

impl SentimentConfig {
    /// 분류 예산을 `Duration`으로 반환.
    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }
}

/// API 자격증명.
///
/// 모든 값은 선택적입니다. `hf_token`이 없으면 감성 분석이 중립값으로
/// 대체될 뿐 서버 시작은 실패하지 않습니다.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    /// CoinGecko demo API 키
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub coingecko_api_key: Option<SecretString>,
    /// NewsData API 키
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub news_api_key: Option<SecretString>,
    /// Hugging Face 추론 토큰
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub hf_token: Option<SecretString>,
}

/// 빈 문자열은 미설정으로 취급.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from))
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 표시 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// 뉴스 게시 시각 표시용 IANA 타임존 (기본: UTC+7)
    pub timezone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

impl DisplayConfig {
    /// 타임존 이름을 파싱합니다.
    pub fn tz(&self) -> CoreResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| CoreError::InvalidTimezone(self.timezone.clone()))
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아닙니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let defaults = UpstreamConfig::default();
        let sentiment = SentimentConfig::default();

        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("cache.ttl_secs", 40)?
            .set_default("upstream.timeout_secs", 10)?
            .set_default("upstream.coingecko_base_url", defaults.coingecko_base_url)?
            .set_default("upstream.newsdata_base_url", defaults.newsdata_base_url)?
            .set_default("upstream.news_query", defaults.news_query)?
            .set_default("upstream.coins", defaults.coins)?
            .set_default("sentiment.base_url", sentiment.base_url)?
            .set_default("sentiment.model", sentiment.model)?
            .set_default("sentiment.budget_secs", sentiment.budget_secs)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("display.timezone", "Asia/Jakarta")?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("PULSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upstream.coins"),
            )
            // 기존 배포 환경 변수
            .set_override_option("server.port", env_non_empty("PORT"))?
            .set_override_option("credentials.coingecko_api_key", env_non_empty("COINGECKO_API_KEY"))?
            .set_override_option("credentials.news_api_key", env_non_empty("NEWS_API_KEY"))?
            .set_override_option("credentials.hf_token", env_non_empty("HF_TOKEN"))?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    /// 값 범위 검증.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cache.ttl_secs == 0 {
            return Err(CoreError::InvalidValue("cache.ttl_secs must be > 0".into()));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(CoreError::InvalidValue(
                "upstream.timeout_secs must be > 0".into(),
            ));
        }
        if self.upstream.coins.is_empty() {
            return Err(CoreError::InvalidValue("upstream.coins is empty".into()));
        }
        // 뉴스 조회와 분류 예산을 합쳐도 요청 타임아웃 안에 끝나야 캐시가 채워진다
        let news_worst_case = self.upstream.timeout_secs + self.sentiment.budget_secs;
        if news_worst_case >= self.server.request_timeout_secs {
            return Err(CoreError::InvalidValue(format!(
                "upstream.timeout_secs + sentiment.budget_secs ({news_worst_case}) must be < server.request_timeout_secs ({})",
                self.server.request_timeout_secs
            )));
        }
        self.display.tz()?;
        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.cache.ttl(), Duration::from_secs(40));
        assert_eq!(config.upstream.timeout(), Duration::from_secs(10));
        assert_eq!(config.upstream.coins.len(), 10);
        assert_eq!(config.upstream.coins[0], "bitcoin");
        assert!(config.credentials.hf_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_display_timezone() {
        let display = DisplayConfig::default();
        assert_eq!(display.tz().unwrap(), chrono_tz::Asia::Jakarta);

        let bad = DisplayConfig {
            timezone: "Nowhere/Special".to_string(),
        };
        assert!(matches!(bad.tz(), Err(CoreError::InvalidTimezone(_))));
    }

    #[test]
    fn test_validate_rejects_budget_beyond_request_timeout() {
        let mut config = AppConfig::default();
        assert_eq!(config.sentiment.budget(), Duration::from_secs(15));
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));

        config.sentiment.budget_secs = 20;
        assert!(matches!(config.validate(), Err(CoreError::InvalidValue(_))));

        config.server.request_timeout_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = AppConfig::default();
        config.cache.ttl_secs = 0;
        assert!(matches!(config.validate(), Err(CoreError::InvalidValue(_))));
    }

    #[test]
    fn test_credentials_blank_is_unset() {
        let creds: Credentials = serde_json::from_value(serde_json::json!({
            "coingecko_api_key": "cg-key",
            "news_api_key": "   ",
        }))
        .unwrap();

        assert_eq!(
            creds.coingecko_api_key.as_ref().unwrap().expose_secret(),
            "cg-key"
        );
        assert!(creds.news_api_key.is_none());
        assert!(creds.hf_token.is_none());
    }
}
