//! 컨테이너 및 실행 환경 설정 관리 모듈
//!
//! 실행 환경과 컨테이너 동작 옵션을 환경 변수에서 읽어옵니다.

use std::env;

use once_cell::sync::Lazy;

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 개발 환경 - 상세 로그
    Development,
    /// 테스트 환경 - 자동화된 테스트용 설정
    Test,
    /// 스테이징 환경 - 프로덕션 유사 환경
    Staging,
    /// 프로덕션 환경
    Production,
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 또는 `NODE_ENV` 환경 변수를 확인하며,
    /// 설정되지 않은 경우 `Production`을 기본값으로 사용합니다.
    pub fn current() -> Self {
        let value = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| env::var("NODE_ENV").unwrap_or_else(|_| "production".to_string()));
        Self::from_str(&value)
    }

    /// 문자열에서 Environment를 생성합니다 (대소문자 무관).
    ///
    /// 알 수 없는 값인 경우 `Production`을 반환합니다.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }
}

/// 컨테이너 동작 옵션
///
/// # Environment Variables
///
/// | 변수 | 기본값 | 설명 |
/// |------|--------|------|
/// | `CONTAINER_EAGER_SINGLETONS` | `false` | 생성 시 모든 싱글톤을 미리 만들지 여부 |
/// | `CONTAINER_TRACE_RESOLUTIONS` | 개발/테스트 `true`, 그 외 `false` | 해석 과정을 `trace` 로그로 남길지 여부 |
///
/// # Examples
///
/// ```bash
/// # .env.dev
/// ENVIRONMENT=development
/// CONTAINER_EAGER_SINGLETONS=true
/// RUST_LOG=scoped_container=trace
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    pub eager_singletons: bool,
    pub trace_resolutions: bool,
}

static GLOBAL_CONFIG: Lazy<ContainerConfig> = Lazy::new(ContainerConfig::from_env);

impl ContainerConfig {
    /// 환경 변수에서 설정을 읽습니다.
    pub fn from_env() -> Self {
        let defaults = Self::for_env(&Environment::current());

        Self {
            eager_singletons: read_flag("CONTAINER_EAGER_SINGLETONS")
                .unwrap_or(defaults.eager_singletons),
            trace_resolutions: read_flag("CONTAINER_TRACE_RESOLUTIONS")
                .unwrap_or(defaults.trace_resolutions),
        }
    }

    /// 특정 환경의 기본 설정을 반환합니다.
    pub fn for_env(env: &Environment) -> Self {
        match env {
            Environment::Development | Environment::Test => Self {
                eager_singletons: false,
                trace_resolutions: true,
            },
            Environment::Staging | Environment::Production => Self {
                eager_singletons: false,
                trace_resolutions: false,
            },
        }
    }

    /// 프로세스 전역 설정 (첫 접근 시 한 번만 환경 변수를 읽음)
    pub fn global() -> &'static ContainerConfig {
        &GLOBAL_CONFIG
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::for_env(&Environment::Production)
    }
}

fn read_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|value| parse_flag(&value))
}

/// "true"/"1"/"yes"/"on" 과 "false"/"0"/"no"/"off" 를 인식합니다.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_string() {
        assert_eq!(Environment::from_str("development"), Environment::Development);
        assert_eq!(Environment::from_str("DEV"), Environment::Development);
        assert_eq!(Environment::from_str("test"), Environment::Test);
        assert_eq!(Environment::from_str("stage"), Environment::Staging);
        assert_eq!(Environment::from_str("unknown"), Environment::Production);
    }

    #[test]
    fn test_config_for_each_environment() {
        assert!(ContainerConfig::for_env(&Environment::Development).trace_resolutions);
        assert!(ContainerConfig::for_env(&Environment::Test).trace_resolutions);
        assert!(!ContainerConfig::for_env(&Environment::Production).trace_resolutions);
        assert!(!ContainerConfig::default().eager_singletons);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" On "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_from_env_defaults() {
        if env::var("CONTAINER_EAGER_SINGLETONS").is_err() {
            assert!(!ContainerConfig::from_env().eager_singletons);
        }
    }
}
