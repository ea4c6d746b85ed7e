//! 서비스 생명주기 정의

use serde::{Deserialize, Serialize};

/// 해석된 인스턴스의 캐싱 범위
///
/// | Lifetime | 저장 위치 | 팩토리 호출 횟수 |
/// |----------|-----------|------------------|
/// | `Singleton` | 루트 저장소 | 루트 컨테이너당 최대 1회 |
/// | `Scoped` | 자식 스코프 저장소 | 활성 스코프당 최대 1회 |
/// | `Transient` | 저장하지 않음 | 해석할 때마다 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    Singleton,
    Scoped,
    Transient,
}

impl Lifetime {
    /// 문자열에서 Lifetime을 파싱합니다 (대소문자 무관).
    ///
    /// # Errors
    ///
    /// 알 수 없는 값이면 입력 문자열을 담은 에러 메시지를 반환합니다.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" | "scope" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            _ => Err(format!("Unsupported lifetime: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_from_string() {
        assert_eq!(Lifetime::from_str("singleton").unwrap(), Lifetime::Singleton);
        assert_eq!(Lifetime::from_str("Scoped").unwrap(), Lifetime::Scoped);
        assert_eq!(Lifetime::from_str("TRANSIENT").unwrap(), Lifetime::Transient);
        assert!(Lifetime::from_str("request").is_err());
    }

    #[test]
    fn test_lifetime_serialization() {
        let json = serde_json::to_string(&Lifetime::Scoped).unwrap();
        assert_eq!(json, "\"scoped\"");

        let deserialized: Lifetime = serde_json::from_str("\"singleton\"").unwrap();
        assert_eq!(deserialized, Lifetime::Singleton);
    }
}
