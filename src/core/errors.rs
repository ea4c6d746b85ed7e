//! # Container Error Handling
//!
//! 스코프 컨테이너 전역에서 사용하는 에러 타입입니다.
//! `thiserror` 기반으로 해석(resolve), 스코프, 해제(dispose), 이벤트 발행 단계에서
//! 발생하는 모든 실패를 하나의 열거형으로 표현합니다.
//!
//! ## 에러 분류
//!
//! | 변형 | 발생 시점 | 복구 가능 여부 |
//! |------|-----------|----------------|
//! | `UnknownService` | 빌드 플랜이 없는 키를 해석 | 호출자에게 전달 |
//! | `InvalidOperation` | 활성 스코프 없이 scoped 서비스 해석 | 호출자가 스코프를 먼저 생성 |
//! | `NoActiveScope` | 현재 스레드에 스코프 없이 `publish` | 호출자가 스코프를 먼저 생성 |
//! | `TypeMismatch` | 저장된 인스턴스와 요청 타입 불일치 | 등록 오류 |
//! | `Construction` | 팩토리 실패 | 호출자에게 전달 |
//! | `Disposal` | 스코프 해제 중 일부 인스턴스 실패 | 나머지는 계속 해제됨 |
//! | `Subscriber` | 구독자 `handle` 실패 | 남은 구독자는 호출되지 않음 |
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use scoped_container::core::errors::{ContainerError, ErrorContext};
//!
//! builder.register::<dyn Database, _>(Lifetime::Singleton, |_| {
//!     let conn = Connection::open("db.sqlite")
//!         .context("Failed to open database")?;
//!     Ok(Arc::new(SqliteDatabase::new(conn)) as Arc<dyn Database>)
//! });
//! ```

use std::fmt;
use thiserror::Error;

/// 구독자 핸들러와 `Disposable` 구현이 반환하는 박싱된 에러 타입
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 스코프 해제 중 한 인스턴스가 실패한 기록
#[derive(Debug)]
pub struct DisposalFailure {
    /// 실패한 서비스 키의 표시 이름
    pub service: String,
    /// `dispose` 가 반환한 원본 에러
    pub source: BoxError,
}

impl fmt::Display for DisposalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.source)
    }
}

/// 컨테이너 전역 에러 타입
#[derive(Error, Debug)]
pub enum ContainerError {
    /// 매핑 테이블에 빌드 플랜이 없는 서비스 키
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// 현재 상태에서 허용되지 않는 작업
    ///
    /// 대표적으로 루트 컨테이너에서 `Scoped` 서비스를 직접 해석하는 경우입니다.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// 호출 스레드에 활성화된 자식 스코프가 없음
    #[error("Invalid operation: no active scope on the current thread")]
    NoActiveScope,

    /// 저장된 인스턴스를 요청한 타입으로 꺼낼 수 없음
    #[error("Type mismatch for service {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// 빌드 플랜(팩토리) 실행 실패
    #[error("Failed to construct {key}: {message}")]
    Construction { key: String, message: String },

    /// 해제 단계에서 수집된 실패 목록
    ///
    /// 개별 실패가 있어도 나머지 인스턴스는 모두 해제된 뒤에 보고됩니다.
    #[error("{} instance(s) failed to dispose: {}", .0.len(), join_failures(.0))]
    Disposal(Vec<DisposalFailure>),

    /// 구독자 핸들러 실패. 같은 발행 호출의 나머지 구독자는 호출되지 않습니다.
    #[error("Subscriber {service} failed to handle {event}: {source}")]
    Subscriber {
        service: String,
        event: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ContainerError {
    /// `publish` 가 스코프 없이 호출되어 실패했는지 확인합니다.
    pub fn is_no_active_scope(&self) -> bool {
        matches!(self, ContainerError::NoActiveScope)
    }

    /// 서비스 키를 찾지 못해 실패했는지 확인합니다.
    pub fn is_unknown_service(&self) -> bool {
        matches!(self, ContainerError::UnknownService(_))
    }
}

fn join_failures(failures: &[DisposalFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 편의성을 위한 Result 타입 별칭
pub type ContainerResult<T> = Result<T, ContainerError>;

/// 팩토리 내부에서 외부 라이브러리 에러를 `Construction` 으로 변환하는 확장 trait
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> ContainerResult<T>;

    /// 클로저를 사용하여 지연 평가된 컨텍스트를 제공합니다.
    fn with_context<F>(self, f: F) -> ContainerResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> ContainerResult<T> {
        self.map_err(|e| ContainerError::Construction {
            key: msg.to_string(),
            message: e.to_string(),
        })
    }

    fn with_context<F>(self, f: F) -> ContainerResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ContainerError::Construction {
            key: f(),
            message: e.to_string(),
        })
    }
}
