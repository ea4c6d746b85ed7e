//! # Configuration Module
//!
//! 컨테이너 동작 옵션을 환경 변수 기반으로 중앙 관리하는 모듈입니다.
//!
//! ## 모듈 구성
//!
//! - [`container_config`] - 실행 환경(`Environment`)과 컨테이너 옵션(`ContainerConfig`)
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use scoped_container::config::{ContainerConfig, Environment};
//!
//! let env = Environment::current();
//! let config = ContainerConfig::from_env();
//! let container = Container::from_config(Arc::new(mappings), &config)?;
//! ```
//!
//! ## 환경 변수 설정 가이드
//!
//! ```bash
//! export ENVIRONMENT="development"        # development, test, staging, production
//! export CONTAINER_EAGER_SINGLETONS="true"
//! export CONTAINER_TRACE_RESOLUTIONS="false"
//! ```
//!
//! 바이너리는 `PROFILE` 에 따라 `.env.dev` / `.env.prod` 파일을 먼저 로드합니다.

pub mod container_config;

pub use container_config::*;
