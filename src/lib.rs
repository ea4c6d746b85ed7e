//! 스코프 컨테이너
//!
//! 의존성 주입 런타임의 스코프/생명주기 엔진입니다.
//! 루트 컨테이너가 싱글톤을 소유하고, 자식 컨테이너가 작업 단위(요청, 트랜잭션)마다
//! 독립된 scoped 인스턴스를 소유하며, 도메인 이벤트는 호출 스레드의 현재 스코프를 통해
//! 구독자에게 전달됩니다.
//!
//! # Features
//!
//! - **생명주기**: `Singleton` / `Scoped` / `Transient`
//! - **스코프 계층**: 루트 컨테이너 + RAII 자식 컨테이너
//! - **앰비언트 스코프**: 스레드별 "현재 스코프" 추적과 LIFO 복원
//! - **도메인 이벤트**: 등록 순서대로 동기 전달되는 `publish`
//! - **해제 관리**: 스코프 종료 시 `Disposable` 인스턴스 best-effort 정리
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   ServiceMappings   │ ← 키 → 빌드 플랜, 구독/해제 능력 인덱스
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   Container (root)  │ ← 싱글톤 저장소, 저장소 팩토리
//! └─────────────────────┘
//!            │ create_child_container()
//!            ▼
//! ┌─────────────────────┐
//! │   ChildContainer    │ ← scoped 저장소, 현재 스코프로 활성화
//! └─────────────────────┘
//!            │ current_scope()
//!            ▼
//! ┌─────────────────────┐
//! │  publish(event)     │ ← 구독자 해석 후 순서대로 handle
//! └─────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoped_container::{publish, Container, Lifetime, ResolveExt, ServiceMappings};
//!
//! let mappings = ServiceMappings::builder()
//!     .register::<dyn AuditTrail, _>(Lifetime::Scoped, |_| {
//!         Ok(Arc::new(MemoryAuditTrail::default()) as Arc<dyn AuditTrail>)
//!     })
//!     .subscribe::<dyn AuditTrail, UserCreated>()
//!     .build()?;
//!
//! let container = Container::new(Arc::new(mappings));
//! let scope = container.create_child_container();
//!
//! publish(UserCreated { id: 7 })?;
//! let audit = scope.resolve::<dyn AuditTrail>()?;
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod utils;

pub use crate::config::{ContainerConfig, Environment};
pub use crate::core::{
    current_scope, ChildContainer, Container, ContainerError, ContainerResult, Disposable,
    Lifetime, ResolveExt, Resolver, ScopeRef, ServiceKey, ServiceMappings,
};
pub use crate::events::{publish, publish_to, HandlerResult, SubscriberOf};
