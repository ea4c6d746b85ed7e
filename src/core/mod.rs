//! # Core Container Module
//!
//! 스코프/생명주기 엔진의 핵심입니다. 부모-자식 컨테이너 계층, 스코프별 인스턴스 저장소,
//! 그리고 이벤트 발행이 의존하는 스레드별 "현재 스코프" 추적을 담당합니다.
//!
//! ## 모듈 구성
//!
//! ### [`key`] / [`lifetime`] - 식별자와 생명주기
//! - **ServiceKey**: `TypeId` + 선택적 이름
//! - **Lifetime**: `Singleton` / `Scoped` / `Transient`
//!
//! ### [`mappings`] - 서비스 매핑 테이블
//! - **ServiceMappings**: 키 → 빌드 플랜 불변 테이블
//! - **구독/해제 능력 인덱스**: 등록 시점에 미리 계산
//!
//! ### [`storage`] - 인스턴스 저장소
//! - **루트 저장소**: 싱글톤, 루트 컨테이너와 같은 수명
//! - **스코프 저장소**: 스코프마다 독립, 해제 시 best-effort 정리
//!
//! ### [`resolver`] - 공통 해석 알고리즘
//! - 자식 저장소 → 루트 저장소 → 빌드 플랜 순서
//!
//! ### [`container`] / [`scope`] - 루트와 자식 컨테이너
//! - **Container**: 싱글톤 소유, 자식 스코프 생성
//! - **ChildContainer**: RAII 스코프, 앰비언트 포인터 저장/복원
//!
//! ### [`errors`] - 통합 에러 처리
//!
//! ## 생명주기 요약
//!
//! | Lifetime | 같은 스코프 | 다른 스코프 | 다른 스레드 |
//! |----------|-------------|-------------|-------------|
//! | `Singleton` | 동일 인스턴스 | 동일 인스턴스 | 동일 인스턴스 |
//! | `Scoped` | 동일 인스턴스 | 다른 인스턴스 | 다른 인스턴스 |
//! | `Transient` | 매번 새로 생성 | 매번 새로 생성 | 매번 새로 생성 |

pub mod container;
pub mod errors;
pub mod key;
pub mod lifetime;
pub mod mappings;
pub mod resolver;
pub mod scope;
pub mod storage;

pub use container::Container;
pub use errors::*;
pub use key::ServiceKey;
pub use lifetime::Lifetime;
pub use mappings::{BuildPlan, ServiceDescriptor, ServiceMappings, ServiceMappingsBuilder, Subscription};
pub use resolver::{ResolveExt, Resolver};
pub use scope::{current_scope, ChildContainer, ScopeRef};
pub use storage::{
    DefaultInstanceStorage, DefaultInstanceStorageFactory, Disposable, Instance, InstanceStorage,
    InstanceStorageFactory, StoredInstance,
};
