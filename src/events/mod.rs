//! # Domain Events
//!
//! 해석된 서비스가 이벤트를 발행하면 현재 스코프의 모든 구독자에게 전달하는 모듈입니다.
//!
//! 메시지 버스가 아닙니다. 프로세스 간 전달, 영속화, 재시도는 없으며 전달 순서는
//! 등록 순서뿐입니다.
//!
//! - [`subscriber`] - `SubscriberOf<E>` 구독자 계약
//! - [`dispatcher`] - `publish` / `publish_to` 진입점

pub mod dispatcher;
pub mod subscriber;

pub use dispatcher::{publish, publish_to};
pub use subscriber::{HandlerResult, SubscriberOf};
