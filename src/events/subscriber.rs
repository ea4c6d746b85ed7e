//! 도메인 이벤트 구독자 계약

use crate::core::errors::BoxError;

/// 핸들러 반환 타입
pub type HandlerResult = Result<(), BoxError>;

/// 이벤트 `E` 를 처리할 수 있는 서비스
///
/// 구독자는 평범한 해석 가능한 서비스입니다. 인스턴스의 수명은 등록된 `Lifetime` 이
/// 결정하므로, scoped 구독자는 같은 스코프 안에서 상태(예: "처리했음" 플래그)를 유지합니다.
/// `handle` 은 `&self` 를 받으므로 상태 변경에는 원자 타입이나 락을 사용합니다.
///
/// 디스패처가 구독자를 찾으려면 매핑 등록 시 `subscribe::<T, E>()` 로 능력을 선언해야 합니다.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// trait Notifier: SubscriberOf<String> {
///     fn handled(&self) -> bool;
/// }
///
/// #[derive(Default)]
/// struct EmailNotifier {
///     handled: AtomicBool,
/// }
///
/// impl SubscriberOf<String> for EmailNotifier {
///     fn handle(&self, _event: &String) -> HandlerResult {
///         self.handled.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
/// ```
pub trait SubscriberOf<E>: Send + Sync {
    fn handle(&self, event: &E) -> HandlerResult;
}
