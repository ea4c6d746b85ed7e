//! # Domain Event Dispatcher
//!
//! 프로세스 전역 `publish` 진입점입니다. 호출 스레드의 현재 스코프를 찾아,
//! 이벤트 타입을 구독하는 모든 서비스를 그 스코프를 통해 해석한 뒤 동기적으로 호출합니다.
//!
//! ## 전달 규칙
//!
//! 1. 현재 스레드에 활성 스코프가 없으면 `NoActiveScope`
//! 2. 구독자는 매핑 테이블의 선언 순서대로 해석/호출
//! 3. 구독자 해석은 일반 해석과 동일 (자식 저장소 → 루트 저장소 → 빌드 플랜)
//! 4. 핸들러 하나가 실패하면 즉시 반환하고 나머지 구독자는 호출하지 않음 (fail-fast)

use std::any::{Any, TypeId};

use log::debug;

use crate::core::errors::{ContainerError, ContainerResult};
use crate::core::resolver::Resolver;
use crate::core::scope::current_scope;

/// 현재 스코프의 모든 구독자에게 이벤트를 전달합니다.
///
/// # Errors
///
/// * `NoActiveScope` - 호출 스레드에 활성 스코프가 없음 (다른 스레드의 스코프는 무관)
/// * `Subscriber` - 핸들러 실패. 이후 구독자는 호출되지 않습니다.
/// * 구독자 해석 중 발생한 에러
///
/// # Examples
///
/// ```rust,ignore
/// let scope = container.create_child_container();
/// publish("Hello world".to_string())?;
/// ```
pub fn publish<E: Any>(event: E) -> ContainerResult<()> {
    let scope = current_scope().ok_or(ContainerError::NoActiveScope)?;
    publish_to(&scope, &event)
}

/// 명시적으로 주어진 컨테이너를 통해 이벤트를 전달합니다.
///
/// 앰비언트 스코프 대신 컨텍스트를 직접 넘기고 싶을 때 사용합니다. 루트 컨테이너를
/// 넘기면 scoped 구독자는 `InvalidOperation` 으로 실패합니다.
pub fn publish_to<R, E>(resolver: &R, event: &E) -> ContainerResult<()>
where
    R: Resolver + ?Sized,
    E: Any,
{
    let subscribers = resolver.mappings().subscribers_of(TypeId::of::<E>());
    debug!(
        "📣 Publishing {} to {} subscriber(s)",
        std::any::type_name::<E>(),
        subscribers.len()
    );

    for subscription in subscribers {
        let instance = resolver.resolve_key(subscription.key())?;
        subscription.deliver(&instance, event)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Container, Lifetime, ResolveExt, ServiceMappings};
    use crate::events::{HandlerResult, SubscriberOf};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    struct Recorder {
        label: &'static str,
        journal: Arc<Journal>,
    }

    impl SubscriberOf<u32> for Recorder {
        fn handle(&self, event: &u32) -> HandlerResult {
            if *event == 0 && self.label == "second" {
                return Err("zero is not allowed".into());
            }
            self.journal
                .entries
                .lock()
                .push(format!("{}:{}", self.label, event));
            Ok(())
        }
    }

    fn recorder_mappings() -> ServiceMappings {
        ServiceMappings::builder()
            .register::<Journal, _>(Lifetime::Scoped, |_| Ok(Arc::new(Journal::default())))
            .register_named::<Recorder, _>("first", Lifetime::Transient, |resolver| {
                Ok(Arc::new(Recorder {
                    label: "first",
                    journal: resolver.resolve::<Journal>()?,
                }))
            })
            .register_named::<Recorder, _>("second", Lifetime::Transient, |resolver| {
                Ok(Arc::new(Recorder {
                    label: "second",
                    journal: resolver.resolve::<Journal>()?,
                }))
            })
            .register_named::<Recorder, _>("third", Lifetime::Transient, |resolver| {
                Ok(Arc::new(Recorder {
                    label: "third",
                    journal: resolver.resolve::<Journal>()?,
                }))
            })
            .subscribe_named::<Recorder, u32>("first")
            .subscribe_named::<Recorder, u32>("second")
            .subscribe_named::<Recorder, u32>("third")
            .build()
            .unwrap()
    }

    #[test]
    fn test_delivery_follows_registration_order() {
        let container = Container::new(Arc::new(recorder_mappings()));
        let scope = container.create_child_container();

        publish(7_u32).unwrap();

        let journal = scope.resolve::<Journal>().unwrap();
        assert_eq!(
            *journal.entries.lock(),
            vec!["first:7", "second:7", "third:7"]
        );
    }

    #[test]
    fn test_handler_failure_stops_fan_out() {
        let container = Container::new(Arc::new(recorder_mappings()));
        let scope = container.create_child_container();

        let result = publish(0_u32);

        assert!(matches!(result, Err(ContainerError::Subscriber { .. })));
        let journal = scope.resolve::<Journal>().unwrap();
        assert_eq!(*journal.entries.lock(), vec!["first:0"]);
    }

    #[test]
    fn test_event_without_subscribers_is_noop() {
        let container = Container::new(Arc::new(recorder_mappings()));
        let _scope = container.create_child_container();

        assert!(publish("nobody listens".to_string()).is_ok());
    }

    #[test]
    fn test_publish_to_explicit_scope_without_ambient() {
        let container = Container::new(Arc::new(recorder_mappings()));
        let scope = container.create_child_container();
        let view = scope.as_scope();
        scope.dispose().unwrap();

        // 해제된 스코프를 통한 발행은 거부됨
        let result = publish_to(&view, &1_u32);
        assert!(matches!(result, Err(ContainerError::InvalidOperation(_))));

        let other = container.create_child_container();
        publish_to(&other, &5_u32).unwrap();
        let journal = other.resolve::<Journal>().unwrap();
        assert_eq!(journal.entries.lock().len(), 3);
    }

    #[test]
    fn test_publish_to_root_fails_for_scoped_dependencies() {
        let container = Container::new(Arc::new(recorder_mappings()));

        let result = publish_to(&container, &1_u32);
        assert!(matches!(result, Err(ContainerError::InvalidOperation(_))));
    }
}
