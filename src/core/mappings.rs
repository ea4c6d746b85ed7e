//! # Service Mappings
//!
//! 서비스 키 → 빌드 플랜의 불변 테이블입니다.
//!
//! 등록 단계에서 한 번 만들어진 뒤에는 컨테이너가 읽기만 합니다. 매핑 테이블은
//! 두 종류의 사전 계산된 정보를 함께 들고 있습니다.
//!
//! - **해제 능력**: 어떤 키의 인스턴스가 `Disposable` 인지
//! - **구독 능력**: 어떤 키가 어떤 이벤트 타입의 `SubscriberOf<E>` 인지
//!
//! 이벤트 디스패처는 살아있는 인스턴스를 검사하지 않고 이 인덱스만 조회합니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoped_container::core::{Lifetime, ServiceMappings};
//!
//! let mappings = ServiceMappings::builder()
//!     .register::<dyn Clock, _>(Lifetime::Singleton, |_| {
//!         Ok(Arc::new(SystemClock) as Arc<dyn Clock>)
//!     })
//!     .register::<dyn AuditTrail, _>(Lifetime::Scoped, |resolver| {
//!         let clock = resolver.resolve::<dyn Clock>()?;
//!         Ok(Arc::new(MemoryAuditTrail::new(clock)) as Arc<dyn AuditTrail>)
//!     })
//!     .subscribe::<dyn AuditTrail, UserCreated>()
//!     .disposable::<dyn AuditTrail>()
//!     .build()?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::{BoxError, ContainerError, ContainerResult};
use crate::core::key::ServiceKey;
use crate::core::lifetime::Lifetime;
use crate::core::resolver::Resolver;
use crate::core::storage::{Disposable, Disposer, Instance};
use crate::events::SubscriberOf;

/// 타입 소거된 팩토리
pub type Factory = Arc<dyn Fn(&dyn Resolver) -> ContainerResult<Instance> + Send + Sync>;

type Delivery = Arc<dyn Fn(&Instance, &dyn Any) -> ContainerResult<()> + Send + Sync>;

/// 외부에서 공급되는 생성 함수와 생명주기 태그
#[derive(Clone)]
pub struct BuildPlan {
    key: ServiceKey,
    lifetime: Lifetime,
    factory: Factory,
    disposer: Option<Disposer>,
    subscribed_events: Vec<&'static str>,
}

impl BuildPlan {
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn disposer(&self) -> Option<Disposer> {
        self.disposer.clone()
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    /// 이 키가 구독하는 이벤트 타입 이름 (선언 순서)
    pub fn subscribed_events(&self) -> &[&'static str] {
        &self.subscribed_events
    }

    /// 팩토리를 실행해 새 인스턴스를 만듭니다. 캐싱은 호출자(컨테이너) 몫입니다.
    pub fn build(&self, resolver: &dyn Resolver) -> ContainerResult<Instance> {
        (self.factory)(resolver)
    }
}

/// "subscriber of E" 능력 하나
#[derive(Clone)]
pub struct Subscription {
    key: ServiceKey,
    event_type: TypeId,
    event_name: &'static str,
    deliver: Delivery,
}

impl Subscription {
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    /// 해석된 구독자 인스턴스에 이벤트를 전달합니다.
    pub fn deliver(&self, instance: &Instance, event: &dyn Any) -> ContainerResult<()> {
        (self.deliver)(instance, event)
    }
}

/// 진단용 매핑 요약 (JSON 출력 등)
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    pub service: String,
    pub name: Option<String>,
    pub lifetime: Lifetime,
    pub disposable: bool,
    pub subscribes_to: Vec<String>,
}

/// 불변 서비스 매핑 테이블
pub struct ServiceMappings {
    plans: HashMap<ServiceKey, BuildPlan>,
    order: Vec<ServiceKey>,
    subscribers: HashMap<TypeId, Vec<Subscription>>,
}

impl ServiceMappings {
    pub fn builder() -> ServiceMappingsBuilder {
        ServiceMappingsBuilder::default()
    }

    /// 등록이 하나도 없는 테이블
    pub fn empty() -> Self {
        Self {
            plans: HashMap::new(),
            order: Vec::new(),
            subscribers: HashMap::new(),
        }
    }

    pub fn plan(&self, key: &ServiceKey) -> Option<&BuildPlan> {
        self.plans.get(key)
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.plans.contains_key(key)
    }

    /// 이벤트 타입 `event_type` 을 구독하는 서비스 목록 (등록 순서)
    pub fn subscribers_of(&self, event_type: TypeId) -> &[Subscription] {
        self.subscribers
            .get(&event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 등록 순서대로 키를 순회합니다.
    pub fn keys(&self) -> impl Iterator<Item = &ServiceKey> {
        self.order.iter()
    }

    /// 등록 순서대로 빌드 플랜을 순회합니다.
    pub fn plans(&self) -> impl Iterator<Item = &BuildPlan> {
        self.order.iter().filter_map(|key| self.plans.get(key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn describe(&self) -> Vec<ServiceDescriptor> {
        self.plans()
            .map(|plan| ServiceDescriptor {
                service: plan.key().base_name(),
                name: plan.key().name().map(str::to_string),
                lifetime: plan.lifetime(),
                disposable: plan.is_disposable(),
                subscribes_to: plan
                    .subscribed_events()
                    .iter()
                    .map(|event| event.to_string())
                    .collect(),
            })
            .collect()
    }
}

/// 매핑 테이블 빌더 (등록 단계의 최소 구현)
#[derive(Default)]
pub struct ServiceMappingsBuilder {
    plans: HashMap<ServiceKey, BuildPlan>,
    order: Vec<ServiceKey>,
    disposers: Vec<(ServiceKey, Disposer)>,
    subscriptions: Vec<Subscription>,
}

impl ServiceMappingsBuilder {
    /// `T` 를 이름 없이 등록합니다.
    ///
    /// 같은 키를 다시 등록하면 플랜은 교체되지만 등록 순서는 처음 위치를 유지합니다.
    pub fn register<T, F>(self, lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.register_key::<T, F>(ServiceKey::of::<T>(), lifetime, factory)
    }

    /// `T` 를 이름 붙여 등록합니다.
    pub fn register_named<T, F>(self, name: &'static str, lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.register_key::<T, F>(ServiceKey::named::<T>(name), lifetime, factory)
    }

    fn register_key<T, F>(mut self, key: ServiceKey, lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(
            move |resolver: &dyn Resolver| -> ContainerResult<Instance> {
                let service = factory(resolver)?;
                Ok(Arc::new(service) as Instance)
            },
        );

        if !self.plans.contains_key(&key) {
            self.order.push(key);
        }
        self.plans.insert(
            key,
            BuildPlan {
                key,
                lifetime,
                factory,
                disposer: None,
                subscribed_events: Vec::new(),
            },
        );
        self
    }

    /// `T` 의 인스턴스가 `Disposable` 임을 선언합니다.
    pub fn disposable<T>(self) -> Self
    where
        T: ?Sized + Disposable + 'static,
    {
        self.disposable_key::<T>(ServiceKey::of::<T>())
    }

    pub fn disposable_named<T>(self, name: &'static str) -> Self
    where
        T: ?Sized + Disposable + 'static,
    {
        self.disposable_key::<T>(ServiceKey::named::<T>(name))
    }

    fn disposable_key<T>(mut self, key: ServiceKey) -> Self
    where
        T: ?Sized + Disposable + 'static,
    {
        let disposer: Disposer = Arc::new(move |instance: &Instance| -> Result<(), BoxError> {
            match instance.downcast_ref::<Arc<T>>() {
                Some(service) => service.dispose(),
                None => Err(format!("stored instance of {} has an unexpected type", key).into()),
            }
        });
        self.disposers.push((key, disposer));
        self
    }

    /// `T` 가 이벤트 `E` 의 구독자임을 선언합니다. 선언 순서가 전달 순서입니다.
    pub fn subscribe<T, E>(self) -> Self
    where
        T: ?Sized + SubscriberOf<E> + 'static,
        E: 'static,
    {
        self.subscribe_key::<T, E>(ServiceKey::of::<T>())
    }

    pub fn subscribe_named<T, E>(self, name: &'static str) -> Self
    where
        T: ?Sized + SubscriberOf<E> + 'static,
        E: 'static,
    {
        self.subscribe_key::<T, E>(ServiceKey::named::<T>(name))
    }

    fn subscribe_key<T, E>(mut self, key: ServiceKey) -> Self
    where
        T: ?Sized + SubscriberOf<E> + 'static,
        E: 'static,
    {
        let event_type = TypeId::of::<E>();
        let duplicate = self
            .subscriptions
            .iter()
            .any(|existing| existing.key == key && existing.event_type == event_type);
        if duplicate {
            return self;
        }

        let event_name = std::any::type_name::<E>();
        let deliver: Delivery = Arc::new(
            move |instance: &Instance, event: &dyn Any| -> ContainerResult<()> {
                let subscriber = instance.downcast_ref::<Arc<T>>().ok_or_else(|| {
                    ContainerError::TypeMismatch {
                        key: key.short_name(),
                        expected: std::any::type_name::<T>(),
                    }
                })?;
                let event = event.downcast_ref::<E>().ok_or_else(|| {
                    ContainerError::TypeMismatch {
                        key: key.short_name(),
                        expected: event_name,
                    }
                })?;
                subscriber
                    .handle(event)
                    .map_err(|source| ContainerError::Subscriber {
                        service: key.short_name(),
                        event: event_name,
                        source,
                    })
            },
        );

        self.subscriptions.push(Subscription {
            key,
            event_type,
            event_name,
            deliver,
        });
        self
    }

    /// 불변 매핑 테이블을 만듭니다.
    ///
    /// # Errors
    ///
    /// 등록되지 않은 키에 해제/구독 능력을 선언했다면 `UnknownService` 를 반환합니다.
    pub fn build(self) -> ContainerResult<ServiceMappings> {
        let Self {
            mut plans,
            order,
            disposers,
            subscriptions,
        } = self;

        for (key, disposer) in disposers {
            let plan = plans
                .get_mut(&key)
                .ok_or_else(|| ContainerError::UnknownService(key.short_name()))?;
            plan.disposer = Some(disposer);
        }

        let mut subscribers: HashMap<TypeId, Vec<Subscription>> = HashMap::new();
        for subscription in subscriptions {
            let plan = plans
                .get_mut(&subscription.key)
                .ok_or_else(|| ContainerError::UnknownService(subscription.key.short_name()))?;
            plan.subscribed_events.push(subscription.event_name);
            subscribers
                .entry(subscription.event_type)
                .or_default()
                .push(subscription);
        }

        Ok(ServiceMappings {
            plans,
            order,
            subscribers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    impl SubscriberOf<String> for English {
        fn handle(&self, _event: &String) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Disposable for English {
        fn dispose(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mappings = ServiceMappings::builder()
            .register::<u32, _>(Lifetime::Transient, |_| Ok(Arc::new(1)))
            .register::<String, _>(Lifetime::Singleton, |_| Ok(Arc::new("a".to_string())))
            .register::<u32, _>(Lifetime::Scoped, |_| Ok(Arc::new(2)))
            .build()
            .unwrap();

        let keys: Vec<String> = mappings.keys().map(|key| key.short_name()).collect();
        assert_eq!(keys, vec!["u32", "String"]);
        assert_eq!(
            mappings.plan(&ServiceKey::of::<u32>()).unwrap().lifetime(),
            Lifetime::Scoped
        );
        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_subscribers_are_indexed_by_event_type() {
        let mappings = ServiceMappings::builder()
            .register::<English, _>(Lifetime::Scoped, |_| Ok(Arc::new(English)))
            .register_named::<English, _>("second", Lifetime::Scoped, |_| Ok(Arc::new(English)))
            .subscribe_named::<English, String>("second")
            .subscribe::<English, String>()
            .subscribe::<English, String>()
            .build()
            .unwrap();

        let subscribers = mappings.subscribers_of(TypeId::of::<String>());
        assert_eq!(subscribers.len(), 2);
        assert_eq!(subscribers[0].key(), &ServiceKey::named::<English>("second"));
        assert_eq!(subscribers[1].key(), &ServiceKey::of::<English>());
        assert!(mappings.subscribers_of(TypeId::of::<u64>()).is_empty());
    }

    #[test]
    fn test_capability_for_unregistered_key_fails() {
        let result = ServiceMappings::builder()
            .subscribe::<English, String>()
            .build();

        assert!(matches!(result, Err(ContainerError::UnknownService(_))));
    }

    #[test]
    fn test_describe_serializes_mapping_table() {
        let mappings = ServiceMappings::builder()
            .register::<dyn Greeter, _>(Lifetime::Singleton, |_| {
                Ok(Arc::new(English) as Arc<dyn Greeter>)
            })
            .register_named::<English, _>("audit", Lifetime::Scoped, |_| Ok(Arc::new(English)))
            .disposable_named::<English>("audit")
            .subscribe_named::<English, String>("audit")
            .build()
            .unwrap();

        let json = serde_json::to_value(mappings.describe()).unwrap();
        assert_eq!(json[0]["service"], "dyn Greeter");
        assert_eq!(json[0]["lifetime"], "singleton");
        assert_eq!(json[0]["disposable"], false);
        assert_eq!(json[1]["service"], "English");
        assert_eq!(json[1]["name"], "audit");
        assert_eq!(json[1]["disposable"], true);
        assert_eq!(json[1]["subscribes_to"][0], "alloc::string::String");
    }

    #[test]
    fn test_delivery_reports_handler_failure() {
        struct Failing;

        impl SubscriberOf<String> for Failing {
            fn handle(&self, _event: &String) -> Result<(), BoxError> {
                Err("rejected".into())
            }
        }

        let mappings = ServiceMappings::builder()
            .register::<Failing, _>(Lifetime::Transient, |_| Ok(Arc::new(Failing)))
            .subscribe::<Failing, String>()
            .build()
            .unwrap();

        let subscription = &mappings.subscribers_of(TypeId::of::<String>())[0];
        let instance: Instance = Arc::new(Arc::new(Failing));
        let result = subscription.deliver(&instance, &"event".to_string());

        match result {
            Err(ContainerError::Subscriber { service, source, .. }) => {
                assert_eq!(service, "Failing");
                assert_eq!(source.to_string(), "rejected");
            }
            other => panic!("Expected Subscriber error, got {:?}", other),
        }
    }
}
