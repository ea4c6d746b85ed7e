//! # Instance Storage
//!
//! 해석된 인스턴스를 보관하는 키 → 인스턴스 저장소와, 이를 생성하는 팩토리입니다.
//!
//! 저장소는 두 가지 용도로 생성됩니다.
//!
//! - **루트 저장소** (`create_parent`): 싱글톤 보관. 루트 컨테이너와 수명을 같이 합니다.
//! - **스코프 저장소** (`create_scoped`): 자식 스코프마다 새로 생성되며 서로 상태를 공유하지 않습니다.
//!
//! 저장소 해제(`release_all`)는 best-effort 입니다. 한 인스턴스의 `dispose` 실패가
//! 다른 인스턴스의 해제를 막지 않으며, 실패 목록은 모두 끝난 뒤 한 번에 보고됩니다.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;

use crate::core::errors::{BoxError, ContainerError, ContainerResult, DisposalFailure};
use crate::core::key::ServiceKey;

/// 저장소에 보관되는 타입 소거된 인스턴스
///
/// 실제로는 서비스 타입 `T` 에 대한 `Arc<T>` 를 한 번 더 감싼 값입니다.
/// `T` 가 `dyn Trait` 이어도 다운캐스트할 수 있도록 이 형태를 사용합니다.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 저장된 인스턴스를 해제하는 어댑터
pub type Disposer = Arc<dyn Fn(&Instance) -> Result<(), BoxError> + Send + Sync>;

/// 명시적인 해제 작업이 필요한 서비스
///
/// 스코프가 해제될 때 그 스코프가 보관하던 인스턴스마다 정확히 한 번 호출됩니다.
/// 싱글톤은 루트 컨테이너가 해제될 때 호출됩니다. Transient 인스턴스는 어디에도
/// 보관되지 않으므로 컨테이너가 해제하지 않습니다.
pub trait Disposable: Send + Sync {
    fn dispose(&self) -> Result<(), BoxError>;
}

/// 인스턴스와 (있다면) 해제 어댑터
#[derive(Clone)]
pub struct StoredInstance {
    pub instance: Instance,
    pub disposer: Option<Disposer>,
}

impl StoredInstance {
    pub fn new(instance: Instance, disposer: Option<Disposer>) -> Self {
        Self { instance, disposer }
    }
}

/// 키 → 인스턴스 저장소 계약
pub trait InstanceStorage: Send + Sync {
    /// 저장된 인스턴스를 조회합니다.
    fn get(&self, key: &ServiceKey) -> Option<Instance>;

    /// 인스턴스를 저장합니다. 같은 키가 이미 있으면 마지막 값이 남습니다.
    ///
    /// 싱글톤/스코프 의미를 지키려면 호출자가 먼저 `get` 으로 확인해야 합니다.
    fn put(&self, key: ServiceKey, stored: StoredInstance);

    /// 해제 가능한 인스턴스를 모두 해제하고 저장소를 비웁니다.
    ///
    /// # Errors
    ///
    /// 하나 이상의 `dispose` 가 실패하면 모든 인스턴스를 처리한 뒤
    /// `ContainerError::Disposal` 로 실패 목록을 반환합니다.
    fn release_all(&self) -> ContainerResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 저장소 생성 계약
pub trait InstanceStorageFactory: Send + Sync {
    /// 루트(싱글톤) 저장소를 생성합니다. 루트 컨테이너당 한 번 호출됩니다.
    fn create_parent(&self) -> Arc<dyn InstanceStorage>;

    /// 자식 스코프 하나를 위한 독립 저장소를 생성합니다.
    fn create_scoped(&self) -> Arc<dyn InstanceStorage>;
}

/// `RwLock<HashMap>` 기반 기본 저장소
pub struct DefaultInstanceStorage {
    label: &'static str,
    instances: RwLock<HashMap<ServiceKey, StoredInstance>>,
}

impl DefaultInstanceStorage {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// 로그에 표시되는 저장소 종류 ("root" 또는 "scoped")
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl InstanceStorage for DefaultInstanceStorage {
    fn get(&self, key: &ServiceKey) -> Option<Instance> {
        self.instances
            .read()
            .get(key)
            .map(|stored| stored.instance.clone())
    }

    fn put(&self, key: ServiceKey, stored: StoredInstance) {
        self.instances.write().insert(key, stored);
    }

    fn release_all(&self) -> ContainerResult<()> {
        // 락을 잡은 채로 dispose 를 호출하지 않도록 먼저 비워둠
        let drained: Vec<(ServiceKey, StoredInstance)> =
            self.instances.write().drain().collect();

        let mut failures = Vec::new();
        for (key, stored) in drained {
            let Some(disposer) = stored.disposer else {
                continue;
            };
            if let Err(source) = disposer(&stored.instance) {
                warn!("⚠️ [{}] dispose failed for {}: {}", self.label, key, source);
                failures.push(DisposalFailure {
                    service: key.short_name(),
                    source,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::Disposal(failures))
        }
    }

    fn len(&self) -> usize {
        self.instances.read().len()
    }
}

/// 기본 저장소 팩토리
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInstanceStorageFactory;

impl InstanceStorageFactory for DefaultInstanceStorageFactory {
    fn create_parent(&self) -> Arc<dyn InstanceStorage> {
        Arc::new(DefaultInstanceStorage::new("root"))
    }

    fn create_scoped(&self) -> Arc<dyn InstanceStorage> {
        Arc::new(DefaultInstanceStorage::new("scoped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    fn counting_disposer(counter: Arc<Counter>) -> Disposer {
        Arc::new(move |_instance: &Instance| -> Result<(), BoxError> {
            counter.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn failing_disposer(message: &'static str) -> Disposer {
        Arc::new(move |_instance: &Instance| -> Result<(), BoxError> { Err(message.into()) })
    }

    fn instance_of(value: &str) -> Instance {
        Arc::new(Arc::new(value.to_string()))
    }

    #[test]
    fn test_get_returns_same_instance() {
        let storage = DefaultInstanceStorage::new("scoped");
        let key = ServiceKey::of::<String>();
        storage.put(key, StoredInstance::new(instance_of("a"), None));

        let first = storage.get(&key).unwrap();
        let second = storage.get(&key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(storage.get(&ServiceKey::of::<u32>()).is_none());
    }

    #[test]
    fn test_put_last_write_wins() {
        let storage = DefaultInstanceStorage::new("root");
        let key = ServiceKey::of::<String>();
        storage.put(key, StoredInstance::new(instance_of("first"), None));
        storage.put(key, StoredInstance::new(instance_of("second"), None));

        let stored = storage.get(&key).unwrap();
        let value = stored.downcast_ref::<Arc<String>>().unwrap();
        assert_eq!(value.as_str(), "second");
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_release_all_disposes_once_and_clears() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let storage = DefaultInstanceStorage::new("scoped");
        storage.put(
            ServiceKey::named::<String>("a"),
            StoredInstance::new(instance_of("a"), Some(counting_disposer(counter.clone()))),
        );
        storage.put(
            ServiceKey::named::<String>("b"),
            StoredInstance::new(instance_of("b"), Some(counting_disposer(counter.clone()))),
        );
        storage.put(
            ServiceKey::named::<String>("plain"),
            StoredInstance::new(instance_of("plain"), None),
        );

        storage.release_all().unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert!(storage.is_empty());

        storage.release_all().unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_release_all_continues_after_failure() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let storage = DefaultInstanceStorage::new("scoped");
        storage.put(
            ServiceKey::named::<String>("broken"),
            StoredInstance::new(instance_of("broken"), Some(failing_disposer("boom"))),
        );
        storage.put(
            ServiceKey::named::<String>("ok-1"),
            StoredInstance::new(instance_of("ok-1"), Some(counting_disposer(counter.clone()))),
        );
        storage.put(
            ServiceKey::named::<String>("ok-2"),
            StoredInstance::new(instance_of("ok-2"), Some(counting_disposer(counter.clone()))),
        );

        let result = storage.release_all();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert!(storage.is_empty());
        match result {
            Err(ContainerError::Disposal(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].service, "String#broken");
            }
            other => panic!("Expected Disposal error, got {:?}", other),
        }
    }

    #[test]
    fn test_factory_creates_independent_scoped_storages() {
        let factory = DefaultInstanceStorageFactory;
        let first = factory.create_scoped();
        let second = factory.create_scoped();
        let key = ServiceKey::of::<String>();

        first.put(key, StoredInstance::new(instance_of("a"), None));
        assert!(first.get(&key).is_some());
        assert!(second.get(&key).is_none());
    }
}
