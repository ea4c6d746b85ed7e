//! # Root Container
//!
//! 싱글톤 저장소와 저장소 팩토리를 소유하고 자식 스코프를 생성하는 최상위 컨테이너입니다.
//!
//! ## 소유 관계
//!
//! ```text
//! Container (root)
//!   ├─ ServiceMappings        (Arc, 모든 스코프가 공유)
//!   ├─ root storage           (Arc, 싱글톤)
//!   ├─ storage factory
//!   └─ singleton lock         (Arc, 모든 스코프가 공유)
//!
//! ChildContainer ×N
//!   ├─ scoped storage         (스코프마다 독립, 단독 소유)
//!   └─ 루트의 mappings / root storage / lock 에 대한 공유 참조
//! ```
//!
//! 자식 스코프는 구조적으로 항상 루트 바로 아래에 있습니다. "중첩"은 같은 스레드에서
//! 연속으로 `create_child_container()` 를 호출했을 때의 앰비언트 활성화 순서일 뿐입니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoped_container::core::{Container, ResolveExt};
//!
//! let container = Container::new(Arc::new(mappings));
//! container.initialize_singletons()?;
//!
//! {
//!     let scope = container.create_child_container();
//!     let audit = scope.resolve::<dyn AuditTrail>()?;
//!     // ...
//! } // scope drop → scoped 인스턴스 해제, 앰비언트 스코프 복원
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info};
use parking_lot::ReentrantMutex;

use crate::config::ContainerConfig;
use crate::core::errors::{ContainerError, ContainerResult};
use crate::core::key::ServiceKey;
use crate::core::lifetime::Lifetime;
use crate::core::mappings::ServiceMappings;
use crate::core::resolver::{Resolver, SingletonLock};
use crate::core::scope::{self, ChildContainer, ScopeParts, ScopeRef};
use crate::core::storage::{
    DefaultInstanceStorageFactory, InstanceStorage, InstanceStorageFactory, StoredInstance,
};
use crate::utils::display_terminal::{
    print_boxed_title, print_final_summary, print_step_complete, print_step_start, print_sub_task,
};

/// 최상위(루트) 컨테이너
pub struct Container {
    mappings: Arc<ServiceMappings>,
    factory: Arc<dyn InstanceStorageFactory>,
    storage: Arc<dyn InstanceStorage>,
    singleton_lock: Arc<SingletonLock>,
    trace_resolutions: bool,
    disposed: Arc<AtomicBool>,
}

impl Container {
    /// 기본 저장소 팩토리로 루트 컨테이너를 생성합니다.
    pub fn new(mappings: Arc<ServiceMappings>) -> Self {
        Self::with_factory(mappings, Arc::new(DefaultInstanceStorageFactory))
    }

    /// 사용자 정의 저장소 팩토리로 루트 컨테이너를 생성합니다.
    ///
    /// 루트 저장소는 여기서 한 번 `create_parent()` 로 만들어집니다.
    pub fn with_factory(
        mappings: Arc<ServiceMappings>,
        factory: Arc<dyn InstanceStorageFactory>,
    ) -> Self {
        let storage = factory.create_parent();
        debug!("📦 Root container created with {} mapping(s)", mappings.len());

        Self {
            mappings,
            factory,
            storage,
            singleton_lock: Arc::new(ReentrantMutex::new(())),
            trace_resolutions: false,
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 설정값을 반영해 루트 컨테이너를 생성합니다.
    ///
    /// `eager_singletons` 가 켜져 있으면 모든 싱글톤을 즉시 생성합니다.
    ///
    /// # Errors
    ///
    /// 즉시 생성 중 실패한 싱글톤의 에러를 그대로 반환합니다.
    pub fn from_config(
        mappings: Arc<ServiceMappings>,
        config: &ContainerConfig,
    ) -> ContainerResult<Self> {
        let mut container = Self::new(mappings);
        container.trace_resolutions = config.trace_resolutions;

        if config.eager_singletons {
            container.initialize_singletons()?;
        }
        Ok(container)
    }

    /// 해석 과정의 `trace` 로그 여부를 설정합니다.
    pub fn with_trace_resolutions(mut self, enabled: bool) -> Self {
        self.trace_resolutions = enabled;
        self
    }

    /// 새 자식 스코프를 만들고 호출 스레드의 현재 스코프로 활성화합니다.
    ///
    /// 반환된 스코프가 해제되면 앰비언트 포인터는 이 호출 직전의 값으로 복원됩니다.
    pub fn create_child_container(&self) -> ChildContainer {
        ChildContainer::activate(ScopeParts {
            mappings: self.mappings.clone(),
            root_storage: self.storage.clone(),
            storage: self.factory.create_scoped(),
            singleton_lock: self.singleton_lock.clone(),
            root_disposed: self.disposed.clone(),
            trace_resolutions: self.trace_resolutions,
        })
    }

    /// 호출 스레드에서 현재 활성화된 자식 스코프 (가장 최근에 만들어지고 아직 해제되지 않은 것)
    pub fn current_child(&self) -> Option<ScopeRef> {
        scope::current_scope()
    }

    /// 외부에서 만든 인스턴스를 루트 저장소에 직접 넣습니다.
    ///
    /// 매핑이 없는 타입도 이후 모든 스코프에서 싱글톤처럼 해석됩니다.
    /// 매핑에 해제 능력이 선언되어 있다면 루트 해제 시 함께 해제됩니다.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let settings = Arc::new(Settings::load()?);
    /// container.set_instance(settings);
    /// ```
    pub fn set_instance<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        info!("📦 Registering: {}", key);

        let disposer = self.mappings.plan(&key).and_then(|plan| plan.disposer());
        self.storage
            .put(key, StoredInstance::new(Arc::new(instance), disposer));
    }

    /// 모든 싱글톤을 등록 순서대로 미리 생성합니다.
    ///
    /// 루트에서 해석하므로 scoped 서비스에 의존하는 싱글톤은 `InvalidOperation` 으로 실패합니다.
    ///
    /// # Returns
    ///
    /// 생성(또는 이미 존재 확인)된 싱글톤 수
    pub fn initialize_singletons(&self) -> ContainerResult<usize> {
        print_boxed_title("🔄 INITIALIZING SINGLETONS");

        let singletons: Vec<ServiceKey> = self
            .mappings
            .plans()
            .filter(|plan| plan.lifetime() == Lifetime::Singleton)
            .map(|plan| *plan.key())
            .collect();

        if !singletons.is_empty() {
            print_step_start(1, "Creating singleton instances");
            for key in &singletons {
                let name = key.short_name();
                print_sub_task(&name, "Creating...");
                self.resolve_key(key)?;
                print_sub_task(&name, "✓ Created");
            }
            print_step_complete(1, "Singleton instances created", singletons.len());
        }

        let count_of = |lifetime: Lifetime| {
            self.mappings
                .plans()
                .filter(|plan| plan.lifetime() == lifetime)
                .count()
        };
        print_final_summary(
            singletons.len(),
            count_of(Lifetime::Scoped),
            count_of(Lifetime::Transient),
        );

        Ok(singletons.len())
    }

    /// 공유 매핑 테이블 핸들
    pub fn service_mappings(&self) -> Arc<ServiceMappings> {
        self.mappings.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// 루트 저장소의 싱글톤을 모두 해제합니다. 두 번째 호출은 아무 일도 하지 않습니다.
    ///
    /// # Errors
    ///
    /// 일부 싱글톤의 `dispose` 실패를 모아 `ContainerError::Disposal` 로 반환합니다.
    pub fn dispose(&self) -> ContainerResult<()> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("🧹 Root container disposed");
        self.storage.release_all()
    }
}

impl Resolver for Container {
    fn mappings(&self) -> &ServiceMappings {
        &self.mappings
    }

    fn child_storage(&self) -> Option<&dyn InstanceStorage> {
        None
    }

    fn root_storage(&self) -> &dyn InstanceStorage {
        self.storage.as_ref()
    }

    fn singleton_lock(&self) -> &SingletonLock {
        &self.singleton_lock
    }

    fn as_resolver(&self) -> &dyn Resolver {
        self
    }

    fn ensure_active(&self) -> ContainerResult<()> {
        if self.is_disposed() {
            return Err(ContainerError::InvalidOperation(
                "Root container has already been disposed".to_string(),
            ));
        }
        Ok(())
    }

    fn trace_resolutions(&self) -> bool {
        self.trace_resolutions
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            error!("❌ Root container released with errors: {}", e);
        }
    }
}
