//! # Resolver - 공통 해석 알고리즘
//!
//! 루트 컨테이너와 자식 스코프가 공유하는 해석 계약입니다. 구현체는 두 개의
//! 저장소 슬롯만 연결하고, 해석 순서는 이 모듈의 기본 구현이 담당합니다.
//!
//! ## 해석 순서
//!
//! ```text
//! resolve(key)
//!    ├─ 1. child_storage 에 있으면 반환 (스코프 인스턴스가 루트를 가림)
//!    ├─ 2. root_storage 에 있으면 반환 (싱글톤은 모든 스코프에서 동일)
//!    ├─ 3. 빌드 플랜 조회 → 없으면 UnknownService
//!    ├─ 4. Scoped 인데 child_storage 가 없으면 InvalidOperation
//!    ├─ 5. 팩토리 실행 후 lifetime 에 따라 저장
//!    │     ├─ Singleton → root_storage (싱글톤 락 안에서 재확인 후 저장)
//!    │     ├─ Scoped    → child_storage
//!    │     └─ Transient → 저장하지 않음
//!    └─ 6. 반환
//! ```

use std::sync::Arc;

use log::trace;
use parking_lot::ReentrantMutex;

use crate::core::errors::{ContainerError, ContainerResult};
use crate::core::key::ServiceKey;
use crate::core::lifetime::Lifetime;
use crate::core::mappings::ServiceMappings;
use crate::core::storage::{Instance, InstanceStorage, StoredInstance};

/// 싱글톤 생성을 직렬화하는 락
///
/// 싱글톤 팩토리가 다른 싱글톤을 해석할 수 있도록 재진입 가능해야 합니다.
pub type SingletonLock = ReentrantMutex<()>;

/// 루트/자식 컨테이너 공통 계약
pub trait Resolver {
    /// 불변 서비스 매핑 테이블
    fn mappings(&self) -> &ServiceMappings;

    /// 스코프 저장소. 루트 컨테이너는 항상 `None` 입니다.
    fn child_storage(&self) -> Option<&dyn InstanceStorage>;

    /// 싱글톤 저장소
    fn root_storage(&self) -> &dyn InstanceStorage;

    fn singleton_lock(&self) -> &SingletonLock;

    /// 팩토리에 넘겨줄 `&dyn Resolver` 뷰
    fn as_resolver(&self) -> &dyn Resolver;

    /// 해석 전에 호출됩니다. 이미 해제된 컨테이너라면 에러를 반환해야 합니다.
    fn ensure_active(&self) -> ContainerResult<()> {
        Ok(())
    }

    /// 해석 과정을 `trace` 레벨로 기록할지 여부
    fn trace_resolutions(&self) -> bool {
        false
    }

    /// 서비스 키를 해석합니다.
    ///
    /// # Errors
    ///
    /// * `UnknownService` - 빌드 플랜이 없는 키
    /// * `InvalidOperation` - 스코프 없이 `Scoped` 서비스 해석, 또는 해제된 컨테이너
    /// * 팩토리가 반환한 에러
    fn resolve_key(&self, key: &ServiceKey) -> ContainerResult<Instance> {
        resolve_service(self.as_resolver(), key)
    }

    /// 서비스 키를 해석하되, 등록되지 않은 키는 `Ok(None)` 으로 돌려줍니다.
    ///
    /// 등록은 되어 있지만 생성에 실패한 경우 등 다른 에러는 그대로 전달됩니다.
    /// 팩토리 안에서 의존성을 찾지 못한 `UnknownService` 도 마찬가지입니다.
    fn try_resolve_key(&self, key: &ServiceKey) -> ContainerResult<Option<Instance>> {
        match self.resolve_key(key) {
            Ok(instance) => Ok(Some(instance)),
            // 요청한 키 자체가 매핑에 없을 때만 부재로 취급
            Err(ContainerError::UnknownService(_)) if !self.mappings().contains(key) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn resolve_service(resolver: &dyn Resolver, key: &ServiceKey) -> ContainerResult<Instance> {
    resolver.ensure_active()?;
    let trace_enabled = resolver.trace_resolutions();

    if let Some(child) = resolver.child_storage() {
        if let Some(instance) = child.get(key) {
            if trace_enabled {
                trace!("🔎 {} ← scoped storage", key);
            }
            return Ok(instance);
        }
    }

    if let Some(instance) = resolver.root_storage().get(key) {
        if trace_enabled {
            trace!("🔎 {} ← root storage", key);
        }
        return Ok(instance);
    }

    let plan = resolver
        .mappings()
        .plan(key)
        .ok_or_else(|| ContainerError::UnknownService(key.short_name()))?;

    match plan.lifetime() {
        Lifetime::Singleton => {
            let _guard = resolver.singleton_lock().lock();
            let root = resolver.root_storage();

            // 락을 기다리는 동안 다른 스레드가 만들었을 수 있음
            if let Some(instance) = root.get(key) {
                return Ok(instance);
            }

            let instance = plan.build(resolver)?;
            root.put(*key, StoredInstance::new(instance.clone(), plan.disposer()));
            if trace_enabled {
                trace!("🏗️ {} built as singleton", key);
            }
            Ok(instance)
        }
        Lifetime::Scoped => {
            let child = resolver.child_storage().ok_or_else(|| {
                ContainerError::InvalidOperation(format!(
                    "Scoped service {} cannot be resolved without a child scope; \
                     call create_child_container() first",
                    key
                ))
            })?;

            let instance = plan.build(resolver)?;
            child.put(*key, StoredInstance::new(instance.clone(), plan.disposer()));
            if trace_enabled {
                trace!("🏗️ {} built as scoped", key);
            }
            Ok(instance)
        }
        Lifetime::Transient => {
            if trace_enabled {
                trace!("🏗️ {} built as transient", key);
            }
            plan.build(resolver)
        }
    }
}

/// 타입 지정 해석 확장
///
/// `&dyn Resolver` 를 포함한 모든 `Resolver` 구현체에서 사용할 수 있습니다.
///
/// # Examples
///
/// ```rust,ignore
/// use scoped_container::core::ResolveExt;
///
/// let scope = container.create_child_container();
/// let audit = scope.resolve::<dyn AuditTrail>()?;
/// let maybe_cache = scope.try_resolve::<dyn Cache>()?;
/// ```
pub trait ResolveExt: Resolver {
    fn resolve<T>(&self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        downcast_instance::<T>(&key, self.resolve_key(&key)?)
    }

    fn resolve_named<T>(&self, name: &'static str) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::named::<T>(name);
        downcast_instance::<T>(&key, self.resolve_key(&key)?)
    }

    fn try_resolve<T>(&self) -> ContainerResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        self.try_resolve_key(&key)?
            .map(|instance| downcast_instance::<T>(&key, instance))
            .transpose()
    }

    fn try_resolve_named<T>(&self, name: &'static str) -> ContainerResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::named::<T>(name);
        self.try_resolve_key(&key)?
            .map(|instance| downcast_instance::<T>(&key, instance))
            .transpose()
    }
}

impl<R: Resolver + ?Sized> ResolveExt for R {}

/// 타입 소거된 인스턴스에서 `Arc<T>` 를 꺼냅니다.
pub fn downcast_instance<T>(key: &ServiceKey, instance: Instance) -> ContainerResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| ContainerError::TypeMismatch {
            key: key.short_name(),
            expected: std::any::type_name::<T>(),
        })
}
