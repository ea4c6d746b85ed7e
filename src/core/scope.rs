//! # Child Container (Scope)
//!
//! 자식 스코프와 스레드별 "현재 스코프" 포인터를 관리합니다.
//!
//! ## 앰비언트 스코프
//!
//! 스코프 핸들을 모든 호출 경로에 넘기지 않아도 이벤트 발행이 현재 스코프를
//! 찾을 수 있도록, 각 스레드는 가장 최근에 생성되고 아직 해제되지 않은 스코프를
//! thread-local 슬롯에 기록합니다.
//!
//! ```text
//! thread T1                          CURRENT_SCOPE (T1)
//! ─────────────────────────────────  ──────────────────
//! let a = root.create_child_container();   Some(a)
//! let b = root.create_child_container();   Some(b)   (이전 값 a 를 기억)
//! drop(b);                                 Some(a)   (복원)
//! drop(a);                                 None
//! ```
//!
//! 중첩은 반드시 스레드별 LIFO 순서로 해제되어야 합니다. 바깥 스코프를 먼저 해제하는
//! 것은 호출자 오류이며, 이 경우 앰비언트 포인터는 일관성을 잃습니다.
//!
//! 다른 스레드의 슬롯은 서로 보이지 않습니다. T1 에서 만든 스코프는 T2 의
//! `publish` 에서 찾을 수 없습니다.

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use log::{debug, error, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::errors::{ContainerError, ContainerResult};
use crate::core::mappings::ServiceMappings;
use crate::core::resolver::{Resolver, SingletonLock};
use crate::core::storage::InstanceStorage;

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<ScopeRef>> = const { RefCell::new(None) };
}

/// 스코프 해제 시 앰비언트 포인터를 되돌리는 콜백
pub(crate) type RestoreFn = Box<dyn FnOnce() + Send>;

/// 호출 스레드의 현재 스코프를 반환합니다.
pub fn current_scope() -> Option<ScopeRef> {
    CURRENT_SCOPE
        .try_with(|slot| slot.borrow().clone())
        .ok()
        .flatten()
}

/// 호출 스레드의 슬롯을 교체합니다. 이전 값은 슬롯 borrow 가 끝난 뒤에 drop 됩니다.
pub(crate) fn replace_current_scope(scope: Option<ScopeRef>) -> Option<ScopeRef> {
    CURRENT_SCOPE
        .try_with(|slot| slot.replace(scope))
        .ok()
        .flatten()
}

/// 자식 컨테이너를 만들 때 루트가 넘겨주는 공유 자원
pub(crate) struct ScopeParts {
    pub mappings: Arc<ServiceMappings>,
    pub root_storage: Arc<dyn InstanceStorage>,
    pub storage: Arc<dyn InstanceStorage>,
    pub singleton_lock: Arc<SingletonLock>,
    pub root_disposed: Arc<AtomicBool>,
    pub trace_resolutions: bool,
}

struct ScopeInner {
    id: Uuid,
    owner: ThreadId,
    mappings: Arc<ServiceMappings>,
    root_storage: Arc<dyn InstanceStorage>,
    storage: Arc<dyn InstanceStorage>,
    singleton_lock: Arc<SingletonLock>,
    root_disposed: Arc<AtomicBool>,
    trace_resolutions: bool,
    disposed: AtomicBool,
    restore: Mutex<Option<RestoreFn>>,
}

impl ScopeInner {
    fn dispose(&self) -> ContainerResult<()> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let released = self.storage.release_all();

        let restore = self.restore.lock().take();
        if let Some(restore) = restore {
            if thread::current().id() == self.owner {
                restore();
            } else {
                warn!(
                    "⚠️ Scope {} disposed on a different thread; ambient scope of the creating thread left untouched",
                    self.id
                );
            }
        }

        debug!("🧹 Scope {} disposed", self.id);
        released
    }
}

/// 스코프에 대한 공유 뷰 (해제 권한 없음)
///
/// 앰비언트 슬롯과 `Container::current_child()` 가 돌려주는 값입니다.
/// 같은 스코프의 `ChildContainer` 와 동일한 저장소를 통해 해석합니다.
#[derive(Clone)]
pub struct ScopeRef {
    inner: Arc<ScopeInner>,
}

impl ScopeRef {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// 두 핸들이 같은 스코프를 가리키는지 확인합니다.
    pub fn same_scope(&self, other: &ScopeRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ScopeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRef")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Resolver for ScopeRef {
    fn mappings(&self) -> &ServiceMappings {
        &self.inner.mappings
    }

    fn child_storage(&self) -> Option<&dyn InstanceStorage> {
        Some(self.inner.storage.as_ref())
    }

    fn root_storage(&self) -> &dyn InstanceStorage {
        self.inner.root_storage.as_ref()
    }

    fn singleton_lock(&self) -> &SingletonLock {
        &self.inner.singleton_lock
    }

    fn as_resolver(&self) -> &dyn Resolver {
        self
    }

    fn ensure_active(&self) -> ContainerResult<()> {
        if self.is_disposed() {
            return Err(ContainerError::InvalidOperation(format!(
                "Scope {} has already been disposed",
                self.inner.id
            )));
        }
        // 루트가 해제된 뒤에는 싱글톤을 다시 만들지 않음
        if self.inner.root_disposed.load(Ordering::Acquire) {
            return Err(ContainerError::InvalidOperation(format!(
                "Root container of scope {} has already been disposed",
                self.inner.id
            )));
        }
        Ok(())
    }

    fn trace_resolutions(&self) -> bool {
        self.inner.trace_resolutions
    }
}

/// 자식 컨테이너 (스코프)
///
/// `Container::create_child_container()` 로 얻고, `dispose()` 를 직접 호출하거나
/// drop 될 때 해제됩니다. 정상 반환, `?` 조기 반환, panic 등 모든 경로에서
/// drop 이 해제를 보장합니다. 해제는 한 번만 수행되며 두 번째 호출은 아무 일도 하지 않습니다.
///
/// # Examples
///
/// ```rust,ignore
/// let scope = container.create_child_container();
/// publish(UserCreated { id: 7 })?;
/// let audit = scope.resolve::<dyn AuditTrail>()?;
/// scope.dispose()?;
/// ```
pub struct ChildContainer {
    scope: ScopeRef,
}

impl ChildContainer {
    /// 새 스코프를 만들고 호출 스레드의 현재 스코프로 설정합니다.
    pub(crate) fn activate(parts: ScopeParts) -> Self {
        let previous = current_scope();
        let restore: RestoreFn = Box::new(move || {
            drop(replace_current_scope(previous));
        });

        let scope = ScopeRef {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                owner: thread::current().id(),
                mappings: parts.mappings,
                root_storage: parts.root_storage,
                storage: parts.storage,
                singleton_lock: parts.singleton_lock,
                root_disposed: parts.root_disposed,
                trace_resolutions: parts.trace_resolutions,
                disposed: AtomicBool::new(false),
                restore: Mutex::new(Some(restore)),
            }),
        };

        drop(replace_current_scope(Some(scope.clone())));
        debug!("🌱 Scope {} created", scope.id());

        Self { scope }
    }

    pub fn id(&self) -> Uuid {
        self.scope.id()
    }

    /// 해제 권한이 없는 공유 뷰를 반환합니다.
    pub fn as_scope(&self) -> ScopeRef {
        self.scope.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }

    /// 스코프 인스턴스를 해제하고 이전 앰비언트 스코프를 복원합니다.
    ///
    /// # Errors
    ///
    /// 일부 인스턴스의 `dispose` 가 실패하면 `ContainerError::Disposal` 을 반환합니다.
    /// 이 경우에도 나머지 인스턴스는 모두 해제되고 앰비언트 스코프는 복원됩니다.
    pub fn dispose(&self) -> ContainerResult<()> {
        self.scope.inner.dispose()
    }
}

impl Resolver for ChildContainer {
    fn mappings(&self) -> &ServiceMappings {
        self.scope.mappings()
    }

    fn child_storage(&self) -> Option<&dyn InstanceStorage> {
        self.scope.child_storage()
    }

    fn root_storage(&self) -> &dyn InstanceStorage {
        self.scope.root_storage()
    }

    fn singleton_lock(&self) -> &SingletonLock {
        self.scope.singleton_lock()
    }

    fn as_resolver(&self) -> &dyn Resolver {
        &self.scope
    }

    fn ensure_active(&self) -> ContainerResult<()> {
        self.scope.ensure_active()
    }

    fn trace_resolutions(&self) -> bool {
        self.scope.trace_resolutions()
    }
}

impl Drop for ChildContainer {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            error!("❌ Scope {} released with errors: {}", self.scope.id(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::DefaultInstanceStorage;
    use parking_lot::ReentrantMutex;

    fn parts() -> ScopeParts {
        ScopeParts {
            mappings: Arc::new(ServiceMappings::empty()),
            root_storage: Arc::new(DefaultInstanceStorage::new("root")),
            storage: Arc::new(DefaultInstanceStorage::new("scope")),
            singleton_lock: Arc::new(ReentrantMutex::new(())),
            root_disposed: Arc::new(AtomicBool::new(false)),
            trace_resolutions: false,
        }
    }

    #[test]
    fn test_activate_sets_and_dispose_restores() {
        assert!(current_scope().is_none());

        let scope = ChildContainer::activate(parts());
        assert_eq!(current_scope().map(|s| s.id()), Some(scope.id()));

        scope.dispose().unwrap();
        assert!(current_scope().is_none());
        assert!(scope.is_disposed());
    }

    #[test]
    fn test_drop_disposes() {
        let view = {
            let scope = ChildContainer::activate(parts());
            scope.as_scope()
        };

        assert!(view.is_disposed());
        assert!(current_scope().is_none());
    }

    #[test]
    fn test_root_disposal_blocks_live_scope() {
        let parts = parts();
        let root_disposed = parts.root_disposed.clone();
        let scope = ChildContainer::activate(parts);
        assert!(scope.ensure_active().is_ok());

        root_disposed.store(true, Ordering::Release);

        assert!(!scope.is_disposed());
        assert!(matches!(
            scope.ensure_active(),
            Err(ContainerError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_dispose_on_other_thread_leaves_owner_slot() {
        let scope = ChildContainer::activate(parts());
        let id = scope.id();

        std::thread::spawn(move || {
            scope.dispose().unwrap();
            assert!(current_scope().is_none());
        })
        .join()
        .unwrap();

        // 생성 스레드의 슬롯은 그대로 남고, 해제된 스코프로는 해석할 수 없음
        let stale = current_scope().unwrap();
        assert_eq!(stale.id(), id);
        assert!(stale.is_disposed());
        assert!(stale.ensure_active().is_err());

        drop(replace_current_scope(None));
    }
}
