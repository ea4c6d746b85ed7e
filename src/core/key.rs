//! 서비스 식별자
//!
//! 매핑 테이블과 인스턴스 저장소가 공통으로 사용하는 조회 키입니다.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 등록된 서비스의 식별자 (타입 + 선택적 이름)
///
/// 보통 `dyn Trait` 형태의 인터페이스 타입으로 만들며, 같은 인터페이스에
/// 여러 구현을 등록할 때만 이름을 붙입니다.
///
/// # Examples
///
/// ```rust,ignore
/// let key = ServiceKey::of::<dyn Greeter>();
/// let english = ServiceKey::named::<dyn Greeter>("english");
/// assert_ne!(key, english);
/// ```
#[derive(Clone, Copy)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl ServiceKey {
    /// 이름 없는 키를 생성합니다.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// 이름 붙은 키를 생성합니다.
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..Self::of::<T>()
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 전체 모듈 경로를 포함한 타입 이름
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// 로그에 쓰기 좋은 짧은 이름을 반환합니다.
    ///
    /// `std::any::type_name` 은 모듈 경로를 모두 포함하므로 마지막 경로 요소만 남깁니다.
    /// (예: `dyn my_app::events::Audit` → `dyn Audit`)
    pub fn short_name(&self) -> String {
        let base = self.base_name();
        match self.name {
            Some(name) => format!("{}#{}", base, name),
            None => base,
        }
    }

    /// 이름을 제외한 짧은 타입 이름
    pub fn base_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

fn shorten_type_name(type_name: &str) -> String {
    let (prefix, path) = match type_name.strip_prefix("dyn ") {
        Some(rest) => ("dyn ", rest),
        None => ("", type_name),
    };
    // 제네릭 인자 안의 `::` 는 건드리지 않음
    let head_end = path.find('<').unwrap_or(path.len());
    let start = path[..head_end].rfind("::").map(|pos| pos + 2).unwrap_or(0);
    format!("{}{}", prefix, &path[start..])
}

// type_name 은 진단용이므로 동등성에서 제외
impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKey")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}

    mod nested {
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_named_keys_are_distinct() {
        assert_eq!(ServiceKey::of::<dyn Greeter>(), ServiceKey::of::<dyn Greeter>());
        assert_ne!(ServiceKey::of::<dyn Greeter>(), ServiceKey::named::<dyn Greeter>("en"));
        assert_ne!(ServiceKey::named::<dyn Greeter>("en"), ServiceKey::named::<dyn Greeter>("ko"));
        assert_ne!(ServiceKey::of::<dyn Greeter>(), ServiceKey::of::<String>());
    }

    #[test]
    fn test_short_name_strips_module_path() {
        assert_eq!(ServiceKey::of::<dyn Greeter>().short_name(), "dyn Greeter");
        assert_eq!(ServiceKey::of::<String>().short_name(), "String");
        assert_eq!(
            ServiceKey::named::<dyn Greeter>("en").to_string(),
            "dyn Greeter#en"
        );
    }

    #[test]
    fn test_short_name_keeps_generic_arguments() {
        let name = ServiceKey::of::<nested::Wrapper<String>>().short_name();
        assert!(name.starts_with("Wrapper<"));
        assert!(name.contains("String"));
    }
}
