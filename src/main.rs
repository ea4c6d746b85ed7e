//! 스코프 컨테이너 데모 애플리케이션
//!
//! 샘플 서비스를 등록하고 매핑 테이블을 JSON 으로 출력한 뒤,
//! 중첩 스코프를 열어 도메인 이벤트를 발행하는 전체 흐름을 보여줍니다.

use std::error::Error;
use std::sync::Arc;

use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};
use parking_lot::Mutex;
use scoped_container::{
    publish, Container, ContainerConfig, Disposable, Environment, HandlerResult, Lifetime,
    ResolveExt, ServiceMappings, SubscriberOf,
};
use scoped_container::core::errors::{BoxError, ErrorContext};

/// 사용자 생성 이벤트
#[derive(Debug, Clone)]
struct UserCreated {
    email: String,
}

/// 인사말 서비스 (싱글톤)
trait Greeter: Send + Sync {
    fn greet(&self, email: &str) -> String;
}

struct KoreanGreeter;

impl Greeter for KoreanGreeter {
    fn greet(&self, email: &str) -> String {
        format!("환영합니다, {}!", email)
    }
}

/// 스코프 단위 감사 로그 (scoped, 해제 가능)
trait AuditTrail: SubscriberOf<UserCreated> + SubscriberOf<String> + Disposable {
    fn entries(&self) -> Vec<String>;
}

struct MemoryAuditTrail {
    greeter: Arc<dyn Greeter>,
    entries: Mutex<Vec<String>>,
}

impl AuditTrail for MemoryAuditTrail {
    fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl SubscriberOf<UserCreated> for MemoryAuditTrail {
    fn handle(&self, event: &UserCreated) -> HandlerResult {
        let line = self.greeter.greet(&event.email);
        info!("📝 audit: {}", line);
        self.entries.lock().push(line);
        Ok(())
    }
}

impl SubscriberOf<String> for MemoryAuditTrail {
    fn handle(&self, event: &String) -> HandlerResult {
        if event.is_empty() {
            return Err("empty message".into());
        }
        self.entries.lock().push(event.clone());
        Ok(())
    }
}

impl Disposable for MemoryAuditTrail {
    fn dispose(&self) -> Result<(), BoxError> {
        info!("🧹 audit trail closed with {} entries", self.entries.lock().len());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // 환경 설정 및 로깅 초기화
    load_env_file();
    init_logging();

    info!("🚀 스코프 컨테이너 데모 시작중... ({:?})", Environment::current());

    let mappings = Arc::new(build_mappings()?);
    println!("{}", serde_json::to_string_pretty(&mappings.describe())?);

    let config = ContainerConfig::global();
    let container = Container::from_config(mappings, config)?;
    if !config.eager_singletons {
        container.initialize_singletons()?;
    }

    run_nested_scopes(&container)?;

    // 스코프 밖에서의 발행은 실패해야 함
    match publish("outside".to_string()) {
        Err(e) if e.is_no_active_scope() => warn!("⚠️ {}", e),
        Err(e) => return Err(e.into()),
        Ok(()) => error!("❌ publish succeeded without an active scope"),
    }

    container.dispose()?;
    info!("✅ 데모가 정상적으로 종료되었습니다");
    Ok(())
}

/// 샘플 서비스 매핑을 구성합니다
fn build_mappings() -> Result<ServiceMappings, Box<dyn Error>> {
    let mappings = ServiceMappings::builder()
        .register::<dyn Greeter, _>(Lifetime::Singleton, |_| {
            Ok(Arc::new(KoreanGreeter) as Arc<dyn Greeter>)
        })
        .register::<dyn AuditTrail, _>(Lifetime::Scoped, |resolver| {
            let greeter = resolver.resolve::<dyn Greeter>()?;
            let capacity = std::env::var("AUDIT_CAPACITY")
                .unwrap_or_else(|_| "16".to_string())
                .parse::<usize>()
                .context("AUDIT_CAPACITY")?;
            Ok(Arc::new(MemoryAuditTrail {
                greeter,
                entries: Mutex::new(Vec::with_capacity(capacity)),
            }) as Arc<dyn AuditTrail>)
        })
        .subscribe::<dyn AuditTrail, UserCreated>()
        .subscribe::<dyn AuditTrail, String>()
        .disposable::<dyn AuditTrail>()
        .build()?;

    Ok(mappings)
}

/// 같은 스레드에서 두 스코프를 중첩해 열고 각각 이벤트를 발행합니다
fn run_nested_scopes(container: &Container) -> Result<(), Box<dyn Error>> {
    let outer = container.create_child_container();
    publish(UserCreated {
        email: "outer@example.com".to_string(),
    })?;

    {
        let inner = container.create_child_container();
        publish(UserCreated {
            email: "inner@example.com".to_string(),
        })?;
        publish("Hello world".to_string())?;

        let audit = inner.resolve::<dyn AuditTrail>()?;
        info!("📋 inner scope {}: {:?}", inner.id(), audit.entries());
    }

    // inner 해제 후 현재 스코프는 outer 로 복원됨
    publish("back to outer".to_string())?;
    let audit = outer.resolve::<dyn AuditTrail>()?;
    info!("📋 outer scope {}: {:?}", outer.id(), audit.entries());

    outer.dispose()?;
    Ok(())
}

/// 프로필에 맞는 환경 변수 파일을 로드합니다
///
/// `PROFILE` 이 `prod` 면 `.env.prod`, `dev` (기본값) 면 `.env.dev`,
/// 그 외에는 기본 `.env` 파일을 사용합니다.
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    match profile.as_str() {
        "prod" => match dotenv::from_filename(".env.prod") {
            Ok(_) => info!(".env.prod 파일 로드 됨"),
            Err(e) => warn!(".env.prod 파일 로드 실패: {}", e),
        },
        "dev" => match dotenv::from_filename(".env.dev") {
            Ok(_) => info!(".env.dev 파일 로드 됨"),
            Err(e) => warn!(".env.dev 파일 로드 실패: {}", e),
        },
        _ => {
            dotenv().ok();
        }
    }
}

/// 로깅 시스템을 초기화합니다
///
/// `RUST_LOG` 가 없으면 info 레벨, 이 크레이트는 debug 레벨로 설정됩니다.
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,scoped_container=debug"));
}
