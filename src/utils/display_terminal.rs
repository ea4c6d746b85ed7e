//! 초기화 리포트 포맷팅 유틸리티
//!
//! 컨테이너 초기화(싱글톤 사전 생성) 과정을 박스 제목, 진행 단계, 요약 형태로 기록합니다.
//! 라이브러리 코드이므로 표준 출력 대신 `log::info!` 로 내보냅니다.
//! 실제 표시 여부는 바이너리에서 초기화한 로거(`env_logger`)가 결정합니다.

use log::info;

// 박스 내부 콘텐츠 너비
const CONTENT_WIDTH: usize = 50;

/// 박스 형태 제목의 세 줄을 만듭니다.
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║            🔄 INITIALIZING SINGLETONS            ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn boxed_title_lines(title: &str) -> [String; 3] {
    let border = "═".repeat(CONTENT_WIDTH);
    [
        format!("╔{}╗", border),
        format!("║{:^width$}║", title, width = CONTENT_WIDTH),
        format!("╚{}╝", border),
    ]
}

/// 박스 형태로 둘러싸인 제목을 기록합니다.
pub fn print_boxed_title(title: &str) {
    for line in boxed_title_lines(title) {
        info!("{}", line);
    }
}

/// 진행 단계 시작을 표시합니다.
///
/// ```text
/// → Step 1: Creating singleton instances
/// ```
pub fn print_step_start(step: u8, description: &str) {
    info!("→ Step {}: {}", step, description);
}

/// 진행 단계 완료와 처리된 항목 수를 표시합니다.
pub fn print_step_complete(step: u8, description: &str, count: usize) {
    info!("✓ Step {}: {} ({} items)", step, description, count);
}

/// 서브 작업의 상태를 트리 형태로 표시합니다.
///
/// ```text
///    ├─ dyn Clock: Creating...
///    ├─ dyn Clock: ✓ Created
/// ```
pub fn print_sub_task(name: &str, status: &str) {
    info!("   ├─ {}: {}", name, status);
}

/// 최종 요약 문자열을 만듭니다.
pub fn summary_lines(singletons: usize, scoped: usize, transient: usize) -> Vec<String> {
    vec![
        format!("   🏛️ Singletons: {}", singletons),
        format!("   🌱 Scoped: {}", scoped),
        format!("   ♻️ Transient: {}", transient),
        format!("   🚀 Total Mappings: {}", singletons + scoped + transient),
    ]
}

/// 초기화 완료 요약을 기록합니다.
pub fn print_final_summary(singletons: usize, scoped: usize, transient: usize) {
    print_boxed_title("🎉 CONTAINER INITIALIZED");
    for line in summary_lines(singletons, scoped, transient) {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_title_lines_have_equal_width() {
        let [top, middle, bottom] = boxed_title_lines("READY");

        assert_eq!(top.chars().count(), CONTENT_WIDTH + 2);
        assert_eq!(bottom.chars().count(), CONTENT_WIDTH + 2);
        assert_eq!(middle.chars().count(), CONTENT_WIDTH + 2);
        assert!(middle.starts_with('║') && middle.ends_with('║'));
        assert!(middle.contains("READY"));
    }

    #[test]
    fn test_summary_lines_total() {
        let lines = summary_lines(2, 3, 1);

        assert_eq!(lines.len(), 4);
        assert!(lines[3].ends_with("Total Mappings: 6"));
    }
}
