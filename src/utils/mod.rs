//! 공통 유틸리티 함수 모듈
//!
//! 컨테이너 초기화 리포트 포맷팅 등 여러 모듈에서 쓰는 보조 함수들을 제공합니다.
//!
//! # Modules
//!
//! - [`display_terminal`] - 초기화 단계/요약 리포트를 로그로 출력
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::utils::display_terminal::print_boxed_title;
//!
//! print_boxed_title("Container Initialized");
//! ```

pub mod display_terminal;
