//! 인터페이스 계층.
//! 외부에 노출되는 CLI 빌더와 기본 어댑터 조립을 담는다.

pub mod cli;
pub mod composition;
