//! 설정 파일 로딩/병합 모듈.
//! 사용자 설정 디렉터리와 작업 디렉터리 상위의 rc 파일을 우선순위대로 병합한다.

mod loader;
mod source;

pub use loader::{Loader, LoaderTable, NO_EXT};
pub use source::{JsonConfigSource, StaticConfigSource};
