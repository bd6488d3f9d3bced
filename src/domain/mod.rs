//! Domain layer
//! 스키마/값/작업 기록 같은 순수 데이터를 외부 I/O 없이 표현한다.

pub mod level;
pub mod naming;
pub mod schema;
pub mod task;
pub mod value;
