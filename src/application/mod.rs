//! Application layer
//! 파서/런타임 같은 코어 규칙을 정의하고 포트(추상 인터페이스)를 통해 인프라를 사용한다.

pub mod coercion;
pub mod parser;
pub mod ports;
pub mod runtime;
pub mod usecases;
