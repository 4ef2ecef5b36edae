//! Chain domain - handler registration, chains and interceptors

mod builder;
mod entity;
mod interceptor;

pub use builder::{chain, ChainBuilder};
pub use entity::{Chain, NamedHandler};
pub use interceptor::{Interceptor, InterceptorRegistry};
