pub mod error;
pub mod pool_registry;
pub mod resolver;
pub mod swap_service;
pub mod swapper;
pub mod types;
pub mod utils;


pub use error::ServiceError;
pub use pool_registry::PoolRegistry;
pub use resolver::{AuthoritySource, TokenIndexPair};
pub use swap_service::CurveSwapService;
pub use swapper::{CurveSwapper, IndexWidthPolicy, Route, SwapOutcome};
pub use types::*;

pub(crate) type ServiceResult<T> = std::result::Result<T, ServiceError>;
