pub mod app;
pub mod config;
pub mod middleware;
pub mod repository;
pub mod service;

pub use app::build_app;

// Re-export commonly used types for tests
pub use service::{
    CurveSwapService, GetPriceRequest, GetPriceResponse, GetTokensIndexRequest,
    GetTokensIndexResponse, SwapRequest, SwapResponse,
};
