//! Travel costs: the matrix the optimizer reads and the providers that fill it.

mod cache;
mod matrix;
mod provider;

pub use cache::CachedProvider;
pub use matrix::{CostEntry, CostMatrix, CostMatrixBuilder, Endpoint, TravelCost};
pub use provider::{
    CostMatrixProvider, CostType, CrowFliesProvider, MatrixRequest, PrecomputedProvider,
    ProviderError, TravelMode,
};
