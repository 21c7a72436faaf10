// Root module for API clients
pub mod client_factory;
pub mod client_trait;
pub mod error_handling;
pub mod portal_client;

// Re-export API client components
pub use client_factory::*;
pub use client_trait::*;
pub use error_handling::*;
pub use portal_client::*;
