//! Client library for the Meshy text-to-3D service.
//!
//! Provides typed wire messages, the [`gateway::GenerationGateway`] seam the
//! job workflow drives, and the HTTP implementation in [`api::MeshyApi`].

pub mod api;
pub mod config;
pub mod gateway;
pub mod messages;

pub use api::{MeshyApi, MeshyApiError};
pub use config::MeshyConfig;
pub use gateway::{GenerationGateway, TaskSnapshot};
pub use messages::TaskStatus;
