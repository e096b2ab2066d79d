//! Application use cases (business logic orchestration).

mod build_scene;
mod load_scene;

pub use build_scene::{BuildScene, BuildSceneError};
pub use load_scene::{LoadScene, LoadSceneError};
