//! Cascade - run a scene definition to a settled variable state.
//!
//! Loads a scene file, registers its static options sources, activates the
//! tree and drives revalidation until nothing is in flight.

pub mod config;
pub mod error;
pub mod report;

use std::path::Path;

use cascade_application::{BuildScene, LoadScene};
use cascade_infrastructure::{FileSceneRepository, TokioFileSystem, static_sources};
use tracing::info;

pub use config::Config;
pub use error::AppError;
pub use report::{NodeReport, SceneReport, VariableReport};

/// Loads, activates and settles a scene file.
///
/// # Errors
/// Returns an error if the file cannot be loaded or the scene cannot be
/// assembled. Per-variable failures end up in the report instead.
pub async fn run(path: &Path) -> Result<SceneReport, AppError> {
    let repository = FileSceneRepository::new(TokioFileSystem::new());
    let definition = LoadScene::new(repository).execute(path).await?;

    let builder = static_sources(&definition)
        .into_iter()
        .fold(BuildScene::new(), |builder, (name, source)| {
            builder.with_source(name, source)
        });
    let mut scene = builder.execute(definition)?;
    info!(title = %scene.title(), nodes = scene.node_count(), "scene loaded");

    let root = scene.root();
    scene.activate_subtree(root)?;
    scene.run_until_idle().await;
    info!("revalidation idle");

    Ok(SceneReport::capture(&scene)?)
}
