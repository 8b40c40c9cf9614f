use std::path::PathBuf;

use clap::Subcommand;
use nightwatch_core::SceneLayout;

#[derive(Subcommand)]
pub enum SceneAction {
    /// Print the built-in scene as TOML
    Dump,
    /// Validate a scene file
    Check {
        /// Path to a scene TOML file
        path: PathBuf,
    },
}

pub fn run(action: SceneAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SceneAction::Dump => {
            print!("{}", SceneLayout::haunted_house().to_toml()?);
        }
        SceneAction::Check { path } => {
            let layout = SceneLayout::load(&path)?;
            println!(
                "ok: {} entities, {} knock doors, {} objective items",
                layout.entities.len(),
                layout.knock_doors.len(),
                layout.objective_items.len()
            );
        }
    }
    Ok(())
}
