//! scenedit - a small interactive 3D scene editor
//!
//! - Places numbered meshes on a textured ground plane and edits them with
//!   mouse drags, one edit mode at a time
//! - Two movable lights, an orbit camera and scroll zoom
//! - Saves and restores whole scenes to numbered binary slot files
//!
//! Meshes and textures are read lazily from the models-textures directory,
//! given as the first argument or found in one of the default locations.

mod app;
mod assets;
mod config;
mod editor;
mod render;
mod scene;

fn main() {
    app::run();
}
