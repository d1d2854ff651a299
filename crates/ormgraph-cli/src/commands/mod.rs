pub mod check;
pub mod exec;
pub mod sdl;
