pub mod chat;
pub mod controls;
pub mod debug;
pub mod history;
pub mod prompt_input;
pub mod scene_canvas;
