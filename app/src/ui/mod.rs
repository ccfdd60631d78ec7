pub mod app;
pub mod appwindow;
pub mod canvas;
pub mod viewport;
