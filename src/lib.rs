pub mod advisor;
pub mod app;
pub mod cli;
pub mod io;
pub mod media;
pub mod model;
pub mod ops;
