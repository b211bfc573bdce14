pub mod config;
pub mod consts;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod resize;
pub mod schedule;
pub mod selection;
pub mod viewport;
