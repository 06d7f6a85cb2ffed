pub mod entity;

pub use entity::{Article, PlainNote};
