//! Takes (short-video) feed client

pub mod client;
pub mod models;

pub use client::TakesApiClient;
pub use models::{CommentsPage, Take, TakeComment, TakesFeed};
