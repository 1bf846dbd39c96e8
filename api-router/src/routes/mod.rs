pub mod admin;
pub mod chat;
pub mod documents;
pub mod entity;
pub mod health;
pub mod upload;
