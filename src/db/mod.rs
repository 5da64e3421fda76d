pub mod conversation_repository;
pub mod event_repository;
pub mod message_repository;
pub mod profile_repository;
