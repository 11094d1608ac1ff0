//! Publisher services: URL parsing, status mapping, payloads and the
//! GitLab HTTP protocol.

pub mod gitlab_service;
pub mod http_client;
pub mod message;
pub mod reconciler;
pub mod repository;
pub mod status_mapper;
