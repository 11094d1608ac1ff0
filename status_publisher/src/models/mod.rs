//! Data models: the build server's view of builds and revisions, plus the
//! GitLab commit status payloads.

pub mod build;
pub mod commit_status;
pub mod repository;
pub mod revision;
