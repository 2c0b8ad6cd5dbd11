pub mod attempt_service;
pub mod auth_service;
pub mod blog_cache;
pub mod blog_service;
pub mod client_service;
pub mod dispatch;
pub mod mailing_service;
pub mod message_service;
pub mod scheduler;
