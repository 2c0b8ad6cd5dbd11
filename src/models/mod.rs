pub mod attempt;
pub mod blog_post;
pub mod client;
pub mod mailing;
pub mod message;
pub mod user;
