pub mod category;
pub mod comment;
pub mod friends_link;
pub mod post;
pub mod post_category;
pub mod post_tag;
pub mod site_config;
pub mod tag;
pub mod user;
