pub mod posts;

pub use posts::{get_announcement_posts, get_label_posts, get_top_posts, get_trending_posts};
