pub mod user_meta;
