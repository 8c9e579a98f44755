mod common;

mod post;
