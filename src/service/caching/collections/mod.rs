pub mod nutrients;
