pub mod xh;
