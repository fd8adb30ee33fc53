pub mod compare;
pub mod pages;
pub mod process;
pub mod show;
pub mod vocab;
