pub mod config;
pub mod equirect;
pub mod extract;
pub mod info;
pub mod run;
