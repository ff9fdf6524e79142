pub mod analyze;
pub mod chat;
pub mod check;
pub mod edit;
pub mod export;
pub mod generate;
pub mod grade;
pub mod init;
pub mod refine;
pub mod regenerate;
pub mod show;
