mod init;
mod ratings;
mod run;

pub use init::cmd_init;
pub use ratings::cmd_ratings;
pub use run::cmd_run;
