//! Production implementations of the service traits
//!
//! The real control channel shells out to ssh/scp; the real host provider
//! reads the inventory file named in the settings.

pub mod inventory;
pub mod ssh;

pub use inventory::FileHostProvider;
pub use ssh::SshChannel;
