//! Canned sequences for the standard application lifecycle.
//!
//! `deploy` creates and wires every component; `setup` seeds the deployed
//! application with its initial participants.

pub mod deploy;
pub mod setup;

pub use deploy::{deploy_sequence, DeployContext, DeployContextProvider};
pub use setup::{setup_sequence, Contributor, ContributorStatus, SetupContext, SetupContextProvider};
