//! Rollback-tag git hook installation for deployment servers.
//!
//! Deployments driven by `git pull` are easy to roll forward and hard to
//! roll back; these hooks tag the repository state around `pull` and
//! `push` so every deployed revision stays addressable.

mod installer;

pub use installer::{install_hooks, InstalledHooks};
