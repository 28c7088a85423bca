//! Redis backend for vanish.
//!
//! This crate provides a Redis-backed implementation of the [`KvStore`] trait
//! from `vanish-state`.
//!
//! # Features
//!
//! - **Binary-safe values**: photo bytes are stored as raw Redis strings and
//!   read back without any text decoding.
//! - **Atomic scripts**: multi-key sequences run as Lua scripts, which Redis
//!   executes without interleaving other commands.
//! - **Connection pooling**: Uses `deadpool-redis` for efficient connection management.
//!
//! # Consistency
//!
//! Lua scripts are atomic on a single Redis instance. With Sentinel, a
//! failover can lose writes that were not yet replicated; a photo consumed
//! just before a failover may reappear until its TTL runs out. Cluster
//! deployments must keep a photo's meta and blob keys in one hash slot, which
//! the default key layout does not guarantee.
//!
//! # Example
//!
//! ```ignore
//! use vanish_state_redis::{RedisConfig, RedisKvStore};
//!
//! let config = RedisConfig::new("redis://localhost:6379");
//! let store = RedisKvStore::new(&config)?;
//! ```
//!
//! [`KvStore`]: vanish_state::KvStore

mod config;
mod key_render;
mod scripts;
mod store;

pub use config::RedisConfig;
pub use store::RedisKvStore;
