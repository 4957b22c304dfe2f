//! PayT / Meta Ads Ingestion Library
//!
//! This library provides the two ingestion workflows feeding the reporting
//! database: the Meta Ads campaign spend sync (pull) and the PayT sales
//! webhook receiver (push), plus the storage backends they share.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `integrations`: External service clients and payload models.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `handlers`: Router, shared state, metadata and health endpoints.
//! - `meta_ads_client`: Meta Ads insights client.
//! - `meta_ads_models`: Insight rows, date presets and the spend transform.
//! - `meta_ads_sync`: Fetch → transform → upsert orchestration.
//! - `rest_storage`: Supabase REST storage backend.
//! - `storage`: Storage trait, Postgres and in-memory backends.
//! - `webhook_handler`: PayT webhook handler.
//! - `webhook_models`: Webhook payload parsing and sale records.

pub mod api;
pub mod integrations;

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod meta_ads_client;
pub mod meta_ads_models;
pub mod meta_ads_sync;
pub mod rest_storage;
pub mod storage;
pub mod webhook_handler;
pub mod webhook_models;
