//! Campaign journal library
//!
//! Backend for tabletop campaign journals: players, games, records with
//! inline entity mentions, quests with tasks, and play sessions.

pub mod app;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod database;
pub mod domain;
pub mod error;
pub mod services;
