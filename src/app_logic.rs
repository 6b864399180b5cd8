/*
 * This module provides the application logic layer, centered around `SyncController`,
 * which reacts to host events and panel commands and keeps the panel's tree in sync.
 * Unit tests for `SyncController` are in `handler_tests.rs`.
 */
pub mod handler;


pub use handler::SyncController;
