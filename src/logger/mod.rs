//! Logger module
//!
//! Provides logging utilities for the service host including:
//! - Server lifecycle logging
//! - Dispatch and handler failure logging
//! - Access logging in several formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::LogLevel;

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup. Until then every line is
/// printed to stdout/stderr.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    let level = config.level.parse().unwrap_or_else(|e| {
        eprintln!("[WARN] {e}, using info");
        LogLevel::Info
    });
    writer::init(
        level,
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn write(level: LogLevel, message: &str) {
    if let Some(writer) = writer::get() {
        writer.write(level, message);
    } else if level >= LogLevel::Warn {
        eprintln!("{message}");
    } else {
        println!("{message}");
    }
}

pub fn log_debug(message: &str) {
    write(LogLevel::Debug, &format!("[DEBUG] {message}"));
}

pub fn log_info(message: &str) {
    write(LogLevel::Info, &format!("[INFO] {message}"));
}

pub fn log_warning(message: &str) {
    write(LogLevel::Warn, &format!("[WARN] {message}"));
}

pub fn log_error(message: &str) {
    write(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info("======================================");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!(
        "Resources under: {}{}",
        config.service.domain_root,
        config.service.resource_prefix()
    ));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_dispatch(verb: &str, uri: &str, resources: &[String]) {
    log_debug(&format!("[Dispatch] {verb} {uri} resources={resources:?}"));
}

pub fn log_handler_failure(verb: &str, uri: &str, error: &impl std::fmt::Display) {
    log_error(&format!("[Handler] {verb} {uri} failed: {error}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    if let Some(writer) = writer::get() {
        writer.write_access(&line);
    } else {
        println!("{line}");
    }
}
