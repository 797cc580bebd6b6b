//! event-backtest: Event-driven backtester for historical OHLCV bars
//!
//! This library provides the core components for:
//! - Bar replay over a pad-aligned multi-instrument timeline
//! - CSV and Parquet bar ingestion
//! - Pluggable strategies emitting directional signals
//! - Portfolio accounting of positions, cash and commission
//! - Simulated execution with a commission schedule
//! - Equity curve, Sharpe ratio and drawdown analytics
//! - Event-loop scheduling, unpaced or on a heartbeat
//! - Logging and Prometheus metrics

pub mod backtest;
pub mod cli;
pub mod config;
pub mod data;
pub mod event;
pub mod execution;
pub mod portfolio;
pub mod signal;
pub mod strategy;
pub mod telemetry;
