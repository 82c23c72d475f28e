//! Performance Monitoring Module
//!
//! Author: OpenTranscribe Team
//! Date: 2024-03-21
//! Version: 0.1.0
//!
//! Purpose: Implements performance metrics collection and analysis for the MPO monitoring subsystem.

use std::{
    sync::Arc,
    time::SystemTime,
};

use axum::{Json, response::IntoResponse, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use tokio::sync::RwLock;

use crate::config::PerformanceConfig;
use crate::metrics::MetricsManager;
use crate::error::Result;
use crate::system::SystemMetrics;

/// Database performance metrics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseMetrics {
    /// Query execution time in milliseconds
    pub query_time_ms: f64,
    /// Number of active connections
    pub active_connections: u32,
    /// Cache hit ratio (0.0 to 1.0)
    pub cache_hit_ratio: f32,
    /// Number of transactions per second
    pub transactions_per_sec: u32,
    /// Replication lag in seconds
    pub replication_lag_sec: u32,
}

/// Application performance metrics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApplicationMetrics {
    /// Requests per second
    pub requests_per_sec: u32,
    /// Average response time in milliseconds
    pub avg_response_time_ms: f64,
    /// Error rate (0.0 to 1.0)
    pub error_rate: f32,
    /// Active sessions count
    pub active_sessions: u32,
    /// Memory usage in MB
    pub memory_usage_mb: u32,
}

/// Pipeline throughput metrics, mirroring the gpu/cpu/nlp/download/utility
/// queue classes from the job dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineMetrics {
    /// Stage invocations completed per second, across all queues
    pub stages_completed_per_sec: u32,
    /// Average stage duration in milliseconds
    pub avg_stage_duration_ms: f64,
    /// Stage failure rate (0.0 to 1.0)
    pub error_rate: f32,
    /// Tasks currently occupying a queue permit
    pub active_tasks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub system: SystemMetrics,
    pub database: DatabaseMetrics,
    pub application: ApplicationMetrics,
    pub pipeline: PipelineMetrics,
    pub cpu_usage: f32,
    pub memory_usage: f32,
    pub disk_usage: f32,
    pub network_usage: f32,
    pub timestamp: SystemTime,
}

impl IntoResponse for PerformanceMetrics {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            system: SystemMetrics::default(),
            database: DatabaseMetrics::default(),
            application: ApplicationMetrics::default(),
            pipeline: PipelineMetrics::default(),
            cpu_usage: 0.0,
            memory_usage: 0.0,
            disk_usage: 0.0,
            network_usage: 0.0,
            timestamp: SystemTime::now(),
        }
    }
}

/// Performance monitoring manager
#[derive(Debug)]
pub struct PerformanceManager {
    config: PerformanceConfig,
    metrics: Arc<MetricsManager>,
    current_metrics: RwLock<PerformanceMetrics>,
}

impl PerformanceManager {
    /// Create a new PerformanceManager instance
    pub fn new(config: PerformanceConfig, metrics: Arc<MetricsManager>) -> Self {
        Self {
            config,
            metrics,
            current_metrics: RwLock::new(PerformanceMetrics::new()),
        }
    }

    /// Get current performance metrics
    #[instrument(level = "debug", skip(self))]
    pub async fn get_metrics(&self) -> Result<PerformanceMetrics> {
        let metrics = self.current_metrics.read().await;
        Ok(metrics.clone())
    }

    /// Collect performance metrics
    #[instrument(level = "debug", skip(self))]
    pub async fn collect_metrics(&self) -> Result<()> {
        let sys = sysinfo::System::new_all();
        let cpu_usage = sys.global_cpu_info().cpu_usage();
        let memory_usage = (sys.used_memory() as f32 / sys.total_memory() as f32) * 100.0;
        
        let mut metrics = self.current_metrics.write().await;
        metrics.cpu_usage = cpu_usage;
        metrics.memory_usage = memory_usage;
        metrics.timestamp = SystemTime::now();

        // TODO: Implement disk and network metrics collection
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;

    #[tokio::test]
    async fn test_performance_manager() -> Result<()> {
        let config = PerformanceConfig::default();
        let metrics_config = MetricsConfig::default();
        let metrics = Arc::new(MetricsManager::new(metrics_config)?);
        let manager = PerformanceManager::new(config, metrics);
        
        manager.collect_metrics().await?;
        let metrics = manager.get_metrics().await?;
        assert!(metrics.cpu_usage >= 0.0);
        assert!(metrics.memory_usage >= 0.0);
        Ok(())
    }
}
