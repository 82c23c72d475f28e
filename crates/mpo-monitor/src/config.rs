//! Configuration Management Module
//!
//! Author: OpenTranscribe Team
//! Date: 2024-03-21
//! Version: 0.1.0
//!
//! Purpose: Defines configuration structures for the MPO monitoring subsystem, including metrics, system, health, alert, performance, and logging settings.
//!
//! All code is documented in English, with detailed struct and field documentation, error handling, and performance characteristics.
//! 
//! This module defines configuration structures for the MPO monitoring subsystem.
//! It includes settings for metrics collection, logging, health checks, and more.

use serde::{Deserialize, Serialize};

/// Main monitoring configuration
///
/// The MonitorConfig struct aggregates all configuration options for the monitoring system.
/// Includes metrics, system, health, alert, performance, and logging configurations.
///
/// # Example
/// ```rust
/// let config = MonitorConfig::default();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
pub struct MonitorConfig {
    /// Metrics configuration
    pub metrics: MetricsConfig,
    /// System monitoring configuration
    pub system: SystemConfig,
    /// Health check configuration
    pub health: HealthConfig,
    /// Performance monitoring configuration
    pub performance: PerformanceConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Metrics configuration
///
/// The MetricsConfig struct defines settings for metrics collection, retention, and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics collection
    pub enabled: bool,
    /// Metrics collection interval in seconds
    pub collection_interval_seconds: u64,
    /// Metrics retention period in days
    pub retention_days: u32,
    /// Enable Prometheus metrics export
    pub prometheus_enabled: bool,
    /// Prometheus metrics endpoint
    pub prometheus_endpoint: String,
    /// Custom metrics
    pub custom_metrics: Vec<CustomMetric>,
}

/// Custom metric configuration
///
/// The CustomMetric struct defines a user-defined metric for collection and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMetric {
    /// Metric name
    pub name: String,
    /// Metric type
    pub metric_type: MetricType,
    /// Metric description
    pub description: String,
    /// Metric labels
    pub labels: Vec<String>,
}

/// Metric type
///
/// The MetricType enum specifies the type of metric (counter, gauge, histogram, summary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetricType {
    /// Counter metric
    Counter,
    /// Gauge metric
    Gauge,
    /// Histogram metric
    Histogram,
    /// Summary metric
    Summary,
}

/// System monitoring configuration
///
/// The SystemConfig struct defines settings for system-level metrics collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Collection interval in seconds
    pub collection_interval_secs: u64,
    /// Whether to monitor CPU usage
    pub monitor_cpu: bool,
    /// Whether to monitor memory usage
    pub monitor_memory: bool,
    /// Whether to monitor disk usage
    pub monitor_disk: bool,
    /// Whether to monitor network usage
    pub monitor_network: bool,
}

/// Health check configuration
///
/// The HealthConfig struct defines settings for health check endpoints and status tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Enable health checks
    pub enabled: bool,
    /// Health check interval in seconds
    pub interval_seconds: u64,
    /// Health check timeout in seconds
    pub timeout_seconds: u64,
    /// Health check endpoints
    pub endpoints: Vec<HealthEndpoint>,
}

/// Health check endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEndpoint {
    /// Endpoint name
    pub name: String,
    /// Endpoint path
    pub path: String,
    /// HTTP method
    pub method: String,
    /// Expected status code
    pub expected_status: u16,
    /// Timeout in seconds
    pub timeout_seconds: u64,
}

/// Performance monitoring configuration
///
/// The PerformanceConfig struct defines settings for performance metrics collection and analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Enable performance monitoring
    pub enabled: bool,
    /// Monitoring interval in seconds
    pub monitoring_interval_seconds: u64,
    /// Metrics retention period in days
    pub metrics_retention_days: u32,
    /// Enable profiling
    pub enable_profiling: bool,
    /// Track memory usage
    pub track_memory_usage: bool,
    /// Memory report interval in minutes
    pub memory_report_interval: u64,
}

/// Logging configuration
///
/// The LoggingConfig struct defines settings for structured logging, log levels, and output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub log_level: String,
    /// Enable file logging
    pub enable_file_logging: bool,
    /// Log directory
    pub log_directory: String,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of files
    pub max_files: u32,
    /// Enable JSON format
    pub enable_json_format: bool,
}


impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collection_interval_seconds: 30,
            retention_days: 7,
            prometheus_enabled: true,
            prometheus_endpoint: "/metrics".to_string(),
            custom_metrics: Vec::new(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            collection_interval_secs: 60,
            monitor_cpu: true,
            monitor_memory: true,
            monitor_disk: true,
            monitor_network: true,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 30,
            timeout_seconds: 5,
            endpoints: vec![
                HealthEndpoint {
                    name: "health".to_string(),
                    path: "/health".to_string(),
                    method: "GET".to_string(),
                    expected_status: 200,
                    timeout_seconds: 5,
                },
            ],
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            monitoring_interval_seconds: 60,
            metrics_retention_days: 7,
            enable_profiling: true,
            track_memory_usage: true,
            memory_report_interval: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logging: true,
            log_directory: "logs".to_string(),
            max_file_size: 1024 * 1024 * 10, // 10MB
            max_files: 5,
            enable_json_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert!(config.metrics.enabled);
        assert!(config.system.monitor_cpu);
        assert!(config.system.monitor_memory);
        assert!(config.system.monitor_disk);
        assert!(config.system.monitor_network);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = MonitorConfig::default();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: MonitorConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config.metrics.enabled, deserialized.metrics.enabled);
        assert_eq!(config.system.collection_interval_secs, deserialized.system.collection_interval_secs);
        assert_eq!(config.health.enabled, deserialized.health.enabled);
        assert_eq!(config.performance.enabled, deserialized.performance.enabled);
        assert_eq!(config.logging.log_level, deserialized.logging.log_level);
    }
}
