//! Task configuration surface: [`TaskBuilder`] produces a validated
//! [`TaskConfig`], which is embedded in a [`crate::Task`] at construction.

use saltyrtc_task_proto::ChunkHeader;

use crate::error::TaskError;

/// Default maximum chunk length: 256 KiB.
pub const DEFAULT_MAX_CHUNK_LENGTH: u32 = 256 * 1024;

/// Protocol generation this task speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskVersion {
    /// Current protocol: chunking is always on, no `max_packet_size`
    /// negotiation field.
    V1,
    /// Legacy protocol: `max_packet_size` is negotiated, and a value of 0
    /// on both sides means "send whole frames, no chunking".
    V0,
}

impl TaskVersion {
    /// The task protocol identifier string advertised to the session.
    #[must_use]
    pub fn protocol_id(self) -> &'static str {
        match self {
            Self::V1 => "v1.webrtc.tasks.saltyrtc.org",
            Self::V0 => "v0.webrtc.tasks.saltyrtc.org",
        }
    }
}

/// Minimum severity the task logs at, independent of whatever filtering
/// the host's own `tracing` subscriber applies. Ordered by increasing
/// verbosity; a configured level enables itself and everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress every task-originated log line.
    Off,
    /// Only log fatal, connection-ending conditions.
    Error,
    /// Also log recoverable anomalies (rejected chunks, reset peers).
    Warn,
    /// Also log high-level lifecycle events (init, handover).
    Info,
    /// Also log per-message/per-chunk detail.
    Debug,
}

/// Resolved, validated task configuration produced by [`TaskBuilder::build`].
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Protocol generation.
    pub version: TaskVersion,
    /// Whether handover is locally enabled (still subject to AND-merge
    /// with the peer's preference during `init`).
    pub do_handover: bool,
    /// Channel ids this endpoint refuses to use for signalling.
    pub exclude: Vec<u16>,
    /// Local preferred maximum chunk length.
    pub max_chunk_length: u32,
    /// Minimum severity the task logs at.
    pub log_level: LogLevel,
}

/// Fluent builder for [`TaskConfig`].
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    version: TaskVersion,
    do_handover: bool,
    exclude: Vec<u16>,
    max_chunk_length: u32,
    log_level: LogLevel,
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self {
            version: TaskVersion::V1,
            do_handover: true,
            exclude: Vec::new(),
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            log_level: LogLevel::Off,
        }
    }
}

impl TaskBuilder {
    /// Start building with default settings: v1, handover enabled, no
    /// excluded channels, 256 KiB max chunk length.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the protocol generation.
    #[must_use]
    pub fn version(mut self, version: TaskVersion) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable handover locally.
    #[must_use]
    pub fn handover(mut self, enabled: bool) -> Self {
        self.do_handover = enabled;
        self
    }

    /// Add a channel id this endpoint refuses to use for signalling.
    #[must_use]
    pub fn exclude(mut self, channel_id: u16) -> Self {
        self.exclude.push(channel_id);
        self
    }

    /// Set the locally preferred maximum chunk length.
    #[must_use]
    pub fn max_chunk_length(mut self, length: u32) -> Self {
        self.max_chunk_length = length;
        self
    }

    /// Set the minimum severity the task logs at. Defaults to
    /// [`LogLevel::Off`].
    #[must_use]
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Validate and produce a [`TaskConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::ChunkLengthTooSmall`] if `max_chunk_length`
    /// does not exceed the chunking header length.
    pub fn build(self) -> Result<TaskConfig, TaskError> {
        if (self.max_chunk_length as usize) <= ChunkHeader::SIZE {
            return Err(TaskError::ChunkLengthTooSmall(self.max_chunk_length as usize));
        }
        Ok(TaskConfig {
            version: self.version,
            do_handover: self.do_handover,
            exclude: self.exclude,
            max_chunk_length: self.max_chunk_length,
            log_level: self.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_v1_with_handover_enabled() {
        let config = TaskBuilder::new().build().unwrap();
        assert_eq!(config.version, TaskVersion::V1);
        assert!(config.do_handover);
        assert_eq!(config.max_chunk_length, DEFAULT_MAX_CHUNK_LENGTH);
    }

    #[test]
    fn chunk_length_at_header_size_is_rejected() {
        let err = TaskBuilder::new()
            .max_chunk_length(ChunkHeader::SIZE as u32)
            .build()
            .unwrap_err();
        assert!(matches!(err, TaskError::ChunkLengthTooSmall(_)));
    }

    #[test]
    fn chunk_length_one_above_header_size_is_accepted() {
        assert!(
            TaskBuilder::new()
                .max_chunk_length(ChunkHeader::SIZE as u32 + 1)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn exclude_accumulates_in_call_order() {
        let config = TaskBuilder::new().exclude(1).exclude(2).build().unwrap();
        assert_eq!(config.exclude, vec![1, 2]);
    }

    #[test]
    fn default_log_level_is_off() {
        let config = TaskBuilder::new().build().unwrap();
        assert_eq!(config.log_level, LogLevel::Off);
    }

    #[test]
    fn log_level_overrides_default() {
        let config = TaskBuilder::new().log_level(LogLevel::Debug).build().unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }
}
