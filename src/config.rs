//! Declarative window and filter specs.
//!
//! Deployments describe windows in configuration documents; a spec is
//! deserialized, validated, and built into a live instance.

use crate::error::ConfigError;
use crate::event::Event;
use crate::filter::DuplicateFilter;
use crate::window::{
    AtMostNWindow, BoundedDiscreteWindow, ClockTimeWindow, DiscreteTimeWindow,
    ProcessingTimeWindow, Window,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Eviction policy declaration for a single window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    Discrete {
        window_ms: i64,
    },
    AtMostN {
        capacity: usize,
    },
    LastN {
        capacity: usize,
    },
    Bounded {
        window_ms: i64,
        capacity: usize,
    },
    Clock {
        window_ms: i64,
        #[serde(default)]
        latency_ms: i64,
        #[serde(default)]
        filling_grace: bool,
    },
    ProcessingTime {
        ttl_ms: u64,
    },
}

impl WindowSpec {
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        match self {
            WindowSpec::Discrete { window_ms } => require_window(name, *window_ms),
            WindowSpec::AtMostN { capacity } | WindowSpec::LastN { capacity } => {
                require_capacity(name, *capacity)
            }
            WindowSpec::Bounded {
                window_ms,
                capacity,
            } => {
                require_window(name, *window_ms)?;
                require_capacity(name, *capacity)
            }
            WindowSpec::Clock {
                window_ms,
                latency_ms,
                ..
            } => {
                require_window(name, *window_ms)?;
                if *latency_ms >= *window_ms {
                    return Err(ConfigError::LatencyExceedsWindow {
                        name: name.to_string(),
                        latency_ms: *latency_ms,
                        window_ms: *window_ms,
                    });
                }
                Ok(())
            }
            WindowSpec::ProcessingTime { ttl_ms } => require_window(name, *ttl_ms as i64),
        }
    }

    /// Validates and builds a live window named `name`.
    pub fn build(&self, name: &str) -> Result<Arc<dyn Window>, ConfigError> {
        self.validate(name)?;
        let window: Arc<dyn Window> = match self {
            WindowSpec::Discrete { window_ms } => {
                Arc::new(DiscreteTimeWindow::new(name, *window_ms))
            }
            WindowSpec::AtMostN { capacity } => Arc::new(AtMostNWindow::new(name, *capacity)),
            WindowSpec::LastN { capacity } => Arc::new(AtMostNWindow::last_n(name, *capacity)),
            WindowSpec::Bounded {
                window_ms,
                capacity,
            } => Arc::new(BoundedDiscreteWindow::new(name, *window_ms, *capacity)),
            WindowSpec::Clock {
                window_ms,
                latency_ms,
                filling_grace,
            } => {
                if *filling_grace {
                    Arc::new(ClockTimeWindow::with_filling_grace(
                        name,
                        *window_ms,
                        *latency_ms,
                    ))
                } else {
                    Arc::new(ClockTimeWindow::new(name, *window_ms, *latency_ms))
                }
            }
            WindowSpec::ProcessingTime { ttl_ms } => Arc::new(ProcessingTimeWindow::new(
                name,
                Duration::from_millis(*ttl_ms),
            )),
        };
        Ok(window)
    }
}

/// Declaration of a duplicate filter keyed on a named payload part.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterSpec {
    pub key_part: String,
    /// Window in front of which the filter sits; defaults to a one-hour
    /// discrete window.
    #[serde(default)]
    pub window: Option<WindowSpec>,
}

impl FilterSpec {
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.key_part.is_empty() {
            return Err(ConfigError::EmptyKeyPart {
                name: name.to_string(),
            });
        }
        if let Some(window) = &self.window {
            window.validate(name)?;
        }
        Ok(())
    }

    pub fn build(&self, name: &str) -> Result<Arc<DuplicateFilter>, ConfigError> {
        self.validate(name)?;
        let key_part = self.key_part.clone();
        let key_fn =
            Box::new(move |event: &Event| event.part(&key_part).map(|value| value.to_string()));
        match &self.window {
            Some(spec) => Ok(DuplicateFilter::new(name, spec.build(name)?, key_fn)),
            None => Ok(DuplicateFilter::with_default_window(name, key_fn)),
        }
    }
}

fn require_window(name: &str, window_ms: i64) -> Result<(), ConfigError> {
    if window_ms <= 0 {
        return Err(ConfigError::ZeroWindow {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn require_capacity(name: &str, capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity {
            name: name.to_string(),
        });
    }
    Ok(())
}
