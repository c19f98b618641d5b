//! Start/stop contract shared by resource-owning components

use crate::core::{Logger, Result, ToolkitError};
use async_trait::async_trait;
use std::fmt;

/// Lifecycle state of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource-owning unit with a `Created -> Running -> Stopped` lifecycle
///
/// `start` and `stop` take `&mut self`; whoever owns the component drives
/// its transitions.
///
/// # Example
///
/// ```no_run
/// use ops_toolkit::components::{Component, LifecycleState};
/// use ops_toolkit::core::Result;
/// use async_trait::async_trait;
///
/// struct Noop(LifecycleState);
///
/// #[async_trait]
/// impl Component for Noop {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn state(&self) -> LifecycleState {
///         self.0
///     }
///
///     async fn start(&mut self) -> Result<()> {
///         self.0 = LifecycleState::Running;
///         Ok(())
///     }
///
///     async fn stop(&mut self) -> Result<()> {
///         self.0 = LifecycleState::Stopped;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Component: Send {
    fn name(&self) -> &str;

    fn state(&self) -> LifecycleState;

    /// Acquire the underlying resource
    ///
    /// On failure the component stays `Created` and holds nothing.
    async fn start(&mut self) -> Result<()>;

    /// Release the underlying resource
    ///
    /// Always leaves the component `Stopped`. Stopping twice, or stopping a
    /// component that never started, is a no-op.
    async fn stop(&mut self) -> Result<()>;
}

/// State cell holding a component's resource while it runs
#[derive(Debug)]
pub struct Lifecycle<R> {
    state: LifecycleState,
    resource: Option<R>,
}

impl<R> Lifecycle<R> {
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            resource: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub fn resource_mut(&mut self) -> Option<&mut R> {
        self.resource.as_mut()
    }

    /// Fail unless the component can still be started
    pub fn ensure_created(&self, component: &str) -> Result<()> {
        match self.state {
            LifecycleState::Created => Ok(()),
            state => Err(ToolkitError::invalid_state(component, "start", state)),
        }
    }

    /// Record a successful start
    pub fn set_running(&mut self, resource: R) {
        self.resource = Some(resource);
        self.state = LifecycleState::Running;
    }

    /// Move to `Stopped`, handing back the resource if one was held
    ///
    /// Returns `None` on every call after the first.
    pub fn begin_stop(&mut self) -> Option<R> {
        self.state = LifecycleState::Stopped;
        self.resource.take()
    }
}

impl<R> Default for Lifecycle<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwrap the constructor arguments every component requires
pub(crate) fn require<C>(
    component: &str,
    config: Option<C>,
    logger: Option<Logger>,
) -> Result<(C, Logger)> {
    let config =
        config.ok_or_else(|| ToolkitError::config(component, "configuration is required"))?;
    let logger = logger.ok_or_else(|| ToolkitError::config(component, "logger is required"))?;
    Ok((config, logger))
}
