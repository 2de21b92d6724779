//! Debounced dropdown option loading
//!
//! Some fields offer choices fetched from a remote service as the user types.
//! [`DebouncedOptions`] waits for a quiet period before asking the
//! [`OptionLoader`], and drops any response that arrives after a newer
//! request was made.

use crate::config::FrameworkConfig;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One dropdown choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Shown to the user
    pub label: String,
    /// Stored in the form
    pub value: String,
}

impl SelectOption {
    /// Create option
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Source of dropdown options
#[async_trait]
pub trait OptionLoader: Send + Sync {
    /// Fetch options matching a query
    async fn load(&self, query: &str) -> Result<Vec<SelectOption>>;
}

/// Result of a debounced request
#[derive(Debug)]
pub enum OptionsOutcome {
    /// Options for the latest query
    Loaded(Vec<SelectOption>),
    /// A newer request replaced this one; show nothing
    Superseded,
    /// The loader failed; show the message beside the field
    Failed(CoreError),
}

impl OptionsOutcome {
    /// Loaded options, if any
    #[must_use]
    pub fn options(&self) -> Option<&[SelectOption]> {
        match self {
            Self::Loaded(options) => Some(options),
            _ => None,
        }
    }

    /// Check if this request was replaced
    #[inline]
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Debounced, latest-wins option fetching for one field
pub struct DebouncedOptions<L: ?Sized> {
    field: String,
    loader: Arc<L>,
    window: Duration,
    generation: Arc<AtomicU64>,
}

impl<L: ?Sized> Clone for DebouncedOptions<L> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            loader: Arc::clone(&self.loader),
            window: self.window,
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for DebouncedOptions<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedOptions")
            .field("field", &self.field)
            .field("window", &self.window)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<L: OptionLoader + ?Sized> DebouncedOptions<L> {
    /// Create with an explicit quiet period
    #[must_use]
    pub fn new(field: impl Into<String>, loader: Arc<L>, window: Duration) -> Self {
        Self {
            field: field.into(),
            loader,
            window,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create with the configured quiet period
    #[must_use]
    pub fn from_config(field: impl Into<String>, loader: Arc<L>, config: &FrameworkConfig) -> Self {
        Self::new(field, loader, config.debounce())
    }

    /// Quiet period
    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop every request in flight
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Request options for a query
    ///
    /// Resolves to [`OptionsOutcome::Superseded`] if another request starts
    /// before this one's quiet period ends or before its response arrives.
    pub async fn request(&self, query: &str) -> OptionsOutcome {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.window).await;
        if !self.is_current(ticket) {
            tracing::trace!(field = %self.field, query, "options request debounced");
            return OptionsOutcome::Superseded;
        }

        let result = self.loader.load(query).await;
        if !self.is_current(ticket) {
            tracing::debug!(field = %self.field, query, "dropping stale options response");
            return OptionsOutcome::Superseded;
        }

        match result {
            Ok(options) => {
                tracing::debug!(field = %self.field, query, count = options.len(), "options loaded");
                OptionsOutcome::Loaded(options)
            }
            Err(e) => {
                tracing::warn!(field = %self.field, query, error = %e, "options request failed");
                let error = match e {
                    CoreError::OptionsFetch { .. } => e,
                    other => CoreError::options_fetch(&self.field, other.to_string()),
                };
                OptionsOutcome::Failed(error)
            }
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}
