//! Installing the strict-schema wrapper in front of a tool source.
//!
//! A [`ToolService`] declares whether it can list tools at all. Installation
//! wraps that capability and hands it back; the caller registers the result
//! with its server explicitly (see [`ToolRoute::from_installation`]). Nothing
//! on the service itself is rebound.

use std::panic::{self, AssertUnwindSafe};

use crate::lister::{StrictToolLister, ToolLister, ToolRoute};
use crate::schema::{SchemaNormalizer, DEFAULT_MAX_DEPTH};

/// A source of tools that may or may not expose a `tools/list` capability
pub trait ToolService {
    type Lister: ToolLister;

    /// The listing capability, or `None` if this source cannot list tools
    fn tool_lister(&self) -> Option<Self::Lister>;
}

/// Options for the strict wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictOptions {
    /// Maximum schema nesting depth accepted by the normalizer
    pub max_depth: usize,
    /// Also normalize `outputSchema`
    pub output_schemas: bool,
}

impl Default for StrictOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            output_schemas: false,
        }
    }
}

/// Installation failures. These are reported, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error("max_depth must be at least 1")]
    InvalidDepthLimit,

    #[error("tool source panicked while providing its lister: {0}")]
    ListerPanicked(String),
}

/// Outcome of [`install_strict_listing`]
#[derive(Debug)]
pub enum Installation<L> {
    /// The listing capability is now wrapped
    Installed(StrictToolLister<L>),
    /// The source has no listing capability; nothing was installed
    Absent,
    /// Wrapping failed; the source is unchanged
    Failed(InstallError),
}

impl<L> Installation<L> {
    /// Boolean view of the outcome
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed(_))
    }
}

/// Wrap `service`'s listing capability so every schema it returns is strict.
///
/// Never panics and never returns an error: a missing capability yields
/// [`Installation::Absent`] and any fault while wrapping is logged and
/// yields [`Installation::Failed`].
pub fn install_strict_listing<S: ToolService>(
    service: &S,
    options: &StrictOptions,
) -> Installation<S::Lister> {
    match try_install(service, options) {
        Ok(Some(lister)) => {
            log::info!("Successfully patched tool listing for OpenAI compatibility");
            Installation::Installed(lister)
        }
        Ok(None) => {
            log::info!("Tool source exposes no tools/list capability; strict schemas not installed");
            Installation::Absent
        }
        Err(e) => {
            log::error!("Failed to patch tool listing for OpenAI compatibility: {e}");
            Installation::Failed(e)
        }
    }
}

fn try_install<S: ToolService>(
    service: &S,
    options: &StrictOptions,
) -> Result<Option<StrictToolLister<S::Lister>>, InstallError> {
    if options.max_depth == 0 {
        return Err(InstallError::InvalidDepthLimit);
    }

    let lister = panic::catch_unwind(AssertUnwindSafe(|| service.tool_lister()))
        .map_err(|payload| InstallError::ListerPanicked(panic_message(payload.as_ref())))?;

    Ok(lister.map(|original| {
        StrictToolLister::new(original, SchemaNormalizer::new(options.max_depth))
            .with_output_schemas(options.output_schemas)
    }))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<L: ToolLister> ToolRoute<L> {
    /// Route to register for an installation outcome.
    ///
    /// A failed installation falls back to the unwrapped lister from
    /// `fallback`, so the server keeps listing tools without strict schemas.
    /// A source that already panicked is not asked again, and a panic inside
    /// `fallback` leaves the route unavailable.
    pub fn from_installation(
        installation: Installation<L>,
        fallback: impl FnOnce() -> Option<L>,
    ) -> Self {
        match installation {
            Installation::Installed(lister) => Self::Strict(lister),
            Installation::Absent => Self::Unavailable,
            Installation::Failed(InstallError::ListerPanicked(_)) => Self::Unavailable,
            Installation::Failed(_) => match panic::catch_unwind(AssertUnwindSafe(fallback)) {
                Ok(lister) => lister.map_or(Self::Unavailable, Self::Passthrough),
                Err(payload) => {
                    log::error!(
                        "Tool source panicked while providing its unpatched lister: {}",
                        panic_message(payload.as_ref())
                    );
                    Self::Unavailable
                }
            },
        }
    }
}
