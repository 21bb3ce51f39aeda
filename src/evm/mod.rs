//! # Execution Engine
//!
//! The bytecode machine and its entry point. [`Evm`] owns the world-state
//! provider, the configuration, and the precompile set; `execute` runs one
//! top-level frame to completion and flushes the journal on success.

pub mod gas;
pub mod interpreter;
pub mod journal;
pub mod memory;
pub mod opcodes;
pub mod precompiles;
pub mod stack;
pub mod transient;

mod calls;

use crate::domain::entities::{ExecutionContext, ExecutionResult, TraceEntry, VmConfig};
use crate::domain::value_objects::Bytes;
use crate::errors::VmError;
use crate::evm::interpreter::{FrameOutcome, Interpreter};
use crate::evm::journal::StateJournal;
use crate::evm::precompiles::PrecompileSet;
use crate::ports::outbound::WorldState;
use tracing::debug;

/// The execution engine.
pub struct Evm<S: WorldState> {
    provider: S,
    config: VmConfig,
    precompiles: PrecompileSet,
}

impl<S: WorldState> Evm<S> {
    /// Engine over `provider` with the default configuration and the base
    /// precompile set.
    pub fn new(provider: S) -> Self {
        Self {
            provider,
            config: VmConfig::default(),
            precompiles: PrecompileSet::base(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the precompile set (e.g. to select a hard-fork range).
    #[must_use]
    pub fn with_precompiles(mut self, precompiles: PrecompileSet) -> Self {
        self.precompiles = precompiles;
        self
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &S {
        &self.provider
    }

    /// Executes `code` in `ctx` and returns the aggregated result and trace.
    ///
    /// A frame that completes normally has its buffered state changes
    /// flushed to the provider; a reverted frame flushes nothing and its
    /// result carries the revert data.
    ///
    /// # Errors
    ///
    /// A fault in the top-level frame surfaces as `VmError`; faults in
    /// nested frames are captured on the result instead.
    pub async fn execute(
        &self,
        code: Bytes,
        ctx: ExecutionContext,
    ) -> Result<(ExecutionResult, Vec<TraceEntry>), VmError> {
        let mut journal = StateJournal::new(&self.provider);
        let frame = Interpreter::new(ctx, code, &mut journal, &self.config, &self.precompiles);
        let exec = frame.run().await;

        match exec.outcome {
            FrameOutcome::Ok(_) => {
                journal.flush().await?;
                debug!(
                    logs = exec.result.logs.len(),
                    inner_calls = exec.result.inner_calls.len(),
                    gas_used = exec.result.gas_used,
                    "execution committed"
                );
                Ok((exec.result, exec.trace))
            }
            FrameOutcome::Revert(_) => {
                debug!(output_len = exec.result.output.len(), "execution reverted");
                Ok((exec.result, exec.trace))
            }
            FrameOutcome::Fault(err) => {
                debug!(error = %err, "execution faulted");
                Err(err)
            }
        }
    }
}
