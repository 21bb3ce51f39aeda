//! # Call & Creation Orchestration
//!
//! Handlers for CALL/CALLCODE/DELEGATECALL/STATICCALL, CREATE/CREATE2, and
//! SELFDESTRUCT. Each nested call derives a fresh child context, opens a
//! journal checkpoint, re-enters the interpreter one depth level deeper, and
//! reconciles the child's typed outcome into the parent's stack, memory,
//! result, and the balance ledger. A child revert or fault pushes failure,
//! is recorded on the parent, and stops the parent frame; a reverting
//! creation additionally marks the parent reverted.

use crate::domain::entities::{CallKind, CallRecord, GasPolicy};
use crate::domain::services::{create2_address, create_address};
use crate::domain::value_objects::{checked_usize, Address, Bytes, Hash, U256};
use crate::errors::{StateError, VmError};
use crate::evm::gas::{self, costs};
use crate::evm::interpreter::{FrameOutcome, Interpreter};
use crate::evm::precompiles::PrecompileProvider;
use crate::ports::outbound::WorldState;
use tracing::debug;

impl<'j, 's, S: WorldState> Interpreter<'j, 's, S> {
    // -------------------------------------------------------------------------
    // CALL family
    // -------------------------------------------------------------------------

    pub(crate) async fn op_call(&mut self, kind: CallKind) -> Result<(), VmError> {
        let gas_requested = self.stack.pop()?;
        let target = Address::from_word(self.stack.pop()?);
        let value = match kind {
            CallKind::Call | CallKind::CallCode => self.stack.pop()?,
            CallKind::DelegateCall => self.ctx.value,
            CallKind::StaticCall => U256::zero(),
            CallKind::Create | CallKind::Create2 => {
                unreachable!("creations are dispatched to op_create")
            }
        };
        let in_offset = checked_usize(self.stack.pop()?)?;
        let in_len = checked_usize(self.stack.pop()?)?;
        let out_offset = checked_usize(self.stack.pop()?)?;
        let out_len = checked_usize(self.stack.pop()?)?;

        // A value-bearing CALL is a state mutation; reject it before anything
        // else in a static context.
        let transfers_value = kind == CallKind::Call && !value.is_zero();
        if self.ctx.is_static && transfers_value {
            return Err(VmError::StaticViolation);
        }

        self.touch_memory(in_offset, in_len)?;
        self.touch_memory(out_offset, out_len)?;
        let input = Bytes::from_vec(self.memory.read(in_offset, in_len)?);

        let depth = self.ctx.depth.saturating_add(1);
        if depth > self.config.max_call_depth {
            let record = self.record(kind, target, value, input, Bytes::new(), false, depth);
            return self.fail_child(
                record,
                Some(VmError::CallDepthExceeded {
                    depth,
                    max: self.config.max_call_depth,
                }),
            );
        }

        // Value surcharges.
        let has_value = matches!(kind, CallKind::Call | CallKind::CallCode) && !value.is_zero();
        if has_value {
            self.gas.consume(costs::CALL_VALUE)?;
            if kind == CallKind::Call && !self.journal.account_exists(target).await? {
                self.gas.consume(costs::CALL_NEW_ACCOUNT)?;
            }
        }

        // A sender that cannot cover the value refuses the call locally:
        // failure is pushed and the frame keeps running.
        if has_value && self.journal.balance(self.ctx.address).await? < value {
            self.stack.push(U256::zero())?;
            let record = self.record(kind, target, value, input, Bytes::new(), false, depth);
            self.result.inner_calls.push(record);
            self.return_data = Bytes::new();
            return Ok(());
        }

        let child_gas = match self.config.gas_policy {
            GasPolicy::Metered => {
                gas::child_call_gas(self.gas.remaining(), gas_requested, has_value)
            }
            GasPolicy::Unmetered => clamp_u64(gas_requested),
        };
        // The stipend rides for free on top of the value surcharge.
        let parent_charge = child_gas.saturating_sub(if has_value {
            costs::CALL_STIPEND
        } else {
            0
        });
        self.gas.consume(parent_charge)?;

        let code = self.journal.code(target).await?;
        self.result.touched_code.insert(target, code.clone());

        debug!(
            kind = ?kind,
            target = %target,
            value = %value,
            input_len = input.len(),
            child_gas,
            "nested call"
        );

        self.journal.checkpoint();
        if transfers_value {
            if let Err(err) = self.apply_transfer(self.ctx.address, target, value).await {
                self.journal.rollback();
                return Err(err.into());
            }
        }

        if code.is_empty() {
            return self
                .finish_codeless_call(kind, target, value, input, out_offset, out_len, child_gas, parent_charge, depth)
                .await;
        }

        let child_ctx = match kind {
            CallKind::Call => self.ctx.child_call(target, value, input.clone(), child_gas),
            CallKind::CallCode => self.ctx.child_callcode(value, input.clone(), child_gas),
            CallKind::DelegateCall => self.ctx.child_delegatecall(input.clone(), child_gas),
            CallKind::StaticCall => self.ctx.child_staticcall(target, input.clone(), child_gas),
            CallKind::Create | CallKind::Create2 => {
                unreachable!("creations are dispatched to op_create")
            }
        };

        let child = Interpreter::new(
            child_ctx,
            code,
            &mut *self.journal,
            self.config,
            self.precompiles,
        );
        let exec = Box::pin(child.run()).await;
        self.trace.extend(exec.trace);
        let child_used = exec.result.gas_used;

        match exec.outcome {
            FrameOutcome::Ok(output) => {
                self.write_truncated(out_offset, out_len, output.as_slice())?;
                self.return_data = output.clone();
                self.journal.commit();
                self.gas.reclaim(parent_charge.saturating_sub(child_used));
                let record = self.record(kind, target, value, input, output, true, depth);
                self.result.inner_calls.push(record);
                self.result.absorb(exec.result);
                self.stack.push(U256::one())?;
                Ok(())
            }
            FrameOutcome::Revert(data) => {
                self.write_truncated(out_offset, out_len, data.as_slice())?;
                self.return_data = data.clone();
                self.journal.rollback();
                self.gas.reclaim(parent_charge.saturating_sub(child_used));
                let record = self.record(kind, target, value, input, data, false, depth);
                self.fail_child(record, None)
            }
            FrameOutcome::Fault(err) => {
                self.return_data = Bytes::new();
                self.journal.rollback();
                let record = self.record(kind, target, value, input, Bytes::new(), false, depth);
                self.fail_child(record, Some(err))
            }
        }
    }

    /// Completes a call to an address with no code: a registered precompile
    /// runs synchronously without recursing into the interpreter; anything
    /// else degenerates to the plain value transfer already applied.
    #[allow(clippy::too_many_arguments)]
    async fn finish_codeless_call(
        &mut self,
        kind: CallKind,
        target: Address,
        value: U256,
        input: Bytes,
        out_offset: usize,
        out_len: usize,
        child_gas: u64,
        parent_charge: u64,
        depth: u16,
    ) -> Result<(), VmError> {
        if self.precompiles.can_handle(&target) {
            let cost = self.precompiles.gas_cost(&target, input.as_slice());
            if self.config.gas_policy == GasPolicy::Metered && cost > child_gas {
                self.journal.rollback();
                let record = self.record(kind, target, value, input, Bytes::new(), false, depth);
                return self.fail_child(record, Some(VmError::OutOfGas));
            }

            debug!(target = %target, cost, input_len = input.len(), "precompile call");
            return match self.precompiles.execute(&target, input.as_slice()) {
                Ok(output) => {
                    self.write_truncated(out_offset, out_len, output.as_slice())?;
                    self.return_data = output.clone();
                    self.journal.commit();
                    self.gas.reclaim(parent_charge.saturating_sub(cost));
                    let record = self.record(kind, target, value, input, output, true, depth);
                    self.result.inner_calls.push(record);
                    self.stack.push(U256::one())?;
                    Ok(())
                }
                Err(err) => {
                    self.journal.rollback();
                    let record =
                        self.record(kind, target, value, input, Bytes::new(), false, depth);
                    self.fail_child(record, Some(err.into()))
                }
            };
        }

        // Plain transfer.
        self.journal.commit();
        self.gas.reclaim(parent_charge);
        self.return_data = Bytes::new();
        let record = self.record(kind, target, value, input, Bytes::new(), true, depth);
        self.result.inner_calls.push(record);
        self.stack.push(U256::one())?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // CREATE family
    // -------------------------------------------------------------------------

    pub(crate) async fn op_create(&mut self, kind: CallKind) -> Result<(), VmError> {
        let value = self.stack.pop()?;
        let offset = checked_usize(self.stack.pop()?)?;
        let len = checked_usize(self.stack.pop()?)?;
        let salt = if kind == CallKind::Create2 {
            Some(Hash::from_word(self.stack.pop()?))
        } else {
            None
        };

        if len > self.config.max_init_code_size {
            return Err(VmError::InitCodeSizeExceeded {
                size: len,
                max: self.config.max_init_code_size,
            });
        }

        self.touch_memory(offset, len)?;
        self.gas.consume(gas::per_word_cost(len, costs::INIT_CODE_WORD))?;
        if salt.is_some() {
            // CREATE2 hashes the init code for the address derivation.
            self.gas.consume(gas::per_word_cost(len, costs::KECCAK256_WORD))?;
        }
        let init_code = Bytes::from_vec(self.memory.read(offset, len)?);

        let depth = self.ctx.depth.saturating_add(1);
        if depth > self.config.max_call_depth {
            let record = self.record(kind, Address::ZERO, value, init_code, Bytes::new(), false, depth);
            self.result.inner_calls.push(record);
            self.result.error = Some(VmError::CallDepthExceeded {
                depth,
                max: self.config.max_call_depth,
            });
            self.stopped = true;
            return Ok(());
        }

        if self.journal.balance(self.ctx.address).await? < value {
            self.stack.push(U256::zero())?;
            let record = self.record(kind, Address::ZERO, value, init_code, Bytes::new(), false, depth);
            self.result.inner_calls.push(record);
            self.return_data = Bytes::new();
            return Ok(());
        }

        // CREATE derives from the creator's nonce, CREATE2 from the salt and
        // the init-code hash. The nonce increment survives a reverted
        // initialization.
        let nonce = self.journal.nonce(self.ctx.address).await?;
        let created = match salt {
            None => create_address(self.ctx.address, nonce),
            Some(salt) => create2_address(self.ctx.address, salt, init_code.as_slice()),
        };
        self.journal.set_nonce(self.ctx.address, nonce.saturating_add(1));

        let child_gas = match self.config.gas_policy {
            GasPolicy::Metered => {
                let remaining = self.gas.remaining();
                remaining - remaining / 64
            }
            GasPolicy::Unmetered => self.gas.remaining(),
        };
        self.gas.consume(child_gas)?;

        debug!(
            kind = ?kind,
            created = %created,
            value = %value,
            init_len = init_code.len(),
            child_gas,
            "contract creation"
        );

        self.journal.checkpoint();
        if !value.is_zero() {
            if let Err(err) = self.apply_transfer(self.ctx.address, created, value).await {
                self.journal.rollback();
                return Err(err.into());
            }
        }
        self.journal.set_nonce(created, 1);

        let child_ctx = self.ctx.child_create(created, value, child_gas);
        let child = Interpreter::new(
            child_ctx,
            init_code.clone(),
            &mut *self.journal,
            self.config,
            self.precompiles,
        );
        let exec = Box::pin(child.run()).await;
        self.trace.extend(exec.trace);
        let child_used = exec.result.gas_used;

        match exec.outcome {
            FrameOutcome::Ok(deployed) => {
                if deployed.len() > self.config.max_code_size {
                    self.journal.rollback();
                    let record =
                        self.record(kind, created, value, init_code, Bytes::new(), false, depth);
                    self.result.inner_calls.push(record);
                    self.result.error = Some(VmError::CodeSizeExceeded {
                        size: deployed.len(),
                        max: self.config.max_code_size,
                    });
                    self.stopped = true;
                    return Ok(());
                }
                if deployed.as_slice().first() == Some(&0xef) {
                    self.journal.rollback();
                    let record =
                        self.record(kind, created, value, init_code, Bytes::new(), false, depth);
                    self.result.inner_calls.push(record);
                    self.result.error = Some(VmError::InvalidCodePrefix);
                    self.stopped = true;
                    return Ok(());
                }
                if let Err(err) = self
                    .gas
                    .consume(costs::CODE_DEPOSIT * deployed.len() as u64)
                {
                    self.journal.rollback();
                    let record =
                        self.record(kind, created, value, init_code, Bytes::new(), false, depth);
                    self.result.inner_calls.push(record);
                    self.result.error = Some(err);
                    self.stopped = true;
                    return Ok(());
                }

                // The child's return data becomes the account's code.
                self.journal.save_code(created, deployed.clone());
                self.journal.commit();
                self.gas.reclaim(child_gas.saturating_sub(child_used));

                let record =
                    self.record(kind, created, value, init_code, deployed.clone(), true, depth);
                self.result.inner_calls.push(record);
                self.result.absorb(exec.result);
                self.result.created.push(created);
                self.result.touched_code.insert(created, deployed);
                self.return_data = Bytes::new();
                self.stack.push(created.to_word())?;
                Ok(())
            }
            FrameOutcome::Revert(data) => {
                self.journal.rollback();
                self.gas.reclaim(child_gas.saturating_sub(child_used));
                let record = self.record(kind, created, value, init_code, data.clone(), false, depth);
                self.result.inner_calls.push(record);
                // A reverting initialization reverts the creator: no address
                // pushed, no code stored.
                self.return_data = data.clone();
                self.output = data;
                self.reverted = true;
                self.stopped = true;
                Ok(())
            }
            FrameOutcome::Fault(err) => {
                self.journal.rollback();
                let record = self.record(kind, created, value, init_code, Bytes::new(), false, depth);
                self.result.inner_calls.push(record);
                self.result.error = Some(err);
                self.stopped = true;
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // SELFDESTRUCT
    // -------------------------------------------------------------------------

    pub(crate) async fn op_selfdestruct(&mut self) -> Result<(), VmError> {
        let beneficiary = Address::from_word(self.stack.pop()?);
        let balance = self.journal.balance(self.ctx.address).await?;

        if !balance.is_zero()
            && beneficiary != self.ctx.address
            && !self.journal.account_exists(beneficiary).await?
        {
            self.gas.consume(costs::CALL_NEW_ACCOUNT)?;
        }

        debug!(address = %self.ctx.address, beneficiary = %beneficiary, balance = %balance, "selfdestruct");

        // The whole balance moves to the beneficiary; sending to the dying
        // account itself burns it.
        self.journal.set_balance(self.ctx.address, U256::zero());
        if beneficiary != self.ctx.address && !balance.is_zero() {
            let existing = self.journal.balance(beneficiary).await?;
            self.journal
                .set_balance(beneficiary, existing.saturating_add(balance));
        }

        self.journal.mark_destroyed(self.ctx.address);
        self.result.destroyed.push(self.ctx.address);
        self.stopped = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Shared plumbing
    // -------------------------------------------------------------------------

    async fn apply_transfer(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), StateError> {
        let from_balance = self.journal.balance(from).await?;
        self.journal.set_balance(from, from_balance.saturating_sub(value));
        let to_balance = self.journal.balance(to).await?;
        self.journal.set_balance(to, to_balance.saturating_add(value));
        Ok(())
    }

    /// Writes child output into the requested slice of parent memory,
    /// truncated to the requested length.
    fn write_truncated(
        &mut self,
        out_offset: usize,
        out_len: usize,
        data: &[u8],
    ) -> Result<(), VmError> {
        let n = data.len().min(out_len);
        if n > 0 {
            self.memory.write(out_offset, &data[..n])?;
        }
        Ok(())
    }

    /// Pushes failure, records the child descriptor (and the captured fault,
    /// if any), and stops this frame.
    fn fail_child(&mut self, record: CallRecord, error: Option<VmError>) -> Result<(), VmError> {
        self.stack.push(U256::zero())?;
        self.result.inner_calls.push(record);
        if let Some(err) = error {
            self.result.error = Some(err);
        }
        self.stopped = true;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        kind: CallKind,
        to: Address,
        value: U256,
        input: Bytes,
        output: Bytes,
        success: bool,
        depth: u16,
    ) -> CallRecord {
        let from = match kind {
            CallKind::DelegateCall => self.ctx.caller,
            _ => self.ctx.address,
        };
        CallRecord {
            kind,
            from,
            to,
            value,
            input,
            output,
            success,
            depth,
        }
    }
}

fn clamp_u64(word: U256) -> u64 {
    if word > U256::from(u64::MAX) {
        u64::MAX
    } else {
        word.as_u64()
    }
}
