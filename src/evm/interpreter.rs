//! # Interpreter
//!
//! The per-frame bytecode machine: fetch, decode, dispatch. Every instruction
//! family except calls and creations is handled here; the orchestration
//! handlers live in `calls.rs` and re-enter this interpreter one depth level
//! deeper.

use crate::domain::entities::{
    CallKind, ExecutionContext, ExecutionResult, Log, TraceEntry, VmConfig,
};
use crate::domain::services::{empty_code_hash, keccak256};
use crate::domain::value_objects::{checked_usize, Address, Bytes, Hash, StorageKey, StorageValue, U256};
use crate::errors::VmError;
use crate::evm::gas::{self, costs, GasMeter, STATIC_COST};
use crate::evm::journal::StateJournal;
use crate::evm::memory::Memory;
use crate::evm::opcodes::{jump_destinations, Instruction};
use crate::evm::precompiles::PrecompileSet;
use crate::evm::stack::Stack;
use crate::ports::outbound::WorldState;
use primitive_types::U512;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Typed outcome of one frame, separated from the fatal-error channel: an
/// expected REVERT is data, not an exception.
#[derive(Clone, Debug)]
pub enum FrameOutcome {
    /// Ran to completion (STOP, RETURN, SELFDESTRUCT, or end of bytecode).
    Ok(Bytes),
    /// REVERT, carrying the revert data.
    Revert(Bytes),
    /// Fatal fault.
    Fault(VmError),
}

/// Everything a frame hands back to its caller.
#[derive(Debug)]
pub struct FrameExecution {
    /// Control-flow outcome.
    pub outcome: FrameOutcome,
    /// Aggregated result (output, logs, inner calls, gas).
    pub result: ExecutionResult,
    /// Step trace, empty unless tracing is enabled.
    pub trace: Vec<TraceEntry>,
}

/// One activation of the interpreter: one call or creation.
pub struct Interpreter<'j, 's, S: WorldState> {
    pub(crate) ctx: ExecutionContext,
    pub(crate) code: Bytes,
    pub(crate) pc: usize,
    pub(crate) stack: Stack,
    pub(crate) memory: Memory,
    /// Raw return data of the most recent child call.
    pub(crate) return_data: Bytes,
    /// Output captured by RETURN/REVERT.
    pub(crate) output: Bytes,
    pub(crate) gas: GasMeter,
    pub(crate) stopped: bool,
    pub(crate) reverted: bool,
    pub(crate) result: ExecutionResult,
    pub(crate) trace: Vec<TraceEntry>,
    jump_dests: HashSet<usize>,
    pub(crate) config: &'j VmConfig,
    pub(crate) precompiles: &'j PrecompileSet,
    pub(crate) journal: &'j mut StateJournal<'s, S>,
}

impl<'j, 's, S: WorldState> Interpreter<'j, 's, S> {
    /// Creates a frame over `code` in `ctx`.
    pub fn new(
        ctx: ExecutionContext,
        code: Bytes,
        journal: &'j mut StateJournal<'s, S>,
        config: &'j VmConfig,
        precompiles: &'j PrecompileSet,
    ) -> Self {
        let gas = GasMeter::new(ctx.gas_limit, config.gas_policy);
        let jump_dests = jump_destinations(code.as_slice());
        let memory = Memory::with_limit(config.max_memory_size);
        Self {
            ctx,
            code,
            pc: 0,
            stack: Stack::new(),
            memory,
            return_data: Bytes::new(),
            output: Bytes::new(),
            gas,
            stopped: false,
            reverted: false,
            result: ExecutionResult::default(),
            trace: Vec::new(),
            jump_dests,
            config,
            precompiles,
            journal,
        }
    }

    /// Executes the frame to completion and returns its outcome.
    pub async fn run(mut self) -> FrameExecution {
        debug!(
            depth = self.ctx.depth,
            address = %self.ctx.address,
            code_len = self.code.len(),
            is_static = self.ctx.is_static,
            "frame start"
        );

        let fault = self.exec_loop().await.err();

        let outcome = match fault {
            Some(err) => {
                self.gas.exhaust();
                self.result.error = Some(err.clone());
                FrameOutcome::Fault(err)
            }
            None if self.reverted => FrameOutcome::Revert(self.output.clone()),
            None => FrameOutcome::Ok(self.output.clone()),
        };

        self.result.output = self.output;
        self.result.reverted = self.reverted;
        self.result.gas_used = self.gas.used();
        self.result.gas_refund = if self.result.is_success() {
            self.gas.refund()
        } else {
            0
        };

        debug!(
            depth = self.ctx.depth,
            gas_used = self.result.gas_used,
            reverted = self.result.reverted,
            faulted = self.result.error.is_some(),
            "frame end"
        );

        FrameExecution {
            outcome,
            result: self.result,
            trace: self.trace,
        }
    }

    async fn exec_loop(&mut self) -> Result<(), VmError> {
        let mut steps: u64 = 0;
        while !self.stopped && self.pc < self.code.len() {
            steps += 1;
            if steps > self.config.max_steps {
                return Err(VmError::StepLimitExceeded(steps));
            }

            let byte = self.code.as_slice()[self.pc];
            let instruction = Instruction::decode(byte).ok_or(VmError::InvalidOpcode(byte))?;

            if self.config.trace_enabled {
                self.trace.push(TraceEntry {
                    depth: self.ctx.depth,
                    pc: self.pc,
                    opcode: byte,
                    name: instruction.name().to_string(),
                    gas_remaining: self.gas.remaining(),
                    stack: self.stack.as_slice().to_vec(),
                    memory_size: self.memory.len(),
                });
            }
            trace!(pc = self.pc, op = instruction.name(), "step");

            if self.ctx.is_static && instruction.mutates_state() {
                return Err(VmError::StaticViolation);
            }

            self.gas.consume(STATIC_COST[byte as usize])?;
            self.step(instruction).await?;
        }
        Ok(())
    }

    /// Expands memory to cover `[offset, offset + len)` and charges the
    /// expansion cost. A zero-length access touches nothing.
    pub(crate) fn touch_memory(&mut self, offset: usize, len: usize) -> Result<(), VmError> {
        if len == 0 {
            return Ok(());
        }
        let end = offset.checked_add(len).ok_or(VmError::MemoryLimitExceeded {
            requested: usize::MAX,
            max: self.config.max_memory_size,
        })?;
        let added = self.memory.expand(end)?;
        if added > 0 {
            let new_words = self.memory.word_count();
            self.gas
                .consume(gas::memory_expansion_cost(new_words - added, new_words))?;
        }
        Ok(())
    }

    async fn step(&mut self, instruction: Instruction) -> Result<(), VmError> {
        self.pc += 1;

        match instruction {
            Instruction::Stop => self.stopped = true,

            // -----------------------------------------------------------------
            // Arithmetic
            // -----------------------------------------------------------------
            Instruction::Add => self.binary_op(|a, b| a.overflowing_add(b).0)?,
            Instruction::Mul => self.binary_op(|a, b| a.overflowing_mul(b).0)?,
            Instruction::Sub => self.binary_op(|a, b| a.overflowing_sub(b).0)?,
            Instruction::Div => self.binary_op(|a, b| {
                if b.is_zero() {
                    U256::zero()
                } else {
                    a / b
                }
            })?,
            Instruction::SDiv => self.binary_op(signed_div)?,
            Instruction::Mod => self.binary_op(|a, b| {
                if b.is_zero() {
                    U256::zero()
                } else {
                    a % b
                }
            })?,
            Instruction::SMod => self.binary_op(signed_rem)?,
            Instruction::AddMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let n = self.stack.pop()?;
                let sum = if n.is_zero() {
                    U256::zero()
                } else {
                    narrow((widen(a) + widen(b)) % widen(n))
                };
                self.stack.push(sum)?;
            }
            Instruction::MulMod => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let n = self.stack.pop()?;
                let product = if n.is_zero() {
                    U256::zero()
                } else {
                    narrow((widen(a) * widen(b)) % widen(n))
                };
                self.stack.push(product)?;
            }
            Instruction::Exp => {
                let base = self.stack.pop()?;
                let exponent = self.stack.pop()?;
                self.gas.consume(gas::exp_dynamic_cost(exponent))?;
                self.stack.push(wrapping_pow(base, exponent))?;
            }
            Instruction::SignExtend => {
                let byte_index = self.stack.pop()?;
                let value = self.stack.pop()?;
                self.stack.push(sign_extend(byte_index, value))?;
            }

            // -----------------------------------------------------------------
            // Comparison & bitwise
            // -----------------------------------------------------------------
            Instruction::Lt => self.binary_op(|a, b| bool_word(a < b))?,
            Instruction::Gt => self.binary_op(|a, b| bool_word(a > b))?,
            Instruction::SLt => self.binary_op(|a, b| bool_word(signed_lt(a, b)))?,
            Instruction::SGt => self.binary_op(|a, b| bool_word(signed_lt(b, a)))?,
            Instruction::Eq => self.binary_op(|a, b| bool_word(a == b))?,
            Instruction::IsZero => {
                let a = self.stack.pop()?;
                self.stack.push(bool_word(a.is_zero()))?;
            }
            Instruction::And => self.binary_op(|a, b| a & b)?,
            Instruction::Or => self.binary_op(|a, b| a | b)?,
            Instruction::Xor => self.binary_op(|a, b| a ^ b)?,
            Instruction::Not => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            Instruction::Byte => self.binary_op(|i, x| {
                if i < U256::from(32) {
                    U256::from(x.byte(31 - i.as_usize()))
                } else {
                    U256::zero()
                }
            })?,
            Instruction::Shl => self.binary_op(|shift, value| {
                if shift >= U256::from(256) {
                    U256::zero()
                } else {
                    value << shift.as_usize()
                }
            })?,
            Instruction::Shr => self.binary_op(|shift, value| {
                if shift >= U256::from(256) {
                    U256::zero()
                } else {
                    value >> shift.as_usize()
                }
            })?,
            Instruction::Sar => self.binary_op(arithmetic_shr)?,

            // -----------------------------------------------------------------
            // Hashing
            // -----------------------------------------------------------------
            Instruction::Keccak256 => {
                let offset = checked_usize(self.stack.pop()?)?;
                let len = checked_usize(self.stack.pop()?)?;
                self.touch_memory(offset, len)?;
                self.gas.consume(gas::per_word_cost(len, costs::KECCAK256_WORD))?;
                let data = self.memory.read(offset, len)?;
                self.stack.push(keccak256(&data).to_word())?;
            }

            // -----------------------------------------------------------------
            // Environment
            // -----------------------------------------------------------------
            Instruction::Address => self.stack.push(self.ctx.address.to_word())?,
            Instruction::Balance => {
                let address = Address::from_word(self.stack.pop()?);
                let balance = self.journal.balance(address).await?;
                self.stack.push(balance)?;
            }
            Instruction::Origin => self.stack.push(self.ctx.origin.to_word())?,
            Instruction::Caller => self.stack.push(self.ctx.caller.to_word())?,
            Instruction::CallValue => self.stack.push(self.ctx.value)?,
            Instruction::CallDataLoad => {
                let offset = self.stack.pop()?;
                self.stack.push(load_word_padded(self.ctx.data.as_slice(), offset))?;
            }
            Instruction::CallDataSize => self.stack.push(U256::from(self.ctx.data.len()))?,
            Instruction::CallDataCopy => {
                let data = self.ctx.data.clone();
                self.copy_into_memory(data.as_slice())?;
            }
            Instruction::CodeSize => self.stack.push(U256::from(self.code.len()))?,
            Instruction::CodeCopy => {
                let code = self.code.clone();
                self.copy_into_memory(code.as_slice())?;
            }
            Instruction::GasPrice => self.stack.push(self.ctx.gas_price)?,
            Instruction::ExtCodeSize => {
                let address = Address::from_word(self.stack.pop()?);
                let code = self.journal.code(address).await?;
                self.stack.push(U256::from(code.len()))?;
            }
            Instruction::ExtCodeCopy => {
                let address = Address::from_word(self.stack.pop()?);
                let code = self.journal.code(address).await?;
                self.copy_into_memory(code.as_slice())?;
            }
            Instruction::ReturnDataSize => self.stack.push(U256::from(self.return_data.len()))?,
            Instruction::ReturnDataCopy => {
                let dest = checked_usize(self.stack.pop()?)?;
                let offset = checked_usize(self.stack.pop()?)?;
                let len = checked_usize(self.stack.pop()?)?;

                if offset.saturating_add(len) > self.return_data.len() {
                    return Err(VmError::ReturnDataOutOfBounds {
                        offset,
                        size: len,
                        available: self.return_data.len(),
                    });
                }
                self.touch_memory(dest, len)?;
                self.gas.consume(gas::per_word_cost(len, costs::COPY_WORD))?;
                let slice = self.return_data.as_slice()[offset..offset + len].to_vec();
                self.memory.write(dest, &slice)?;
            }
            Instruction::ExtCodeHash => {
                let address = Address::from_word(self.stack.pop()?);
                let hash = if self.journal.account_exists(address).await? {
                    let code = self.journal.code(address).await?;
                    if code.is_empty() {
                        empty_code_hash()
                    } else {
                        keccak256(code.as_slice())
                    }
                } else {
                    Hash::ZERO
                };
                self.stack.push(hash.to_word())?;
            }

            // -----------------------------------------------------------------
            // Block information
            // -----------------------------------------------------------------
            Instruction::BlockHash => {
                let number = self.stack.pop()?;
                let current = self.ctx.block.number;
                let hash = if number >= U256::from(current)
                    || number < U256::from(current.saturating_sub(256))
                {
                    Hash::ZERO
                } else {
                    self.journal.block_hash(number.as_u64()).await?
                };
                self.stack.push(hash.to_word())?;
            }
            Instruction::Coinbase => self.stack.push(self.ctx.block.coinbase.to_word())?,
            Instruction::Timestamp => self.stack.push(U256::from(self.ctx.block.timestamp))?,
            Instruction::Number => self.stack.push(U256::from(self.ctx.block.number))?,
            Instruction::PrevRandao => self.stack.push(self.ctx.block.difficulty)?,
            Instruction::GasLimit => self.stack.push(U256::from(self.ctx.block.gas_limit))?,
            Instruction::ChainId => self.stack.push(U256::from(self.ctx.block.chain_id))?,
            Instruction::SelfBalance => {
                let balance = self.journal.balance(self.ctx.address).await?;
                self.stack.push(balance)?;
            }
            Instruction::BaseFee => self.stack.push(self.ctx.block.base_fee)?,
            Instruction::BlobHash => {
                let index = self.stack.pop()?;
                let hash = if index < U256::from(self.ctx.block.blob_hashes.len()) {
                    self.ctx.block.blob_hashes[index.as_usize()]
                } else {
                    Hash::ZERO
                };
                self.stack.push(hash.to_word())?;
            }
            Instruction::BlobBaseFee => self.stack.push(self.ctx.block.blob_base_fee)?,

            // -----------------------------------------------------------------
            // Stack, memory, storage
            // -----------------------------------------------------------------
            Instruction::Pop => {
                self.stack.pop()?;
            }
            Instruction::MLoad => {
                let offset = checked_usize(self.stack.pop()?)?;
                self.touch_memory(offset, 32)?;
                let word = self.memory.read_word(offset)?;
                self.stack.push(U256::from_big_endian(&word))?;
            }
            Instruction::MStore => {
                let offset = checked_usize(self.stack.pop()?)?;
                let value = self.stack.pop()?;
                self.touch_memory(offset, 32)?;
                let mut word = [0u8; 32];
                value.to_big_endian(&mut word);
                self.memory.write(offset, &word)?;
            }
            Instruction::MStore8 => {
                let offset = checked_usize(self.stack.pop()?)?;
                let value = self.stack.pop()?;
                self.touch_memory(offset, 1)?;
                self.memory.write_byte(offset, value.byte(0))?;
            }
            Instruction::MCopy => {
                let dest = checked_usize(self.stack.pop()?)?;
                let src = checked_usize(self.stack.pop()?)?;
                let len = checked_usize(self.stack.pop()?)?;
                self.touch_memory(dest.max(src), len)?;
                self.gas.consume(gas::per_word_cost(len, costs::COPY_WORD))?;
                self.memory.copy_within(dest, src, len)?;
            }
            Instruction::SLoad => {
                let key = StorageKey::from_word(self.stack.pop()?);
                let value = self.journal.storage(self.ctx.address, key).await?;
                self.stack.push(value.to_word())?;
            }
            Instruction::SStore => {
                let key = StorageKey::from_word(self.stack.pop()?);
                let value = StorageValue::from_word(self.stack.pop()?);

                // The original value is always read first; refund bookkeeping
                // downstream depends on it.
                let original = self.journal.storage(self.ctx.address, key).await?;
                if original.is_zero() && !value.is_zero() {
                    self.gas.consume(costs::SSTORE_SET)?;
                } else {
                    self.gas.consume(costs::SSTORE_RESET)?;
                }
                if !original.is_zero() && value.is_zero() {
                    self.gas.add_refund(costs::SSTORE_CLEAR_REFUND);
                }
                self.journal.set_storage(self.ctx.address, key, value);
            }
            Instruction::TLoad => {
                let key = StorageKey::from_word(self.stack.pop()?);
                let value = self.journal.transient(self.ctx.address, key);
                self.stack.push(value.to_word())?;
            }
            Instruction::TStore => {
                let key = StorageKey::from_word(self.stack.pop()?);
                let value = StorageValue::from_word(self.stack.pop()?);
                self.journal.set_transient(self.ctx.address, key, value);
            }

            // -----------------------------------------------------------------
            // Control flow
            // -----------------------------------------------------------------
            Instruction::Jump => {
                let dest = checked_usize(self.stack.pop()?)?;
                self.jump_to(dest)?;
            }
            Instruction::JumpI => {
                let dest = checked_usize(self.stack.pop()?)?;
                let condition = self.stack.pop()?;
                if !condition.is_zero() {
                    self.jump_to(dest)?;
                }
            }
            Instruction::Pc => self.stack.push(U256::from(self.pc - 1))?,
            Instruction::MSize => self.stack.push(U256::from(self.memory.len()))?,
            Instruction::Gas => self.stack.push(U256::from(self.gas.remaining()))?,
            Instruction::JumpDest => {}

            Instruction::Push(0) => self.stack.push(U256::zero())?,
            Instruction::Push(n) => {
                let n = n as usize;
                let end = (self.pc + n).min(self.code.len());
                let mut word = [0u8; 32];
                word[32 - n..32 - n + (end - self.pc)]
                    .copy_from_slice(&self.code.as_slice()[self.pc..end]);
                self.stack.push(U256::from_big_endian(&word))?;
                self.pc += n;
            }
            Instruction::Dup(n) => self.stack.duplicate(n as usize - 1)?,
            Instruction::Swap(n) => self.stack.swap(n as usize)?,

            // -----------------------------------------------------------------
            // Logging
            // -----------------------------------------------------------------
            Instruction::Log(topic_count) => {
                let offset = checked_usize(self.stack.pop()?)?;
                let len = checked_usize(self.stack.pop()?)?;
                let mut topics = Vec::with_capacity(topic_count as usize);
                for _ in 0..topic_count {
                    topics.push(Hash::from_word(self.stack.pop()?));
                }
                self.touch_memory(offset, len)?;
                self.gas
                    .consume(gas::log_dynamic_cost(len, topic_count as usize))?;
                let data = self.memory.read(offset, len)?;
                self.result
                    .logs
                    .push(Log::new(self.ctx.address, topics, Bytes::from_vec(data)));
            }

            // -----------------------------------------------------------------
            // Frame termination
            // -----------------------------------------------------------------
            Instruction::Return => {
                self.output = self.capture_output()?;
                self.stopped = true;
            }
            Instruction::Revert => {
                self.output = self.capture_output()?;
                self.stopped = true;
                self.reverted = true;
            }
            Instruction::Invalid => return Err(VmError::InvalidOpcode(0xfe)),

            // -----------------------------------------------------------------
            // Calls, creations, destruction (calls.rs)
            // -----------------------------------------------------------------
            Instruction::Call => self.op_call(CallKind::Call).await?,
            Instruction::CallCode => self.op_call(CallKind::CallCode).await?,
            Instruction::DelegateCall => self.op_call(CallKind::DelegateCall).await?,
            Instruction::StaticCall => self.op_call(CallKind::StaticCall).await?,
            Instruction::Create => self.op_create(CallKind::Create).await?,
            Instruction::Create2 => self.op_create(CallKind::Create2).await?,
            Instruction::SelfDestruct => self.op_selfdestruct().await?,
        }

        Ok(())
    }

    fn binary_op(&mut self, op: impl FnOnce(U256, U256) -> U256) -> Result<(), VmError> {
        let a = self.stack.pop()?;
        let b = self.stack.pop()?;
        self.stack.push(op(a, b))
    }

    fn jump_to(&mut self, dest: usize) -> Result<(), VmError> {
        if !self.jump_dests.contains(&dest) {
            return Err(VmError::InvalidJump(dest));
        }
        self.pc = dest;
        Ok(())
    }

    /// Pops `(dest, src_offset, len)` and copies a zero-padded slice of
    /// `source` into memory, charging expansion and per-word copy costs.
    fn copy_into_memory(&mut self, source: &[u8]) -> Result<(), VmError> {
        let dest = checked_usize(self.stack.pop()?)?;
        let src_offset = self.stack.pop()?;
        let len = checked_usize(self.stack.pop()?)?;

        self.touch_memory(dest, len)?;
        self.gas.consume(gas::per_word_cost(len, costs::COPY_WORD))?;

        if len == 0 {
            return Ok(());
        }
        let mut buffer = vec![0u8; len];
        if src_offset <= U256::from(usize::MAX) {
            let src = src_offset.as_usize();
            if src < source.len() {
                let available = (source.len() - src).min(len);
                buffer[..available].copy_from_slice(&source[src..src + available]);
            }
        }
        self.memory.write(dest, &buffer)?;
        Ok(())
    }

    /// Pops `(offset, len)` and captures that memory slice as frame output.
    fn capture_output(&mut self) -> Result<Bytes, VmError> {
        let offset = checked_usize(self.stack.pop()?)?;
        let len = checked_usize(self.stack.pop()?)?;
        self.touch_memory(offset, len)?;
        Ok(Bytes::from_vec(self.memory.read_padded(offset, len)))
    }
}

// =============================================================================
// WORD ARITHMETIC
// =============================================================================

fn bool_word(condition: bool) -> U256 {
    if condition {
        U256::one()
    } else {
        U256::zero()
    }
}

fn widen(value: U256) -> U512 {
    U512::from(value)
}

fn narrow(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

fn is_negative(value: U256) -> bool {
    value.bit(255)
}

fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}

/// Two's-complement division. Division by zero yields zero; `MIN / -1`
/// wraps back to `MIN`.
fn signed_div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quotient = abs(a) / abs(b);
    if is_negative(a) == is_negative(b) {
        quotient
    } else {
        negate(quotient)
    }
}

/// Two's-complement remainder; takes the sign of the dividend.
fn signed_rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let remainder = abs(a) % abs(b);
    if is_negative(a) {
        negate(remainder)
    } else {
        remainder
    }
}

fn signed_lt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// Arithmetic shift right: fills with the sign bit; shifts of 256 or more
/// collapse to all-zeros or all-ones.
fn arithmetic_shr(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.as_usize();
    let shifted = value >> shift;
    if negative && shift > 0 {
        shifted | (U256::MAX << (256 - shift))
    } else {
        shifted
    }
}

/// Modular exponentiation by squaring, modulo 2^256.
fn wrapping_pow(mut base: U256, mut exponent: U256) -> U256 {
    let mut acc = U256::one();
    while !exponent.is_zero() {
        if exponent.bit(0) {
            acc = acc.overflowing_mul(base).0;
        }
        exponent >>= 1;
        base = base.overflowing_mul(base).0;
    }
    acc
}

/// Sign-extends `value` from byte `byte_index` (0 = least significant);
/// indices of 31 and above leave the value unchanged.
fn sign_extend(byte_index: U256, value: U256) -> U256 {
    if byte_index >= U256::from(31) {
        return value;
    }
    let bit = byte_index.as_usize() * 8 + 7;
    let mask = (U256::one() << (bit + 1)) - 1;
    if value.bit(bit) {
        value | !mask
    } else {
        value & mask
    }
}

/// Reads a 32-byte big-endian word out of `data` at `offset`, zero-padded
/// past the end; oversized offsets read as zero.
fn load_word_padded(data: &[u8], offset: U256) -> U256 {
    let mut word = [0u8; 32];
    if offset <= U256::from(usize::MAX) {
        let offset = offset.as_usize();
        if offset < data.len() {
            let available = (data.len() - offset).min(32);
            word[..available].copy_from_slice(&data[offset..offset + available]);
        }
    }
    U256::from_big_endian(&word)
}

// =============================================================================
// TESTS
// =============================================================================
