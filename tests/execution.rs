//! End-to-end call-tree tests: bytecode in, committed state and results out,
//! through the in-memory world state.

use evm_core::prelude::*;

// =============================================================================
// BYTECODE BUILDERS
// =============================================================================

const STOP: u8 = 0x00;
const ADD: u8 = 0x01;
const DIV: u8 = 0x04;
const CALLER: u8 = 0x33;
const RETURNDATASIZE: u8 = 0x3d;
const MSTORE: u8 = 0x52;
const SSTORE: u8 = 0x55;
const JUMP: u8 = 0x56;
const LOG1: u8 = 0xa1;
const CREATE: u8 = 0xf0;
const CALL: u8 = 0xf1;
const RETURN: u8 = 0xf3;
const DELEGATECALL: u8 = 0xf4;
const CREATE2: u8 = 0xf5;
const STATICCALL: u8 = 0xfa;
const REVERT: u8 = 0xfd;
const SELFDESTRUCT: u8 = 0xff;

/// Appends a PUSHn for `bytes` (1 <= n <= 32).
fn push(code: &mut Vec<u8>, bytes: &[u8]) {
    assert!(!bytes.is_empty() && bytes.len() <= 32);
    code.push(0x5f + bytes.len() as u8);
    code.extend_from_slice(bytes);
}

fn push1(code: &mut Vec<u8>, byte: u8) {
    push(code, &[byte]);
}

/// Appends the CALL argument block `(..., value, to, gas)` and the opcode.
fn call_with_value(code: &mut Vec<u8>, to: Address, value: u8) {
    push1(code, 0x00); // retSize
    push1(code, 0x00); // retOffset
    push1(code, 0x00); // argsSize
    push1(code, 0x00); // argsOffset
    push1(code, value);
    push(code, to.as_bytes());
    push(code, &[0xff, 0xff, 0xff]); // gas
    code.push(CALL);
}

/// Bytecode that stores `value` at storage slot `slot`.
fn sstore_code(slot: u8, value: u8) -> Vec<u8> {
    let mut code = Vec::new();
    push1(&mut code, value);
    push1(&mut code, slot);
    code.push(SSTORE);
    code
}

fn slot(n: u64) -> StorageKey {
    StorageKey::from_word(U256::from(n))
}

fn word(n: u64) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    U256::from(n).to_big_endian(&mut bytes);
    bytes
}

async fn seeded_evm() -> Evm<InMemoryWorldState> {
    Evm::new(InMemoryWorldState::new())
}

fn ctx_at(address: Address) -> ExecutionContext {
    ExecutionContext {
        origin: Address::from_low_u64(0xaaaa),
        caller: Address::from_low_u64(0xaaaa),
        address,
        ..Default::default()
    }
}

// =============================================================================
// ARITHMETIC & MEMORY
// =============================================================================

#[tokio::test]
async fn add_mstore_return_pipeline() {
    // PUSH1 1 PUSH1 2 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    let mut code = Vec::new();
    push1(&mut code, 0x01);
    push1(&mut code, 0x02);
    code.push(ADD);
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x20);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.output.as_slice(), &word(3));
}

#[tokio::test]
async fn division_by_zero_yields_zero() {
    // PUSH1 0 PUSH1 7 DIV -> 7 / 0 == 0
    let mut code = Vec::new();
    push1(&mut code, 0x00);
    push1(&mut code, 0x07);
    code.push(DIV);
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x20);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap();
    assert_eq!(result.output.as_slice(), &word(0));
}

#[tokio::test]
async fn invalid_jump_faults_the_top_frame() {
    // PUSH1 3 JUMP STOP — offset 3 is not a JUMPDEST.
    let mut code = Vec::new();
    push1(&mut code, 0x03);
    code.push(JUMP);
    code.push(STOP);

    let evm = seeded_evm().await;
    let err = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap_err();
    assert_eq!(err, VmError::InvalidJump(3));
}

// =============================================================================
// STORAGE & REVERT ISOLATION
// =============================================================================

#[tokio::test]
async fn successful_store_reaches_the_provider() {
    let me = Address::from_low_u64(0x100);
    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(sstore_code(0, 42)), ctx_at(me))
        .await
        .unwrap();

    assert!(result.is_success());
    let stored = evm.provider().get_storage_at(me, slot(0)).await.unwrap();
    assert_eq!(stored.to_word(), U256::from(42));
}

#[tokio::test]
async fn reverted_top_frame_flushes_nothing() {
    let me = Address::from_low_u64(0x100);
    let mut code = sstore_code(0, 42);
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    code.push(REVERT);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(me))
        .await
        .unwrap();

    assert!(result.reverted);
    let stored = evm.provider().get_storage_at(me, slot(0)).await.unwrap();
    assert!(stored.is_zero());
}

#[tokio::test]
async fn child_revert_discards_child_writes_but_keeps_parents() {
    let parent = Address::from_low_u64(0x100);
    let child = Address::from_low_u64(0x200);

    // Child: SSTORE(0, 2) then REVERT.
    let mut child_code = sstore_code(0, 2);
    push1(&mut child_code, 0x00);
    push1(&mut child_code, 0x00);
    child_code.push(REVERT);

    // Parent: SSTORE(0, 1), CALL child, (stops on the child's revert).
    let mut parent_code = sstore_code(0, 1);
    call_with_value(&mut parent_code, child, 0);
    parent_code.push(STOP);

    let state = InMemoryWorldState::new();
    state.deploy_code(child, Bytes::from_vec(child_code)).await;
    let evm = Evm::new(state);

    let (result, _) = evm
        .execute(Bytes::from_vec(parent_code), ctx_at(parent))
        .await
        .unwrap();

    // The failed call is recorded and the parent's own write survives.
    assert!(!result.reverted);
    assert_eq!(result.inner_calls.len(), 1);
    assert!(!result.inner_calls[0].success);

    let parents = evm.provider().get_storage_at(parent, slot(0)).await.unwrap();
    assert_eq!(parents.to_word(), U256::one());
    let childs = evm.provider().get_storage_at(child, slot(0)).await.unwrap();
    assert!(childs.is_zero());
}

#[tokio::test]
async fn staticcall_rejects_child_store_without_mutation() {
    let parent = Address::from_low_u64(0x100);
    let child = Address::from_low_u64(0x200);

    let state = InMemoryWorldState::new();
    state.deploy_code(child, Bytes::from_vec(sstore_code(0, 1))).await;
    let evm = Evm::new(state);

    // STATICCALL(gas, child, 0, 0, 0, 0)
    let mut code = Vec::new();
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    push(&mut code, child.as_bytes());
    push(&mut code, &[0xff, 0xff, 0xff]);
    code.push(STATICCALL);
    code.push(STOP);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();

    assert_eq!(result.error, Some(VmError::StaticViolation));
    assert!(!result.inner_calls[0].success);
    let stored = evm.provider().get_storage_at(child, slot(0)).await.unwrap();
    assert!(stored.is_zero());
}

#[tokio::test]
async fn delegatecall_keeps_caller_and_storage_context() {
    let origin = Address::from_low_u64(0xaaaa);
    let parent = Address::from_low_u64(0x100);
    let library = Address::from_low_u64(0x200);

    // Library: SSTORE(0, CALLER).
    let mut library_code = Vec::new();
    library_code.push(CALLER);
    push1(&mut library_code, 0x00);
    library_code.push(SSTORE);

    let state = InMemoryWorldState::new();
    state.deploy_code(library, Bytes::from_vec(library_code)).await;
    let evm = Evm::new(state);

    // DELEGATECALL(gas, library, 0, 0, 0, 0)
    let mut code = Vec::new();
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    push1(&mut code, 0x00);
    push(&mut code, library.as_bytes());
    push(&mut code, &[0xff, 0xff, 0xff]);
    code.push(DELEGATECALL);
    code.push(STOP);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();
    assert!(result.inner_calls[0].success);

    // The write landed in the parent's storage, and the library observed the
    // original caller.
    let stored = evm.provider().get_storage_at(parent, slot(0)).await.unwrap();
    assert_eq!(stored.to_word(), origin.to_word());
    let library_slot = evm.provider().get_storage_at(library, slot(0)).await.unwrap();
    assert!(library_slot.is_zero());
}

// =============================================================================
// VALUE TRANSFER & SELFDESTRUCT
// =============================================================================

#[tokio::test]
async fn call_to_codeless_account_transfers_value() {
    let parent = Address::from_low_u64(0x100);
    let beneficiary = Address::from_low_u64(0x200);

    let state = InMemoryWorldState::new();
    state.set_balance(parent, U256::from(1_000)).await;
    let evm = Evm::new(state);

    let mut code = Vec::new();
    call_with_value(&mut code, beneficiary, 25);
    code.push(STOP);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();
    assert!(result.inner_calls[0].success);

    assert_eq!(
        evm.provider().get_balance(beneficiary).await.unwrap(),
        U256::from(25)
    );
    assert_eq!(
        evm.provider().get_balance(parent).await.unwrap(),
        U256::from(975)
    );
}

#[tokio::test]
async fn insufficient_balance_pushes_failure_and_continues() {
    let parent = Address::from_low_u64(0x100);
    let beneficiary = Address::from_low_u64(0x200);

    let evm = seeded_evm().await;

    // CALL with value from a broke account, then SSTORE(0, 7) to prove the
    // frame kept running.
    let mut code = Vec::new();
    call_with_value(&mut code, beneficiary, 25);
    code.extend_from_slice(&sstore_code(0, 7));
    code.push(STOP);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();

    assert!(!result.inner_calls[0].success);
    assert!(result.error.is_none());
    let stored = evm.provider().get_storage_at(parent, slot(0)).await.unwrap();
    assert_eq!(stored.to_word(), U256::from(7));
    assert!(evm.provider().get_balance(beneficiary).await.unwrap().is_zero());
}

#[tokio::test]
async fn selfdestruct_moves_the_whole_balance() {
    let victim = Address::from_low_u64(0x100);
    let heir = Address::from_low_u64(0x200);

    let state = InMemoryWorldState::new();
    state.set_balance(victim, U256::from(500)).await;
    let evm = Evm::new(state);

    let mut code = Vec::new();
    push(&mut code, heir.as_bytes());
    code.push(SELFDESTRUCT);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(victim))
        .await
        .unwrap();

    assert_eq!(result.destroyed, vec![victim]);
    assert_eq!(evm.provider().get_balance(heir).await.unwrap(), U256::from(500));
    assert!(evm.provider().get_balance(victim).await.unwrap().is_zero());
}

// =============================================================================
// CREATE / CREATE2
// =============================================================================

/// Init code that deploys a 32-byte runtime blob containing the word 42.
fn deploy_42_init_code() -> Vec<u8> {
    let mut init = Vec::new();
    push1(&mut init, 0x2a);
    push1(&mut init, 0x00);
    init.push(MSTORE);
    push1(&mut init, 0x20);
    push1(&mut init, 0x00);
    init.push(RETURN);
    init
}

/// Parent code: writes `init` into memory and runs CREATE/CREATE2.
fn create_caller(init: &[u8], create2_salt: Option<u8>) -> Vec<u8> {
    assert!(init.len() <= 32);
    let mut padded = [0u8; 32];
    padded[..init.len()].copy_from_slice(init);

    let mut code = Vec::new();
    push(&mut code, &padded);
    push1(&mut code, 0x00);
    code.push(MSTORE);
    if let Some(salt) = create2_salt {
        push1(&mut code, salt);
    }
    push1(&mut code, init.len() as u8); // length
    push1(&mut code, 0x00); // offset
    push1(&mut code, 0x00); // value
    code.push(if create2_salt.is_some() { CREATE2 } else { CREATE });
    code.push(STOP);
    code
}

#[tokio::test]
async fn create_deploys_code_and_bumps_nonces() {
    let creator = Address::from_low_u64(0x100);
    let evm = seeded_evm().await;

    let init = deploy_42_init_code();
    let (result, _) = evm
        .execute(Bytes::from_vec(create_caller(&init, None)), ctx_at(creator))
        .await
        .unwrap();

    let expected = create_address(creator, 0);
    assert_eq!(result.created, vec![expected]);
    assert!(result.inner_calls[0].success);
    assert_eq!(result.inner_calls[0].kind, CallKind::Create);

    assert_eq!(evm.provider().get_nonce(creator).await.unwrap(), 1);
    assert_eq!(evm.provider().get_nonce(expected).await.unwrap(), 1);
    let deployed = evm.provider().get_code(expected).await.unwrap();
    assert_eq!(deployed.as_slice(), &word(42));
}

#[tokio::test]
async fn create2_address_is_deterministic() {
    let creator = Address::from_low_u64(0x100);
    let init = deploy_42_init_code();

    let salt = Hash::from_word(U256::from(0x07));
    let expected = create2_address(creator, salt, &init);
    assert_eq!(expected, create2_address(creator, salt, &init));

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(
            Bytes::from_vec(create_caller(&init, Some(0x07))),
            ctx_at(creator),
        )
        .await
        .unwrap();

    assert_eq!(result.created, vec![expected]);
    let deployed = evm.provider().get_code(expected).await.unwrap();
    assert_eq!(deployed.as_slice(), &word(42));
}

#[tokio::test]
async fn reverting_init_code_reverts_the_creator() {
    let creator = Address::from_low_u64(0x100);

    // Init code: REVERT(0, 0).
    let mut init = Vec::new();
    push1(&mut init, 0x00);
    push1(&mut init, 0x00);
    init.push(REVERT);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(create_caller(&init, None)), ctx_at(creator))
        .await
        .unwrap();

    assert!(result.reverted);
    assert!(result.created.is_empty());
    assert!(!result.inner_calls[0].success);
    // Nothing committed, not even the creator's nonce.
    assert_eq!(evm.provider().get_nonce(creator).await.unwrap(), 0);
}

// =============================================================================
// PRECOMPILES THROUGH CALL
// =============================================================================

#[tokio::test]
async fn identity_precompile_round_trips_through_memory() {
    let parent = Address::from_low_u64(0x100);
    let evm = seeded_evm().await;

    let payload = word(0xdead_beef);

    // MSTORE(0, payload); CALL(identity, in 0..32, out 32..64); RETURN(32, 32)
    let mut code = Vec::new();
    push(&mut code, &payload);
    push1(&mut code, 0x00);
    code.push(MSTORE);

    push1(&mut code, 0x20); // retSize
    push1(&mut code, 0x20); // retOffset
    push1(&mut code, 0x20); // argsSize
    push1(&mut code, 0x00); // argsOffset
    push1(&mut code, 0x00); // value
    push1(&mut code, 0x04); // identity
    push(&mut code, &[0xff, 0xff]); // gas
    code.push(CALL);

    push1(&mut code, 0x20); // len
    push1(&mut code, 0x20); // offset
    code.push(RETURN);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();

    assert!(result.inner_calls[0].success);
    assert_eq!(result.inner_calls[0].to, Address::from_low_u64(4));
    assert_eq!(result.output.as_slice(), &payload);
}

#[tokio::test]
async fn return_data_size_reflects_the_last_call() {
    let parent = Address::from_low_u64(0x100);
    let child = Address::from_low_u64(0x200);

    // Child returns two bytes.
    let mut child_code = Vec::new();
    push(&mut child_code, &[0xaa, 0xbb]);
    push1(&mut child_code, 0x00);
    child_code.push(MSTORE);
    push1(&mut child_code, 0x02); // len
    push1(&mut child_code, 0x1e); // offset 30
    child_code.push(RETURN);

    let state = InMemoryWorldState::new();
    state.deploy_code(child, Bytes::from_vec(child_code)).await;
    let evm = Evm::new(state);

    let mut code = Vec::new();
    call_with_value(&mut code, child, 0);
    code.push(RETURNDATASIZE);
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x20);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();
    assert_eq!(result.output.as_slice(), &word(2));
}

// =============================================================================
// LOGS, TRACES, GAS POLICY
// =============================================================================

#[tokio::test]
async fn log1_records_topic_and_data() {
    let me = Address::from_low_u64(0x100);
    let evm = seeded_evm().await;

    let mut code = Vec::new();
    push1(&mut code, 0x2a);
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x07); // topic
    push1(&mut code, 0x20); // size
    push1(&mut code, 0x00); // offset
    code.push(LOG1);
    code.push(STOP);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(me))
        .await
        .unwrap();

    assert_eq!(result.logs.len(), 1);
    let log = &result.logs[0];
    assert_eq!(log.address, me);
    assert_eq!(log.topics, vec![Hash::from_word(U256::from(7))]);
    assert_eq!(log.data.as_slice(), &word(42));
}

#[tokio::test]
async fn trace_records_each_step_and_serializes() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let evm = Evm::new(InMemoryWorldState::new()).with_config(VmConfig {
        trace_enabled: true,
        ..Default::default()
    });

    let mut code = Vec::new();
    push1(&mut code, 0x01);
    push1(&mut code, 0x02);
    code.push(ADD);
    code.push(STOP);

    let (_, trace) = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap();

    assert_eq!(trace.len(), 4);
    assert_eq!(trace[0].name, "PUSH");
    assert_eq!(trace[2].name, "ADD");
    assert_eq!(trace[2].stack.len(), 2);
    assert_eq!(trace[3].name, "STOP");

    let json = serde_json::to_string(&trace).unwrap();
    assert!(json.contains("\"ADD\""));
}

#[tokio::test]
async fn metered_execution_runs_out_of_gas() {
    let mut ctx = ctx_at(Address::from_low_u64(1));
    ctx.gas_limit = 4;

    let mut code = Vec::new();
    push1(&mut code, 0x01);
    push1(&mut code, 0x02);
    code.push(ADD);
    code.push(STOP);

    let evm = seeded_evm().await;
    let err = evm.execute(Bytes::from_vec(code), ctx).await.unwrap_err();
    assert_eq!(err, VmError::OutOfGas);
}

#[tokio::test]
async fn unmetered_execution_ignores_the_gas_limit() {
    let evm = Evm::new(InMemoryWorldState::new()).with_config(VmConfig {
        gas_policy: GasPolicy::Unmetered,
        ..Default::default()
    });

    let mut ctx = ctx_at(Address::from_low_u64(1));
    ctx.gas_limit = 0;

    let mut code = Vec::new();
    push1(&mut code, 0x01);
    push1(&mut code, 0x02);
    code.push(ADD);
    code.push(STOP);

    let (result, _) = evm.execute(Bytes::from_vec(code), ctx).await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.gas_used, 0);
}

#[tokio::test]
async fn add_wraps_modulo_2_pow_256() {
    // PUSH32 MAX PUSH1 1 ADD -> 0
    let mut code = Vec::new();
    push(&mut code, &[0xff; 32]);
    push1(&mut code, 0x01);
    code.push(ADD);
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x20);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap();
    assert_eq!(result.output.as_slice(), &word(0));
}

#[tokio::test]
async fn addmod_with_zero_modulus_is_zero() {
    // ADDMOD(5, 6, 0) -> 0; pops a, b, n.
    let mut code = Vec::new();
    push1(&mut code, 0x00); // n
    push1(&mut code, 0x06); // b
    push1(&mut code, 0x05); // a
    code.push(0x08); // ADDMOD
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x20);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap();
    assert_eq!(result.output.as_slice(), &word(0));
}

#[tokio::test]
async fn transient_storage_round_trips_within_the_call() {
    // TSTORE(0, 5); TLOAD(0); MSTORE(0); RETURN 32
    let mut code = Vec::new();
    push1(&mut code, 0x05); // value
    push1(&mut code, 0x00); // key
    code.push(0x5d); // TSTORE
    push1(&mut code, 0x00);
    code.push(0x5c); // TLOAD
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x20);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let evm = seeded_evm().await;
    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(Address::from_low_u64(1)))
        .await
        .unwrap();
    assert_eq!(result.output.as_slice(), &word(5));
}

#[tokio::test]
async fn blockhash_reads_recent_blocks_through_the_provider() {
    let state = InMemoryWorldState::new();
    state.put_block_hash(9, Hash::from_word(U256::from(0x1234))).await;
    let evm = Evm::new(state);

    let mut ctx = ctx_at(Address::from_low_u64(1));
    ctx.block.number = 10;

    // BLOCKHASH(9) -> stored hash; BLOCKHASH(10) (current) -> 0.
    let mut code = Vec::new();
    push1(&mut code, 0x09);
    code.push(0x40); // BLOCKHASH
    push1(&mut code, 0x00);
    code.push(MSTORE);
    push1(&mut code, 0x0a);
    code.push(0x40);
    push1(&mut code, 0x20);
    code.push(MSTORE);
    push1(&mut code, 0x40);
    push1(&mut code, 0x00);
    code.push(RETURN);

    let (result, _) = evm.execute(Bytes::from_vec(code), ctx).await.unwrap();
    assert_eq!(&result.output.as_slice()[..32], &word(0x1234));
    assert_eq!(&result.output.as_slice()[32..], &word(0));
}

#[tokio::test]
async fn touched_code_map_covers_called_contracts() {
    let parent = Address::from_low_u64(0x100);
    let child = Address::from_low_u64(0x200);
    let child_code = vec![STOP];

    let state = InMemoryWorldState::new();
    state.deploy_code(child, Bytes::from_vec(child_code.clone())).await;
    let evm = Evm::new(state);

    let mut code = Vec::new();
    call_with_value(&mut code, child, 0);
    code.push(STOP);

    let (result, _) = evm
        .execute(Bytes::from_vec(code), ctx_at(parent))
        .await
        .unwrap();

    assert_eq!(
        result.touched_code.get(&child).map(Bytes::as_slice),
        Some(child_code.as_slice())
    );
}
