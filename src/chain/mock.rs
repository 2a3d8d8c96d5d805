//! Scripted in-memory chain for tests
//!
//! Submissions apply their effects immediately: value and the full
//! `gas_limit * fee_rate` fee leave the sender, token transfers are decoded
//! from calldata. Every call is recorded in order.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, H256, U256};

use crate::error::{Error, Result};
use crate::wallet::WalletCredential;

use super::{ChainClient, Confirmation, ContractRead, TransferRequest};

const ERC20_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
const ERC721_SAFE_TRANSFER_FROM: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e];

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    NativeBalance(Address),
    FeeRate,
    Read(Address, ContractRead),
    Submit(Address, TransferRequest),
    Confirm(TxHash),
}

#[derive(Default)]
struct State {
    fee_rate: U256,
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    nfts: HashMap<(Address, Address), Vec<U256>>,
    failing_reads: HashSet<(Address, Address)>,
    failing_submitters: HashSet<Address>,
    failing_confirmations: HashSet<Address>,
    tx_senders: HashMap<TxHash, Address>,
    events: Vec<MockEvent>,
    next_tx: u64,
}

#[derive(Default)]
pub struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub fn new(fee_rate: u64) -> Self {
        let chain = Self::default();
        chain.state.lock().unwrap().fee_rate = U256::from(fee_rate);
        chain
    }

    pub fn set_native(&self, owner: Address, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .native
            .insert(owner, U256::from(amount));
    }

    pub fn set_tokens(&self, contract: Address, owner: Address, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert((contract, owner), U256::from(amount));
    }

    pub fn set_nfts(&self, contract: Address, owner: Address, ids: &[u64]) {
        self.state
            .lock()
            .unwrap()
            .nfts
            .insert((contract, owner), ids.iter().map(|&i| U256::from(i)).collect());
    }

    pub fn fail_reads(&self, contract: Address, owner: Address) {
        self.state
            .lock()
            .unwrap()
            .failing_reads
            .insert((contract, owner));
    }

    pub fn fail_submissions_from(&self, sender: Address) {
        self.state.lock().unwrap().failing_submitters.insert(sender);
    }

    pub fn fail_confirmations_from(&self, sender: Address) {
        self.state
            .lock()
            .unwrap()
            .failing_confirmations
            .insert(sender);
    }

    pub fn native(&self, owner: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .native
            .get(&owner)
            .copied()
            .unwrap_or_default()
    }

    pub fn tokens(&self, contract: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get(&(contract, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn nfts(&self, contract: Address, owner: Address) -> Vec<U256> {
        self.state
            .lock()
            .unwrap()
            .nfts
            .get(&(contract, owner))
            .cloned()
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Submissions in order, as (sender, request)
    pub fn submissions(&self) -> Vec<(Address, TransferRequest)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Submit(from, req) => Some((from, req)),
                _ => None,
            })
            .collect()
    }

    pub fn submissions_from(&self, sender: Address) -> Vec<TransferRequest> {
        self.submissions()
            .into_iter()
            .filter(|(from, _)| *from == sender)
            .map(|(_, req)| req)
            .collect()
    }
}

fn word(data: &[u8], index: usize) -> &[u8] {
    &data[4 + index * 32..4 + (index + 1) * 32]
}

fn word_address(data: &[u8], index: usize) -> Address {
    Address::from_slice(&word(data, index)[12..])
}

fn word_uint(data: &[u8], index: usize) -> U256 {
    U256::from_big_endian(word(data, index))
}

impl State {
    fn apply(&mut self, from: Address, req: &TransferRequest) -> Result<()> {
        let balance = self.native.get(&from).copied().unwrap_or_default();
        let cost = req.value + req.max_fee();
        if balance < cost {
            return Err(Error::Submission(format!(
                "insufficient funds for gas * price + value: have {} want {}",
                balance, cost
            )));
        }

        let data = req.data.as_ref();
        if data.len() >= 4 && data[..4] == ERC20_TRANSFER {
            let (to, amount) = (word_address(data, 0), word_uint(data, 1));
            let held = self.tokens.get(&(req.to, from)).copied().unwrap_or_default();
            if held < amount {
                return Err(Error::Submission("execution reverted".to_string()));
            }
            self.tokens.insert((req.to, from), held - amount);
            *self.tokens.entry((req.to, to)).or_default() += amount;
        } else if data.len() >= 4 && data[..4] == ERC721_SAFE_TRANSFER_FROM {
            let (owner, to, id) = (
                word_address(data, 0),
                word_address(data, 1),
                word_uint(data, 2),
            );
            let items = self.nfts.entry((req.to, owner)).or_default();
            let pos = items
                .iter()
                .position(|i| *i == id)
                .ok_or_else(|| Error::Submission("execution reverted".to_string()))?;
            items.remove(pos);
            self.nfts.entry((req.to, to)).or_default().push(id);
        }

        self.native.insert(from, balance - cost);
        *self.native.entry(req.to).or_default() += req.value;
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn native_balance(&self, address: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::NativeBalance(address));
        Ok(state.native.get(&address).copied().unwrap_or_default())
    }

    async fn fee_rate(&self) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::FeeRate);
        Ok(state.fee_rate)
    }

    async fn read_contract(&self, contract: Address, call: ContractRead) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::Read(contract, call));

        match call {
            ContractRead::BalanceOf { owner } => {
                if state.failing_reads.contains(&(contract, owner)) {
                    return Err(Error::NetworkQuery("execution reverted".to_string()));
                }
                let tokens = state.tokens.get(&(contract, owner)).copied();
                let nfts = state.nfts.get(&(contract, owner)).map(|v| U256::from(v.len()));
                Ok(tokens.or(nfts).unwrap_or_default())
            }
            ContractRead::TokenOfOwnerByIndex { owner, index } => state
                .nfts
                .get(&(contract, owner))
                .and_then(|items| items.get(index.as_usize()).copied())
                .ok_or_else(|| Error::NetworkQuery("owner index out of bounds".to_string())),
        }
    }

    async fn submit_transfer(
        &self,
        from: &WalletCredential,
        request: TransferRequest,
    ) -> Result<TxHash> {
        let sender = from.address();
        let mut state = self.state.lock().unwrap();
        state
            .events
            .push(MockEvent::Submit(sender, request.clone()));

        if state.failing_submitters.contains(&sender) {
            return Err(Error::Submission("nonce too low".to_string()));
        }

        state.apply(sender, &request)?;

        state.next_tx += 1;
        let hash = H256::from_low_u64_be(state.next_tx);
        state.tx_senders.insert(hash, sender);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::Confirm(tx_hash));

        let sender = state
            .tx_senders
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| Error::Confirmation(format!("{:?} unknown", tx_hash)))?;

        if state.failing_confirmations.contains(&sender) {
            return Err(Error::Confirmation(format!("{:?} reverted", tx_hash)));
        }

        Ok(Confirmation {
            tx_hash,
            block_number: Some(state.next_tx),
        })
    }
}
