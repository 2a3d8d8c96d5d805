//! Token ABI bindings and calldata encoding
//!
//! Only the handful of ERC-20 / ERC-721 functions the sweeper calls.

use ethers::abi::{AbiDecode, AbiEncode};
use ethers::types::{Address, Bytes, U256};

use crate::error::{Error, Result};

use super::ContractRead;

mod erc20 {
    ethers::contract::abigen!(
        Erc20,
        r#"[
            function balanceOf(address owner) external view returns (uint256)
            function transfer(address to, uint256 amount) external returns (bool)
        ]"#
    );
}

mod erc721 {
    ethers::contract::abigen!(
        Erc721,
        r#"[
            function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256)
            function safeTransferFrom(address from, address to, uint256 tokenId) external
        ]"#
    );
}

/// Calldata for a read-only call
pub fn encode_read(call: ContractRead) -> Bytes {
    match call {
        // Same selector for ERC-20 and ERC-721
        ContractRead::BalanceOf { owner } => erc20::BalanceOfCall { owner }.encode().into(),
        ContractRead::TokenOfOwnerByIndex { owner, index } => {
            erc721::TokenOfOwnerByIndexCall { owner, index }
                .encode()
                .into()
        }
    }
}

/// Decode a single uint256 return value
pub fn decode_uint(output: &[u8]) -> Result<U256> {
    U256::decode(output)
        .map_err(|e| Error::NetworkQuery(format!("Failed to decode uint256: {}", e)))
}

/// `transfer(to, amount)`
pub fn erc20_transfer(to: Address, amount: U256) -> Bytes {
    erc20::TransferCall { to, amount }.encode().into()
}

/// `safeTransferFrom(from, to, tokenId)`
pub fn erc721_safe_transfer_from(from: Address, to: Address, token_id: U256) -> Bytes {
    erc721::SafeTransferFromCall { from, to, token_id }
        .encode()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_selectors() {
        let balance = encode_read(ContractRead::BalanceOf { owner: addr(1) });
        assert_eq!(&balance[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(balance.len(), 4 + 32);

        let by_index = encode_read(ContractRead::TokenOfOwnerByIndex {
            owner: addr(1),
            index: U256::zero(),
        });
        assert_eq!(&by_index[..4], &[0x2f, 0x74, 0x5c, 0x59]);

        let transfer = erc20_transfer(addr(2), U256::from(100));
        assert_eq!(&transfer[..4], &[0xa9, 0x05, 0x9c, 0xbb]);

        let safe = erc721_safe_transfer_from(addr(1), addr(2), U256::from(7));
        assert_eq!(&safe[..4], &[0x42, 0x84, 0x2e, 0x0e]);
        assert_eq!(safe.len(), 4 + 3 * 32);
    }

    #[test]
    fn test_transfer_arguments_encoded() {
        let data = erc20_transfer(addr(0xab), U256::from(100));
        // address is right-aligned in the first word
        assert_eq!(&data[4 + 12..4 + 32], addr(0xab).as_bytes());
        assert_eq!(U256::from_big_endian(&data[36..68]), U256::from(100));
    }

    #[test]
    fn test_decode_uint() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_uint(&word).unwrap(), U256::from(42));
        assert!(decode_uint(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_empty_return_data_is_query_error() {
        // Contracts without the enumerable extension return nothing
        let err = decode_uint(&[]).unwrap_err();
        assert!(matches!(err, Error::NetworkQuery(_)));

        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_uint(&word).unwrap(), U256::from(42));
    }
}
